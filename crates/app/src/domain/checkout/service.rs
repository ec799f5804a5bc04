//! Checkout Service

use std::{slice, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use sqlx::{Connection, Postgres, Transaction};
use tracing::{Span, info, warn};

use crate::{
    clock::Clock,
    database::Db,
    domain::{
        carts::{models::CheckoutLine, repository::PgCartItemsRepository},
        checkout::{
            errors::CheckoutError,
            models::{CheckoutInput, CheckoutPolicy, NewOrderInput, ValidatedCheckout},
        },
        markets::models::MarketUuid,
        orders::{
            models::{Order, OrderItemUuid, OrderUuid},
            number::{MAX_ORDER_NUMBER_ATTEMPTS, OrderNumberSource, RandomOrderNumbers},
            repositories::{
                NewOrderItemRow, NewOrderRow, ORDER_NUMBER_CONSTRAINT, PgOrderItemsRepository,
                PgOrdersRepository,
            },
            totals::{OrderTotals, line_total},
        },
        products::{models::Product, repository::PgProductsRepository},
        stock::StockLedger,
        transactions::{
            models::{TransactionType, TransactionUuid},
            repository::{NewTransactionRow, PgTransactionsRepository},
        },
        users::models::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgCheckoutService {
    db: Db,
    clock: Arc<dyn Clock>,
    policy: CheckoutPolicy,
    numbers: Arc<dyn OrderNumberSource>,
    carts: PgCartItemsRepository,
    products: PgProductsRepository,
    orders: PgOrdersRepository,
    items: PgOrderItemsRepository,
    stock: StockLedger,
    transactions: PgTransactionsRepository,
}

impl PgCheckoutService {
    #[must_use]
    pub fn new(db: Db, clock: Arc<dyn Clock>, policy: CheckoutPolicy) -> Self {
        Self::with_order_numbers(db, clock, policy, Arc::new(RandomOrderNumbers))
    }

    #[must_use]
    pub fn with_order_numbers(
        db: Db,
        clock: Arc<dyn Clock>,
        policy: CheckoutPolicy,
        numbers: Arc<dyn OrderNumberSource>,
    ) -> Self {
        Self {
            db,
            clock,
            policy,
            numbers,
            carts: PgCartItemsRepository::new(),
            products: PgProductsRepository::new(),
            orders: PgOrdersRepository::new(),
            items: PgOrderItemsRepository::new(),
            stock: StockLedger::new(),
            transactions: PgTransactionsRepository::new(),
        }
    }

    /// Insert the order row, drawing a fresh number whenever the previous
    /// one collides. Each attempt runs in its own savepoint.
    async fn insert_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        buyer: UserUuid,
        market: MarketUuid,
        checkout: &ValidatedCheckout,
        now: Timestamp,
    ) -> Result<(), CheckoutError> {
        for attempt in 1..=MAX_ORDER_NUMBER_ATTEMPTS {
            let order_number = self.numbers.next_number();

            let row = NewOrderRow {
                uuid: order,
                buyer,
                market,
                order_number: &order_number,
                shipping_address: &checkout.shipping_address,
                shipping_method: checkout.shipping_method.as_deref(),
                notes: checkout.notes.as_deref(),
            };

            let mut savepoint = Connection::begin(&mut **tx).await?;

            match self.orders.insert_order(&mut savepoint, &row, now).await {
                Ok(()) => {
                    savepoint.commit().await?;

                    return Ok(());
                }
                Err(error) if is_order_number_collision(&error) => {
                    savepoint.rollback().await?;

                    warn!(attempt, order_number = %order_number, "order number collision");
                }
                Err(error) => return Err(error.into()),
            }
        }

        Err(CheckoutError::OrderNumberExhausted {
            attempts: MAX_ORDER_NUMBER_ATTEMPTS,
        })
    }

    /// Create one market's order: header, snapshotted items, reservations
    /// and totals.
    async fn place_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: UserUuid,
        market: MarketUuid,
        lines: &[(&Product, i32)],
        checkout: &ValidatedCheckout,
        now: Timestamp,
    ) -> Result<Order, CheckoutError> {
        let uuid = OrderUuid::new();

        self.insert_order(tx, uuid, buyer, market, checkout, now).await?;

        let mut items = Vec::with_capacity(lines.len());

        for (position, &(product, quantity)) in (0_i32..).zip(lines) {
            let item = self
                .items
                .insert_item(
                    tx,
                    &NewOrderItemRow {
                        uuid: OrderItemUuid::new(),
                        order: uuid,
                        product,
                        quantity,
                        total: line_total(quantity, product.price),
                        position,
                    },
                    now,
                )
                .await?;

            self.stock.reserve(tx, product.uuid, quantity, now).await?;

            items.push(item);
        }

        let totals = OrderTotals::calculate(
            items.iter().map(|item| item.total),
            self.policy.tax_rate,
            self.policy.flat_shipping,
        );

        self.orders.update_totals(tx, uuid, &totals, now).await?;

        let mut order = self.orders.get_order(tx, uuid).await?;

        order.items = items;

        Ok(order)
    }

    /// Book the pending purchase and sale entries for freshly placed orders.
    /// Failures are logged; the orders stand regardless.
    async fn record_ledger_entries(&self, orders: &[Order]) {
        for order in orders {
            if let Err(error) = self.record_order_entries(order).await {
                warn!(order_uuid = %order.uuid, %error, "could not record ledger entries");
            }
        }
    }

    async fn record_order_entries(&self, order: &Order) -> Result<(), sqlx::Error> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;

        let entries = [
            (
                order.buyer_uuid,
                TransactionType::Purchase,
                format!("Purchase of order {}", order.order_number),
            ),
            (
                order.market_owner_uuid,
                TransactionType::Sale,
                format!("Sale of order {}", order.order_number),
            ),
        ];

        for (user, transaction_type, description) in &entries {
            self.transactions
                .insert_transaction(
                    &mut tx,
                    &NewTransactionRow {
                        uuid: TransactionUuid::new(),
                        user: *user,
                        market: Some(order.market_uuid),
                        order: Some(order.uuid),
                        transaction_type: *transaction_type,
                        amount: order.total_amount,
                        currency: self.policy.currency,
                        transaction_hash: None,
                        blockchain_signature: None,
                        from_wallet: None,
                        to_wallet: None,
                        description: Some(description.as_str()),
                        processed_at: None,
                    },
                    now,
                )
                .await?;
        }

        tx.commit().await
    }
}

fn is_order_number_collision(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|error| error.constraint())
        .is_some_and(|constraint| constraint == ORDER_NUMBER_CONSTRAINT)
}

/// Cart lines grouped by market, markets in order of first appearance.
fn group_by_market(lines: &[CheckoutLine]) -> Vec<(MarketUuid, Vec<(&Product, i32)>)> {
    let mut positions: FxHashMap<MarketUuid, usize> = FxHashMap::default();
    let mut groups: Vec<(MarketUuid, Vec<(&Product, i32)>)> = Vec::new();

    for line in lines {
        let market = line.product.market_uuid;

        let position = *positions.entry(market).or_insert_with(|| {
            groups.push((market, Vec::new()));
            groups.len() - 1
        });

        groups[position].1.push((&line.product, line.quantity));
    }

    groups
}

/// Reject the cart before anything is written.
fn preflight(lines: &[CheckoutLine]) -> Result<(), CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    for line in lines {
        check_line(&line.product, line.quantity)?;
    }

    Ok(())
}

/// Read-time availability; `reserve` stays the authoritative check.
fn check_line(product: &Product, quantity: i32) -> Result<(), CheckoutError> {
    if !product.is_active {
        return Err(CheckoutError::ProductUnavailable(product.uuid));
    }

    if product.stock_quantity < quantity {
        return Err(CheckoutError::InsufficientStock {
            product: product.uuid,
            requested: quantity,
            available: product.stock_quantity,
        });
    }

    Ok(())
}

#[async_trait]
impl CheckoutService for PgCheckoutService {
    #[tracing::instrument(
        name = "checkout.service.checkout",
        skip(self, input),
        fields(
            buyer_uuid = %buyer,
            line_count = tracing::field::Empty,
            order_count = tracing::field::Empty
        ),
        err
    )]
    async fn checkout(
        &self,
        buyer: UserUuid,
        input: CheckoutInput,
    ) -> Result<Vec<Order>, CheckoutError> {
        let checkout = input.validate()?;

        let now = self.clock.now();
        let mut tx = self.db.begin().await?;

        let lines = self.carts.lock_checkout_lines(&mut tx, buyer).await?;

        let span = Span::current();

        span.record("line_count", lines.len());

        preflight(&lines)?;

        let mut orders = Vec::new();

        for (market, group) in group_by_market(&lines) {
            let order = self
                .place_order(&mut tx, buyer, market, &group, &checkout, now)
                .await?;

            orders.push(order);
        }

        let cart_items: Vec<_> = lines.iter().map(|line| line.cart_item_uuid).collect();

        self.carts.delete_items(&mut tx, buyer, &cart_items).await?;

        tx.commit().await?;

        span.record("order_count", orders.len());

        info!(
            buyer_uuid = %buyer,
            orders = orders.len(),
            "checked out cart"
        );

        self.record_ledger_entries(&orders).await;

        Ok(orders)
    }

    #[tracing::instrument(
        name = "checkout.service.create_order",
        skip(self, input),
        fields(
            buyer_uuid = %buyer,
            market_uuid = %input.market_uuid,
            order_uuid = tracing::field::Empty
        ),
        err
    )]
    async fn create_order(
        &self,
        buyer: UserUuid,
        input: NewOrderInput,
    ) -> Result<Order, CheckoutError> {
        let order = input.validate()?;
        let market = order.market_uuid;

        let now = self.clock.now();
        let mut tx = self.db.begin().await?;

        let mut products = Vec::with_capacity(order.lines.len());

        for &(uuid, quantity) in &order.lines {
            let product = self
                .products
                .get_orderable_product(&mut tx, uuid)
                .await?
                .ok_or(CheckoutError::ProductUnavailable(uuid))?;

            if product.market_uuid != market {
                return Err(CheckoutError::ProductOutsideMarket {
                    product: uuid,
                    market,
                });
            }

            check_line(&product, quantity)?;

            products.push((product, quantity));
        }

        let lines: Vec<(&Product, i32)> = products
            .iter()
            .map(|(product, quantity)| (product, *quantity))
            .collect();

        let placed = self
            .place_order(&mut tx, buyer, market, &lines, &order.delivery, now)
            .await?;

        tx.commit().await?;

        Span::current().record("order_uuid", tracing::field::display(placed.uuid));

        info!(order_uuid = %placed.uuid, "placed direct order");

        self.record_ledger_entries(slice::from_ref(&placed)).await;

        Ok(placed)
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Turn the buyer's cart into one pending order per market.
    ///
    /// All or nothing: on error no order exists, no stock moved and the
    /// cart is untouched.
    async fn checkout(
        &self,
        buyer: UserUuid,
        input: CheckoutInput,
    ) -> Result<Vec<Order>, CheckoutError>;

    /// Place one pending order with a single market from explicit lines,
    /// leaving the cart alone. Every product must belong to that market.
    async fn create_order(
        &self,
        buyer: UserUuid,
        input: NewOrderInput,
    ) -> Result<Order, CheckoutError>;
}
