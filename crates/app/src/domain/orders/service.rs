//! Orders Service

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use sqlx::{Postgres, Transaction};
use tracing::{Span, info};

use crate::{
    clock::Clock,
    database::Db,
    domain::{
        orders::{
            errors::OrdersServiceError,
            models::{
                Metadata, Order, OrderItem, OrderListQuery, OrderScope, OrderUuid, RateOrder,
                ShipOrder,
            },
            repositories::{OrderChange, PgOrderItemsRepository, PgOrdersRepository},
            status::{OrderAction, OrderStatus, Party},
        },
        pagination::{Page, Pagination},
        stock::StockLedger,
        transactions::{
            models::{Currency, TransactionType, TransactionUuid},
            repository::{NewTransactionRow, PgTransactionsRepository},
        },
        users::models::UserUuid,
    },
    validation::{FieldError, MAX_TEXT_CHARS, ValidationErrors, one_of, optional_text},
};

/// Longest review a buyer may leave.
pub const MAX_REVIEW_CHARS: usize = 1000;

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    clock: Arc<dyn Clock>,
    currency: Currency,
    orders: PgOrdersRepository,
    items: PgOrderItemsRepository,
    stock: StockLedger,
    transactions: PgTransactionsRepository,
}

impl PgOrdersService {
    /// `currency` is what refund ledger entries are booked in.
    #[must_use]
    pub fn new(db: Db, clock: Arc<dyn Clock>, currency: Currency) -> Self {
        Self {
            db,
            clock,
            currency,
            orders: PgOrdersRepository::new(),
            items: PgOrderItemsRepository::new(),
            stock: StockLedger::new(),
            transactions: PgTransactionsRepository::new(),
        }
    }

    /// Lock the order, check the actor and the state machine, then write the
    /// transition with its side effects.
    async fn transition(
        &self,
        actor: UserUuid,
        order: OrderUuid,
        action: OrderAction,
        change: OrderChange,
        now: Timestamp,
    ) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let locked = self.orders.lock_order(&mut tx, order).await?;

        let party = Party {
            buyer: locked.buyer_uuid == actor,
            market_owner: locked.market_owner_uuid == actor,
        };

        if !action.permits(party) {
            return Err(OrdersServiceError::Unauthorized);
        }

        let transition = action.apply(locked.state()).map_err(|rejected| {
            OrdersServiceError::InvalidStateTransition {
                order,
                current: rejected.current,
                action: rejected.action,
            }
        })?;

        if transition.releases_stock {
            for item in self.items.list_items(&mut tx, &[order]).await? {
                self.stock
                    .release(&mut tx, item.product_uuid, item.quantity, now)
                    .await?;
            }
        }

        let rows_affected = self
            .orders
            .apply_transition(
                &mut tx,
                order,
                locked.status,
                transition.status,
                transition.payment_status,
                change,
                now,
            )
            .await?;

        if rows_affected == 0 {
            return Err(OrdersServiceError::InvalidStateTransition {
                order,
                current: locked.status,
                action,
            });
        }

        if action == OrderAction::Refund {
            let description = format!("Refund for order {}", locked.order_number);

            self.transactions
                .insert_transaction(
                    &mut tx,
                    &NewTransactionRow {
                        uuid: TransactionUuid::new(),
                        user: locked.buyer_uuid,
                        market: Some(locked.market_uuid),
                        order: Some(order),
                        transaction_type: TransactionType::Refund,
                        amount: locked.total_amount,
                        currency: self.currency,
                        transaction_hash: None,
                        blockchain_signature: None,
                        from_wallet: None,
                        to_wallet: None,
                        description: Some(&description),
                        processed_at: None,
                    },
                    now,
                )
                .await?;
        }

        let mut updated = self.orders.get_order(&mut tx, order).await?;

        updated.items = self.items.list_items(&mut tx, &[order]).await?;

        tx.commit().await?;

        info!(
            order_uuid = %order,
            from = %locked.status,
            to = %updated.status,
            released_stock = transition.releases_stock,
            "order {action}"
        );

        Ok(updated)
    }
}

/// Attach line items to each order with one query.
pub(crate) async fn attach_items(
    items: &PgOrderItemsRepository,
    tx: &mut Transaction<'_, Postgres>,
    orders: &mut [Order],
) -> Result<(), sqlx::Error> {
    let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();

    let mut by_order: FxHashMap<OrderUuid, Vec<OrderItem>> = FxHashMap::default();

    for item in items.list_items(tx, &uuids).await? {
        by_order.entry(item.order_uuid).or_default().push(item);
    }

    for order in orders {
        order.items = by_order.remove(&order.uuid).unwrap_or_default();
    }

    Ok(())
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.get_order",
        skip(self),
        fields(actor_uuid = %actor, order_uuid = %order),
        err
    )]
    async fn get_order(&self, actor: UserUuid, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let mut found = self.orders.get_order(&mut tx, order).await?;

        let party = Party {
            buyer: found.buyer_uuid == actor,
            market_owner: found.market_owner_uuid == actor,
        };

        if !party.is_participant() {
            return Err(OrdersServiceError::Unauthorized);
        }

        found.items = self.items.list_items(&mut tx, &[order]).await?;

        tx.commit().await?;

        Ok(found)
    }

    #[tracing::instrument(
        name = "orders.service.list_orders",
        skip(self, query),
        fields(actor_uuid = %actor, scope = ?scope, total = tracing::field::Empty),
        err
    )]
    async fn list_orders(
        &self,
        actor: UserUuid,
        scope: OrderScope,
        query: OrderListQuery,
    ) -> Result<Page<Order>, OrdersServiceError> {
        let mut errors = ValidationErrors::new();

        let statuses = OrderStatus::ALL.map(OrderStatus::as_str);

        let status: Option<OrderStatus> = errors.check(
            query
                .status
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| one_of("status", &raw, &statuses))
                .transpose(),
        );

        let pagination = errors.absorb(Pagination::from_query(query.page, query.per_page));

        errors.into_result()?;

        let mut tx = self.db.begin().await?;

        let mut orders = self
            .orders
            .list_orders(&mut tx, scope, actor, status, pagination)
            .await?;

        let total = self.orders.count_orders(&mut tx, scope, actor, status).await?;

        attach_items(&self.items, &mut tx, &mut orders).await?;

        tx.commit().await?;

        Span::current().record("total", total);

        Ok(Page::new(orders, total, pagination))
    }

    #[tracing::instrument(
        name = "orders.service.confirm",
        skip(self),
        fields(actor_uuid = %actor, order_uuid = %order),
        err
    )]
    async fn confirm(&self, actor: UserUuid, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        let now = self.clock.now();

        self.transition(actor, order, OrderAction::Confirm, OrderChange::default(), now)
            .await
    }

    #[tracing::instrument(
        name = "orders.service.process",
        skip(self),
        fields(actor_uuid = %actor, order_uuid = %order),
        err
    )]
    async fn process(&self, actor: UserUuid, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        let now = self.clock.now();

        self.transition(actor, order, OrderAction::Process, OrderChange::default(), now)
            .await
    }

    #[tracing::instrument(
        name = "orders.service.ship",
        skip(self, shipment),
        fields(actor_uuid = %actor, order_uuid = %order),
        err
    )]
    async fn ship(
        &self,
        actor: UserUuid,
        order: OrderUuid,
        shipment: ShipOrder,
    ) -> Result<Order, OrdersServiceError> {
        let tracking_number = optional_text(
            "tracking_number",
            shipment.tracking_number.as_deref(),
            MAX_TEXT_CHARS,
        )
        .map_err(ValidationErrors::from)?;

        let mut metadata = Metadata::new();

        if let Some(tracking_number) = tracking_number {
            metadata.insert("tracking_number".to_string(), Value::String(tracking_number));
        }

        let now = self.clock.now();

        self.transition(
            actor,
            order,
            OrderAction::Ship,
            OrderChange {
                metadata,
                ..OrderChange::default()
            },
            now,
        )
        .await
    }

    #[tracing::instrument(
        name = "orders.service.deliver",
        skip(self),
        fields(actor_uuid = %actor, order_uuid = %order),
        err
    )]
    async fn deliver(&self, actor: UserUuid, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        let now = self.clock.now();

        self.transition(
            actor,
            order,
            OrderAction::Deliver,
            OrderChange {
                delivered_at: Some(now),
                ..OrderChange::default()
            },
            now,
        )
        .await
    }

    #[tracing::instrument(
        name = "orders.service.complete",
        skip(self),
        fields(actor_uuid = %actor, order_uuid = %order),
        err
    )]
    async fn complete(&self, actor: UserUuid, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        let now = self.clock.now();

        self.transition(actor, order, OrderAction::Complete, OrderChange::default(), now)
            .await
    }

    #[tracing::instrument(
        name = "orders.service.cancel",
        skip(self),
        fields(actor_uuid = %actor, order_uuid = %order),
        err
    )]
    async fn cancel(&self, actor: UserUuid, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        let now = self.clock.now();

        self.transition(actor, order, OrderAction::Cancel, OrderChange::default(), now)
            .await
    }

    #[tracing::instrument(
        name = "orders.service.refund",
        skip(self),
        fields(actor_uuid = %actor, order_uuid = %order),
        err
    )]
    async fn refund(&self, actor: UserUuid, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        let now = self.clock.now();

        self.transition(actor, order, OrderAction::Refund, OrderChange::default(), now)
            .await
    }

    #[tracing::instrument(
        name = "orders.service.rate",
        skip(self, rating),
        fields(actor_uuid = %actor, order_uuid = %order),
        err
    )]
    async fn rate(
        &self,
        actor: UserUuid,
        order: OrderUuid,
        rating: RateOrder,
    ) -> Result<Order, OrdersServiceError> {
        let mut errors = ValidationErrors::new();

        let stars = errors.check(star_rating(rating.rating));
        let review = errors.check(optional_text(
            "review",
            rating.review.as_deref(),
            MAX_REVIEW_CHARS,
        ));

        errors.into_result()?;

        let now = self.clock.now();

        self.transition(
            actor,
            order,
            OrderAction::Rate,
            OrderChange {
                rating: Some(stars),
                review,
                ..OrderChange::default()
            },
            now,
        )
        .await
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// One order with its items, for its buyer or the market owner.
    async fn get_order(&self, actor: UserUuid, order: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// Orders the actor placed, or orders placed with markets they own.
    async fn list_orders(
        &self,
        actor: UserUuid,
        scope: OrderScope,
        query: OrderListQuery,
    ) -> Result<Page<Order>, OrdersServiceError>;

    async fn confirm(&self, actor: UserUuid, order: OrderUuid) -> Result<Order, OrdersServiceError>;

    async fn process(&self, actor: UserUuid, order: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// Mark shipped, keeping an optional tracking number in the metadata.
    async fn ship(
        &self,
        actor: UserUuid,
        order: OrderUuid,
        shipment: ShipOrder,
    ) -> Result<Order, OrdersServiceError>;

    async fn deliver(&self, actor: UserUuid, order: OrderUuid) -> Result<Order, OrdersServiceError>;

    async fn complete(&self, actor: UserUuid, order: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// Cancel and return every line's quantity to stock.
    async fn cancel(&self, actor: UserUuid, order: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// Refund a paid order and book a pending refund for the buyer.
    async fn refund(&self, actor: UserUuid, order: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// Leave the single rating a completed order accepts.
    async fn rate(
        &self,
        actor: UserUuid,
        order: OrderUuid,
        rating: RateOrder,
    ) -> Result<Order, OrdersServiceError>;
}

fn star_rating(raw: i64) -> Result<i16, FieldError> {
    i16::try_from(raw)
        .ok()
        .filter(|stars| (1..=5).contains(stars))
        .ok_or_else(|| FieldError::new("rating", "must be between 1 and 5"))
}
