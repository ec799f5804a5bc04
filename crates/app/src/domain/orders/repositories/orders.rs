//! Orders Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{
    FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar,
    types::Json,
};

use crate::{
    database::decode_column,
    domain::{
        markets::models::MarketUuid,
        orders::{
            models::{Metadata, Order, OrderScope, OrderUuid, ShippingAddress},
            status::{OrderStatus, PaymentStatus},
            totals::OrderTotals,
        },
        pagination::Pagination,
        users::models::UserUuid,
    },
};

const GET_ORDER_SQL: &str = include_str!("../sql/get_order.sql");
const LOCK_ORDER_SQL: &str = include_str!("../sql/lock_order.sql");
const LIST_BUYER_ORDERS_SQL: &str = include_str!("../sql/list_buyer_orders.sql");
const LIST_MARKET_ORDERS_SQL: &str = include_str!("../sql/list_market_orders.sql");
const COUNT_BUYER_ORDERS_SQL: &str = include_str!("../sql/count_buyer_orders.sql");
const COUNT_MARKET_ORDERS_SQL: &str = include_str!("../sql/count_market_orders.sql");
const INSERT_ORDER_SQL: &str = include_str!("../sql/insert_order.sql");
const UPDATE_ORDER_TOTALS_SQL: &str = include_str!("../sql/update_order_totals.sql");
const APPLY_ORDER_TRANSITION_SQL: &str = include_str!("../sql/apply_order_transition.sql");
const UPDATE_PAYMENT_STATUS_SQL: &str = include_str!("../sql/update_payment_status.sql");

/// Unique constraint guarding order numbers.
pub(crate) const ORDER_NUMBER_CONSTRAINT: &str = "orders_order_number_key";

/// Columns written when an order is first inserted.
#[derive(Debug)]
pub(crate) struct NewOrderRow<'a> {
    pub uuid: OrderUuid,
    pub buyer: UserUuid,
    pub market: MarketUuid,
    pub order_number: &'a str,
    pub shipping_address: &'a ShippingAddress,
    pub shipping_method: Option<&'a str>,
    pub notes: Option<&'a str>,
}

/// Everything a status transition may write.
#[derive(Debug, Default)]
pub(crate) struct OrderChange {
    pub delivered_at: Option<Timestamp>,
    pub metadata: Metadata,
    pub rating: Option<i16>,
    pub review: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn insert_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &NewOrderRow<'_>,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        query(INSERT_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.buyer.into_uuid())
            .bind(order.market.into_uuid())
            .bind(order.order_number)
            .bind(&order.shipping_address.street)
            .bind(&order.shipping_address.city)
            .bind(&order.shipping_address.postal_code)
            .bind(&order.shipping_address.country)
            .bind(order.shipping_method)
            .bind(order.notes)
            .bind(SqlxTimestamp::from(now))
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Order, sqlx::Error> {
        query_as::<Postgres, Order>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Read the order holding a row lock until the transaction ends.
    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Order, sqlx::Error> {
        query_as::<Postgres, Order>(LOCK_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        scope: OrderScope,
        actor: UserUuid,
        status: Option<OrderStatus>,
        pagination: Pagination,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let sql = match scope {
            OrderScope::Buying => LIST_BUYER_ORDERS_SQL,
            OrderScope::Selling => LIST_MARKET_ORDERS_SQL,
        };

        query_as::<Postgres, Order>(sql)
            .bind(actor.into_uuid())
            .bind(status.map(OrderStatus::as_str))
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn count_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        scope: OrderScope,
        actor: UserUuid,
        status: Option<OrderStatus>,
    ) -> Result<u64, sqlx::Error> {
        let sql = match scope {
            OrderScope::Buying => COUNT_BUYER_ORDERS_SQL,
            OrderScope::Selling => COUNT_MARKET_ORDERS_SQL,
        };

        let count: i64 = query_scalar(sql)
            .bind(actor.into_uuid())
            .bind(status.map(OrderStatus::as_str))
            .fetch_one(&mut **tx)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    pub(crate) async fn update_totals(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        totals: &OrderTotals,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_ORDER_TOTALS_SQL)
            .bind(order.into_uuid())
            .bind(totals.subtotal)
            .bind(totals.tax_amount)
            .bind(totals.shipping_amount)
            .bind(totals.total_amount)
            .bind(SqlxTimestamp::from(now))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Move the order from `observed` to `status`. Zero rows affected means
    /// the order was no longer in `observed`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn apply_transition(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        observed: OrderStatus,
        status: OrderStatus,
        payment_status: PaymentStatus,
        change: OrderChange,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(APPLY_ORDER_TRANSITION_SQL)
            .bind(order.into_uuid())
            .bind(observed.as_str())
            .bind(status.as_str())
            .bind(payment_status.as_str())
            .bind(change.delivered_at.map(SqlxTimestamp::from))
            .bind(Json(change.metadata))
            .bind(change.rating)
            .bind(change.review)
            .bind(SqlxTimestamp::from(now))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn update_payment_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        from: PaymentStatus,
        to: PaymentStatus,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_PAYMENT_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(SqlxTimestamp::from(now))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for Order {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: OrderStatus =
            decode_column("status", row.try_get::<String, _>("status")?.parse())?;
        let payment_status: PaymentStatus = decode_column(
            "payment_status",
            row.try_get::<String, _>("payment_status")?.parse(),
        )?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            buyer_uuid: UserUuid::from_uuid(row.try_get("buyer_uuid")?),
            market_uuid: MarketUuid::from_uuid(row.try_get("market_uuid")?),
            market_owner_uuid: UserUuid::from_uuid(row.try_get("market_owner_uuid")?),
            order_number: row.try_get("order_number")?,
            status,
            payment_status,
            subtotal: row.try_get("subtotal")?,
            tax_amount: row.try_get("tax_amount")?,
            shipping_amount: row.try_get("shipping_amount")?,
            total_amount: row.try_get("total_amount")?,
            shipping_address: ShippingAddress {
                street: row.try_get("shipping_street")?,
                city: row.try_get("shipping_city")?,
                postal_code: row.try_get("shipping_postal_code")?,
                country: row.try_get("shipping_country")?,
            },
            shipping_method: row.try_get("shipping_method")?,
            notes: row.try_get("notes")?,
            metadata: row.try_get::<Json<Metadata>, _>("metadata")?.0,
            rating: row.try_get("rating")?,
            review: row.try_get("review")?,
            delivered_at: row
                .try_get::<Option<SqlxTimestamp>, _>("delivered_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            items: Vec::new(),
        })
    }
}
