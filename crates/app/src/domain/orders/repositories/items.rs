//! Order Items Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::domain::{
    orders::models::{OrderItem, OrderItemUuid, OrderUuid},
    products::models::{Product, ProductUuid},
};

const INSERT_ORDER_ITEM_SQL: &str = include_str!("../sql/insert_order_item.sql");
const LIST_ORDER_ITEMS_SQL: &str = include_str!("../sql/list_order_items.sql");

/// A line item plus the product it snapshots.
#[derive(Debug)]
pub(crate) struct NewOrderItemRow<'a> {
    pub uuid: OrderItemUuid,
    pub order: OrderUuid,
    pub product: &'a Product,
    pub quantity: i32,
    pub total: Decimal,
    pub position: i32,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderItemsRepository;

impl PgOrderItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn insert_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: &NewOrderItemRow<'_>,
        now: Timestamp,
    ) -> Result<OrderItem, sqlx::Error> {
        query_as::<Postgres, OrderItem>(INSERT_ORDER_ITEM_SQL)
            .bind(item.uuid.into_uuid())
            .bind(item.order.into_uuid())
            .bind(item.product.uuid.into_uuid())
            .bind(item.quantity)
            .bind(item.product.price)
            .bind(item.total)
            .bind(&item.product.name)
            .bind(&item.product.description)
            .bind(item.product.image_url.as_deref())
            .bind(item.position)
            .bind(SqlxTimestamp::from(now))
            .fetch_one(&mut **tx)
            .await
    }

    /// Items of all the given orders, in checkout order within each order.
    pub(crate) async fn list_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &[OrderUuid],
    ) -> Result<Vec<OrderItem>, sqlx::Error> {
        let uuids: Vec<Uuid> = orders.iter().map(|order| order.into_uuid()).collect();

        query_as::<Postgres, OrderItem>(LIST_ORDER_ITEMS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OrderItemUuid::from_uuid(row.try_get("uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get("unit_price")?,
            total: row.try_get("total")?,
            product_name: row.try_get("product_name")?,
            product_description: row.try_get("product_description")?,
            product_image: row.try_get("product_image")?,
        })
    }
}
