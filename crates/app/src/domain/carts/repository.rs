//! Cart Items Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::domain::{
    carts::models::{CartItem, CartItemUuid, CheckoutLine},
    markets::models::MarketUuid,
    products::models::{Product, ProductUuid},
    users::models::UserUuid,
};

const LIST_CART_ITEMS_SQL: &str = include_str!("sql/list_cart_items.sql");
const GET_CART_ITEM_SQL: &str = include_str!("sql/get_cart_item.sql");
const UPSERT_CART_ITEM_SQL: &str = include_str!("sql/upsert_cart_item.sql");
const UPDATE_CART_ITEM_QUANTITY_SQL: &str = include_str!("sql/update_cart_item_quantity.sql");
const DELETE_CART_ITEM_SQL: &str = include_str!("sql/delete_cart_item.sql");
const CLEAR_CART_SQL: &str = include_str!("sql/clear_cart.sql");
const LOCK_CHECKOUT_LINES_SQL: &str = include_str!("sql/lock_checkout_lines.sql");
const DELETE_CART_ITEMS_SQL: &str = include_str!("sql/delete_cart_items.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartItemsRepository;

impl PgCartItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: UserUuid,
    ) -> Result<Vec<CartItem>, sqlx::Error> {
        query_as::<Postgres, CartItem>(LIST_CART_ITEMS_SQL)
            .bind(buyer.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    /// Returns the owning buyer alongside the item.
    pub(crate) async fn get_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: CartItemUuid,
    ) -> Result<(UserUuid, CartItem), sqlx::Error> {
        let row = query(GET_CART_ITEM_SQL)
            .bind(item.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        let buyer = UserUuid::from_uuid(row.try_get("buyer_uuid")?);

        Ok((buyer, CartItem::from_row(&row)?))
    }

    /// Insert the line, or add `quantity` to the buyer's existing line for
    /// the same product. Returns the uuid of the affected row.
    pub(crate) async fn upsert_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: UserUuid,
        item: CartItemUuid,
        product: ProductUuid,
        quantity: i32,
        now: Timestamp,
    ) -> Result<CartItemUuid, sqlx::Error> {
        let uuid: Uuid = query_scalar(UPSERT_CART_ITEM_SQL)
            .bind(item.into_uuid())
            .bind(buyer.into_uuid())
            .bind(product.into_uuid())
            .bind(quantity)
            .bind(SqlxTimestamp::from(now))
            .fetch_one(&mut **tx)
            .await?;

        Ok(CartItemUuid::from_uuid(uuid))
    }

    /// Replace the line's quantity outright.
    pub(crate) async fn set_quantity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: UserUuid,
        item: CartItemUuid,
        quantity: i32,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_CART_ITEM_QUANTITY_SQL)
            .bind(item.into_uuid())
            .bind(buyer.into_uuid())
            .bind(quantity)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn delete_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: UserUuid,
        item: CartItemUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_ITEM_SQL)
            .bind(item.into_uuid())
            .bind(buyer.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn clear(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: UserUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(CLEAR_CART_SQL)
            .bind(buyer.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Read and row-lock the buyer's cart in insertion order.
    pub(crate) async fn lock_checkout_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: UserUuid,
    ) -> Result<Vec<CheckoutLine>, sqlx::Error> {
        query_as::<Postgres, CheckoutLine>(LOCK_CHECKOUT_LINES_SQL)
            .bind(buyer.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    /// Delete exactly the given cart rows.
    pub(crate) async fn delete_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        buyer: UserUuid,
        items: &[CartItemUuid],
    ) -> Result<u64, sqlx::Error> {
        let uuids: Vec<Uuid> = items.iter().map(|item| item.into_uuid()).collect();

        let rows_affected = query(DELETE_CART_ITEMS_SQL)
            .bind(buyer.into_uuid())
            .bind(uuids)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for CartItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CartItemUuid::from_uuid(row.try_get("uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            market_uuid: MarketUuid::from_uuid(row.try_get("market_uuid")?),
            product_name: row.try_get("product_name")?,
            unit_price: row.try_get("unit_price")?,
            quantity: row.try_get("quantity")?,
            added_at: row.try_get::<SqlxTimestamp, _>("added_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CheckoutLine {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            cart_item_uuid: CartItemUuid::from_uuid(row.try_get("cart_item_uuid")?),
            quantity: row.try_get("cart_quantity")?,
            product: Product::from_row(row)?,
        })
    }
}
