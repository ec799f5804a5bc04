//! Stock Ledger Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{Postgres, Transaction, query_scalar};

use crate::domain::{products::models::ProductUuid, stock::errors::StockError};

const RESERVE_STOCK_SQL: &str = include_str!("sql/reserve_stock.sql");
const RELEASE_STOCK_SQL: &str = include_str!("sql/release_stock.sql");
const GET_STOCK_SQL: &str = include_str!("sql/get_stock.sql");

#[derive(Debug, Clone, Default)]
pub struct StockLedger;

impl StockLedger {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Atomically take `quantity` units, returning the remaining stock.
    ///
    /// The decrement is a single guarded update, so concurrent reservations
    /// can never drive stock below zero.
    ///
    /// # Errors
    ///
    /// [`StockError::InsufficientStock`] when fewer than `quantity` units are
    /// available, [`StockError::NotFound`] for unknown or deleted products.
    pub async fn reserve(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: i32,
        now: Timestamp,
    ) -> Result<i32, StockError> {
        ensure_positive(quantity)?;

        let remaining = query_scalar::<Postgres, i32>(RESERVE_STOCK_SQL)
            .bind(product.into_uuid())
            .bind(quantity)
            .bind(SqlxTimestamp::from(now))
            .fetch_optional(&mut **tx)
            .await?;

        if let Some(remaining) = remaining {
            return Ok(remaining);
        }

        let available = self.available(tx, product).await?;

        Err(StockError::InsufficientStock {
            product,
            requested: quantity,
            available,
        })
    }

    /// Return `quantity` units to stock. Uncapped; only used to compensate
    /// a previous reservation.
    ///
    /// # Errors
    ///
    /// [`StockError::NotFound`] when the product row does not exist.
    pub async fn release(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: i32,
        now: Timestamp,
    ) -> Result<i32, StockError> {
        ensure_positive(quantity)?;

        query_scalar::<Postgres, i32>(RELEASE_STOCK_SQL)
            .bind(product.into_uuid())
            .bind(quantity)
            .bind(SqlxTimestamp::from(now))
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(StockError::NotFound(product))
    }

    /// Current available quantity.
    ///
    /// # Errors
    ///
    /// [`StockError::NotFound`] for unknown or deleted products.
    pub async fn available(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<i32, StockError> {
        query_scalar::<Postgres, i32>(GET_STOCK_SQL)
            .bind(product.into_uuid())
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(StockError::NotFound(product))
    }
}

fn ensure_positive(quantity: i32) -> Result<(), StockError> {
    if quantity <= 0 {
        return Err(StockError::InvalidQuantity(quantity));
    }

    Ok(())
}
