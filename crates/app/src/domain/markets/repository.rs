//! Markets Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::{
    markets::models::{Market, MarketUuid, NewMarket},
    users::models::UserUuid,
};

const CREATE_MARKET_SQL: &str = include_str!("sql/create_market.sql");
const GET_MARKET_SQL: &str = include_str!("sql/get_market.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgMarketsRepository;

impl PgMarketsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_market(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        market: NewMarket,
        now: Timestamp,
    ) -> Result<Market, sqlx::Error> {
        query_as::<Postgres, Market>(CREATE_MARKET_SQL)
            .bind(market.uuid.into_uuid())
            .bind(market.owner_uuid.into_uuid())
            .bind(market.name)
            .bind(market.wallet_address)
            .bind(SqlxTimestamp::from(now))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_market(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        market: MarketUuid,
    ) -> Result<Market, sqlx::Error> {
        query_as::<Postgres, Market>(GET_MARKET_SQL)
            .bind(market.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for Market {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: MarketUuid::from_uuid(row.try_get("uuid")?),
            owner_uuid: UserUuid::from_uuid(row.try_get("owner_uuid")?),
            name: row.try_get("name")?,
            wallet_address: row.try_get("wallet_address")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
