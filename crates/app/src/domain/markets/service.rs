//! Markets service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

use crate::{
    clock::Clock,
    database::Db,
    domain::markets::{
        errors::MarketsServiceError,
        models::{Market, MarketUuid, NewMarket},
        repository::PgMarketsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgMarketsService {
    db: Db,
    clock: Arc<dyn Clock>,
    repository: PgMarketsRepository,
}

impl PgMarketsService {
    #[must_use]
    pub fn new(db: Db, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            clock,
            repository: PgMarketsRepository::new(),
        }
    }
}

#[async_trait]
impl MarketsService for PgMarketsService {
    async fn create_market(&self, market: NewMarket) -> Result<Market, MarketsServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self
            .repository
            .create_market(&mut tx, market, self.clock.now())
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_market(&self, market: MarketUuid) -> Result<Market, MarketsServiceError> {
        let mut tx = self.db.begin().await?;

        let market = self.repository.get_market(&mut tx, market).await?;

        tx.commit().await?;

        Ok(market)
    }
}

#[automock]
#[async_trait]
pub trait MarketsService: Send + Sync {
    /// Open a market owned by an existing user.
    async fn create_market(&self, market: NewMarket) -> Result<Market, MarketsServiceError>;

    /// Retrieve a single market.
    async fn get_market(&self, market: MarketUuid) -> Result<Market, MarketsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{domain::users::models::UserUuid, test::TestContext};

    use super::*;

    #[tokio::test]
    async fn create_market_is_active_by_default() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = ctx.create_user("Owner").await;
        let uuid = MarketUuid::new();

        ctx.markets
            .create_market(NewMarket {
                uuid,
                owner_uuid: owner,
                name: "Corner Shop".to_string(),
                wallet_address: None,
            })
            .await?;

        let market = ctx.markets.get_market(uuid).await?;

        assert_eq!(market.owner_uuid, owner);
        assert!(market.is_active);

        Ok(())
    }

    #[tokio::test]
    async fn create_market_for_unknown_owner_returns_invalid_reference() {
        let ctx = TestContext::new().await;

        let result = ctx
            .markets
            .create_market(NewMarket {
                uuid: MarketUuid::new(),
                owner_uuid: UserUuid::new(),
                name: "Ghost Shop".to_string(),
                wallet_address: None,
            })
            .await;

        assert!(
            matches!(result, Err(MarketsServiceError::InvalidReference)),
            "expected InvalidReference, got {result:?}"
        );
    }
}
