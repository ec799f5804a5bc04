//! Products service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

use crate::{
    clock::Clock,
    database::Db,
    domain::products::{
        errors::ProductsServiceError,
        models::{NewProduct, Product, ProductUuid},
        repository::PgProductsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgProductsService {
    db: Db,
    clock: Arc<dyn Clock>,
    repository: PgProductsRepository,
}

impl PgProductsService {
    #[must_use]
    pub fn new(db: Db, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            clock,
            repository: PgProductsRepository::new(),
        }
    }
}

#[async_trait]
impl ProductsService for PgProductsService {
    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let product = self.repository.get_product(&mut tx, product).await?;

        tx.commit().await?;

        Ok(product)
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self
            .repository
            .create_product(&mut tx, product, self.clock.now())
            .await?;

        tx.commit().await?;

        Ok(created)
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Retrieve a single product.
    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError>;

    /// Creates a new product with the given details.
    async fn create_product(&self, product: NewProduct) -> Result<Product, ProductsServiceError>;
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{domain::markets::models::MarketUuid, test::TestContext};

    use super::*;

    fn new_product(market: MarketUuid, stock_quantity: i32) -> NewProduct {
        NewProduct {
            uuid: ProductUuid::new(),
            market_uuid: market,
            name: "Lamp".to_string(),
            description: "A desk lamp".to_string(),
            image_url: None,
            price: Decimal::new(20_00, 2),
            stock_quantity,
        }
    }

    #[tokio::test]
    async fn create_product_returns_persisted_price_and_stock() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = ctx.create_user("Owner").await;
        let market = ctx.create_market(owner).await;

        let created = ctx.products.create_product(new_product(market, 5)).await?;
        let fetched = ctx.products.get_product(created.uuid).await?;

        assert_eq!(fetched.price, Decimal::new(20_00, 2));
        assert_eq!(fetched.stock_quantity, 5);
        assert_eq!(fetched.market_uuid, market);
        assert!(fetched.is_active);

        Ok(())
    }

    #[tokio::test]
    async fn negative_stock_is_rejected_by_storage() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = ctx.create_user("Owner").await;
        let market = ctx.create_market(owner).await;

        let result = ctx.products.create_product(new_product(market, -1)).await;

        assert!(
            matches!(result, Err(ProductsServiceError::NegativeStock)),
            "expected NegativeStock, got {result:?}"
        );

        let mut discounted = new_product(market, 1);
        discounted.price = Decimal::new(-1, 2);

        let result = ctx.products.create_product(discounted).await;

        assert!(
            matches!(result, Err(ProductsServiceError::NegativePrice)),
            "expected NegativePrice, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn product_for_unknown_market_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;

        let result = ctx
            .products
            .create_product(new_product(MarketUuid::new(), 1))
            .await;

        assert!(
            matches!(result, Err(ProductsServiceError::UnknownMarket)),
            "expected UnknownMarket, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn reused_uuid_already_exists() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = ctx.create_user("Owner").await;
        let market = ctx.create_market(owner).await;

        let product = new_product(market, 1);

        ctx.products.create_product(product.clone()).await?;

        let result = ctx.products.create_product(product).await;

        assert!(
            matches!(result, Err(ProductsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.products.get_product(ProductUuid::new()).await;

        assert!(
            matches!(result, Err(ProductsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }
}
