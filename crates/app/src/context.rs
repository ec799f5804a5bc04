//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    auth::{AuthService, PgAuthService},
    chain::{ChainClient, ChainConfig, ChainError, HttpChainClient},
    clock::{Clock, SystemClock},
    database::{self, Db},
    domain::{
        carts::{CartsService, PgCartsService},
        checkout::{CheckoutService, PgCheckoutService, models::CheckoutPolicy},
        markets::{MarketsService, PgMarketsService},
        orders::{OrdersService, PgOrdersService},
        products::{PgProductsService, ProductsService},
        transactions::{PgTransactionsService, TransactionsService, signature::WebhookSecret},
        users::{PgUsersService, UsersService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply migrations")]
    Migrate(#[source] sqlx::migrate::MigrateError),

    #[error("failed to build chain client")]
    Chain(#[source] ChainError),
}

#[derive(Clone)]
pub struct AppContext {
    pub users: Arc<dyn UsersService>,
    pub markets: Arc<dyn MarketsService>,
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub checkout: Arc<dyn CheckoutService>,
    pub transactions: Arc<dyn TransactionsService>,
    pub auth: Arc<dyn AuthService>,
}

impl AppContext {
    /// Build application context from a database URL, applying any pending
    /// migrations first.
    ///
    /// # Errors
    ///
    /// Returns an error when connecting, migrating, or building the chain
    /// client fails.
    pub async fn from_database_url(
        url: &str,
        chain: &ChainConfig,
        webhook_secret: WebhookSecret,
        policy: CheckoutPolicy,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        database::migrate(&pool)
            .await
            .map_err(AppInitError::Migrate)?;

        let chain = HttpChainClient::new(chain).map_err(AppInitError::Chain)?;

        Ok(Self::new(
            Db::new(pool),
            Arc::new(SystemClock),
            Arc::new(chain),
            webhook_secret,
            policy,
        ))
    }

    /// Wire every service onto one database handle.
    #[must_use]
    pub fn new(
        db: Db,
        clock: Arc<dyn Clock>,
        chain: Arc<dyn ChainClient>,
        webhook_secret: WebhookSecret,
        policy: CheckoutPolicy,
    ) -> Self {
        Self {
            users: Arc::new(PgUsersService::new(db.clone(), Arc::clone(&clock))),
            markets: Arc::new(PgMarketsService::new(db.clone(), Arc::clone(&clock))),
            products: Arc::new(PgProductsService::new(db.clone(), Arc::clone(&clock))),
            carts: Arc::new(PgCartsService::new(db.clone(), Arc::clone(&clock))),
            orders: Arc::new(PgOrdersService::new(
                db.clone(),
                Arc::clone(&clock),
                policy.currency,
            )),
            checkout: Arc::new(PgCheckoutService::new(
                db.clone(),
                Arc::clone(&clock),
                policy,
            )),
            transactions: Arc::new(PgTransactionsService::new(
                db.clone(),
                Arc::clone(&clock),
                chain,
                webhook_secret,
            )),
            auth: Arc::new(PgAuthService::new(db, clock)),
        }
    }
}
