//! Test context for service-level integration tests.

use std::sync::Arc;

use jiff::Timestamp;

use crate::{
    auth::PgAuthService,
    chain::{ChainClient, MockChainClient},
    clock::{Clock, FixedClock},
    database::Db,
    domain::{
        carts::PgCartsService,
        checkout::{PgCheckoutService, models::CheckoutPolicy},
        markets::PgMarketsService,
        orders::{PgOrdersService, number::OrderNumberSource},
        products::PgProductsService,
        transactions::{PgTransactionsService, signature::WebhookSecret},
        users::PgUsersService,
    },
};

use super::db::TestDb;

/// 2026-01-01T00:00:00Z. Whole seconds, so values survive a round trip
/// through `timestamptz` unchanged.
const FROZEN_AT: i64 = 1_767_225_600;

pub struct TestContext {
    pub db: TestDb,
    pub clock: Arc<dyn Clock>,
    pub now: Timestamp,
    pub users: PgUsersService,
    pub markets: PgMarketsService,
    pub products: PgProductsService,
    pub carts: PgCartsService,
    pub orders: PgOrdersService,
    pub checkout: PgCheckoutService,
    pub transactions: PgTransactionsService,
    pub auth: PgAuthService,
    pub webhook_secret: WebhookSecret,
}

impl TestContext {
    pub async fn new() -> Self {
        let test_db = TestDb::new().await;
        let db = Db::new(test_db.pool().clone());

        let now = Timestamp::from_second(FROZEN_AT).expect("valid fixed timestamp");
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now));
        let policy = CheckoutPolicy::default();
        let webhook_secret = WebhookSecret::new("test-webhook-secret");

        Self {
            users: PgUsersService::new(db.clone(), Arc::clone(&clock)),
            markets: PgMarketsService::new(db.clone(), Arc::clone(&clock)),
            products: PgProductsService::new(db.clone(), Arc::clone(&clock)),
            carts: PgCartsService::new(db.clone(), Arc::clone(&clock)),
            orders: PgOrdersService::new(db.clone(), Arc::clone(&clock), policy.currency),
            checkout: PgCheckoutService::new(db.clone(), Arc::clone(&clock), policy),
            transactions: PgTransactionsService::new(
                db.clone(),
                Arc::clone(&clock),
                Arc::new(unseen_chain()),
                webhook_secret.clone(),
            ),
            auth: PgAuthService::new(db, Arc::clone(&clock)),
            webhook_secret,
            clock,
            now,
            db: test_db,
        }
    }

    /// A transactions service talking to the given chain double.
    pub fn transactions_with_chain(&self, chain: MockChainClient) -> PgTransactionsService {
        let chain: Arc<dyn ChainClient> = Arc::new(chain);

        PgTransactionsService::new(
            Db::new(self.db.pool().clone()),
            Arc::clone(&self.clock),
            chain,
            self.webhook_secret.clone(),
        )
    }

    /// A checkout service drawing order numbers from `numbers`.
    pub fn checkout_with_numbers(&self, numbers: Arc<dyn OrderNumberSource>) -> PgCheckoutService {
        PgCheckoutService::with_order_numbers(
            Db::new(self.db.pool().clone()),
            Arc::clone(&self.clock),
            CheckoutPolicy::default(),
            numbers,
        )
    }
}

/// The chain service has never heard of any signature.
fn unseen_chain() -> MockChainClient {
    let mut chain = MockChainClient::new();

    chain.expect_signature_status().returning(|_| Ok(None));

    chain
}
