//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use rust_decimal::Decimal;
use salvo::{affix_state::inject, prelude::*};
use serde_json::Map;
use uuid::Uuid;

use bazaar_app::{
    auth::MockAuthService,
    context::AppContext,
    domain::{
        carts::{
            MockCartsService,
            models::{CartItem, CartItemUuid},
        },
        checkout::MockCheckoutService,
        markets::{MockMarketsService, models::MarketUuid},
        orders::{
            MockOrdersService,
            models::{Order, OrderItem, OrderItemUuid, OrderUuid, ShippingAddress},
            status::{OrderStatus, PaymentStatus},
        },
        products::{MockProductsService, models::ProductUuid},
        transactions::{
            MockTransactionsService,
            models::{Currency, Transaction, TransactionType, TransactionUuid},
            status::TransactionStatus,
        },
        users::{MockUsersService, models::UserUuid},
    },
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_USER_UUID: UserUuid = UserUuid::from_uuid(Uuid::nil());

pub(crate) const TEST_SELLER_UUID: UserUuid = UserUuid::from_uuid(Uuid::max());

#[salvo::handler]
pub(crate) async fn inject_user(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_user_uuid(TEST_USER_UUID);
    ctrl.call_next(req, depot, res).await;
}

fn strict_users_mock() -> MockUsersService {
    let mut users = MockUsersService::new();

    users.expect_create_user().never();
    users.expect_get_user().never();

    users
}

fn strict_markets_mock() -> MockMarketsService {
    let mut markets = MockMarketsService::new();

    markets.expect_create_market().never();
    markets.expect_get_market().never();

    markets
}

fn strict_products_mock() -> MockProductsService {
    let mut products = MockProductsService::new();

    products.expect_get_product().never();
    products.expect_create_product().never();

    products
}

fn strict_auth_mock() -> MockAuthService {
    let mut auth = MockAuthService::new();

    auth.expect_authenticate_bearer().never();
    auth.expect_issue_api_token().never();
    auth.expect_revoke_api_token().never();

    auth
}

fn strict_carts_mock() -> MockCartsService {
    let mut carts = MockCartsService::new();

    carts.expect_list_items().never();
    carts.expect_add_item().never();
    carts.expect_update_item().never();
    carts.expect_remove_item().never();
    carts.expect_clear().never();

    carts
}

fn strict_checkout_mock() -> MockCheckoutService {
    let mut checkout = MockCheckoutService::new();

    checkout.expect_checkout().never();
    checkout.expect_create_order().never();

    checkout
}

fn strict_orders_mock() -> MockOrdersService {
    let mut orders = MockOrdersService::new();

    orders.expect_get_order().never();
    orders.expect_list_orders().never();
    orders.expect_confirm().never();
    orders.expect_process().never();
    orders.expect_ship().never();
    orders.expect_deliver().never();
    orders.expect_complete().never();
    orders.expect_cancel().never();
    orders.expect_refund().never();
    orders.expect_rate().never();

    orders
}

fn strict_transactions_mock() -> MockTransactionsService {
    let mut transactions = MockTransactionsService::new();

    transactions.expect_list_transactions().never();
    transactions.expect_get_transaction().never();
    transactions.expect_summary().never();
    transactions.expect_create_funding().never();
    transactions.expect_create_withdrawal().never();
    transactions.expect_confirm_transaction().never();
    transactions.expect_cancel_transaction().never();
    transactions.expect_sync_transaction().never();
    transactions.expect_handle_webhook().never();

    transactions
}

fn strict_context() -> AppContext {
    AppContext {
        users: Arc::new(strict_users_mock()),
        markets: Arc::new(strict_markets_mock()),
        products: Arc::new(strict_products_mock()),
        carts: Arc::new(strict_carts_mock()),
        orders: Arc::new(strict_orders_mock()),
        checkout: Arc::new(strict_checkout_mock()),
        transactions: Arc::new(strict_transactions_mock()),
        auth: Arc::new(strict_auth_mock()),
    }
}

pub(crate) fn state_with_auth(auth: MockAuthService) -> Arc<State> {
    let mut app = strict_context();

    app.auth = Arc::new(auth);

    State::from_app_context(app)
}

pub(crate) fn state_with_auth_and_transactions(
    auth: MockAuthService,
    transactions: MockTransactionsService,
) -> Arc<State> {
    let mut app = strict_context();

    app.auth = Arc::new(auth);
    app.transactions = Arc::new(transactions);

    State::from_app_context(app)
}

fn authenticated_service(app: AppContext, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(State::from_app_context(app)))
            .hoop(inject_user)
            .push(route),
    )
}

pub(crate) fn carts_service(carts: MockCartsService, route: Router) -> Service {
    let mut app = strict_context();

    app.carts = Arc::new(carts);

    authenticated_service(app, route)
}

pub(crate) fn checkout_service(checkout: MockCheckoutService, route: Router) -> Service {
    let mut app = strict_context();

    app.checkout = Arc::new(checkout);

    authenticated_service(app, route)
}

pub(crate) fn orders_service(orders: MockOrdersService, route: Router) -> Service {
    let mut app = strict_context();

    app.orders = Arc::new(orders);

    authenticated_service(app, route)
}

pub(crate) fn transactions_service(transactions: MockTransactionsService, route: Router) -> Service {
    let mut app = strict_context();

    app.transactions = Arc::new(transactions);

    authenticated_service(app, route)
}

/// Webhooks are signed, not bearer authenticated, so no user is injected.
pub(crate) fn webhook_service(transactions: MockTransactionsService, route: Router) -> Service {
    let mut app = strict_context();

    app.transactions = Arc::new(transactions);

    Service::new(
        Router::new()
            .hoop(inject(State::from_app_context(app)))
            .push(route),
    )
}

pub(crate) fn make_cart_item(uuid: CartItemUuid, quantity: i32) -> CartItem {
    CartItem {
        uuid,
        product_uuid: ProductUuid::from_uuid(Uuid::nil()),
        market_uuid: MarketUuid::from_uuid(Uuid::nil()),
        product_name: "Lamp".to_string(),
        unit_price: Decimal::new(20_00, 2),
        quantity,
        added_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn make_order(uuid: OrderUuid, status: OrderStatus) -> Order {
    let product = ProductUuid::from_uuid(Uuid::nil());

    Order {
        uuid,
        buyer_uuid: TEST_USER_UUID,
        market_uuid: MarketUuid::from_uuid(Uuid::nil()),
        market_owner_uuid: TEST_SELLER_UUID,
        order_number: "ORD-20260101-ABCDEFGH".to_string(),
        status,
        payment_status: PaymentStatus::Pending,
        subtotal: Decimal::new(40_00, 2),
        tax_amount: Decimal::new(4_00, 2),
        shipping_amount: Decimal::new(10_00, 2),
        total_amount: Decimal::new(54_00, 2),
        shipping_address: ShippingAddress {
            street: "1 Market St".to_string(),
            city: "Lisbon".to_string(),
            postal_code: "1000-001".to_string(),
            country: "PT".to_string(),
        },
        shipping_method: None,
        notes: None,
        metadata: Map::new(),
        rating: None,
        review: None,
        delivered_at: None,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
        items: vec![OrderItem {
            uuid: OrderItemUuid::from_uuid(Uuid::nil()),
            order_uuid: uuid,
            product_uuid: product,
            quantity: 2,
            unit_price: Decimal::new(20_00, 2),
            total: Decimal::new(40_00, 2),
            product_name: "Lamp".to_string(),
            product_description: "A desk lamp".to_string(),
            product_image: None,
        }],
    }
}

pub(crate) fn make_transaction(
    uuid: TransactionUuid,
    transaction_type: TransactionType,
    status: TransactionStatus,
) -> Transaction {
    Transaction {
        uuid,
        user_uuid: TEST_USER_UUID,
        market_uuid: None,
        market_owner_uuid: None,
        order_uuid: None,
        transaction_type,
        status,
        amount: Decimal::new(12_50, 2),
        currency: Currency::Sol,
        transaction_hash: Some("5abc".to_string()),
        blockchain_signature: None,
        from_wallet: None,
        to_wallet: None,
        gas_fee: None,
        description: None,
        metadata: Map::new(),
        processed_at: None,
        confirmed_at: None,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}
