//! Order Models

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::{
    domain::{
        markets::models::MarketUuid,
        orders::status::{OrderState, OrderStatus, PaymentStatus},
        products::models::ProductUuid,
        users::models::UserUuid,
    },
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Order Item UUID
pub type OrderItemUuid = TypedUuid<OrderItem>;

/// Free-form key/value data attached to orders and ledger entries.
pub type Metadata = Map<String, Value>;

/// Shipping Address
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Order Model
#[derive(Debug, Clone)]
pub struct Order {
    pub uuid: OrderUuid,
    pub buyer_uuid: UserUuid,
    pub market_uuid: MarketUuid,
    pub market_owner_uuid: UserUuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub total_amount: Decimal,
    pub shipping_address: ShippingAddress,
    pub shipping_method: Option<String>,
    pub notes: Option<String>,
    pub metadata: Metadata,
    pub rating: Option<i16>,
    pub review: Option<String>,
    pub delivered_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub items: Vec<OrderItem>,
}

impl Order {
    #[must_use]
    pub fn state(&self) -> OrderState {
        OrderState {
            status: self.status,
            payment_status: self.payment_status,
            rated: self.rating.is_some(),
        }
    }
}

/// Order line, frozen at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub uuid: OrderItemUuid,
    pub order_uuid: OrderUuid,
    pub product_uuid: ProductUuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub product_name: String,
    pub product_description: String,
    pub product_image: Option<String>,
}

/// Which side of the marketplace an order listing is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    /// Orders the caller placed.
    Buying,

    /// Orders placed with markets the caller owns.
    Selling,
}

/// Raw listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Raw shipping details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipOrder {
    pub tracking_number: Option<String>,
}

/// Raw rating.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateOrder {
    pub rating: i64,
    pub review: Option<String>,
}
