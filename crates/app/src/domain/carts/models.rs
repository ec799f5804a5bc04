//! Cart Models

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{
    domain::{
        markets::models::MarketUuid,
        products::models::{Product, ProductUuid},
    },
    uuids::TypedUuid,
};

/// Cart Item UUID
pub type CartItemUuid = TypedUuid<CartItem>;

/// A line in a buyer's cart, joined with the product it points at.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub uuid: CartItemUuid,
    pub product_uuid: ProductUuid,
    pub market_uuid: MarketUuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub added_at: Timestamp,
}

/// New Cart Item Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub uuid: CartItemUuid,
    pub product_uuid: ProductUuid,
    pub quantity: i64,
}

/// A cart line read for checkout, carrying the full product row.
///
/// `product.is_active` is false when the product, or its market, has been
/// deactivated or deleted.
#[derive(Debug, Clone)]
pub(crate) struct CheckoutLine {
    pub cart_item_uuid: CartItemUuid,
    pub quantity: i32,
    pub product: Product,
}
