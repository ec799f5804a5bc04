//! Cart response bodies.

use rust_decimal::Decimal;
use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_app::domain::carts::models::CartItem;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartItemResponse {
    pub uuid: Uuid,
    pub product_uuid: Uuid,
    pub market_uuid: Uuid,
    pub product_name: String,

    /// Current product price; checkout snapshots it onto the order
    pub unit_price: String,

    pub quantity: i32,
    pub line_total: String,
    pub added_at: String,
}

impl From<CartItem> for CartItemResponse {
    fn from(item: CartItem) -> Self {
        Self {
            uuid: item.uuid.into(),
            product_uuid: item.product_uuid.into(),
            market_uuid: item.market_uuid.into(),
            line_total: (item.unit_price * Decimal::from(item.quantity)).to_string(),
            unit_price: item.unit_price.to_string(),
            product_name: item.product_name,
            quantity: item.quantity,
            added_at: item.added_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartResponse {
    pub items: Vec<CartItemResponse>,

    /// Sum of line totals before tax and shipping
    pub subtotal: String,
}

impl From<Vec<CartItem>> for CartResponse {
    fn from(items: Vec<CartItem>) -> Self {
        let subtotal: Decimal = items
            .iter()
            .map(|item| item.unit_price * Decimal::from(item.quantity))
            .sum();

        Self {
            items: items.into_iter().map(Into::into).collect(),
            subtotal: subtotal.to_string(),
        }
    }
}
