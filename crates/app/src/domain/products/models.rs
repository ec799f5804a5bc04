//! Product Models

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{domain::markets::models::MarketUuid, uuids::TypedUuid};

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Product Model
#[derive(Debug, Clone)]
pub struct Product {
    pub uuid: ProductUuid,
    pub market_uuid: MarketUuid,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Product Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub market_uuid: MarketUuid,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
}
