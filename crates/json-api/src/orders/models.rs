//! Order response bodies.

use std::string::ToString;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use bazaar_app::domain::{
    orders::models::{Order, OrderItem, ShippingAddress},
    pagination::Page,
};

use crate::pagination::PageMeta;

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub(crate) struct ShippingAddressBody {
    #[serde(default)]
    pub street: String,

    #[serde(default)]
    pub city: String,

    #[serde(default)]
    pub postal_code: String,

    #[serde(default)]
    pub country: String,
}

impl From<ShippingAddress> for ShippingAddressBody {
    fn from(address: ShippingAddress) -> Self {
        Self {
            street: address.street,
            city: address.city,
            postal_code: address.postal_code,
            country: address.country,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderItemResponse {
    pub uuid: Uuid,
    pub product_uuid: Uuid,
    pub quantity: i32,

    /// Price per unit captured at checkout
    pub unit_price: String,

    pub total: String,

    pub product_name: String,
    pub product_description: String,
    pub product_image: Option<String>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            uuid: item.uuid.into(),
            product_uuid: item.product_uuid.into(),
            quantity: item.quantity,
            unit_price: item.unit_price.to_string(),
            total: item.total.to_string(),
            product_name: item.product_name,
            product_description: item.product_description,
            product_image: item.product_image,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    pub uuid: Uuid,

    /// Human readable number, `ORD-YYYYMMDD-XXXXXXXX`
    pub order_number: String,

    pub buyer_uuid: Uuid,
    pub market_uuid: Uuid,
    pub status: String,
    pub payment_status: String,
    pub subtotal: String,
    pub tax_amount: String,
    pub shipping_amount: String,
    pub total_amount: String,
    pub shipping_address: ShippingAddressBody,
    pub shipping_method: Option<String>,
    pub notes: Option<String>,

    /// Free-form details such as the shipment tracking number
    pub metadata: Value,

    pub rating: Option<i16>,
    pub review: Option<String>,
    pub delivered_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            uuid: order.uuid.into(),
            order_number: order.order_number,
            buyer_uuid: order.buyer_uuid.into(),
            market_uuid: order.market_uuid.into(),
            status: order.status.as_str().to_string(),
            payment_status: order.payment_status.as_str().to_string(),
            subtotal: order.subtotal.to_string(),
            tax_amount: order.tax_amount.to_string(),
            shipping_amount: order.shipping_amount.to_string(),
            total_amount: order.total_amount.to_string(),
            shipping_address: order.shipping_address.into(),
            shipping_method: order.shipping_method,
            notes: order.notes,
            metadata: Value::Object(order.metadata),
            rating: order.rating,
            review: order.review,
            delivered_at: order.delivered_at.as_ref().map(ToString::to_string),
            created_at: order.created_at.to_string(),
            updated_at: order.updated_at.to_string(),
            items: order.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrdersPageResponse {
    pub orders: Vec<OrderResponse>,
    pub meta: PageMeta,
}

impl From<Page<Order>> for OrdersPageResponse {
    fn from(page: Page<Order>) -> Self {
        let meta = PageMeta::from(&page);

        Self {
            orders: page.items.into_iter().map(Into::into).collect(),
            meta,
        }
    }
}
