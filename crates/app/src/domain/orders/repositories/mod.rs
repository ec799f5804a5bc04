//! Order Repositories

mod items;
mod orders;

pub(crate) use items::{NewOrderItemRow, PgOrderItemsRepository};
pub(crate) use orders::{NewOrderRow, ORDER_NUMBER_CONSTRAINT, OrderChange, PgOrdersRepository};
