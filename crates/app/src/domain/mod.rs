//! Marketplace Domain Concerns

pub mod carts;
pub mod checkout;
pub mod markets;
pub mod orders;
pub mod pagination;
pub mod products;
pub mod stock;
pub mod transactions;
pub mod users;
