//! Checkout
//!
//! Turns a buyer's cart into one order per market inside a single database
//! transaction.

pub mod errors;
pub mod models;
pub mod service;

pub use errors::CheckoutError;
pub use service::*;
