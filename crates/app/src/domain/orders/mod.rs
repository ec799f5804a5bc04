//! Orders

pub mod errors;
pub mod models;
pub mod number;
pub(crate) mod repositories;
pub mod service;
pub mod status;
pub mod totals;

pub use errors::OrdersServiceError;
pub use service::*;
