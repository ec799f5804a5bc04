//! Transaction Ledger
//!
//! Monetary movements with their own status machine. Entries settle through
//! owner confirmation, the signed chain webhook or an on-demand chain
//! lookup; all three go through [`settlement::settle`].

pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;
pub mod settlement;
pub mod signature;
pub mod status;

pub use errors::TransactionsServiceError;
pub use service::*;
