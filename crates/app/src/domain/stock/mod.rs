//! Stock Ledger
//!
//! Per-product available quantity. Every mutation runs on the caller's
//! transaction so it commits or rolls back with the surrounding work.

pub mod errors;
mod ledger;

pub use errors::StockError;
pub use ledger::StockLedger;
