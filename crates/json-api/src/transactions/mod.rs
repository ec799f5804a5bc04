//! Transaction ledger endpoints.

pub(crate) mod errors;
pub(crate) mod handlers;
pub(crate) mod models;

pub(crate) use handlers::*;
