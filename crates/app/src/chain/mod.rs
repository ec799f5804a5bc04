//! Chain service client.
//!
//! The chain service is an opaque collaborator that reports what it knows
//! about a transaction signature.

mod client;
mod errors;
mod models;

pub use client::*;
pub use errors::ChainError;
pub use models::*;
