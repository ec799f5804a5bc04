//! Authentication
//!
//! Opaque bearer tokens. Only the SHA-256 of a token is stored; the raw
//! value is shown once when issued.

mod errors;
mod models;
mod repository;
mod service;
mod token;

pub use errors::*;
pub use models::*;
pub use service::*;
pub use token::*;
