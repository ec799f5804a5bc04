//! Transaction Handlers

pub(crate) mod cancel;
pub(crate) mod confirm;
pub(crate) mod funding;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod summary;
pub(crate) mod sync;
pub(crate) mod withdrawal;
