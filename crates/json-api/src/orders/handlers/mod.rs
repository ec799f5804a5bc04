//! Order Handlers

pub(crate) mod actions;
pub(crate) mod create;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod rate;
pub(crate) mod ship;
