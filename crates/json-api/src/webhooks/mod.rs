//! Inbound webhooks. These sit outside bearer auth; each payload carries its
//! own HMAC signature.

pub(crate) mod blockchain;
