//! Market Models

use jiff::Timestamp;

use crate::{domain::users::models::UserUuid, uuids::TypedUuid};

/// Market UUID
pub type MarketUuid = TypedUuid<Market>;

/// Market Model
#[derive(Debug, Clone)]
pub struct Market {
    pub uuid: MarketUuid,
    pub owner_uuid: UserUuid,
    pub name: String,
    pub wallet_address: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Market Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewMarket {
    pub uuid: MarketUuid,
    pub owner_uuid: UserUuid,
    pub name: String,
    pub wallet_address: Option<String>,
}
