//! User Models

use jiff::Timestamp;

use crate::uuids::TypedUuid;

/// User UUID
pub type UserUuid = TypedUuid<User>;

/// User Model
#[derive(Debug, Clone)]
pub struct User {
    pub uuid: UserUuid,
    pub name: String,
    pub wallet_address: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New User Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub uuid: UserUuid,
    pub name: String,
    pub wallet_address: Option<String>,
}
