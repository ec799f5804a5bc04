//! Auth data models.

use jiff::Timestamp;

use crate::{domain::users::models::UserUuid, uuids::TypedUuid};

/// API Token UUID
pub type ApiTokenUuid = TypedUuid<ApiToken>;

/// API token metadata persisted in storage.
#[derive(Debug, Clone)]
pub struct ApiToken {
    pub uuid: ApiTokenUuid,
    pub user_uuid: UserUuid,
    pub created_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
}

/// API token issuance result with one-time raw token.
#[derive(Debug, Clone)]
pub struct IssuedApiToken {
    pub token: String,
    pub metadata: ApiToken,
}
