//! Auth service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::{Span, info};

use crate::{
    auth::{
        ApiTokenUuid, AuthServiceError, IssuedApiToken, format_api_token,
        generate_api_token_secret, hash_api_token, repository::PgAuthRepository,
    },
    clock::Clock,
    database::Db,
    domain::users::models::UserUuid,
};

#[derive(Debug, Clone)]
pub struct PgAuthService {
    db: Db,
    clock: Arc<dyn Clock>,
    repository: PgAuthRepository,
}

impl PgAuthService {
    #[must_use]
    pub fn new(db: Db, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            clock,
            repository: PgAuthRepository::new(),
        }
    }
}

#[async_trait]
impl AuthService for PgAuthService {
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<UserUuid, AuthServiceError> {
        let hash = hash_api_token(bearer_token.trim());

        let mut tx = self.db.begin().await?;

        let user = self
            .repository
            .find_user_by_token_hash(&mut tx, &hash)
            .await?
            .ok_or(AuthServiceError::NotFound)?;

        tx.commit().await?;

        Ok(user)
    }

    #[tracing::instrument(
        name = "auth.service.issue_api_token",
        skip(self),
        fields(user_uuid = %user, token_uuid = tracing::field::Empty),
        err
    )]
    async fn issue_api_token(&self, user: UserUuid) -> Result<IssuedApiToken, AuthServiceError> {
        let token_uuid = ApiTokenUuid::new();
        let token = format_api_token(&generate_api_token_secret());

        let mut tx = self.db.begin().await?;

        let metadata = self
            .repository
            .create_api_token(
                &mut tx,
                token_uuid,
                user,
                &hash_api_token(&token),
                self.clock.now(),
            )
            .await?;

        tx.commit().await?;

        Span::current().record("token_uuid", tracing::field::display(token_uuid));

        info!("issued api token");

        Ok(IssuedApiToken { token, metadata })
    }

    #[tracing::instrument(
        name = "auth.service.revoke_api_token",
        skip(self),
        fields(token_uuid = %token),
        err
    )]
    async fn revoke_api_token(&self, token: ApiTokenUuid) -> Result<bool, AuthServiceError> {
        let mut tx = self.db.begin().await?;

        let revoked = self
            .repository
            .revoke_api_token(&mut tx, token, self.clock.now())
            .await?;

        tx.commit().await?;

        Ok(revoked.is_some())
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolve a bearer token to the user it was issued for.
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<UserUuid, AuthServiceError>;

    /// Issue a new token. The raw value is only ever returned here.
    async fn issue_api_token(&self, user: UserUuid) -> Result<IssuedApiToken, AuthServiceError>;

    /// Revoke a token. Returns `true` if the token was active.
    async fn revoke_api_token(&self, token: ApiTokenUuid) -> Result<bool, AuthServiceError>;
}
