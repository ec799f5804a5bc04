//! Users service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

use crate::{
    clock::Clock,
    database::Db,
    domain::users::{
        errors::UsersServiceError,
        models::{NewUser, User, UserUuid},
        repository::PgUsersRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgUsersService {
    db: Db,
    clock: Arc<dyn Clock>,
    repository: PgUsersRepository,
}

impl PgUsersService {
    #[must_use]
    pub fn new(db: Db, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            clock,
            repository: PgUsersRepository::new(),
        }
    }
}

#[async_trait]
impl UsersService for PgUsersService {
    async fn create_user(&self, user: NewUser) -> Result<User, UsersServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self
            .repository
            .create_user(&mut tx, user, self.clock.now())
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_user(&self, user: UserUuid) -> Result<User, UsersServiceError> {
        let mut tx = self.db.begin().await?;

        let user = self.repository.get_user(&mut tx, user).await?;

        tx.commit().await?;

        Ok(user)
    }
}

#[automock]
#[async_trait]
pub trait UsersService: Send + Sync {
    /// Create a user.
    async fn create_user(&self, user: NewUser) -> Result<User, UsersServiceError>;

    /// Retrieve a single user.
    async fn get_user(&self, user: UserUuid) -> Result<User, UsersServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::TestContext;

    use super::*;

    #[tokio::test]
    async fn create_user_round_trips_wallet() -> TestResult {
        let ctx = TestContext::new().await;
        let uuid = UserUuid::new();

        let created = ctx
            .users
            .create_user(NewUser {
                uuid,
                name: "Ada".to_string(),
                wallet_address: Some("AdaWallet111".to_string()),
            })
            .await?;

        let fetched = ctx.users.get_user(uuid).await?;

        assert_eq!(created.uuid, uuid);
        assert_eq!(fetched.name, "Ada");
        assert_eq!(fetched.wallet_address.as_deref(), Some("AdaWallet111"));
        assert_eq!(fetched.created_at, ctx.now);

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_user_returns_already_exists() -> TestResult {
        let ctx = TestContext::new().await;
        let user = NewUser {
            uuid: UserUuid::new(),
            name: "Ada".to_string(),
            wallet_address: None,
        };

        ctx.users.create_user(user.clone()).await?;

        let result = ctx.users.create_user(user).await;

        assert!(
            matches!(result, Err(UsersServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unknown_user_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.users.get_user(UserUuid::new()).await;

        assert!(
            matches!(result, Err(UsersServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }
}
