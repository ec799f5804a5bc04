//! Auth repository.

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    auth::models::{ApiToken, ApiTokenUuid},
    domain::users::models::UserUuid,
};

const FIND_USER_BY_TOKEN_HASH_SQL: &str = include_str!("sql/find_user_by_token_hash.sql");
const CREATE_API_TOKEN_SQL: &str = include_str!("sql/create_api_token.sql");
const REVOKE_API_TOKEN_SQL: &str = include_str!("sql/revoke_api_token.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgAuthRepository;

impl PgAuthRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn find_user_by_token_hash(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        hash: &str,
    ) -> Result<Option<UserUuid>, sqlx::Error> {
        let user = query_scalar::<Postgres, Uuid>(FIND_USER_BY_TOKEN_HASH_SQL)
            .bind(hash)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(user.map(UserUuid::from_uuid))
    }

    pub(crate) async fn create_api_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: ApiTokenUuid,
        user: UserUuid,
        hash: &str,
        now: Timestamp,
    ) -> Result<ApiToken, sqlx::Error> {
        query_as::<Postgres, ApiToken>(CREATE_API_TOKEN_SQL)
            .bind(uuid.into_uuid())
            .bind(user.into_uuid())
            .bind(hash)
            .bind(SqlxTimestamp::from(now))
            .fetch_one(&mut **tx)
            .await
    }

    /// `None` when the token does not exist or was already revoked.
    pub(crate) async fn revoke_api_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: ApiTokenUuid,
        now: Timestamp,
    ) -> Result<Option<ApiToken>, sqlx::Error> {
        query_as::<Postgres, ApiToken>(REVOKE_API_TOKEN_SQL)
            .bind(uuid.into_uuid())
            .bind(SqlxTimestamp::from(now))
            .fetch_optional(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for ApiToken {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ApiTokenUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            revoked_at: row
                .try_get::<Option<SqlxTimestamp>, _>("revoked_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
