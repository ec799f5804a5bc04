//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};

use bazaar_app::domain::users::models::UserUuid;

const USER_UUID_KEY: &str = "user_uuid";

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    /// Record the user a bearer token resolved to.
    fn insert_user_uuid(&mut self, user: UserUuid);

    /// The authenticated user, or 401 when the auth hoop did not run.
    fn user_uuid_or_401(&self) -> Result<UserUuid, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn insert_user_uuid(&mut self, user: UserUuid) {
        self.insert(USER_UUID_KEY, user);
    }

    fn user_uuid_or_401(&self) -> Result<UserUuid, StatusError> {
        self.get::<UserUuid>(USER_UUID_KEY)
            .copied()
            .map_err(|_ignored| StatusError::unauthorized())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn missing_user_is_unauthorized() {
        let depot = Depot::new();

        let result = depot.user_uuid_or_401();

        assert!(
            matches!(&result, Err(error) if error.code == salvo::http::StatusCode::UNAUTHORIZED),
            "expected 401, got {result:?}"
        );
    }

    #[test]
    fn inserted_user_is_returned() {
        let mut depot = Depot::new();
        let user = UserUuid::from_uuid(Uuid::nil());

        depot.insert_user_uuid(user);

        assert_eq!(depot.user_uuid_or_401().ok(), Some(user));
    }
}
