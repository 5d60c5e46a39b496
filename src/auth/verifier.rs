use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::User;

use super::PasswordHasher;

/// Authenticates a username and password against the user store.
///
/// Unknown users, inactive users and wrong passwords all yield
/// [`Error::Unauthenticated`].
pub fn verify_basic(
    store: &dyn Store,
    hasher: &PasswordHasher,
    username: &str,
    password: &str,
) -> Result<User> {
    let Some(user) = store.get_user_by_name(username)? else {
        tracing::debug!(username, "authentication failed: unknown user");
        return Err(Error::Unauthenticated);
    };

    if !user.active {
        tracing::debug!(username, "authentication failed: user disabled");
        return Err(Error::Unauthenticated);
    }

    if !hasher.verify(password, &user.password_hash)? {
        tracing::debug!(username, "authentication failed: password mismatch");
        return Err(Error::Unauthenticated);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;
    use crate::store::SqliteStore;

    fn setup(temp: &TempDir, hasher: &PasswordHasher, active: bool) -> SqliteStore {
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
            .create_user(&User {
                id: 1,
                username: "alice".to_string(),
                password_hash: hasher.hash("s3cret").unwrap(),
                admin: false,
                active,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .unwrap();
        store
    }

    #[test]
    fn test_valid_credentials() {
        let temp = TempDir::new().unwrap();
        let hasher = PasswordHasher::new();
        let store = setup(&temp, &hasher, true);

        let user = verify_basic(&store, &hasher, "alice", "s3cret").unwrap();
        assert_eq!(user.id, 1);
    }

    #[test]
    fn test_failures_are_indistinguishable() {
        let temp = TempDir::new().unwrap();
        let hasher = PasswordHasher::new();
        let store = setup(&temp, &hasher, true);

        assert!(matches!(
            verify_basic(&store, &hasher, "bob", "s3cret"),
            Err(Error::Unauthenticated)
        ));
        assert!(matches!(
            verify_basic(&store, &hasher, "alice", "wrong"),
            Err(Error::Unauthenticated)
        ));
    }

    #[test]
    fn test_inactive_user_rejected() {
        let temp = TempDir::new().unwrap();
        let hasher = PasswordHasher::new();
        let store = setup(&temp, &hasher, false);

        assert!(matches!(
            verify_basic(&store, &hasher, "alice", "s3cret"),
            Err(Error::Unauthenticated)
        ));
    }
}
