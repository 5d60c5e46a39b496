mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    /// Inserts the user unless the username is taken. Returns whether a row was written.
    fn create_user(&self, user: &User) -> Result<bool>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_name(&self, username: &str) -> Result<Option<User>>;
    fn set_user_active(&self, id: i64, active: bool) -> Result<()>;
    fn update_user_password(&self, id: i64, password_hash: &str) -> Result<()>;
    /// Deletes the user together with its grants and memberships.
    fn delete_user(&self, id: i64) -> Result<bool>;

    // Group operations
    fn create_group(&self, group: &Group) -> Result<bool>;
    fn get_group_by_name(&self, name: &str) -> Result<Option<Group>>;
    fn set_group_active(&self, id: i64, active: bool) -> Result<()>;
    fn delete_group(&self, id: i64) -> Result<bool>;

    // Membership operations
    fn add_group_member(&self, group_id: i64, user_id: i64) -> Result<bool>;
    fn remove_group_member(&self, group_id: i64, user_id: i64) -> Result<bool>;
    fn list_active_user_groups(&self, user_id: i64) -> Result<Vec<Group>>;

    // Grant operations
    /// Inserts the grant or, when the owner already holds a grant on the same
    /// `(type, class, name)`, replaces its action.
    fn upsert_grant(&self, grant: &Grant) -> Result<()>;
    fn delete_grant(
        &self,
        owner: Owner,
        resource_type: ResourceType,
        name: &str,
        action: Action,
    ) -> Result<bool>;
    fn list_owner_grants(&self, owner: Owner) -> Result<Vec<Grant>>;
    fn list_grants_for_owners(&self, owners: &[Owner]) -> Result<Vec<Grant>>;

    // Signing credential operations
    /// Upserts by id and makes the credential the only active one.
    fn activate_credential(&self, credential: &Credential) -> Result<()>;
    /// The active, unexpired, most recently created credential.
    fn current_credential(&self, now: DateTime<Utc>) -> Result<Option<Credential>>;
    fn list_usable_credentials(&self, now: DateTime<Utc>) -> Result<Vec<Credential>>;
    /// Activates `candidate` unless a credential is already current at `now`,
    /// in which case that one is returned and `candidate` is discarded. The
    /// check and the write share one write-locking transaction. The flag is
    /// true when `candidate` was stored.
    fn activate_unless_current(
        &self,
        now: DateTime<Utc>,
        candidate: &Credential,
    ) -> Result<(Credential, bool)>;
}
