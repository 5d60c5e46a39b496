use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const USER_COLUMNS: &str = "id, username, password_hash, admin, active, created_at, updated_at";
const GROUP_COLUMNS: &str = "id, name, active, created_at, updated_at";
const GRANT_COLUMNS: &str =
    "id, type, class, name, action, owner_kind, owner_id, created_at, updated_at";
const CREDENTIAL_COLUMNS: &str =
    "id, algorithm, bits, private_key, certificate, not_before, expires_at, active, created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

/// Fixed-width UTC timestamps so that text comparison in SQL orders correctly.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn invalid_column(idx: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("unexpected value '{value}'").into(),
    )
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        admin: row.get(3)?,
        active: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        name: row.get(1)?,
        active: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
        updated_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn grant_from_row(row: &Row<'_>) -> rusqlite::Result<Grant> {
    let resource_type: String = row.get(1)?;
    let action: String = row.get(4)?;
    let owner_kind: String = row.get(5)?;

    Ok(Grant {
        id: row.get(0)?,
        resource_type: ResourceType::parse(&resource_type)
            .ok_or_else(|| invalid_column(1, &resource_type))?,
        class: row.get(2)?,
        name: row.get(3)?,
        action: Action::parse(&action).ok_or_else(|| invalid_column(4, &action))?,
        owner: Owner::from_parts(&owner_kind, row.get(6)?)
            .ok_or_else(|| invalid_column(5, &owner_kind))?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn credential_from_row(row: &Row<'_>) -> rusqlite::Result<Credential> {
    let algorithm: String = row.get(1)?;

    Ok(Credential {
        id: row.get(0)?,
        algorithm: KeyAlgorithm::parse(&algorithm).ok_or_else(|| invalid_column(1, &algorithm))?,
        bits: row.get(2)?,
        private_key_pem: row.get(3)?,
        certificate_pem: row.get(4)?,
        not_before: parse_datetime(&row.get::<_, String>(5)?),
        expires_at: parse_datetime(&row.get::<_, String>(6)?),
        active: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn select_current_credential(
    conn: &Connection,
    now: DateTime<Utc>,
) -> rusqlite::Result<Option<Credential>> {
    conn.query_row(
        &format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM pki
             WHERE active = 1 AND expires_at > ?1
             ORDER BY created_at DESC, id DESC LIMIT 1"
        ),
        params![format_datetime(&now)],
        credential_from_row,
    )
    .optional()
}

fn write_active_credential(conn: &Connection, credential: &Credential) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO pki (id, algorithm, bits, private_key, certificate, not_before, expires_at, active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)
         ON CONFLICT (id) DO UPDATE SET
            algorithm = excluded.algorithm,
            bits = excluded.bits,
            private_key = excluded.private_key,
            certificate = excluded.certificate,
            not_before = excluded.not_before,
            expires_at = excluded.expires_at,
            active = 1",
        params![
            credential.id,
            credential.algorithm.as_str(),
            credential.bits,
            credential.private_key_pem,
            credential.certificate_pem,
            format_datetime(&credential.not_before),
            format_datetime(&credential.expires_at),
            format_datetime(&credential.created_at),
        ],
    )?;
    conn.execute(
        "UPDATE pki SET active = 0 WHERE id != ?1 AND active = 1",
        params![credential.id],
    )?;
    Ok(())
}

fn delete_owner_grants(conn: &Connection, owner: Owner) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM permissions WHERE owner_kind = ?1 AND owner_id = ?2",
        params![owner.kind(), owner.id()],
    )
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<bool> {
        let rows = self.conn().execute(
            "INSERT INTO users (id, username, password_hash, admin, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (username) DO NOTHING",
            params![
                user.id,
                user.username,
                user.password_hash,
                user.admin,
                user.active,
                format_datetime(&user.created_at),
                format_datetime(&user.updated_at),
            ],
        )?;
        Ok(rows > 0)
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_user_by_name(&self, username: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn set_user_active(&self, id: i64, active: bool) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET active = ?1, updated_at = ?2 WHERE id = ?3",
            params![active, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    fn update_user_password(&self, id: i64, password_hash: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
            params![password_hash, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    fn delete_user(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        delete_owner_grants(&tx, Owner::User(id))?;
        tx.execute("DELETE FROM group_members WHERE user_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM users WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // Group operations

    fn create_group(&self, group: &Group) -> Result<bool> {
        let rows = self.conn().execute(
            "INSERT INTO principal_groups (id, name, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (name) DO NOTHING",
            params![
                group.id,
                group.name,
                group.active,
                format_datetime(&group.created_at),
                format_datetime(&group.updated_at),
            ],
        )?;
        Ok(rows > 0)
    }

    fn get_group_by_name(&self, name: &str) -> Result<Option<Group>> {
        self.conn()
            .query_row(
                &format!("SELECT {GROUP_COLUMNS} FROM principal_groups WHERE name = ?1"),
                params![name],
                group_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn set_group_active(&self, id: i64, active: bool) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE principal_groups SET active = ?1, updated_at = ?2 WHERE id = ?3",
            params![active, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(format!("group {id}")));
        }
        Ok(())
    }

    fn delete_group(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        delete_owner_grants(&tx, Owner::Group(id))?;
        tx.execute("DELETE FROM group_members WHERE group_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM principal_groups WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // Membership operations

    fn add_group_member(&self, group_id: i64, user_id: i64) -> Result<bool> {
        let rows = self.conn().execute(
            "INSERT INTO group_members (group_id, user_id, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (group_id, user_id) DO NOTHING",
            params![group_id, user_id, format_datetime(&Utc::now())],
        )?;
        Ok(rows > 0)
    }

    fn remove_group_member(&self, group_id: i64, user_id: i64) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2",
            params![group_id, user_id],
        )?;
        Ok(rows > 0)
    }

    fn list_active_user_groups(&self, user_id: i64) -> Result<Vec<Group>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT g.id, g.name, g.active, g.created_at, g.updated_at
             FROM principal_groups g
             INNER JOIN group_members m ON m.group_id = g.id
             WHERE m.user_id = ?1 AND g.active = 1
             ORDER BY g.id",
        )?;

        let rows = stmt.query_map(params![user_id], group_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Grant operations

    fn upsert_grant(&self, grant: &Grant) -> Result<()> {
        self.conn().execute(
            "INSERT INTO permissions (id, type, class, name, action, owner_kind, owner_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (owner_kind, owner_id, type, class, name) DO UPDATE SET
                action = excluded.action,
                updated_at = excluded.updated_at",
            params![
                grant.id,
                grant.resource_type.as_str(),
                grant.class,
                grant.name,
                grant.action.as_str(),
                grant.owner.kind(),
                grant.owner.id(),
                format_datetime(&grant.created_at),
                format_datetime(&grant.updated_at),
            ],
        )?;
        Ok(())
    }

    fn delete_grant(
        &self,
        owner: Owner,
        resource_type: ResourceType,
        name: &str,
        action: Action,
    ) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM permissions
             WHERE owner_kind = ?1 AND owner_id = ?2 AND type = ?3 AND name = ?4 AND action = ?5",
            params![
                owner.kind(),
                owner.id(),
                resource_type.as_str(),
                name,
                action.as_str()
            ],
        )?;
        Ok(rows > 0)
    }

    fn list_owner_grants(&self, owner: Owner) -> Result<Vec<Grant>> {
        self.list_grants_for_owners(&[owner])
    }

    fn list_grants_for_owners(&self, owners: &[Owner]) -> Result<Vec<Grant>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {GRANT_COLUMNS} FROM permissions
             WHERE owner_kind = ?1 AND owner_id = ?2 ORDER BY id"
        ))?;

        let mut grants = Vec::new();
        for owner in owners {
            let rows = stmt.query_map(params![owner.kind(), owner.id()], grant_from_row)?;
            for grant in rows {
                grants.push(grant?);
            }
        }
        Ok(grants)
    }

    // Signing credential operations

    fn activate_credential(&self, credential: &Credential) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        write_active_credential(&tx, credential)?;

        tx.commit()?;
        Ok(())
    }

    fn current_credential(&self, now: DateTime<Utc>) -> Result<Option<Credential>> {
        select_current_credential(&self.conn(), now).map_err(Error::from)
    }

    fn list_usable_credentials(&self, now: DateTime<Utc>) -> Result<Vec<Credential>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM pki
             WHERE active = 1 AND expires_at > ?1
             ORDER BY created_at DESC, id DESC"
        ))?;

        let rows = stmt.query_map(params![format_datetime(&now)], credential_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn activate_unless_current(
        &self,
        now: DateTime<Utc>,
        candidate: &Credential,
    ) -> Result<(Credential, bool)> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(current) = select_current_credential(&tx, now)? {
            return Ok((current, false));
        }

        write_active_credential(&tx, candidate)?;

        tx.commit()?;
        Ok((candidate.clone(), true))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, mpsc};
    use std::thread;
    use std::time::{Duration as StdDuration, Instant};

    use chrono::Duration as ChronoDuration;
    use tempfile::TempDir;

    use super::*;

    fn open_store(temp: &TempDir) -> SqliteStore {
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
    }

    fn user(id: i64, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            password_hash: "hash".to_string(),
            admin: false,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn group(id: i64, name: &str) -> Group {
        Group {
            id,
            name: name.to_string(),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn grant(id: i64, owner: Owner, resource_type: ResourceType, name: &str, action: Action) -> Grant {
        Grant {
            id,
            resource_type,
            class: String::new(),
            name: name.to_string(),
            action,
            owner,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn credential(id: i64, created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Credential {
        Credential {
            id,
            algorithm: KeyAlgorithm::Ec,
            bits: 256,
            private_key_pem: format!("key-{id}"),
            certificate_pem: format!("cert-{id}"),
            not_before: created_at,
            expires_at,
            active: true,
            created_at,
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in ["users", "principal_groups", "group_members", "permissions", "pki", "tokens"] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_create_user_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        assert!(store.create_user(&user(1, "alice")).unwrap());
        assert!(!store.create_user(&user(2, "alice")).unwrap());

        let fetched = store.get_user_by_name("alice").unwrap().unwrap();
        assert_eq!(fetched.id, 1);
        assert!(store.get_user(2).unwrap().is_none());
    }

    #[test]
    fn test_repeated_grant_keeps_one_row() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let owner = Owner::User(1);

        for (id, action) in [(10, Action::Pull), (11, Action::Push), (12, Action::Push)] {
            store
                .upsert_grant(&grant(id, owner, ResourceType::Repository, "acme/web", action))
                .unwrap();
        }

        let grants = store.list_owner_grants(owner).unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].action, Action::Push);
        assert_eq!(grants[0].id, 10);
    }

    #[test]
    fn test_delete_grant_exact_match() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let owner = Owner::Group(5);

        store
            .upsert_grant(&grant(1, owner, ResourceType::Namespace, "acme", Action::Push))
            .unwrap();

        assert!(
            !store
                .delete_grant(owner, ResourceType::Namespace, "acme", Action::Pull)
                .unwrap()
        );
        assert!(
            !store
                .delete_grant(Owner::User(5), ResourceType::Namespace, "acme", Action::Push)
                .unwrap()
        );
        assert_eq!(store.list_owner_grants(owner).unwrap().len(), 1);

        assert!(
            store
                .delete_grant(owner, ResourceType::Namespace, "acme", Action::Push)
                .unwrap()
        );
        assert!(store.list_owner_grants(owner).unwrap().is_empty());
    }

    #[test]
    fn test_active_groups_only() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store.create_user(&user(1, "alice")).unwrap();
        store.create_group(&group(2, "devs")).unwrap();
        store.create_group(&group(3, "ops")).unwrap();
        store.add_group_member(2, 1).unwrap();
        store.add_group_member(3, 1).unwrap();
        assert!(!store.add_group_member(3, 1).unwrap());

        store.set_group_active(3, false).unwrap();

        let groups = store.list_active_user_groups(1).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "devs");
    }

    #[test]
    fn test_delete_user_removes_grants_and_memberships() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store.create_user(&user(1, "alice")).unwrap();
        store.create_group(&group(2, "devs")).unwrap();
        store.add_group_member(2, 1).unwrap();
        store
            .upsert_grant(&grant(3, Owner::User(1), ResourceType::Repository, "a/b", Action::Pull))
            .unwrap();

        assert!(store.delete_user(1).unwrap());
        assert!(store.list_owner_grants(Owner::User(1)).unwrap().is_empty());
        assert!(!store.remove_group_member(2, 1).unwrap());
        assert!(!store.delete_user(1).unwrap());
    }

    #[test]
    fn test_set_active_missing_user_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        assert!(matches!(
            store.set_user_active(42, false),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_single_active_credential() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let now = Utc::now();
        let later = now + ChronoDuration::days(365);

        store
            .activate_credential(&credential(1, now - ChronoDuration::seconds(10), later))
            .unwrap();
        store.activate_credential(&credential(2, now, later)).unwrap();

        let active: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM pki WHERE active = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(active, 1);

        let current = store.current_credential(now).unwrap().unwrap();
        assert_eq!(current.id, 2);
        assert_eq!(store.list_usable_credentials(now).unwrap().len(), 1);
    }

    #[test]
    fn test_reactivating_same_id_updates_material() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let now = Utc::now();
        let later = now + ChronoDuration::days(1);

        store.activate_credential(&credential(7, now, later)).unwrap();
        let mut replaced = credential(7, now, later);
        replaced.private_key_pem = "rotated".to_string();
        store.activate_credential(&replaced).unwrap();

        let current = store.current_credential(now).unwrap().unwrap();
        assert_eq!(current.private_key_pem, "rotated");
        assert_eq!(store.list_usable_credentials(now).unwrap().len(), 1);
    }

    #[test]
    fn test_expired_credential_is_not_current() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let now = Utc::now();

        store
            .activate_credential(&credential(1, now - ChronoDuration::days(2), now - ChronoDuration::days(1)))
            .unwrap();

        assert!(store.current_credential(now).unwrap().is_none());
        assert!(store.list_usable_credentials(now).unwrap().is_empty());
    }

    #[test]
    fn test_activate_unless_current_keeps_existing() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let now = Utc::now();

        let first = credential(101, now, now + ChronoDuration::days(1));
        let (stored, written) = store.activate_unless_current(now, &first).unwrap();
        assert!(written);
        assert_eq!(stored.id, 101);

        let second = credential(102, now, now + ChronoDuration::days(1));
        let (current, written) = store.activate_unless_current(now, &second).unwrap();
        assert!(!written);
        assert_eq!(current.id, 101);
        assert_eq!(store.list_usable_credentials(now).unwrap().len(), 1);
    }

    #[test]
    fn test_activate_unless_current_replaces_expired() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let now = Utc::now();

        let old = credential(201, now - ChronoDuration::days(2), now - ChronoDuration::days(1));
        store.activate_credential(&old).unwrap();

        let fresh = credential(202, now, now + ChronoDuration::days(1));
        let (current, written) = store.activate_unless_current(now, &fresh).unwrap();
        assert!(written);
        assert_eq!(current.id, 202);
    }

    #[test]
    fn test_reads_proceed_while_a_key_is_generated() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(open_store(&temp));
        store.create_user(&user(1, "alice")).unwrap();

        // Hold a long generation on one thread; the store must stay usable.
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let generator = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let now = Utc::now();
                if store.current_credential(now).unwrap().is_none() {
                    started_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    let candidate = credential(301, now, now + ChronoDuration::days(1));
                    store.activate_unless_current(now, &candidate).unwrap();
                }
            })
        };

        started_rx.recv().unwrap();
        let start = Instant::now();
        assert!(store.get_user_by_name("alice").unwrap().is_some());
        assert!(start.elapsed() < StdDuration::from_secs(1));

        release_tx.send(()).unwrap();
        generator.join().unwrap();
        assert_eq!(store.current_credential(Utc::now()).unwrap().unwrap().id, 301);
    }
}
