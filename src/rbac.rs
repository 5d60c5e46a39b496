//! User, group and grant administration.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::auth::PasswordHasher;
use crate::error::{Error, Result};
use crate::id::IdGenerator;
use crate::store::Store;
use crate::types::{Action, Grant, Group, Owner, ResourceType, User};

pub const MIN_PASSWORD_LEN: usize = 4;

pub const ANONYMOUS_USER: &str = "anonymous";
pub const ANONYMOUS_PASSWORD: &str = "anonymous";

/// The kind of entity an admin path addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Group,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
        }
    }

    pub fn parse(s: &str) -> Option<EntityKind> {
        match s {
            "user" => Some(Self::User),
            "group" => Some(Self::Group),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A grant as addressed by the admin API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantSpec {
    pub resource_type: ResourceType,
    pub class: String,
    pub name: String,
    pub action: Action,
}

fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Applies administrative mutations. Creates are idempotent, grants are
/// upserts and revokes of absent grants are no-ops.
pub struct RbacEngine {
    store: Arc<dyn Store>,
    hasher: Arc<PasswordHasher>,
    ids: Arc<IdGenerator>,
}

impl RbacEngine {
    pub fn new(store: Arc<dyn Store>, hasher: Arc<PasswordHasher>, ids: Arc<IdGenerator>) -> Self {
        Self { store, hasher, ids }
    }

    /// Creates the anonymous principal and, when configured, the root admin.
    pub fn bootstrap_principals(&self, root: Option<(&str, &str)>) -> Result<()> {
        self.create_user(ANONYMOUS_USER, ANONYMOUS_PASSWORD, false)?;

        if let Some((username, password)) = root {
            let (user, created) = self.create_user(username, password, true)?;
            if created {
                info!(username = %user.username, "created root user");
            } else if !user.admin {
                tracing::warn!(
                    username = %user.username,
                    "root user already exists without admin rights"
                );
            }
        }
        Ok(())
    }

    /// Returns the user and whether it was created by this call.
    pub fn create_user(&self, username: &str, password: &str, admin: bool) -> Result<(User, bool)> {
        check_password(password)?;

        if let Some(existing) = self.store.get_user_by_name(username)? {
            return Ok((existing, false));
        }

        let now = Utc::now();
        let user = User {
            id: self.ids.generate(),
            username: username.to_string(),
            password_hash: self.hasher.hash(password)?,
            admin,
            active: true,
            created_at: now,
            updated_at: now,
        };

        if !self.store.create_user(&user)? {
            // Lost a race with a concurrent create.
            let existing = self.find_user(username)?;
            return Ok((existing, false));
        }

        info!(username, admin, "created user");
        Ok((user, true))
    }

    pub fn create_group(&self, name: &str) -> Result<(Group, bool)> {
        let now = Utc::now();
        let group = Group {
            id: self.ids.generate(),
            name: name.to_string(),
            active: true,
            created_at: now,
            updated_at: now,
        };

        if self.store.create_group(&group)? {
            info!(name, "created group");
            return Ok((group, true));
        }
        Ok((self.find_group(name)?, false))
    }

    pub fn find_user(&self, username: &str) -> Result<User> {
        self.store
            .get_user_by_name(username)?
            .ok_or_else(|| Error::NotFound(format!("unknown user: {username}")))
    }

    pub fn find_group(&self, name: &str) -> Result<Group> {
        self.store
            .get_group_by_name(name)?
            .ok_or_else(|| Error::NotFound(format!("unknown group: {name}")))
    }

    pub fn resolve_owner(&self, kind: EntityKind, name: &str) -> Result<Owner> {
        match kind {
            EntityKind::User => Ok(Owner::User(self.find_user(name)?.id)),
            EntityKind::Group => Ok(Owner::Group(self.find_group(name)?.id)),
        }
    }

    pub fn set_active(&self, kind: EntityKind, name: &str, active: bool) -> Result<()> {
        match self.resolve_owner(kind, name)? {
            Owner::User(id) => self.store.set_user_active(id, active)?,
            Owner::Group(id) => self.store.set_group_active(id, active)?,
        }
        info!(%kind, name, active, "updated active flag");
        Ok(())
    }

    /// Replaces the user's password. A rejected password leaves the stored
    /// hash untouched.
    pub fn change_password(&self, username: &str, password: &str) -> Result<()> {
        check_password(password)?;
        let user = self.find_user(username)?;

        let hash = self.hasher.hash(password)?;
        self.store.update_user_password(user.id, &hash)?;

        info!(username, "changed password");
        Ok(())
    }

    /// Deletes the entity with its grants and memberships.
    pub fn remove(&self, kind: EntityKind, name: &str) -> Result<()> {
        let removed = match self.resolve_owner(kind, name)? {
            Owner::User(id) => self.store.delete_user(id)?,
            Owner::Group(id) => self.store.delete_group(id)?,
        };

        if !removed {
            return Err(Error::NotFound(format!("unknown {kind}: {name}")));
        }
        info!(%kind, name, "removed");
        Ok(())
    }

    pub fn grant(&self, owner: Owner, spec: &GrantSpec) -> Result<()> {
        let now = Utc::now();
        self.store.upsert_grant(&Grant {
            id: self.ids.generate(),
            resource_type: spec.resource_type,
            class: spec.class.clone(),
            name: spec.name.clone(),
            action: spec.action,
            owner,
            created_at: now,
            updated_at: now,
        })?;

        info!(
            %owner,
            "granted {}:{}:{}",
            spec.resource_type,
            spec.name,
            spec.action
        );
        Ok(())
    }

    /// Returns whether a grant was deleted.
    pub fn revoke(&self, owner: Owner, spec: &GrantSpec) -> Result<bool> {
        let removed =
            self.store
                .delete_grant(owner, spec.resource_type, &spec.name, spec.action)?;

        if removed {
            info!(
                %owner,
                "revoked {}:{}:{}",
                spec.resource_type,
                spec.name,
                spec.action
            );
        }
        Ok(removed)
    }

    pub fn add_member(&self, group: &str, username: &str) -> Result<bool> {
        let group = self.find_group(group)?;
        let user = self.find_user(username)?;
        self.store.add_group_member(group.id, user.id)
    }

    pub fn remove_member(&self, group: &str, username: &str) -> Result<bool> {
        let group = self.find_group(group)?;
        let user = self.find_user(username)?;
        self.store.remove_group_member(group.id, user.id)
    }

    pub fn permissions(&self, kind: EntityKind, name: &str) -> Result<Vec<Grant>> {
        let owner = self.resolve_owner(kind, name)?;
        self.store.list_owner_grants(owner)
    }
}
