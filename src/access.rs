//! Reconciles requested scopes against stored grants.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::Store;
use crate::types::{Action, Grant, Owner, ResourceType, Scope};

/// A scope with the actions actually granted, as carried in the `access` claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedScope {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub actions: Vec<String>,
}

/// Loads every grant held by the user or by an active group the user belongs
/// to, then resolves `scopes` against them.
pub fn resolve_access(
    store: &dyn Store,
    user_id: i64,
    scopes: &[Scope],
) -> Result<Vec<ResolvedScope>> {
    if scopes.is_empty() {
        return Ok(Vec::new());
    }

    let mut owners = vec![Owner::User(user_id)];
    owners.extend(
        store
            .list_active_user_groups(user_id)?
            .into_iter()
            .map(|g| Owner::Group(g.id)),
    );

    let grants = store.list_grants_for_owners(&owners)?;
    let resolved = resolve(&grants, scopes);

    for scope in &resolved {
        tracing::debug!(
            "reconciled permission: {}:{}:{}",
            scope.resource_type,
            scope.name,
            scope.actions.join(",")
        );
    }

    Ok(resolved)
}

/// Computes the granted actions per scope. Output follows input order; scopes
/// left with no action are dropped.
#[must_use]
pub fn resolve(grants: &[Grant], scopes: &[Scope]) -> Vec<ResolvedScope> {
    scopes
        .iter()
        .filter_map(|scope| {
            let granted: HashSet<Action> = grants
                .iter()
                .filter(|grant| grant_matches(grant, scope))
                .flat_map(|grant| grant.action.implied().iter().copied())
                .collect();

            let mut actions: Vec<String> = Vec::new();
            for requested in requested_actions(scope) {
                let allowed = Action::parse(requested).is_some_and(|a| granted.contains(&a));
                if allowed && !actions.iter().any(|a| a == requested) {
                    actions.push(requested.to_string());
                }
            }

            (!actions.is_empty()).then(|| ResolvedScope {
                resource_type: scope.resource_type.clone(),
                name: scope.name.clone(),
                actions,
            })
        })
        .collect()
}

/// A request for exactly `pull` is evaluated as `pull,push`.
fn requested_actions(scope: &Scope) -> Vec<&str> {
    if scope.actions.len() == 1 && scope.actions[0] == Action::Pull.as_str() {
        vec![Action::Pull.as_str(), Action::Push.as_str()]
    } else {
        scope.actions.iter().map(String::as_str).collect()
    }
}

fn grant_matches(grant: &Grant, scope: &Scope) -> bool {
    if grant.resource_type == ResourceType::Namespace {
        return scope.name == grant.name
            || scope
                .name
                .strip_prefix(grant.name.as_str())
                .is_some_and(|rest| rest.starts_with('/'));
    }

    grant.resource_type.as_str() == scope.resource_type
        && grant.name == scope.name
        && (grant.class.is_empty() || grant.class == scope.class)
}
