use serde_json::json;
use urlencoding::encode;

use super::commands::{RbacArgs, RbacCommands};
use super::http_client::ApiClient;
use crate::types::Grant;

fn action_path(entity: &str, action: &str) -> String {
    format!("/admin/{}/{}", encode(entity), encode(action))
}

fn membership_path(group: &str, user: &str, action: &str) -> String {
    format!("/admin/{}/{}/{}", encode(group), encode(user), action)
}

fn format_grant(grant: &Grant) -> String {
    if grant.class.is_empty() {
        format!("{}:{}:{}", grant.resource_type, grant.name, grant.action)
    } else {
        format!(
            "{}({}):{}:{}",
            grant.resource_type, grant.class, grant.name, grant.action
        )
    }
}

pub fn run_rbac(args: RbacArgs) -> anyhow::Result<()> {
    let client = ApiClient::new(&args.server, &args.username, &args.password)?;

    match args.command {
        RbacCommands::Add {
            entity,
            entity_password,
        } => {
            let body = entity_password.map(|password| json!({ "password": password }));
            client.put::<serde_json::Value>(&action_path(&entity, "add"), body.as_ref())?;
            println!("Created {entity}");
        }
        RbacCommands::Remove { entity } => {
            client.put::<serde_json::Value>(&action_path(&entity, "remove"), None)?;
            println!("Removed {entity}");
        }
        RbacCommands::Enable { entity } => {
            client.put::<serde_json::Value>(&action_path(&entity, "enable"), None)?;
            println!("Enabled {entity}");
        }
        RbacCommands::Disable { entity } => {
            client.put::<serde_json::Value>(&action_path(&entity, "disable"), None)?;
            println!("Disabled {entity}");
        }
        RbacCommands::ChangePassword {
            entity,
            entity_password,
        } => {
            let body = json!({ "password": entity_password });
            client.put::<serde_json::Value>(&action_path(&entity, "change-password"), Some(&body))?;
            println!("Changed password of {entity}");
        }
        RbacCommands::Permissions { entity } => {
            let grants: Vec<Grant> = client
                .put(&action_path(&entity, "permissions"), None)?
                .unwrap_or_default();
            if grants.is_empty() {
                println!("{entity} holds no permissions.");
            }
            for grant in &grants {
                println!("{}", format_grant(grant));
            }
        }
        RbacCommands::Grant { entity, permission } => {
            client.put::<serde_json::Value>(&action_path(&entity, &permission), None)?;
            println!("Granted {permission} to {entity}");
        }
        RbacCommands::Revoke { entity, permission } => {
            client.delete(&action_path(&entity, &permission))?;
            println!("Revoked {permission} from {entity}");
        }
        RbacCommands::AddMember { group, user } => {
            client.put::<serde_json::Value>(&membership_path(&group, &user, "add-member"), None)?;
            println!("Added {user} to {group}");
        }
        RbacCommands::RemoveMember { group, user } => {
            client.delete(&membership_path(&group, &user, "remove-member"))?;
            println!("Removed {user} from {group}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_segment_is_encoded() {
        assert_eq!(
            action_path("user:alice", "repository:acme/web:pull"),
            "/admin/user%3Aalice/repository%3Aacme%2Fweb%3Apull"
        );
    }

    #[test]
    fn test_membership_path() {
        assert_eq!(
            membership_path("group:devs", "user:bob", "add-member"),
            "/admin/group%3Adevs/user%3Abob/add-member"
        );
    }
}
