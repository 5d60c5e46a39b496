//! Parsing of admin path segments.

use crate::rbac::{EntityKind, GrantSpec};
use crate::server::response::ApiError;
use crate::types::{Action, ResourceType, split_resource_class};

/// An entity addressed as `{rbac_type}:{rbac_entity}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub name: String,
}

/// Parses `user:alice` or `group:devs`. A missing separator or empty name is
/// malformed (422); an unknown type is unsupported (501).
pub fn parse_entity(segment: &str) -> Result<EntityRef, ApiError> {
    let (kind, name) = segment
        .split_once(':')
        .filter(|(kind, name)| !kind.is_empty() && !name.is_empty())
        .ok_or_else(|| {
            ApiError::unprocessable(format!("expected <type>:<name>, got '{segment}'"))
        })?;

    let kind = EntityKind::parse(kind)
        .ok_or_else(|| ApiError::not_implemented(format!("unsupported rbac type: {kind}")))?;

    Ok(EntityRef {
        kind,
        name: name.to_string(),
    })
}

/// Parses `{type}:{name}:{action}`. The name may itself contain `:`; the type
/// is everything before the first separator and the action everything after
/// the last one.
pub fn parse_grant(segment: &str) -> Result<GrantSpec, ApiError> {
    let malformed =
        || ApiError::unprocessable(format!("expected <type>:<name>:<action>, got '{segment}'"));

    let (type_field, rest) = segment.split_once(':').ok_or_else(malformed)?;
    let (name, action) = rest.rsplit_once(':').ok_or_else(malformed)?;
    if name.is_empty() {
        return Err(malformed());
    }

    let (resource_type, class) = split_resource_class(type_field)
        .ok_or_else(|| ApiError::unprocessable(format!("invalid permission type: {type_field}")))?;
    let resource_type = ResourceType::parse(resource_type).ok_or_else(|| {
        ApiError::unprocessable(format!("unknown permission type: {resource_type}"))
    })?;
    let action = Action::parse(action)
        .ok_or_else(|| ApiError::unprocessable(format!("unknown permission action: {action}")))?;

    Ok(GrantSpec {
        resource_type,
        class: class.to_string(),
        name: name.to_string(),
        action,
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn test_parse_entity() {
        assert_eq!(
            parse_entity("user:alice").unwrap(),
            EntityRef {
                kind: EntityKind::User,
                name: "alice".to_string()
            }
        );
        assert_eq!(parse_entity("group:devs").unwrap().kind, EntityKind::Group);
    }

    #[test]
    fn test_parse_entity_errors() {
        assert_eq!(
            parse_entity("alice").unwrap_err().status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            parse_entity("user:").unwrap_err().status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            parse_entity("robot:r2").unwrap_err().status,
            StatusCode::NOT_IMPLEMENTED
        );
    }

    #[test]
    fn test_parse_grant() {
        let spec = parse_grant("repository:acme/web:push").unwrap();
        assert_eq!(spec.resource_type, ResourceType::Repository);
        assert_eq!(spec.name, "acme/web");
        assert_eq!(spec.action, Action::Push);
        assert!(spec.class.is_empty());

        let spec = parse_grant("repository(plugin):host:5000/acme:pull").unwrap();
        assert_eq!(spec.class, "plugin");
        assert_eq!(spec.name, "host:5000/acme");
        assert_eq!(spec.action, Action::Pull);
    }

    #[test]
    fn test_parse_grant_errors() {
        for segment in [
            "repository:acme",
            "repository::pull",
            "blob:acme:pull",
            "repository:acme:delete",
            "Repository:acme:pull",
        ] {
            assert_eq!(
                parse_grant(segment).unwrap_err().status,
                StatusCode::UNPROCESSABLE_ENTITY,
                "{segment}"
            );
        }
    }
}
