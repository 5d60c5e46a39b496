//! The registry scope grammar: `type[(class)]:name:action[,action...]`,
//! space separated.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A scope as requested by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class: String,
    pub name: String,
    pub actions: Vec<String>,
}

/// Parses a raw scope string.
///
/// A single entry without exactly three `:` separated fields fails the whole
/// input. Entries whose type field does not match the type grammar are
/// skipped.
pub fn parse_scope(raw: &str) -> Result<Vec<Scope>> {
    let mut scopes = Vec::new();

    for entry in raw.split(' ') {
        let parts: Vec<&str> = entry.split(':').collect();
        let [resource_type, name, actions] = parts.as_slice() else {
            return Err(Error::ScopeFormat(entry.to_string()));
        };

        let Some((resource_type, class)) = split_resource_class(resource_type) else {
            tracing::debug!("skipping scope with unparseable type: {entry}");
            continue;
        };

        scopes.push(Scope {
            resource_type: resource_type.to_string(),
            class: class.to_string(),
            name: (*name).to_string(),
            actions: actions.split(',').map(str::to_string).collect(),
        });
    }

    Ok(scopes)
}

fn is_type_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

fn is_type_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_type_char)
}

/// Splits `type(class)` into its parts. Returns `None` when the field does not
/// match `^[a-z0-9]+(\([a-z0-9]+\))?$`.
pub(crate) fn split_resource_class(field: &str) -> Option<(&str, &str)> {
    match field.split_once('(') {
        None => is_type_word(field).then_some((field, "")),
        Some((resource_type, rest)) => {
            let class = rest.strip_suffix(')')?;
            (is_type_word(resource_type) && is_type_word(class)).then_some((resource_type, class))
        }
    }
}
