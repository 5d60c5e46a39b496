use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Resource kinds a grant can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Registry,
    Catalog,
    Namespace,
    Repository,
}

impl ResourceType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registry => "registry",
            Self::Catalog => "catalog",
            Self::Namespace => "namespace",
            Self::Repository => "repository",
        }
    }

    pub fn parse(s: &str) -> Option<ResourceType> {
        match s {
            "registry" => Some(Self::Registry),
            "catalog" => Some(Self::Catalog),
            "namespace" => Some(Self::Namespace),
            "repository" => Some(Self::Repository),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown resource type: {s}"))
    }
}

/// Registry actions a grant can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Pull,
    Push,
    Admin,
}

impl Action {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Push => "push",
            Self::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Action> {
        match s {
            "pull" => Some(Self::Pull),
            "push" => Some(Self::Push),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// The actions this grant permits: `push` also permits `pull`.
    #[must_use]
    pub fn implied(self) -> &'static [Action] {
        match self {
            Self::Pull => &[Self::Pull],
            Self::Push => &[Self::Push, Self::Pull],
            Self::Admin => &[Self::Admin],
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown action: {s}"))
    }
}
