//! # Tollgate
//!
//! A token authorization server for container registries. Clients trade
//! Basic credentials and a requested scope for a short-lived signed token
//! listing the access their user and group grants allow.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! tollgate = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chrono::Utc;
//! use tollgate::config::ServerConfig;
//! use tollgate::id::IdGenerator;
//! use tollgate::server::{AppState, create_router};
//! use tollgate::store::{SqliteStore, Store};
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(&config.database).unwrap();
//! store.initialize().unwrap();
//!
//! let ids = Arc::new(IdGenerator::new(config.resolved_node_id()).unwrap());
//! let state = Arc::new(AppState::new(Arc::new(store), ids, &config));
//! state.keys.bootstrap(Utc::now()).unwrap();
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

pub mod access;
pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod id;
pub mod pki;
pub mod rbac;
pub mod server;
pub mod store;
pub mod token;
pub mod types;
