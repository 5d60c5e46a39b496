use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use super::PkiConfig;

pub const DEFAULT_PORT: u16 = 4315;
pub const DEFAULT_ISSUER: &str = "tollgate";

/// Node id that asks for a random node in `0..1024`.
pub const RANDOM_NODE_ID: u16 = 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    /// Snowflake node id; must differ between replicas sharing a database.
    pub node_id: u16,
    /// Value of the `iss` claim.
    pub issuer: String,
    /// Optional bootstrap administrator, created at start when both are set.
    pub root_user: Option<String>,
    pub root_password: Option<String>,
    /// Upper bound on draining in-flight requests at shutdown.
    pub shutdown_grace: Duration,
    pub pki: PkiConfig,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// The configured node id, or a random one when [`RANDOM_NODE_ID`] is set.
    #[must_use]
    pub fn resolved_node_id(&self) -> u16 {
        if self.node_id == RANDOM_NODE_ID {
            rand::random::<u16>() % RANDOM_NODE_ID
        } else {
            self.node_id
        }
    }

    /// Root credentials, if both halves are configured.
    #[must_use]
    pub fn root_credentials(&self) -> Option<(&str, &str)> {
        match (self.root_user.as_deref(), self.root_password.as_deref()) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some((user, password))
            }
            _ => None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            database: PathBuf::from("./tollgate.db"),
            node_id: RANDOM_NODE_ID,
            issuer: DEFAULT_ISSUER.to_string(),
            root_user: None,
            root_password: None,
            shutdown_grace: Duration::from_secs(10),
            pki: PkiConfig::default(),
        }
    }
}
