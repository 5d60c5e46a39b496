use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Subcommand};

use crate::config::{
    CertificateValidity, DEFAULT_ISSUER, DEFAULT_PORT, PkiConfig, RANDOM_NODE_ID, ServerConfig,
};
use crate::types::KeyAlgorithm;

fn parse_key_type(s: &str) -> Result<KeyAlgorithm, String> {
    KeyAlgorithm::parse(&s.to_ascii_uppercase())
        .ok_or_else(|| format!("unknown key type {s:?}, expected EC or RSA"))
}

/// Key and certificate options shared by `serve` and `pki`.
#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    /// Signing key type
    #[arg(long = "pki-key-type", env = "TOLLGATE_PKI_KEY_TYPE", default_value = "EC", value_parser = parse_key_type)]
    pub key_type: KeyAlgorithm,

    /// EC curve size in bits (256 or 384)
    #[arg(long = "pki-ec-key-size", env = "TOLLGATE_PKI_EC_KEY_SIZE", default_value_t = 256)]
    pub ec_key_size: u32,

    /// RSA modulus size in bits (2048, 3072 or 4096)
    #[arg(long = "pki-rsa-key-size", env = "TOLLGATE_PKI_RSA_KEY_SIZE", default_value_t = 4096)]
    pub rsa_key_size: u32,

    /// Certificate lifetime, years part
    #[arg(long = "pki-cert-years", env = "TOLLGATE_PKI_CERT_YEARS", default_value_t = 2)]
    pub cert_years: u32,

    /// Certificate lifetime, months part
    #[arg(long = "pki-cert-months", env = "TOLLGATE_PKI_CERT_MONTHS", default_value_t = 0)]
    pub cert_months: u32,

    /// Certificate lifetime, days part
    #[arg(long = "pki-cert-days", env = "TOLLGATE_PKI_CERT_DAYS", default_value_t = 0)]
    pub cert_days: u32,
}

impl KeyArgs {
    #[must_use]
    pub fn key_size(&self) -> u32 {
        match self.key_type {
            KeyAlgorithm::Ec => self.ec_key_size,
            KeyAlgorithm::Rsa => self.rsa_key_size,
        }
    }

    #[must_use]
    pub fn validity(&self) -> CertificateValidity {
        CertificateValidity {
            years: self.cert_years,
            months: self.cert_months,
            days: self.cert_days,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(long, env = "TOLLGATE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind to
    #[arg(long, short, env = "TOLLGATE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite database file
    #[arg(long, env = "TOLLGATE_DATABASE", default_value = "./tollgate.db")]
    pub database: PathBuf,

    /// Snowflake node id (0-1023); 1024 picks one at random
    #[arg(long, env = "TOLLGATE_NODE_ID", default_value_t = RANDOM_NODE_ID)]
    pub node_id: u16,

    /// Value of the `iss` claim in issued tokens
    #[arg(long, env = "TOLLGATE_ISSUER", default_value = DEFAULT_ISSUER)]
    pub issuer: String,

    /// Administrator created at startup
    #[arg(long, env = "TOLLGATE_ROOT_USER")]
    pub root_user: Option<String>,

    /// Password for the startup administrator
    #[arg(long, env = "TOLLGATE_ROOT_PASSWORD", hide_env_values = true)]
    pub root_password: Option<String>,

    /// Seconds to wait for in-flight requests at shutdown
    #[arg(long, env = "TOLLGATE_SHUTDOWN_GRACE", default_value_t = 10)]
    pub shutdown_grace: u64,

    /// Generate a signing credential when none is usable
    #[arg(long = "pki-generate", env = "TOLLGATE_PKI_GENERATE", default_value_t = true, action = ArgAction::Set)]
    pub pki_generate: bool,

    /// PEM bundle with the signing key and certificate, used when generation is off
    #[arg(long = "pki-file", env = "TOLLGATE_PKI_FILE")]
    pub pki_file: Option<PathBuf>,

    #[command(flatten)]
    pub key: KeyArgs,
}

impl ServeArgs {
    #[must_use]
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            database: self.database,
            node_id: self.node_id,
            issuer: self.issuer,
            root_user: self.root_user,
            root_password: self.root_password,
            shutdown_grace: Duration::from_secs(self.shutdown_grace),
            pki: PkiConfig {
                generate: self.pki_generate,
                file: self.pki_file,
                key_type: self.key.key_type,
                ec_key_size: self.key.ec_key_size,
                rsa_key_size: self.key.rsa_key_size,
                validity: self.key.validity(),
            },
        }
    }
}

#[derive(Args, Debug)]
pub struct RbacArgs {
    /// Base URL of the tollgate server
    #[arg(long, env = "TOLLGATE_SERVER", default_value = "http://127.0.0.1:4315")]
    pub server: String,

    /// Admin username
    #[arg(long, short, env = "TOLLGATE_USERNAME")]
    pub username: String,

    /// Admin password
    #[arg(long, env = "TOLLGATE_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[command(subcommand)]
    pub command: RbacCommands,
}

/// Entities are written `user:<name>` or `group:<name>`; permissions
/// `type[(class)]:name:action`.
#[derive(Subcommand, Debug)]
pub enum RbacCommands {
    /// Create a user or group
    Add {
        entity: String,

        /// Password for a new user
        #[arg(long = "entity-password", env = "TOLLGATE_ENTITY_PASSWORD", hide_env_values = true)]
        entity_password: Option<String>,
    },

    /// Delete a user or group with its grants and memberships
    Remove { entity: String },

    /// Enable a user or group
    Enable { entity: String },

    /// Disable a user or group
    Disable { entity: String },

    /// Set a user's password
    ChangePassword {
        entity: String,

        #[arg(long = "entity-password", env = "TOLLGATE_ENTITY_PASSWORD", hide_env_values = true)]
        entity_password: String,
    },

    /// List the grants held directly by a user or group
    Permissions { entity: String },

    /// Grant a permission, replacing the action of an existing grant on the same resource
    Grant { entity: String, permission: String },

    /// Revoke an exact permission
    Revoke { entity: String, permission: String },

    /// Add a user to a group
    AddMember { group: String, user: String },

    /// Remove a user from a group
    RemoveMember { group: String, user: String },
}
