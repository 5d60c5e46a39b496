mod pki;
mod server;

pub use pki::{CertificateValidity, PkiConfig};
pub use server::{DEFAULT_ISSUER, DEFAULT_PORT, RANDOM_NODE_ID, ServerConfig};
