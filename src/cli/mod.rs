mod commands;
pub mod http_client;
mod init_container;
mod pki;
mod rbac;

pub use commands::{KeyArgs, RbacArgs, RbacCommands, ServeArgs};
pub use init_container::run_init_container;
pub use pki::run_pki;
pub use rbac::run_rbac;
