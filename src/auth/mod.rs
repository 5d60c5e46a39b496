mod credentials;
mod middleware;
mod password;
mod verifier;

pub use credentials::{Credentials, CredentialsError, decode_basic, parse_authorization};
pub use middleware::{AuthError, BASIC_CHALLENGE, RequireAdmin, RequireUser};
pub use password::PasswordHasher;
pub use verifier::verify_basic;
