mod claims;
mod issuer;

pub use claims::{Claims, TOKEN_TTL_SECS, TokenParams, TokenResponse};
pub use issuer::{TokenIssuer, algorithm_name, signing_algorithm, x5c};
