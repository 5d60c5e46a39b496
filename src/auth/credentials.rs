use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Credentials presented in an `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    Bearer(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsError {
    InvalidScheme,
    Malformed,
}

/// Decodes `Basic base64(username:password)`, splitting on the first `:` so
/// passwords may contain colons.
pub fn decode_basic(encoded: &str) -> Option<(String, String)> {
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;

    let (username, password) = credentials.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Parses an `Authorization` header.
/// Returns `Ok(None)` if no header is present.
pub fn parse_authorization(
    auth_header: Option<&str>,
) -> Result<Option<Credentials>, CredentialsError> {
    let Some(header) = auth_header else {
        return Ok(None);
    };

    if let Some(token) = header.strip_prefix("Bearer ") {
        return Ok(Some(Credentials::Bearer(token.trim().to_string())));
    }

    if let Some(encoded) = header.strip_prefix("Basic ") {
        let (username, password) = decode_basic(encoded).ok_or(CredentialsError::Malformed)?;
        return Ok(Some(Credentials::Basic { username, password }));
    }

    Err(CredentialsError::InvalidScheme)
}
