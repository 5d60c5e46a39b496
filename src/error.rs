use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden")]
    Forbidden,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid scope: {0}")]
    ScopeFormat(String),

    #[error("unsupported key size: {0}")]
    UnsupportedKeySize(u32),

    #[error("pki error: {0}")]
    Pki(String),

    #[error("no active signing credential")]
    NoActiveCredential,

    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("password hashing error: {0}")]
    Hash(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<rcgen::Error> for Error {
    fn from(e: rcgen::Error) -> Self {
        Error::Pki(e.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Error::Signing(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
