use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use uuid::Uuid;

use super::{Claims, TOKEN_TTL_SECS, TokenParams, TokenResponse};
use crate::access::resolve_access;
use crate::error::{Error, Result};
use crate::pki::KeyLifecycleManager;
use crate::store::Store;
use crate::types::{Credential, KeyAlgorithm, User, parse_scope};

/// JWS algorithm name for a credential: `ES<curve bits>` or `RS<digest bits>`.
#[must_use]
pub fn algorithm_name(algorithm: KeyAlgorithm, bits: u32) -> String {
    match algorithm {
        KeyAlgorithm::Ec => format!("ES{bits}"),
        KeyAlgorithm::Rsa => {
            let digest = match bits {
                ..=2048 => 256,
                2049..=3072 => 384,
                _ => 512,
            };
            format!("RS{digest}")
        }
    }
}

pub fn signing_algorithm(credential: &Credential) -> Result<Algorithm> {
    let name = algorithm_name(credential.algorithm, credential.bits);
    Algorithm::from_str(&name).map_err(|_| Error::UnsupportedAlgorithm(name))
}

/// The certificate body as carried in the `x5c` header: base64 DER without
/// armor or line breaks.
#[must_use]
pub fn x5c(certificate_pem: &str) -> String {
    certificate_pem
        .replace("-----BEGIN CERTIFICATE-----", "")
        .replace("-----END CERTIFICATE-----", "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn encoding_key(credential: &Credential) -> Result<EncodingKey> {
    let pem = credential.private_key_pem.as_bytes();
    let key = match credential.algorithm {
        KeyAlgorithm::Ec => EncodingKey::from_ec_pem(pem)?,
        KeyAlgorithm::Rsa => EncodingKey::from_rsa_pem(pem)?,
    };
    Ok(key)
}

/// Issues registry bearer tokens for authenticated users.
pub struct TokenIssuer {
    issuer: String,
    store: Arc<dyn Store>,
    keys: Arc<KeyLifecycleManager>,
}

impl TokenIssuer {
    pub fn new(issuer: impl Into<String>, store: Arc<dyn Store>, keys: Arc<KeyLifecycleManager>) -> Self {
        Self {
            issuer: issuer.into(),
            store,
            keys,
        }
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Resolves the requested scope for the subject and signs a token.
    ///
    /// The subject is `account` when given, else `user`. Only admins may ask
    /// for another account.
    pub fn issue(&self, user: &User, params: &TokenParams, now: DateTime<Utc>) -> Result<TokenResponse> {
        let account = params.account.as_deref().filter(|a| !a.is_empty());

        let subject = match account {
            Some(account) if account != user.username => {
                if !user.admin {
                    tracing::debug!(
                        username = %user.username,
                        account,
                        "token requested for another account"
                    );
                    return Err(Error::Forbidden);
                }
                self.store.get_user_by_name(account)?
            }
            _ => Some(user.clone()),
        };

        let scopes = match params.scope.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => parse_scope(raw)?,
            None => Vec::new(),
        };

        let access = match &subject {
            Some(subject) if subject.active => resolve_access(self.store.as_ref(), subject.id, &scopes)?,
            _ => Vec::new(),
        };

        let credential = self.keys.current(now)?;

        let claims = Claims {
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
            aud: params.service.clone().unwrap_or_default(),
            sub: account.unwrap_or(&user.username).to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + Duration::seconds(TOKEN_TTL_SECS)).timestamp(),
            access,
        };

        let token = self.sign(&credential, &claims)?;

        Ok(TokenResponse {
            access_token: token.clone(),
            token,
            expires_in: TOKEN_TTL_SECS,
            issued_at: now,
        })
    }

    pub fn sign(&self, credential: &Credential, claims: &Claims) -> Result<String> {
        let algorithm = signing_algorithm(credential)?;
        tracing::debug!("signing method: {algorithm:?}");

        let mut header = Header::new(algorithm);
        header.x5c = Some(vec![x5c(&credential.certificate_pem)]);

        let key = encoding_key(credential)?;
        Ok(jsonwebtoken::encode(&header, claims, &key)?)
    }
}
