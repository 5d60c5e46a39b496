use std::path::PathBuf;

use chrono::{DateTime, Duration, Months, Utc};

use crate::error::{Error, Result};
use crate::types::KeyAlgorithm;

/// Lifetime of generated certificates, applied as calendar arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateValidity {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl CertificateValidity {
    pub fn not_after(&self, from: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let months = self
            .years
            .checked_mul(12)
            .and_then(|m| m.checked_add(self.months))
            .ok_or_else(|| Error::Config("certificate validity overflows".to_string()))?;

        let not_after = from
            .checked_add_months(Months::new(months))
            .and_then(|dt| dt.checked_add_signed(Duration::days(i64::from(self.days))))
            .ok_or_else(|| Error::Config("certificate validity overflows".to_string()))?;

        if not_after <= from {
            return Err(Error::Config(
                "certificate validity must be positive".to_string(),
            ));
        }
        Ok(not_after)
    }
}

impl Default for CertificateValidity {
    fn default() -> Self {
        Self {
            years: 2,
            months: 0,
            days: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PkiConfig {
    /// Generate a credential when none is usable. When false, `file` is required.
    pub generate: bool,
    /// PEM bundle holding one certificate and its private key.
    pub file: Option<PathBuf>,
    pub key_type: KeyAlgorithm,
    pub ec_key_size: u32,
    pub rsa_key_size: u32,
    pub validity: CertificateValidity,
}

impl PkiConfig {
    /// Key size for the configured key type.
    #[must_use]
    pub fn key_size(&self) -> u32 {
        match self.key_type {
            KeyAlgorithm::Ec => self.ec_key_size,
            KeyAlgorithm::Rsa => self.rsa_key_size,
        }
    }
}

impl Default for PkiConfig {
    fn default() -> Self {
        Self {
            generate: true,
            file: None,
            key_type: KeyAlgorithm::Ec,
            ec_key_size: 256,
            rsa_key_size: 4096,
            validity: CertificateValidity::default(),
        }
    }
}
