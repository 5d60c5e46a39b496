use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::bundle::parse_bundle;
use super::keygen::{check_key_size, generate_credential};
use crate::config::PkiConfig;
use crate::error::{Error, Result};
use crate::id::IdGenerator;
use crate::store::Store;
use crate::types::Credential;

pub const ROTATION_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Owns the single active signing credential.
pub struct KeyLifecycleManager {
    store: Arc<dyn Store>,
    ids: Arc<IdGenerator>,
    config: PkiConfig,
}

impl KeyLifecycleManager {
    pub fn new(store: Arc<dyn Store>, ids: Arc<IdGenerator>, config: PkiConfig) -> Self {
        Self { store, ids, config }
    }

    /// Startup path: import the configured bundle, or make sure a usable
    /// credential exists when generation is enabled.
    pub fn bootstrap(&self, now: DateTime<Utc>) -> Result<Credential> {
        if self.config.generate {
            let (credential, _) = self.ensure_active(now)?;
            return Ok(credential);
        }

        let path = self.config.file.as_deref().ok_or_else(|| {
            Error::Config("a pki file is required when generation is disabled".to_string())
        })?;
        self.bootstrap_from_file(path, now)
    }

    pub fn bootstrap_from_file(&self, path: &Path, now: DateTime<Utc>) -> Result<Credential> {
        let contents = std::fs::read_to_string(path)?;
        let credential = parse_bundle(&contents, now)?;

        self.store.activate_credential(&credential)?;

        info!(
            id = credential.id,
            algorithm = %credential.algorithm,
            bits = credential.bits,
            expires_at = %credential.expires_at,
            "imported signing credential from {}",
            path.display()
        );
        Ok(credential)
    }

    /// Returns the current credential, generating one if none is usable at
    /// `now`. The flag is true when a generated credential was stored.
    ///
    /// Key generation runs without holding the store. When another writer
    /// activates a credential in the meantime, the generated one is dropped.
    pub fn ensure_active(&self, now: DateTime<Utc>) -> Result<(Credential, bool)> {
        let algorithm = self.config.key_type;
        let bits = self.config.key_size();
        check_key_size(algorithm, bits)?;

        if let Some(current) = self.store.current_credential(now)? {
            return Ok((current, false));
        }

        let candidate = generate_credential(
            self.ids.generate(),
            algorithm,
            bits,
            &self.config.validity,
            Utc::now(),
        )?;

        let (credential, stored) = self.store.activate_unless_current(now, &candidate)?;
        if !stored {
            debug!(
                discarded = candidate.id,
                current = credential.id,
                "credential activated concurrently, discarding generated key"
            );
        }
        Ok((credential, stored))
    }

    /// The active, unexpired, most recently created credential.
    pub fn current(&self, now: DateTime<Utc>) -> Result<Credential> {
        self.store
            .current_credential(now)?
            .ok_or(Error::NoActiveCredential)
    }

    /// PEM certificates of every usable credential, newline separated.
    pub fn active_certificates(&self, now: DateTime<Utc>) -> Result<String> {
        let certificates: Vec<String> = self
            .store
            .list_usable_credentials(now)?
            .into_iter()
            .map(|c| c.certificate_pem)
            .collect();
        Ok(certificates.join("\n"))
    }

    /// Periodically replaces the credential before it stops being usable.
    /// Generation runs on the blocking pool.
    pub fn spawn_rotation(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; bootstrap already ran.
            ticker.tick().await;

            let lead = chrono::Duration::from_std(interval).unwrap_or(chrono::Duration::hours(1));

            loop {
                ticker.tick().await;

                let manager = Arc::clone(&self);
                let result =
                    tokio::task::spawn_blocking(move || manager.ensure_active(Utc::now() + lead))
                        .await;

                match result {
                    Ok(Ok((credential, true))) => {
                        info!(id = credential.id, "rotated signing credential");
                    }
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => error!("credential rotation failed: {e}"),
                    Err(e) => error!("credential rotation task panicked: {e}"),
                }
            }
        })
    }
}
