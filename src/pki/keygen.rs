//! Signing key generation and self-issued certificates.

use chrono::{DateTime, Utc};
use rcgen::{
    CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair,
    KeyUsagePurpose, PKCS_ECDSA_P256_SHA256, PKCS_ECDSA_P384_SHA384, SerialNumber,
};
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use time::OffsetDateTime;
use tracing::info;

use crate::config::CertificateValidity;
use crate::error::{Error, Result};
use crate::types::{Credential, KeyAlgorithm};

/// Curves with a JWS algorithm (ES256, ES384). P-224 has none.
pub const EC_KEY_SIZES: [u32; 2] = [256, 384];
pub const RSA_KEY_SIZES: [u32; 4] = [2048, 3072, 4096, 7680];

pub fn check_key_size(algorithm: KeyAlgorithm, bits: u32) -> Result<()> {
    let supported = match algorithm {
        KeyAlgorithm::Ec => EC_KEY_SIZES.as_slice(),
        KeyAlgorithm::Rsa => RSA_KEY_SIZES.as_slice(),
    };

    if supported.contains(&bits) {
        Ok(())
    } else {
        Err(Error::UnsupportedKeySize(bits))
    }
}

/// Generates a key pair. Private keys are PKCS#8.
pub fn generate_key(algorithm: KeyAlgorithm, bits: u32) -> Result<KeyPair> {
    check_key_size(algorithm, bits)?;

    match (algorithm, bits) {
        (KeyAlgorithm::Ec, 256) => Ok(KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256)?),
        (KeyAlgorithm::Ec, 384) => Ok(KeyPair::generate_for(&PKCS_ECDSA_P384_SHA384)?),
        (KeyAlgorithm::Ec, _) => Err(Error::UnsupportedKeySize(bits)),
        (KeyAlgorithm::Rsa, _) => {
            let key = RsaPrivateKey::new(&mut rand::thread_rng(), bits as usize)
                .map_err(|e| Error::Pki(format!("failed to generate rsa key: {e}")))?;
            let pem = key
                .to_pkcs8_pem(LineEnding::LF)
                .map_err(|e| Error::Pki(format!("failed to encode rsa key: {e}")))?;
            Ok(KeyPair::from_pem(&pem)?)
        }
    }
}

fn to_offset(dt: DateTime<Utc>) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(dt.timestamp())
        .map_err(|e| Error::Pki(format!("certificate time out of range: {e}")))
}

/// Self-signs a leaf certificate for `key_pair`. The serial number is `id`.
pub fn self_sign(
    id: i64,
    key_pair: &KeyPair,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
) -> Result<String> {
    let mut subject = DistinguishedName::new();
    subject.push(DnType::OrganizationalUnitName, "tollgate");
    subject.push(DnType::OrganizationName, "tollgate");
    subject.push(DnType::CountryName, "US");
    subject.push(DnType::StateOrProvinceName, "dev");

    let mut params = CertificateParams::default();
    params.distinguished_name = subject;
    params.serial_number = Some(SerialNumber::from_slice(&(id as u64).to_be_bytes()));
    params.not_before = to_offset(not_before)?;
    params.not_after = to_offset(not_after)?;
    params.is_ca = IsCa::ExplicitNoCa;
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyCertSign,
    ];
    params.extended_key_usages = vec![
        ExtendedKeyUsagePurpose::ClientAuth,
        ExtendedKeyUsagePurpose::ServerAuth,
    ];

    let cert = params.self_signed(key_pair)?;
    Ok(cert.pem())
}

/// Generates a key and certificate valid from `now` for `validity`.
pub fn generate_credential(
    id: i64,
    algorithm: KeyAlgorithm,
    bits: u32,
    validity: &CertificateValidity,
    now: DateTime<Utc>,
) -> Result<Credential> {
    // Certificates carry whole seconds.
    let not_before = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
    let expires_at = validity.not_after(not_before)?;

    let key_pair = generate_key(algorithm, bits)?;
    let certificate_pem = self_sign(id, &key_pair, not_before, expires_at)?;

    info!(id, %algorithm, bits, %expires_at, "generated signing credential");

    Ok(Credential {
        id,
        algorithm,
        bits,
        private_key_pem: key_pair.serialize_pem(),
        certificate_pem,
        not_before,
        expires_at,
        active: true,
        created_at: now,
    })
}
