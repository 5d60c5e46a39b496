//! Operator-supplied PEM bundles: one certificate and its private key.

use chrono::{DateTime, Utc};
use jsonwebtoken::EncodingKey;
use p256::pkcs8::{EncodePrivateKey, LineEnding as Pkcs8LineEnding};
use pem::{EncodeConfig, LineEnding, Pem};
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;
use x509_parser::public_key::PublicKey;

use crate::error::{Error, Result};
use crate::types::{Credential, KeyAlgorithm};

const CERTIFICATE_TAG: &str = "CERTIFICATE";
const SEC1_KEY_TAG: &str = "EC PRIVATE KEY";
const KEY_TAGS: [&str; 3] = ["PRIVATE KEY", "RSA PRIVATE KEY", SEC1_KEY_TAG];

/// Folds a DER serial number into a positive id using its low 63 bits.
#[must_use]
pub fn serial_to_id(serial: &[u8]) -> i64 {
    let low = &serial[serial.len().saturating_sub(8)..];
    let mut bytes = [0u8; 8];
    bytes[8 - low.len()..].copy_from_slice(low);
    (u64::from_be_bytes(bytes) & i64::MAX as u64) as i64
}

fn encode(block: &Pem) -> String {
    pem::encode_config(block, EncodeConfig::new().set_line_ending(LineEnding::LF))
}

fn invalid_ec_key(e: impl std::fmt::Display) -> Error {
    Error::Pki(format!("invalid EC private key: {e}"))
}

/// Rewrites a SEC1 `EC PRIVATE KEY` as PKCS#8; the signer only loads EC
/// keys in that form. Other blocks are re-encoded unchanged.
fn normalize_key_pem(key: &Pem, bits: usize) -> Result<String> {
    if key.tag() != SEC1_KEY_TAG {
        return Ok(encode(key));
    }

    let sec1 = encode(key);
    let pkcs8 = match bits {
        256 => p256::SecretKey::from_sec1_pem(&sec1)
            .map_err(invalid_ec_key)?
            .to_pkcs8_pem(Pkcs8LineEnding::LF)
            .map_err(invalid_ec_key)?
            .to_string(),
        384 => p384::SecretKey::from_sec1_pem(&sec1)
            .map_err(invalid_ec_key)?
            .to_pkcs8_pem(Pkcs8LineEnding::LF)
            .map_err(invalid_ec_key)?
            .to_string(),
        _ => return Err(Error::UnsupportedKeySize(bits as u32)),
    };
    Ok(pkcs8)
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| Error::Pki(format!("certificate time out of range: {seconds}")))
}

/// Parses a bundle into a credential. Blocks other than the certificate and
/// private key are ignored; when a kind repeats the last block wins.
pub fn parse_bundle(contents: &str, now: DateTime<Utc>) -> Result<Credential> {
    let blocks =
        pem::parse_many(contents).map_err(|e| Error::Pki(format!("invalid pem data: {e}")))?;

    let mut certificate = None;
    let mut key = None;
    for block in blocks {
        tracing::debug!("detected block type: {}", block.tag());
        if block.tag() == CERTIFICATE_TAG {
            certificate = Some(block);
        } else if KEY_TAGS.contains(&block.tag()) {
            key = Some(block);
        }
    }

    let certificate =
        certificate.ok_or_else(|| Error::Pki("unable to find certificate".to_string()))?;
    let key = key.ok_or_else(|| Error::Pki("unable to find key".to_string()))?;

    let (_, cert) = X509Certificate::from_der(certificate.contents())
        .map_err(|e| Error::Pki(format!("invalid certificate: {e}")))?;

    let public_key = cert
        .public_key()
        .parsed()
        .map_err(|e| Error::Pki(format!("invalid certificate public key: {e}")))?;
    let (algorithm, bits) = match public_key {
        PublicKey::RSA(rsa) => (KeyAlgorithm::Rsa, rsa.key_size()),
        PublicKey::EC(point) => (KeyAlgorithm::Ec, point.key_size()),
        _ => {
            return Err(Error::Pki(
                "certificate public key must be RSA or EC".to_string(),
            ));
        }
    };

    let private_key_pem = normalize_key_pem(&key, bits)?;
    let usable = match algorithm {
        KeyAlgorithm::Ec => EncodingKey::from_ec_pem(private_key_pem.as_bytes()),
        KeyAlgorithm::Rsa => EncodingKey::from_rsa_pem(private_key_pem.as_bytes()),
    };
    if let Err(e) = usable {
        return Err(Error::Pki(format!(
            "unusable {algorithm} private key ({}): {e}",
            key.tag()
        )));
    }

    let validity = cert.validity();

    Ok(Credential {
        id: serial_to_id(cert.raw_serial()),
        algorithm,
        bits: u32::try_from(bits).map_err(|_| Error::Pki(format!("invalid key size {bits}")))?,
        private_key_pem,
        certificate_pem: encode(&certificate),
        not_before: timestamp(validity.not_before.timestamp())?,
        expires_at: timestamp(validity.not_after.timestamp())?,
        active: true,
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CertificateValidity;
    use crate::pki::keygen::generate_credential;

    fn generated() -> Credential {
        generate_credential(
            99,
            KeyAlgorithm::Ec,
            256,
            &CertificateValidity::default(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_serial_to_id() {
        assert_eq!(serial_to_id(&[0x10, 0x92]), 4242);
        assert_eq!(serial_to_id(&[]), 0);
        assert_eq!(serial_to_id(&[0xff; 9]), i64::MAX);
    }

    #[test]
    fn test_parse_generated_bundle() {
        let source = generated();
        let contents = format!("{}\n{}", source.private_key_pem, source.certificate_pem);

        let parsed = parse_bundle(&contents, Utc::now()).unwrap();
        assert_eq!(parsed.id, 99);
        assert_eq!(parsed.algorithm, KeyAlgorithm::Ec);
        assert_eq!(parsed.bits, 256);
        assert_eq!(parsed.expires_at, source.expires_at);
        assert_eq!(parsed.not_before, source.not_before);
        assert!(parsed.active);
    }

    #[test]
    fn test_block_order_does_not_matter() {
        let source = generated();
        let contents = format!("{}{}", source.certificate_pem, source.private_key_pem);
        assert_eq!(parse_bundle(&contents, Utc::now()).unwrap().id, 99);
    }

    fn sec1_bundle(source: &Credential) -> String {
        use p256::pkcs8::DecodePrivateKey;

        let sec1 = match source.bits {
            256 => p256::SecretKey::from_pkcs8_pem(&source.private_key_pem)
                .unwrap()
                .to_sec1_pem(Pkcs8LineEnding::LF)
                .unwrap()
                .to_string(),
            _ => p384::SecretKey::from_pkcs8_pem(&source.private_key_pem)
                .unwrap()
                .to_sec1_pem(Pkcs8LineEnding::LF)
                .unwrap()
                .to_string(),
        };
        assert!(sec1.contains("BEGIN EC PRIVATE KEY"));
        format!("{sec1}{}", source.certificate_pem)
    }

    #[test]
    fn test_sec1_ec_key_is_imported_as_pkcs8() {
        for bits in [256, 384] {
            let source = generate_credential(
                7,
                KeyAlgorithm::Ec,
                bits,
                &CertificateValidity::default(),
                Utc::now(),
            )
            .unwrap();

            let parsed = parse_bundle(&sec1_bundle(&source), Utc::now()).unwrap();
            assert_eq!(parsed.bits, bits);
            assert!(parsed.private_key_pem.contains("BEGIN PRIVATE KEY"));
            assert!(EncodingKey::from_ec_pem(parsed.private_key_pem.as_bytes()).is_ok());
        }
    }

    #[test]
    fn test_missing_certificate() {
        let source = generated();
        let err = parse_bundle(&source.private_key_pem, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("unable to find certificate"));
    }

    #[test]
    fn test_missing_key() {
        let source = generated();
        let err = parse_bundle(&source.certificate_pem, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("unable to find key"));
    }
}
