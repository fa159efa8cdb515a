//! On-demand provisioning of self-signed certificates
//!
//! A bus hub that listens on a LAN interface encrypts its transport with a
//! self-signed pair generated on first start. Provisioning is a one-shot
//! startup step: when both files already exist they are trusted as-is and
//! never inspected or replaced, so a deployment keeps its identity across
//! restarts.

use std::fs;
use std::path::{Path, PathBuf};

use gethostname::gethostname;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from certificate provisioning and loading
#[derive(Error, Debug)]
pub enum TlsError {
    /// Filesystem failure while reading or writing certificate material
    #[error("Failed to access certificate material: {0}")]
    Io(#[from] std::io::Error),

    /// Key or certificate generation failed
    #[error("Certificate generation failed: {0}")]
    Generation(String),

    /// Certificate file did not contain usable certificates
    #[error("Invalid certificate format: {0}")]
    InvalidCertificate(String),

    /// Key file did not contain a usable PKCS#8 key
    #[error("Invalid private key format")]
    InvalidPrivateKey,

    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    Config(String),
}

/// Convenience alias for TLS results
pub type Result<T> = std::result::Result<T, TlsError>;

/// Key and signature algorithm for generated certificates
///
/// Only contemporary algorithms are offered; RSA below 2048 bits and SHA-1
/// signatures are not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// ECDSA over NIST P-256 with SHA-256 signatures
    #[default]
    EcdsaP256,
    /// ECDSA over NIST P-384 with SHA-384 signatures
    EcdsaP384,
}

impl KeyAlgorithm {
    fn signature_algorithm(&self) -> &'static rcgen::SignatureAlgorithm {
        match self {
            KeyAlgorithm::EcdsaP256 => &rcgen::PKCS_ECDSA_P256_SHA256,
            KeyAlgorithm::EcdsaP384 => &rcgen::PKCS_ECDSA_P384_SHA384,
        }
    }
}

/// Tunables for certificate generation
#[derive(Debug, Clone)]
pub struct CertificateOptions {
    /// Key and signature algorithm
    pub key_algorithm: KeyAlgorithm,

    /// Length of the validity window in days
    pub validity_days: i64,
}

impl Default for CertificateOptions {
    fn default() -> Self {
        Self {
            key_algorithm: KeyAlgorithm::default(),
            validity_days: 3650, // 10 years
        }
    }
}

/// Paths of a provisioned certificate and key pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificatePair {
    /// PEM certificate path (`<base>.crt`)
    pub cert_path: PathBuf,

    /// PEM private key path (`<base>.key`)
    pub key_path: PathBuf,
}

/// Ensure `<base_name>.crt` and `<base_name>.key` exist under `cert_dir`
///
/// Returns the two paths. When both files are already present they are left
/// untouched; their contents are never validated. When either is missing, a
/// fresh self-signed pair is generated and both files are written together,
/// creating `cert_dir` first if needed. Filesystem failures propagate to the
/// caller so a hub that cannot provision its identity fails at startup.
///
/// Not safe to call concurrently for the same paths; callers run this once
/// during process bootstrap.
pub fn ensure_certificate(cert_dir: impl AsRef<Path>, base_name: &str) -> Result<CertificatePair> {
    ensure_certificate_with(cert_dir, base_name, &CertificateOptions::default())
}

/// [`ensure_certificate`] with explicit generation options
pub fn ensure_certificate_with(
    cert_dir: impl AsRef<Path>,
    base_name: &str,
    options: &CertificateOptions,
) -> Result<CertificatePair> {
    let cert_dir = cert_dir.as_ref();
    let pair = CertificatePair {
        cert_path: cert_dir.join(format!("{}.crt", base_name)),
        key_path: cert_dir.join(format!("{}.key", base_name)),
    };

    if pair.cert_path.exists() && pair.key_path.exists() {
        debug!(cert = %pair.cert_path.display(), "Certificate pair already provisioned");
        return Ok(pair);
    }

    let hostname = hostname();
    let params = self_signed_params(&hostname, options)?;
    let cert =
        rcgen::Certificate::from_params(params).map_err(|e| TlsError::Generation(e.to_string()))?;

    let cert_pem = cert
        .serialize_pem()
        .map_err(|e| TlsError::Generation(e.to_string()))?;
    let key_pem = cert.serialize_private_key_pem();

    fs::create_dir_all(cert_dir)?;
    fs::write(&pair.cert_path, cert_pem)?;
    fs::write(&pair.key_path, key_pem)?;

    info!(
        host = %hostname,
        cert = %pair.cert_path.display(),
        "Generated self-signed certificate pair"
    );

    Ok(pair)
}

/// Build the parameter set for a self-signed certificate
///
/// The common name is the machine hostname; the remaining subject fields
/// are static placeholders. The serial number is drawn from a small range
/// and the validity window runs from now for `options.validity_days`.
fn self_signed_params(
    hostname: &str,
    options: &CertificateOptions,
) -> Result<rcgen::CertificateParams> {
    let alg = options.key_algorithm.signature_algorithm();
    let key = rcgen::KeyPair::generate(alg).map_err(|e| TlsError::Generation(e.to_string()))?;

    let mut params = rcgen::CertificateParams::new(vec![hostname.to_string()]);
    params.alg = alg;
    params.key_pair = Some(key);

    let mut dn = rcgen::DistinguishedName::new();
    dn.push(rcgen::DnType::CountryName, "XX");
    dn.push(rcgen::DnType::StateOrProvinceName, "Local");
    dn.push(rcgen::DnType::LocalityName, "Local");
    dn.push(rcgen::DnType::OrganizationName, "HiveBus");
    dn.push(rcgen::DnType::OrganizationalUnitName, "Bus Hub");
    dn.push(rcgen::DnType::CommonName, hostname);
    params.distinguished_name = dn;

    params.serial_number = Some(rand::thread_rng().gen_range(0..=2000u64).into());
    params.not_before = time::OffsetDateTime::now_utc();
    params.not_after = params.not_before + time::Duration::days(options.validity_days);

    Ok(params)
}

/// Hostname used for the certificate's common name
fn hostname() -> String {
    gethostname()
        .into_string()
        .unwrap_or_else(|_| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generates_pair_when_absent() {
        let dir = tempdir().unwrap();
        let pair = ensure_certificate(dir.path(), "hub").unwrap();

        assert_eq!(pair.cert_path, dir.path().join("hub.crt"));
        assert_eq!(pair.key_path, dir.path().join("hub.key"));
        assert!(pair.cert_path.exists());
        assert!(pair.key_path.exists());

        let cert_pem = fs::read_to_string(&pair.cert_path).unwrap();
        assert!(cert_pem.starts_with("-----BEGIN CERTIFICATE-----"));
        let key_pem = fs::read_to_string(&pair.key_path).unwrap();
        assert!(key_pem.contains("PRIVATE KEY"));
    }

    #[test]
    fn test_existing_pair_is_left_alone() {
        let dir = tempdir().unwrap();
        let first = ensure_certificate(dir.path(), "hub").unwrap();
        let cert_before = fs::read(&first.cert_path).unwrap();
        let key_before = fs::read(&first.key_path).unwrap();

        let second = ensure_certificate(dir.path(), "hub").unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read(&second.cert_path).unwrap(), cert_before);
        assert_eq!(fs::read(&second.key_path).unwrap(), key_before);
    }

    #[test]
    fn test_partial_pair_is_regenerated() {
        let dir = tempdir().unwrap();
        let pair = ensure_certificate(dir.path(), "hub").unwrap();
        let cert_before = fs::read(&pair.cert_path).unwrap();

        fs::remove_file(&pair.key_path).unwrap();
        let pair = ensure_certificate(dir.path(), "hub").unwrap();

        assert!(pair.cert_path.exists());
        assert!(pair.key_path.exists());
        assert_ne!(fs::read(&pair.cert_path).unwrap(), cert_before);
    }

    #[test]
    fn test_missing_certificate_regenerates_both() {
        let dir = tempdir().unwrap();
        let pair = ensure_certificate(dir.path(), "hub").unwrap();
        let key_before = fs::read(&pair.key_path).unwrap();

        fs::remove_file(&pair.cert_path).unwrap();
        let pair = ensure_certificate(dir.path(), "hub").unwrap();

        assert!(pair.cert_path.exists());
        assert!(pair.key_path.exists());
        assert_ne!(fs::read(&pair.key_path).unwrap(), key_before);
    }

    #[test]
    fn test_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("certs").join("hub");

        let pair = ensure_certificate(&nested, "hub").unwrap();

        assert!(pair.cert_path.exists());
        assert!(pair.key_path.exists());
    }

    #[test]
    fn test_params_carry_hostname_and_validity_window() {
        let params = self_signed_params("unit-test-host", &CertificateOptions::default()).unwrap();

        match params.distinguished_name.get(&rcgen::DnType::CommonName) {
            Some(rcgen::DnValue::Utf8String(cn)) => assert_eq!(cn, "unit-test-host"),
            other => panic!("unexpected common name: {:?}", other),
        }
        match params.distinguished_name.get(&rcgen::DnType::OrganizationName) {
            Some(rcgen::DnValue::Utf8String(org)) => assert_eq!(org, "HiveBus"),
            other => panic!("unexpected organization: {:?}", other),
        }

        assert_eq!(
            params.not_after - params.not_before,
            time::Duration::days(3650)
        );
    }

    #[test]
    fn test_serial_number_stays_in_range() {
        let params = self_signed_params("host", &CertificateOptions::default()).unwrap();
        let serial = params
            .serial_number
            .unwrap()
            .to_bytes()
            .iter()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
        assert!(serial <= 2000);
    }

    #[test]
    fn test_p384_generation() {
        let dir = tempdir().unwrap();
        let options = CertificateOptions {
            key_algorithm: KeyAlgorithm::EcdsaP384,
            ..Default::default()
        };

        let pair = ensure_certificate_with(dir.path(), "hub", &options).unwrap();

        assert!(pair.cert_path.exists());
        assert!(pair.key_path.exists());
    }
}
