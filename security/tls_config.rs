//! TLS configuration for the bus listener
//!
//! Loads a provisioned certificate pair into a rustls server configuration.
//! Clients do not present certificates: a self-signed pair gives the
//! transport encryption, not peer authentication.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use rustls::{Certificate, PrivateKey, ServerConfig};
use rustls_pemfile::{certs, pkcs8_private_keys};

use crate::provision::{CertificatePair, Result, TlsError};

/// TLS certificate configuration
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the server certificate (PEM)
    pub cert_path: PathBuf,

    /// Path to the server private key (PEM)
    pub key_path: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: PathBuf::from("./certs/hivebus.crt"),
            key_path: PathBuf::from("./certs/hivebus.key"),
        }
    }
}

impl From<CertificatePair> for TlsConfig {
    fn from(pair: CertificatePair) -> Self {
        Self {
            cert_path: pair.cert_path,
            key_path: pair.key_path,
        }
    }
}

impl TlsConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(cert_path) = std::env::var("HIVEBUS_TLS_CERT") {
            config.cert_path = PathBuf::from(cert_path);
        }

        if let Ok(key_path) = std::env::var("HIVEBUS_TLS_KEY") {
            config.key_path = PathBuf::from(key_path);
        }

        Ok(config)
    }

    /// Build the server-side TLS configuration
    pub fn build_server_config(&self) -> Result<Arc<ServerConfig>> {
        // Load server certificate
        let cert_file = File::open(&self.cert_path)?;
        let mut cert_reader = BufReader::new(cert_file);
        let cert_chain: Vec<Certificate> = certs(&mut cert_reader)
            .map_err(|e| TlsError::InvalidCertificate(e.to_string()))?
            .into_iter()
            .map(Certificate)
            .collect();

        if cert_chain.is_empty() {
            return Err(TlsError::InvalidCertificate(
                "No certificates found".to_string(),
            ));
        }

        // Load private key
        let key_file = File::open(&self.key_path)?;
        let mut key_reader = BufReader::new(key_file);
        let mut keys =
            pkcs8_private_keys(&mut key_reader).map_err(|_| TlsError::InvalidPrivateKey)?;

        if keys.is_empty() {
            return Err(TlsError::InvalidPrivateKey);
        }

        let private_key = PrivateKey(keys.remove(0));

        let config = ServerConfig::builder()
            .with_safe_defaults()
            .with_no_client_auth()
            .with_single_cert(cert_chain, private_key)
            .map_err(|e| TlsError::Config(e.to_string()))?;

        Ok(Arc::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::ensure_certificate;
    use tempfile::tempdir;

    #[test]
    fn test_server_config_from_provisioned_pair() {
        let temp_dir = tempdir().unwrap();
        let pair = ensure_certificate(temp_dir.path(), "hub").unwrap();

        let config = TlsConfig::from(pair);
        let server_config = config.build_server_config();
        assert!(server_config.is_ok());
    }

    #[test]
    fn test_from_env_overrides_paths() {
        std::env::set_var("HIVEBUS_TLS_CERT", "/tmp/hub.crt");
        std::env::set_var("HIVEBUS_TLS_KEY", "/tmp/hub.key");

        let config = TlsConfig::from_env().unwrap();
        assert_eq!(config.cert_path, PathBuf::from("/tmp/hub.crt"));
        assert_eq!(config.key_path, PathBuf::from("/tmp/hub.key"));

        std::env::remove_var("HIVEBUS_TLS_CERT");
        std::env::remove_var("HIVEBUS_TLS_KEY");

        let config = TlsConfig::from_env().unwrap();
        assert_eq!(config.cert_path, TlsConfig::default().cert_path);
        assert_eq!(config.key_path, TlsConfig::default().key_path);
    }

    #[test]
    fn test_missing_files_surface_io_errors() {
        let temp_dir = tempdir().unwrap();
        let config = TlsConfig {
            cert_path: temp_dir.path().join("absent.crt"),
            key_path: temp_dir.path().join("absent.key"),
        };

        let err = config.build_server_config().unwrap_err();
        assert!(matches!(err, TlsError::Io(_)));
    }

    #[test]
    fn test_rejects_empty_certificate_file() {
        let temp_dir = tempdir().unwrap();
        let pair = ensure_certificate(temp_dir.path(), "hub").unwrap();
        std::fs::write(&pair.cert_path, "").unwrap();

        let config = TlsConfig::from(pair);
        let err = config.build_server_config().unwrap_err();
        assert!(matches!(err, TlsError::InvalidCertificate(_)));
    }
}
