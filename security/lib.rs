//! Transport security for HiveBus
//!
//! Provides the TLS material a bus hub needs to accept encrypted
//! connections:
//! - Certificate provisioning (`provision`): self-signed pair generated on
//!   first start, reused on every start after that
//! - TLS configuration (`tls_config`): loads a PEM pair into a rustls
//!   server configuration
//!
//! # Usage
//!
//! ```rust,no_run
//! use security::{ensure_certificate, TlsConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Provision (or find) the hub's certificate pair
//! let pair = ensure_certificate("./certs", "hivebus")?;
//!
//! // Load it for the listener
//! let tls_config = TlsConfig::from(pair);
//! let server_config = tls_config.build_server_config()?;
//! # Ok(())
//! # }
//! ```
//!
//! A hub answering only loopback traffic can skip TLS entirely; nothing
//! here runs unless the caller asks for an encrypted listener.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod provision;
pub mod tls_config;

// Re-exports for convenience
pub use provision::{
    ensure_certificate, ensure_certificate_with, CertificateOptions, CertificatePair,
    KeyAlgorithm, Result, TlsError,
};
pub use tls_config::TlsConfig;
