//! Provision the hub's TLS certificate pair
//!
//! Usage: `provision-certs [cert_dir] [base_name]`
//!
//! Generates `<base_name>.crt` and `<base_name>.key` under `cert_dir`
//! unless both already exist. Defaults to `./certs` and `hivebus`.

use std::error::Error;

use security::ensure_certificate;
use tracing::info;

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let cert_dir = args.next().unwrap_or_else(|| "./certs".to_string());
    let base_name = args.next().unwrap_or_else(|| "hivebus".to_string());

    let pair = ensure_certificate(&cert_dir, &base_name)?;

    info!(
        cert = %pair.cert_path.display(),
        key = %pair.key_path.display(),
        "Certificate pair ready"
    );

    Ok(())
}
