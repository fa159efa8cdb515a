//! Process-wide configuration

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Settings shared by every bus-connected component in the process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory where the TLS certificate pair is provisioned
    pub certs_dir: PathBuf,

    /// Message types never echoed to the log, regardless of any whitelist
    pub log_blacklist: HashSet<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            certs_dir: PathBuf::from("./certs"),
            log_blacklist: HashSet::new(),
        }
    }
}

impl Settings {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut settings = Settings::default();

        if let Ok(dir) = std::env::var("HIVEBUS_CERTS_DIR") {
            settings.certs_dir = PathBuf::from(dir);
        }

        if let Ok(list) = std::env::var("HIVEBUS_LOG_BLACKLIST") {
            settings.log_blacklist = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings with missing or empty required values
    pub fn validate(&self) -> Result<()> {
        require_param(self.certs_dir.to_str().unwrap_or(""), "certs_dir")?;
        Ok(())
    }
}

/// Reject a missing or empty configuration value
pub fn require_param<'a>(value: &'a str, name: &'static str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(Error::MissingParam(name));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.certs_dir, PathBuf::from("./certs"));
        assert!(settings.log_blacklist.is_empty());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "certs_dir = \"/var/lib/hivebus/certs\"\nlog_blacklist = [\"enclosure.mouth.viseme\"]"
        )
        .unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.certs_dir, PathBuf::from("/var/lib/hivebus/certs"));
        assert!(settings.log_blacklist.contains("enclosure.mouth.viseme"));
    }

    #[test]
    fn test_from_file_fills_missing_fields_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_blacklist = [\"enclosure.mouth.viseme\"]").unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.certs_dir, PathBuf::from("./certs"));
        assert_eq!(settings.log_blacklist.len(), 1);
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "certs_dir = 17").unwrap();

        assert!(matches!(
            Settings::from_file(file.path()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_require_param() {
        assert_eq!(require_param("ok", "field").unwrap(), "ok");
        assert!(matches!(
            require_param("", "certs_dir"),
            Err(Error::MissingParam("certs_dir"))
        ));
        assert!(matches!(
            require_param("   ", "certs_dir"),
            Err(Error::MissingParam("certs_dir"))
        ));
    }
}
