//! Account and logging configuration.
//!
//! # Responsibility
//! - Parse TOML configuration into typed sections.
//! - Hand credentials to the facade without exposing the password elsewhere.
//!
//! # Invariants
//! - `account.username` is never blank after parsing.
//! - The password only leaves `SecretString` inside `credentials()`.

use crate::client::journal_client::Credentials;
use crate::logging::{default_log_level, init_logging};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration file.
///
/// ```toml
/// [account]
/// username = "frank"
/// password = "secret"
///
/// [logging]
/// level = "info"
/// dir = "/var/log/ljtasks"
/// ```
#[derive(Debug, Deserialize)]
pub struct JournalConfig {
    pub account: AccountSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct AccountSection {
    pub username: String,
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: SecretString,
}

/// Optional file logging. Nothing is initialized without `dir`.
#[derive(Debug, Default, Deserialize)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub dir: Option<String>,
}

impl JournalConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(contents)?;
        config.account.username = config.account.username.trim().to_string();
        if config.account.username.is_empty() {
            return Err(ConfigError::Invalid(
                "account.username cannot be blank".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.account.username.as_str(),
            self.account.password.expose_secret(),
        )
    }
}

impl LoggingSection {
    /// Starts file logging when a directory is configured.
    ///
    /// Returns `Ok(false)` when no directory is set.
    pub fn init(&self) -> Result<bool, String> {
        let Some(dir) = self.dir.as_deref() else {
            return Ok(false);
        };
        let level = match self.level.as_deref() {
            Some(level) => level,
            None => default_log_level(),
        };
        init_logging(level, dir)?;
        Ok(true)
    }
}

/// Reads and parses a configuration file.
pub fn read_config(path: &Path) -> Result<JournalConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    JournalConfig::from_toml_str(&contents)
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::{read_config, ConfigError, JournalConfig};
    use secrecy::ExposeSecret;
    use std::io::Write;

    const SAMPLE: &str = r#"
        [account]
        username = " frank "
        password = "hunter2"
    "#;

    #[test]
    fn parses_account_and_defaults_logging() {
        let config = JournalConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.account.username, "frank");
        assert!(config.logging.dir.is_none());
        assert_eq!(config.logging.init(), Ok(false));

        let credentials = config.credentials();
        assert_eq!(credentials.username, "frank");
        assert_eq!(credentials.password.expose_secret(), "hunter2");
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn logging_section_without_dir_is_skipped_at_any_level() {
        let config = JournalConfig::from_toml_str(
            "[account]\nusername = \"frank\"\npassword = \"x\"\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();
        assert_eq!(config.logging.level.as_deref(), Some("warn"));
        assert_eq!(config.logging.init(), Ok(false));
    }

    #[test]
    fn rejects_blank_username_and_missing_sections() {
        let blank = JournalConfig::from_toml_str(
            "[account]\nusername = \"  \"\npassword = \"x\"\n",
        )
        .unwrap_err();
        assert!(matches!(blank, ConfigError::Invalid(_)));

        let missing = JournalConfig::from_toml_str("[logging]\nlevel = \"info\"\n").unwrap_err();
        assert!(matches!(missing, ConfigError::Parse(_)));
    }

    #[test]
    fn reads_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = read_config(file.path()).unwrap();
        assert_eq!(config.account.username, "frank");

        let missing = read_config(&file.path().with_extension("absent")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }
}
