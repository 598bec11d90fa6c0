//! Service configuration file.
//!
//! ```yaml
//! http:
//!   addr: 0.0.0.0:8080
//!   stack_size: 0x8000
//! errors:
//!   handler_error: 500
//!   panic: 500
//! ```
//!
//! Every key is optional. `errors` maps failure outcomes to status codes (see
//! [`ErrorStatusPolicy`]); without it statuses are left untouched.

use crate::middleware::ErrorStatusPolicy;
use crate::runtime_config::parse_size;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_yaml::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "invalid config {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub http: HttpConfig,
    pub errors: ErrorStatusPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub addr: String,
    /// Coroutine stack size; overrides `ROUTEDOC_STACK_SIZE` when set
    #[serde(deserialize_with = "deserialize_size")]
    pub stack_size: Option<usize>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            stack_size: None,
        }
    }
}

/// Accepts `16384`, `"16384"` or `"0x4000"`.
fn deserialize_size<'de, D: Deserializer<'de>>(de: D) -> Result<Option<usize>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(usize),
        Text(String),
    }

    match Option::<Size>::deserialize(de)? {
        None => Ok(None),
        Some(Size::Number(n)) => Ok(Some(n)),
        Some(Size::Text(s)) => parse_size(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid size '{s}'"))),
    }
}

impl ServiceConfig {
    /// Parse YAML text.
    ///
    /// # Errors
    ///
    /// Returns the YAML error for malformed input or unknown keys.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Load a YAML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the file when it cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ServiceConfig::from_yaml("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.http.addr, DEFAULT_ADDR);
        assert_eq!(config.errors, ErrorStatusPolicy::default());
    }

    #[test]
    fn test_full_config() {
        let config = ServiceConfig::from_yaml(
            "http:\n  addr: 0.0.0.0:9000\n  stack_size: \"0x8000\"\nerrors:\n  handler_error: 400\n  panic: 500\n",
        )
        .unwrap();
        assert_eq!(config.http.addr, "0.0.0.0:9000");
        assert_eq!(config.http.stack_size, Some(0x8000));
        assert_eq!(config.errors.handler_error, Some(400));
        assert_eq!(config.errors.panic, Some(500));
        assert_eq!(config.errors.encoding_error, None);
    }

    #[test]
    fn test_numeric_stack_size() {
        let config = ServiceConfig::from_yaml("http:\n  stack_size: 32768\n").unwrap();
        assert_eq!(config.http.stack_size, Some(32768));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(ServiceConfig::from_yaml("htp:\n  addr: x\n").is_err());
        assert!(ServiceConfig::from_yaml("http:\n  stack_size: huge\n").is_err());
    }

    #[test]
    fn test_load_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "errors: [not, a, map]").unwrap();
        let err = ServiceConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));

        let missing = ServiceConfig::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
