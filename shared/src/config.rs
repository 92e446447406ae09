use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::http::{BackendUrl, UrlError};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("backend url rejected: {0}")]
    BackendUrl(#[from] UrlError),
}

/// Startup configuration handed over by the shell. Read once; the core never
/// looks at it again after bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend_url: BackendUrl,
}

impl AppConfig {
    /// Builds the config from the shell's raw backend setting. Absent or blank
    /// values select [`DEFAULT_BACKEND_URL`]; anything else must parse.
    pub fn from_shell(backend_url: Option<&str>) -> Result<Self, ConfigError> {
        let backend_url = match backend_url.map(str::trim) {
            Some(raw) if !raw.is_empty() => BackendUrl::parse(raw)?,
            _ => return Ok(Self::default()),
        };
        Ok(Self { backend_url })
    }
}

impl Default for AppConfig {
    // `DEFAULT_BACKEND_URL` is a checked constant (`default_backend_url_is_valid`).
    fn default() -> Self {
        match BackendUrl::parse(DEFAULT_BACKEND_URL) {
            Ok(backend_url) => Self { backend_url },
            Err(e) => unreachable!("default backend url must parse: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_url_uses_default() {
        assert_eq!(AppConfig::from_shell(None).unwrap(), AppConfig::default());
        assert_eq!(AppConfig::from_shell(Some("  ")).unwrap(), AppConfig::default());
        assert_eq!(
            AppConfig::default().backend_url.to_string(),
            DEFAULT_BACKEND_URL
        );
    }

    #[test]
    fn default_backend_url_is_valid() {
        assert!(BackendUrl::parse(DEFAULT_BACKEND_URL).is_ok());
    }

    #[test]
    fn explicit_url_is_used() {
        let config = AppConfig::from_shell(Some("https://tools.example.org")).unwrap();
        assert_eq!(
            config.backend_url.hello().as_str(),
            "https://tools.example.org/api/hello"
        );
    }

    #[test]
    fn malformed_url_is_an_error() {
        assert!(matches!(
            AppConfig::from_shell(Some("not a url")),
            Err(ConfigError::BackendUrl(_))
        ));
    }
}
