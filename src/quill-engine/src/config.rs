//! Engine configuration.
//!
//! Loaded from TOML. Lookup order for the file:
//! 1. `QUILL_CONFIG` environment variable (path to the file)
//! 2. `$QUILL_HOME/config.toml`
//! 3. `~/.quill/config.toml`
//!
//! A missing file means defaults. `QUILL_ENDPOINT` and
//! `QUILL_RENDER_INTERVAL_MS` override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{QuillError, Result};

/// Configuration file name.
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable for a custom config file path.
pub const QUILL_CONFIG_ENV: &str = "QUILL_CONFIG";

/// Environment variable for a custom config directory.
pub const QUILL_HOME_ENV: &str = "QUILL_HOME";

/// Environment variable overriding [`EngineConfig::endpoint`].
pub const QUILL_ENDPOINT_ENV: &str = "QUILL_ENDPOINT";

/// Environment variable overriding [`EngineConfig::render_interval_ms`].
pub const QUILL_RENDER_INTERVAL_ENV: &str = "QUILL_RENDER_INTERVAL_MS";

/// Upper bound for [`EngineConfig::render_interval_ms`].
pub const MAX_RENDER_INTERVAL_MS: u64 = 60_000;

/// Default conversion stream endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "http://localhost:8000/api/v1/v2/transcription/convert/stream-simple";

/// Runtime settings for conversions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Conversion stream endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Delay between two typed characters, in milliseconds
    #[serde(default = "default_render_interval_ms")]
    pub render_interval_ms: u64,

    /// Animate output; when false the queue drains without delay
    #[serde(default = "default_true")]
    pub typewriter: bool,

    /// Fail the conversion if no bytes arrive for this long (0 disables)
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// TCP connect timeout
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Maximum input length in characters
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_render_interval_ms() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_idle_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_input_chars() -> usize {
    50_000
}

fn default_user_agent() -> String {
    format!("quill/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            render_interval_ms: default_render_interval_ms(),
            typewriter: true,
            idle_timeout_secs: default_idle_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_input_chars: default_max_input_chars(),
            user_agent: default_user_agent(),
        }
    }
}

impl EngineConfig {
    /// Load from `explicit` or the standard location, then apply environment
    /// overrides and validate.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(),
        };

        let mut config = match path {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(QUILL_ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
            debug!(endpoint = %endpoint, "Endpoint overridden from environment");
            self.endpoint = endpoint;
        }

        if let Some(raw) = lookup(QUILL_RENDER_INTERVAL_ENV) {
            self.render_interval_ms = raw.trim().parse().map_err(|_| {
                QuillError::invalid_config(
                    "render_interval_ms",
                    format!("{QUILL_RENDER_INTERVAL_ENV} must be a number, got '{raw}'"),
                )
            })?;
        }
        Ok(())
    }

    /// Check the configuration for values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(QuillError::invalid_config("endpoint", "must not be empty"));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(QuillError::invalid_config(
                "endpoint",
                format!("'{}' is not an http(s) URL", self.endpoint),
            ));
        }
        if self.render_interval_ms == 0 {
            return Err(QuillError::invalid_config(
                "render_interval_ms",
                "must be greater than zero (set typewriter = false to disable pacing)",
            ));
        }
        if self.render_interval_ms > MAX_RENDER_INTERVAL_MS {
            return Err(QuillError::invalid_config(
                "render_interval_ms",
                format!("must be at most {MAX_RENDER_INTERVAL_MS}"),
            ));
        }
        if self.max_input_chars == 0 {
            return Err(QuillError::invalid_config(
                "max_input_chars",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Delay between typed characters; zero when the typewriter is off.
    pub fn render_interval(&self) -> Duration {
        if self.typewriter {
            Duration::from_millis(self.render_interval_ms)
        } else {
            Duration::ZERO
        }
    }

    /// Idle timeout, or `None` when disabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Find the Quill home directory.
///
/// `QUILL_HOME` wins, otherwise `~/.quill`.
pub fn find_quill_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var(QUILL_HOME_ENV)
        && !val.is_empty()
    {
        debug!(path = %val, "Using QUILL_HOME");
        return Some(PathBuf::from(val));
    }
    dirs::home_dir().map(|home| home.join(".quill"))
}

/// Resolve the config file path without checking that it exists.
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(val) = std::env::var(QUILL_CONFIG_ENV)
        && !val.is_empty()
    {
        return Some(PathBuf::from(val));
    }
    find_quill_home().map(|home| home.join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.render_interval(), Duration::from_millis(30));
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(config.max_input_chars, 50_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "endpoint = \"https://convert.example.com/stream\"\nidle_timeout_secs = 0\n",
        )
        .unwrap();

        let config = EngineConfig::load_from(&path).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint, "https://convert.example.com/stream");
        assert_eq!(config.idle_timeout(), None);
        assert_eq!(config.render_interval_ms, 30);
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "render_interval_ms = \"fast\"").unwrap();

        let err = EngineConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, QuillError::TomlParse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EngineConfig::default();
        config
            .apply_overrides(env(&[
                (QUILL_ENDPOINT_ENV, "http://127.0.0.1:9000/stream"),
                (QUILL_RENDER_INTERVAL_ENV, "5"),
            ]))
            .unwrap();
        assert_eq!(config.endpoint, "http://127.0.0.1:9000/stream");
        assert_eq!(config.render_interval_ms, 5);
    }

    #[test]
    fn test_blank_endpoint_override_is_ignored() {
        let mut config = EngineConfig::default();
        config
            .apply_overrides(env(&[(QUILL_ENDPOINT_ENV, "  ")]))
            .unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_bad_interval_override() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_overrides(env(&[(QUILL_RENDER_INTERVAL_ENV, "fast")]))
            .unwrap_err();
        assert!(matches!(err, QuillError::InvalidConfig { ref field, .. } if field == "render_interval_ms"));
    }

    #[test]
    fn test_validate_rejects_zero_interval_and_empty_endpoint() {
        let config = EngineConfig {
            render_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            endpoint: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_huge_interval() {
        let config = EngineConfig {
            render_interval_ms: u64::MAX,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, QuillError::InvalidConfig { ref field, .. } if field == "render_interval_ms"));

        let config = EngineConfig {
            render_interval_ms: MAX_RENDER_INTERVAL_MS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_typewriter_off_drains_immediately() {
        let config = EngineConfig {
            typewriter: false,
            ..Default::default()
        };
        assert_eq!(config.render_interval(), Duration::ZERO);
        assert!(config.validate().is_ok());
    }
}
