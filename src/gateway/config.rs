use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use super::access::AccessKeySet;
use crate::env::Env;

pub const ENABLED_ENV: &str = "BUILTIN_MODEL_ENABLED";
pub const BASE_URL_ENV: &str = "BUILTIN_MODEL_BASE_URL";
pub const API_KEY_ENV: &str = "BUILTIN_MODEL_API_KEY";
pub const ACCESS_KEY_ENV: &str = "BUILTIN_MODEL_ACCESS_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Settings for the builtin model gateway, fixed for the life of the process.
#[derive(Clone)]
pub struct BuiltinModelConfig {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: Option<String>,
    pub access_keys: AccessKeySet,
    pub upstream_timeout: Duration,
}

impl std::fmt::Debug for BuiltinModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinModelConfig")
            .field("enabled", &self.enabled)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("access_keys", &self.access_keys)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}

impl Default for BuiltinModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            access_keys: AccessKeySet::default(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}

/// On-disk form; `access_keys` keeps the comma-separated env var shape.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuiltinModelFileConfig {
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    access_keys: String,
}

fn default_enabled() -> bool {
    true
}

impl BuiltinModelConfig {
    pub fn from_env(env: &Env) -> Self {
        let enabled = env.get_or(ENABLED_ENV, "true").to_lowercase() == "true";
        Self {
            enabled,
            base_url: env.get_or(BASE_URL_ENV, DEFAULT_BASE_URL),
            api_key: env.get(API_KEY_ENV),
            access_keys: AccessKeySet::parse(&env.get(ACCESS_KEY_ENV).unwrap_or_default()),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: BuiltinModelFileConfig = toml::from_str(raw)?;
        Ok(Self {
            enabled: file.enabled,
            base_url: file
                .base_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: file.api_key.filter(|key| !key.trim().is_empty()),
            access_keys: AccessKeySet::parse(&file.access_keys),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        })
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(contents: &str) -> Env {
        Env::parse_dotenv(contents)
    }

    #[test]
    fn from_env_reads_all_fields() {
        let config = BuiltinModelConfig::from_env(&env(
            "BUILTIN_MODEL_ENABLED=TRUE\nBUILTIN_MODEL_BASE_URL=http://upstream/v1\nBUILTIN_MODEL_API_KEY=sk-up\nBUILTIN_MODEL_ACCESS_KEY=abc, def\n",
        ));
        assert!(config.enabled);
        assert_eq!(config.base_url, "http://upstream/v1");
        assert_eq!(config.api_key.as_deref(), Some("sk-up"));
        assert_eq!(config.access_keys.len(), 2);
        assert_eq!(config.upstream_timeout, DEFAULT_UPSTREAM_TIMEOUT);
    }

    #[test]
    fn enabled_flag_is_true_only_for_true() {
        for (raw, expected) in [
            ("true", true),
            ("True", true),
            ("false", false),
            ("1", false),
            ("yes", false),
        ] {
            let config =
                BuiltinModelConfig::from_env(&env(&format!("BUILTIN_MODEL_ENABLED={raw}\n")));
            assert_eq!(config.enabled, expected, "{raw}");
        }
    }

    #[test]
    fn from_toml_applies_defaults() {
        let config = BuiltinModelConfig::from_toml_str("access_keys = \"abc\"\n").expect("toml");
        assert!(config.enabled);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.api_key.is_none());
        assert!(config.access_keys.contains("abc"));
    }

    #[test]
    fn from_toml_rejects_unknown_fields() {
        let err = BuiltinModelConfig::from_toml_str("access_key = \"abc\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn from_toml_file_reads_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("builtin.toml");
        std::fs::write(
            &path,
            "enabled = false\nbase_url = \"http://local/v1\"\napi_key = \"sk-file\"\naccess_keys = \"a,b\"\n",
        )
        .expect("write");
        let config = BuiltinModelConfig::from_toml_file(&path).expect("load");
        assert!(!config.enabled);
        assert_eq!(config.base_url, "http://local/v1");
        assert_eq!(config.access_keys.len(), 2);

        let missing = BuiltinModelConfig::from_toml_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = BuiltinModelConfig {
            api_key: Some("sk-secret".to_string()),
            access_keys: AccessKeySet::parse("access-secret"),
            ..BuiltinModelConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("access-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
