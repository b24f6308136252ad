use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tagpulse::AnalyticsConfig;

pub const DEFAULT_CONFIG_FILE: &str = "tagpulse.toml";

/// Loaded configuration plus where it came from.
pub struct AppContext {
    /// Config file that was read, if any.
    pub config_path: Option<PathBuf>,
    pub config: TagpulseConfig,
}

/// Configuration stored in tagpulse.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagpulseConfig {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub redis: RedisSettings,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Process-local store seeded with the demo dataset on every run
    #[default]
    Memory,
    /// Redis store, persistent across runs
    Redis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            prefix: default_prefix(),
        }
    }
}

fn default_prefix() -> String {
    "tagpulse".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettings {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

fn default_redis_url() -> String {
    "${REDIS_URL}".to_string()
}

impl AppContext {
    /// Loads `path`, or `tagpulse.toml` from the current directory when no
    /// path is given. A missing default file means built-in defaults; a
    /// missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self {
                        config_path: None,
                        config: TagpulseConfig::default(),
                    })
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: TagpulseConfig =
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Self {
            config_path: Some(path.to_path_buf()),
            config,
        })
    }

    /// Get the Redis URL, expanding environment variables and checking it
    /// parses as a redis URL.
    pub fn redis_url(&self) -> Result<String> {
        let url = expand_env(&self.config.redis.url)?;
        validate_redis_url(&url)?;
        Ok(url)
    }
}

/// Replaces every `${VAR}` in `value` with the variable's value.
pub fn expand_env(value: &str) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .with_context(|| format!("Unterminated variable reference in '{value}'"))?;
        let var_name = &after[..end];
        let resolved =
            std::env::var(var_name).with_context(|| format!("Environment variable {var_name} not set"))?;
        out.push_str(&resolved);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

pub fn validate_redis_url(raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw).with_context(|| format!("Invalid Redis URL '{raw}'"))?;
    match parsed.scheme() {
        "redis" | "rediss" | "unix" | "redis+unix" => Ok(()),
        other => anyhow::bail!("Unsupported Redis URL scheme '{other}' (expected redis:// or rediss://)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TagpulseConfig::default();
        assert_eq!(config.store.backend, Backend::Memory);
        assert_eq!(config.store.prefix, "tagpulse");
        assert_eq!(config.redis.url, "${REDIS_URL}");
        assert_eq!(config.analytics.overview_page_size, 10);
        assert_eq!(config.analytics.top_hashtags, 5);
    }

    #[test]
    fn test_config_serialization() {
        let config = TagpulseConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("backend = \"memory\""));
        assert!(toml_str.contains("default_range_days"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store]\nbackend = \"redis\"\n\n[analytics]\noverview_page_size = 50").unwrap();

        let ctx = AppContext::load(Some(file.path())).unwrap();
        assert_eq!(ctx.config.store.backend, Backend::Redis);
        assert_eq!(ctx.config.store.prefix, "tagpulse");
        assert_eq!(ctx.config.analytics.overview_page_size, 50);
        assert_eq!(ctx.config.analytics.default_range_days, 30);
        assert_eq!(ctx.config_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppContext::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    #[serial]
    fn test_redis_url_expands_environment() {
        unsafe { std::env::set_var("TAGPULSE_TEST_REDIS_HOST", "cache.internal") };
        let ctx = AppContext {
            config_path: None,
            config: TagpulseConfig {
                redis: RedisSettings {
                    url: "redis://${TAGPULSE_TEST_REDIS_HOST}:6379/2".to_string(),
                },
                ..TagpulseConfig::default()
            },
        };
        assert_eq!(ctx.redis_url().unwrap(), "redis://cache.internal:6379/2");
        unsafe { std::env::remove_var("TAGPULSE_TEST_REDIS_HOST") };
    }

    #[test]
    #[serial]
    fn test_unset_variable_is_reported() {
        unsafe { std::env::remove_var("TAGPULSE_TEST_UNSET") };
        let err = expand_env("${TAGPULSE_TEST_UNSET}").unwrap_err();
        assert!(err.to_string().contains("TAGPULSE_TEST_UNSET"));
    }

    #[test]
    fn test_redis_url_scheme_is_checked() {
        assert!(validate_redis_url("redis://localhost:6379").is_ok());
        assert!(validate_redis_url("http://localhost:6379").is_err());
        assert!(validate_redis_url("not a url").is_err());
        assert_eq!(expand_env("plain").unwrap(), "plain");
    }
}
