use crate::{Error, Result};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Credentials and addressing for the remote document store.
#[derive(Clone)]
pub struct AzureConfig {
    pub account: String,
    /// Base64 master key, decoded once when the backend is built.
    pub key: String,
    pub database: String,
    pub collection: String,
}

impl AzureConfig {
    pub const DEFAULT_DATABASE: &str = "prebidcache";
    pub const DEFAULT_COLLECTION: &str = "cache";

    pub fn new(account: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            key: key.into(),
            database: Self::DEFAULT_DATABASE.to_string(),
            collection: Self::DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl std::fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureConfig")
            .field("account", &self.account)
            .field("key", &"<redacted>")
            .field("database", &self.database)
            .field("collection", &self.collection)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub enum BackendConfig {
    Memory {
        max_entries: Option<u64>,
        default_ttl: Option<Duration>,
    },
    Azure(AzureConfig),
}

impl BackendConfig {
    pub fn name(&self) -> &'static str {
        match self {
            BackendConfig::Memory { .. } => "memory",
            BackendConfig::Azure(_) => "azure",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestLimits {
    pub max_num_values: usize,
    pub max_value_bytes: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_num_values: Config::DEFAULT_MAX_NUM_VALUES,
            max_value_bytes: Config::DEFAULT_MAX_VALUE_BYTES,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub http_port: u16,
    pub backend: BackendConfig,
    pub limits: RequestLimits,
    pub request_timeout: Option<Duration>,
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_HTTP_PORT: u16 = 2424;
    const DEFAULT_MAX_NUM_VALUES: usize = 10;
    const DEFAULT_MAX_VALUE_BYTES: usize = 10 * 1024;

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source. `from_env` is this
    /// over the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("CACHE_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let http_port = parse_or(&lookup, "CACHE_HTTP_PORT", Self::DEFAULT_HTTP_PORT);

        let backend = match lookup("CACHE_BACKEND")
            .unwrap_or_else(|| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => BackendConfig::Memory {
                max_entries: parse_opt(&lookup, "CACHE_MEMORY_MAX_ENTRIES"),
                default_ttl: parse_opt(&lookup, "CACHE_DEFAULT_TTL_SECONDS")
                    .map(Duration::from_secs),
            },
            "azure" => {
                let account = required(&lookup, "CACHE_AZURE_ACCOUNT")?;
                let key = required(&lookup, "CACHE_AZURE_KEY")?;
                let mut azure = AzureConfig::new(account, key);
                if let Some(database) = lookup("CACHE_AZURE_DATABASE") {
                    azure.database = database;
                }
                if let Some(collection) = lookup("CACHE_AZURE_COLLECTION") {
                    azure.collection = collection;
                }
                BackendConfig::Azure(azure)
            }
            other => {
                return Err(Error::Configuration(format!(
                    "unknown backend '{other}', expected 'memory' or 'azure'"
                )));
            }
        };

        Ok(Self {
            host,
            http_port,
            backend,
            limits: RequestLimits {
                max_num_values: parse_or(
                    &lookup,
                    "CACHE_MAX_NUM_VALUES",
                    Self::DEFAULT_MAX_NUM_VALUES,
                ),
                max_value_bytes: parse_or(
                    &lookup,
                    "CACHE_MAX_VALUE_BYTES",
                    Self::DEFAULT_MAX_VALUE_BYTES,
                ),
            },
            request_timeout: parse_opt(&lookup, "CACHE_REQUEST_TIMEOUT_MS")
                .map(Duration::from_millis),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

fn required<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Configuration(format!("{name} must be set")))
}

fn parse_opt<F, T>(lookup: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("{name}={raw} is not a valid value, ignoring it");
            None
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    parse_opt(lookup, name).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:2424");
        assert_eq!(config.limits, RequestLimits::default());
        assert!(config.request_timeout.is_none());
        assert!(matches!(
            config.backend,
            BackendConfig::Memory {
                max_entries: None,
                default_ttl: None
            }
        ));
    }

    #[test]
    fn test_azure_backend() {
        let config = config_from(&[
            ("CACHE_BACKEND", "Azure"),
            ("CACHE_AZURE_ACCOUNT", "acct"),
            ("CACHE_AZURE_KEY", "c2VjcmV0"),
            ("CACHE_AZURE_COLLECTION", "entries"),
        ])
        .unwrap();

        match config.backend {
            BackendConfig::Azure(azure) => {
                assert_eq!(azure.account, "acct");
                assert_eq!(azure.key, "c2VjcmV0");
                assert_eq!(azure.database, AzureConfig::DEFAULT_DATABASE);
                assert_eq!(azure.collection, "entries");
            }
            other => panic!("expected azure backend, got {other:?}"),
        }
    }

    #[test]
    fn test_azure_requires_credentials() {
        let err = config_from(&[("CACHE_BACKEND", "azure"), ("CACHE_AZURE_ACCOUNT", "acct")])
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(msg) if msg.contains("CACHE_AZURE_KEY")));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = config_from(&[("CACHE_BACKEND", "redis")]).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_malformed_numbers_fall_back() {
        let config = config_from(&[
            ("CACHE_HTTP_PORT", "not-a-port"),
            ("CACHE_MAX_NUM_VALUES", "3"),
            ("CACHE_REQUEST_TIMEOUT_MS", "250"),
            ("CACHE_DEFAULT_TTL_SECONDS", "-1"),
        ])
        .unwrap();

        assert_eq!(config.http_port, 2424);
        assert_eq!(config.limits.max_num_values, 3);
        assert_eq!(config.request_timeout, Some(Duration::from_millis(250)));
        assert!(matches!(
            config.backend,
            BackendConfig::Memory {
                default_ttl: None,
                ..
            }
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let azure = AzureConfig::new("acct", "c2VjcmV0");
        let printed = format!("{azure:?}");
        assert!(!printed.contains("c2VjcmV0"));
        assert!(printed.contains("<redacted>"));
    }
}
