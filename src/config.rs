//! Configuration management for PagePilot
//!
//! Parses TOML configuration files and provides typed access to settings.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::{AppError, AppResult};

/// Default per-attempt provider timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
/// Default number of retries after the initial attempt
pub const DEFAULT_MAX_RETRIES: usize = 2;
/// Default free-query quota per installation
pub const DEFAULT_QUOTA: u32 = 25;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub usage: UsageConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Provider endpoints, one per backend model
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// General-knowledge / reasoning backend
    pub analytical: ProviderEndpoint,
    /// Search-grounded / current-events backend
    pub realtime: ProviderEndpoint,
}

/// Individual provider endpoint configuration
///
/// Fields are private to enforce invariants. Configuration is loaded via
/// deserialization and validated via Config::validate(). After construction,
/// fields cannot be mutated, ensuring validated data remains valid.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderEndpoint {
    base_url: String,
    model: String,
    api_key: String,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_temperature")]
    temperature: f64,
}

impl ProviderEndpoint {
    /// Construct an endpoint programmatically with default sampling settings
    ///
    /// Configuration files remain the normal construction path; this exists
    /// for embedders and tests that wire adapters directly.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }

    /// Get the endpoint base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the provider model identifier
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the maximum number of output tokens per response
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Get the sampling temperature
    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f64 {
    0.7
}

/// Retry/timeout settings for provider calls
///
/// # Custom Deserialization
///
/// This type implements custom `Deserialize` to enforce validation at parse
/// time. `max_retries` must be in 1..=3 and `timeout_ms` in (0, 120000].
/// Invalid values are rejected immediately during TOML parsing, not later
/// during `Config::validate()`, so invalid instances never exist.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionConfig {
    max_retries: usize,
    timeout_ms: u64,
}

impl ExecutionConfig {
    /// Get the number of retries applied after the initial attempt
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Get the per-attempt timeout in milliseconds
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl<'de> Deserialize<'de> for ExecutionConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawExecutionConfig {
            #[serde(default = "default_max_retries")]
            max_retries: usize,
            #[serde(default = "default_timeout_ms")]
            timeout_ms: u64,
        }

        let raw = RawExecutionConfig::deserialize(deserializer)?;

        if !(1..=3).contains(&raw.max_retries) {
            return Err(serde::de::Error::custom(format!(
                "execution.max_retries must be between 1 and 3, got {}",
                raw.max_retries
            )));
        }
        if raw.timeout_ms == 0 || raw.timeout_ms > 120_000 {
            return Err(serde::de::Error::custom(format!(
                "execution.timeout_ms must be in (0, 120000], got {}",
                raw.timeout_ms
            )));
        }

        Ok(ExecutionConfig {
            max_retries: raw.max_retries,
            timeout_ms: raw.timeout_ms,
        })
    }
}

fn default_max_retries() -> usize {
    DEFAULT_MAX_RETRIES
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Usage metering configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UsageConfig {
    #[serde(default = "default_quota")]
    pub quota: u32,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            quota: default_quota(),
        }
    }
}

fn default_quota() -> u32 {
    DEFAULT_QUOTA
}

/// Local persistent store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "pagepilot-store.json".to_string()
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field invariants that serde cannot express
    pub fn validate(&self) -> AppResult<()> {
        for (name, endpoint) in [
            ("analytical", &self.providers.analytical),
            ("realtime", &self.providers.realtime),
        ] {
            if endpoint.base_url.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "providers.{name}.base_url must not be empty"
                )));
            }
            if !endpoint.base_url.starts_with("http://") && !endpoint.base_url.starts_with("https://")
            {
                return Err(AppError::Config(format!(
                    "providers.{name}.base_url must start with http:// or https://, got '{}'",
                    endpoint.base_url
                )));
            }
            if endpoint.model.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "providers.{name}.model must not be empty"
                )));
            }
            if endpoint.api_key.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "providers.{name}.api_key must not be empty"
                )));
            }
            if endpoint.max_tokens == 0 {
                return Err(AppError::Config(format!(
                    "providers.{name}.max_tokens must be greater than zero"
                )));
            }
            if !(0.0..=2.0).contains(&endpoint.temperature) {
                return Err(AppError::Config(format!(
                    "providers.{name}.temperature must be in [0.0, 2.0], got {}",
                    endpoint.temperature
                )));
            }
        }

        if self.usage.quota == 0 {
            return Err(AppError::Config(
                "usage.quota must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_toml() -> &'static str {
        r#"
[server]
host = "127.0.0.1"
port = 3100

[providers.analytical]
base_url = "https://api.example-analytical.com"
model = "reasoner-large"
api_key = "sk-test-key"
max_tokens = 1024
temperature = 0.7

[providers.realtime]
base_url = "https://api.example-search.com"
model = "search-online"
api_key = "pplx-test-key"

[execution]
max_retries = 2
timeout_ms = 15000

[usage]
quota = 25

[storage]
path = "store.json"

[observability]
log_level = "info"
"#
    }

    #[test]
    fn test_parses_valid_config() {
        let config: Config = toml::from_str(valid_toml()).expect("should parse");
        config.validate().expect("should validate");

        assert_eq!(config.server.port, 3100);
        assert_eq!(config.providers.analytical.model(), "reasoner-large");
        assert_eq!(config.providers.realtime.max_tokens(), 1024);
        assert_eq!(config.execution.max_retries(), 2);
        assert_eq!(config.execution.timeout_ms(), 15_000);
        assert_eq!(config.usage.quota, 25);
    }

    #[test]
    fn test_defaults_applied_when_sections_missing() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 3100

[providers.analytical]
base_url = "https://a.example.com"
model = "m"
api_key = "k"

[providers.realtime]
base_url = "https://r.example.com"
model = "m"
api_key = "k"
"#;
        let config: Config = toml::from_str(toml).expect("should parse");
        assert_eq!(config.execution.max_retries(), DEFAULT_MAX_RETRIES);
        assert_eq!(config.execution.timeout_ms(), DEFAULT_TIMEOUT_MS);
        assert_eq!(config.usage.quota, DEFAULT_QUOTA);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_rejects_zero_retries_at_parse_time() {
        let toml = valid_toml().replace("max_retries = 2", "max_retries = 0");
        let result: Result<Config, _> = toml::from_str(&toml);
        assert!(result.is_err(), "max_retries = 0 should be rejected");
    }

    #[test]
    fn test_rejects_excessive_retries_at_parse_time() {
        let toml = valid_toml().replace("max_retries = 2", "max_retries = 10");
        let result: Result<Config, _> = toml::from_str(&toml);
        assert!(result.is_err(), "max_retries = 10 should be rejected");
    }

    #[test]
    fn test_rejects_zero_timeout_at_parse_time() {
        let toml = valid_toml().replace("timeout_ms = 15000", "timeout_ms = 0");
        let result: Result<Config, _> = toml::from_str(&toml);
        assert!(result.is_err(), "timeout_ms = 0 should be rejected");
    }

    #[test]
    fn test_validate_rejects_empty_api_key() {
        let toml = valid_toml().replace(r#"api_key = "sk-test-key""#, r#"api_key = """#);
        let config: Config = toml::from_str(&toml).expect("should parse");
        let err = config.validate().expect_err("should reject empty key");
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_validate_rejects_non_http_base_url() {
        let toml = valid_toml().replace(
            r#"base_url = "https://api.example-analytical.com""#,
            r#"base_url = "ftp://api.example-analytical.com""#,
        );
        let config: Config = toml::from_str(&toml).expect("should parse");
        let err = config.validate().expect_err("should reject ftp url");
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_validate_rejects_zero_quota() {
        let toml = valid_toml().replace("quota = 25", "quota = 0");
        let config: Config = toml::from_str(&toml).expect("should parse");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_temperature() {
        let toml = valid_toml().replace("temperature = 0.7", "temperature = 3.5");
        let config: Config = toml::from_str(&toml).expect("should parse");
        assert!(config.validate().is_err());
    }
}
