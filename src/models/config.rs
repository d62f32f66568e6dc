use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;

use serde::Deserialize;

use crate::services::batches::{BatchOptions, DEFAULT_BATCH_SIZE, MAX_ASINS_PER_REQUEST};

/// Configuration options specific to the BSR lookup service.
///
/// Values are layered from `config/default.yaml`, `config/{APP_ENV}.yaml` and
/// `APP__*` environment variables, in that order.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Keepa API access key.
    pub keepa_api_key: String,
    #[serde(default = "default_keepa_base_url")]
    pub keepa_base_url: String,
    /// Keepa marketplace selector, `1` is amazon.com.
    #[serde(default = "default_keepa_domain")]
    pub keepa_domain: u8,
    #[serde(default = "default_batch_size")]
    pub batch_size: NonZeroUsize,
    #[serde(default = "default_max_asins")]
    pub max_asins: usize,
    /// Pause between consecutive batch calls, in milliseconds.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    /// Browser origins allowed by CORS.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Length of the per-client request window on `/api`, in milliseconds.
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,
    /// Requests one client address may make per window.
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: NonZeroU32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("keepa_api_key must be set")]
    MissingApiKey,
    #[error("batch_size must not exceed {max}, got {found}")]
    BatchSizeTooLarge { found: usize, max: usize },
    #[error("max_asins must be between 1 and {max}, got {found}")]
    MaxAsinsOutOfRange { found: usize, max: usize },
    #[error("rate_limit_window_ms must be positive")]
    EmptyRateLimitWindow,
}

impl ServerConfig {
    /// Loads and validates the configuration.
    pub fn load() -> Result<Self, ConfigError> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| default_environment());

        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{app_env}")).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("allowed_origins"),
            )
            .set_default("environment", app_env)?
            .build()?;

        let server_config: ServerConfig = settings.try_deserialize()?;
        server_config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.keepa_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.batch_size > DEFAULT_BATCH_SIZE {
            return Err(ConfigError::BatchSizeTooLarge {
                found: self.batch_size.get(),
                max: DEFAULT_BATCH_SIZE.get(),
            });
        }
        if self.max_asins == 0 || self.max_asins > MAX_ASINS_PER_REQUEST {
            return Err(ConfigError::MaxAsinsOutOfRange {
                found: self.max_asins,
                max: MAX_ASINS_PER_REQUEST,
            });
        }
        if self.rate_limit_window_ms == 0 {
            return Err(ConfigError::EmptyRateLimitWindow);
        }
        Ok(self)
    }

    /// Batching parameters derived from this configuration.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            batch_size: self.batch_size,
            max_asins: self.max_asins,
            pacing: Duration::from_millis(self.pacing_ms),
        }
    }

    /// Length of the inbound rate-limit window.
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    /// First characters of the API key, safe to print in logs.
    pub fn masked_api_key(&self) -> String {
        let prefix: String = self.keepa_api_key.chars().take(10).collect();
        format!("{prefix}...")
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_keepa_base_url() -> String {
    "https://api.keepa.com".to_string()
}

fn default_keepa_domain() -> u8 {
    1
}

fn default_batch_size() -> NonZeroUsize {
    BatchOptions::default().batch_size
}

fn default_max_asins() -> usize {
    BatchOptions::default().max_asins
}

fn default_pacing_ms() -> u64 {
    1000
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

fn default_rate_limit_window_ms() -> u64 {
    60_000
}

fn default_rate_limit_max() -> NonZeroU32 {
    NonZeroU32::new(60).unwrap_or(NonZeroU32::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> ServerConfig {
        config::Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn applies_defaults() {
        let config = parse("keepa_api_key: secret-key-value");
        assert_eq!(config.port, 3001);
        assert_eq!(config.keepa_base_url, "https://api.keepa.com");
        assert_eq!(config.keepa_domain, 1);
        assert_eq!(config.batch_size.get(), 20);
        assert_eq!(config.max_asins, 100);
        assert_eq!(config.batch_options().pacing, Duration::from_secs(1));
    }

    #[test]
    fn rejects_blank_api_key() {
        let config = parse("keepa_api_key: '  '");
        assert!(matches!(config.validate(), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn defaults_cors_and_inbound_limits() {
        let config = parse("keepa_api_key: secret-key-value");
        assert_eq!(
            config.allowed_origins,
            ["http://localhost:3000", "http://localhost:5173"]
        );
        assert_eq!(config.rate_limit_window(), Duration::from_secs(60));
        assert_eq!(config.rate_limit_max.get(), 60);
    }

    #[test]
    fn rejects_batch_size_over_keepa_cap() {
        let config = parse("keepa_api_key: key\nbatch_size: 21");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BatchSizeTooLarge { found: 21, max: 20 })
        ));
    }

    #[test]
    fn rejects_max_asins_outside_request_ceiling() {
        let config = parse("keepa_api_key: key\nmax_asins: 101");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MaxAsinsOutOfRange { found: 101, max: 100 })
        ));
        let config = parse("keepa_api_key: key\nmax_asins: 0");
        assert!(config.validate().is_err());
    }

    #[test]
    fn accepts_lower_limits() {
        let config = parse("keepa_api_key: key\nbatch_size: 5\nmax_asins: 50");
        let config = config.validate().unwrap();
        assert_eq!(config.batch_options().batch_size.get(), 5);
        assert_eq!(config.batch_options().max_asins, 50);
    }

    #[test]
    fn masks_api_key() {
        let config = parse("keepa_api_key: 9j4bnejfqn3tvh1dqfo3");
        assert_eq!(config.masked_api_key(), "9j4bnejfqn...");
    }
}
