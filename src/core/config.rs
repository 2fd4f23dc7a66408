use crate::core::repository::Markets;
use crate::providers::RetryPolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EndpointConfig {
    pub base_url: String,
}

impl EndpointConfig {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ProvidersConfig {
    pub exchange_rate: EndpointConfig,
    pub p2p: EndpointConfig,
    pub binance: EndpointConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            exchange_rate: EndpointConfig::new("https://api.exchangerate-api.com"),
            p2p: EndpointConfig::new("https://criptoya.com"),
            binance: EndpointConfig::new("https://api.binance.com"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ScheduleConfig {
    pub rates_minutes: u64,
    pub crypto_minutes: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            rates_minutes: 30,
            crypto_minutes: 5,
        }
    }
}

/// Longest accepted refresh period, one week.
pub const MAX_SCHEDULE_MINUTES: u64 = 7 * 24 * 60;

fn period_from_minutes(minutes: u64) -> Duration {
    Duration::from_secs(minutes.clamp(1, MAX_SCHEDULE_MINUTES) * 60)
}

impl ScheduleConfig {
    pub fn rates_period(&self) -> Duration {
        period_from_minutes(self.rates_minutes)
    }

    pub fn crypto_period(&self) -> Duration {
        period_from_minutes(self.crypto_minutes)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: usize,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            attempts: policy.retries,
            delay_ms: policy.delay_ms,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_local_currency")]
    pub local_currency: String,
    #[serde(default = "default_stablecoin")]
    pub stablecoin: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub data_path: Option<String>,
}

fn default_local_currency() -> String {
    Markets::default().local_currency
}

fn default_stablecoin() -> String {
    Markets::default().stablecoin
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            local_currency: default_local_currency(),
            stablecoin: default_stablecoin(),
            providers: ProvidersConfig::default(),
            schedule: ScheduleConfig::default(),
            retry: RetryConfig::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the default config file, or built-in defaults when it does not exist.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "ratewatch", "ratewatch")
            .context("Could not determine project directories")
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn markets(&self) -> Markets {
        Markets {
            local_currency: self.local_currency.to_uppercase(),
            stablecoin: self.stablecoin.to_uppercase(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retry.attempts,
            delay_ms: self.retry.delay_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
local_currency: "ars"
providers:
  exchange_rate:
    base_url: "http://example.com/fx"
  p2p:
    base_url: "http://example.com/p2p"
  binance:
    base_url: "http://example.com/binance"
schedule:
  rates_minutes: 10
retry:
  attempts: 0
  delay_ms: 50
data_path: "/tmp/ratewatch"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.markets().local_currency, "ARS");
        assert_eq!(config.markets().stablecoin, "USDT");
        assert_eq!(config.providers.exchange_rate.base_url, "http://example.com/fx");
        assert_eq!(config.providers.p2p.base_url, "http://example.com/p2p");
        assert_eq!(config.providers.binance.base_url, "http://example.com/binance");
        assert_eq!(config.schedule.rates_period(), Duration::from_secs(600));
        assert_eq!(config.schedule.crypto_period(), Duration::from_secs(300));
        assert_eq!(config.retry_policy().retries, 0);
        assert_eq!(config.retry_policy().delay_ms, 50);
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/ratewatch")
        );
    }

    #[test]
    fn test_schedule_periods_are_bounded() {
        let schedule = ScheduleConfig {
            rates_minutes: u64::MAX,
            crypto_minutes: 0,
        };
        assert_eq!(
            schedule.rates_period(),
            Duration::from_secs(MAX_SCHEDULE_MINUTES * 60)
        );
        assert_eq!(schedule.crypto_period(), Duration::from_secs(60));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.local_currency, "VES");
        assert_eq!(
            config.providers.binance.base_url,
            "https://api.binance.com"
        );
        assert_eq!(config.schedule.rates_minutes, 30);
        assert!(config.data_path.is_none());
    }
}
