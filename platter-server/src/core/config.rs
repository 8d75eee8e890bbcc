use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::orders::PricingPolicy;
use crate::resilience::{BatchConfig, ResilientAccess, RetryPolicy};

/// Document store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Single-file redb database under `work_dir`
    #[default]
    Redb,
    /// Volatile, for tests and demos
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(StoreBackend::Redb),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | data directory (database file) |
/// | HTTP_PORT | 3000 | HTTP port |
/// | STORE_BACKEND | redb | `redb` or `memory` |
/// | ENVIRONMENT | development | environment name |
/// | LOG_LEVEL | info | log filter |
/// | LOG_DIR | - | enables daily rolling log files |
/// | RETRY_MAX_RETRIES | 3 | retries after the first attempt |
/// | RETRY_BASE_DELAY_MS | 1000 | backoff base |
/// | THROTTLE_MS | 100 | pause before each order insert |
/// | BATCH_SIZE | 5 | bulk operation batch size |
/// | BATCH_DELAY_MS | 200 | pause between batches |
/// | TAX_RATE | 0.10 | tax as a fraction of subtotal |
/// | DELIVERY_FEE | 3.99 | flat delivery fee |
/// | PREP_TIME_MINUTES | 20 | estimated ready time offset |
///
/// ```ignore
/// WORK_DIR=/srv/platter HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    pub store_backend: StoreBackend,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,

    pub retry_max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub throttle_ms: u64,
    pub batch_size: usize,
    pub batch_delay_ms: u64,

    pub tax_rate: Decimal,
    pub delivery_fee: Decimal,
    pub prep_time_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        let pricing = PricingPolicy::default();
        Self {
            work_dir: "./data".into(),
            http_port: 3000,
            store_backend: StoreBackend::default(),
            environment: "development".into(),
            log_level: "info".into(),
            log_dir: None,
            retry_max_retries: 3,
            retry_base_delay_ms: 1000,
            throttle_ms: 100,
            batch_size: 5,
            batch_delay_ms: 200,
            tax_rate: pricing.tax_rate,
            delivery_fee: pricing.delivery_fee,
            prep_time_minutes: pricing.prep_time_minutes,
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable environment variable");
            default
        }),
        Err(_) => default,
    }
}

impl Config {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or(d.work_dir),
            http_port: env_parse("HTTP_PORT", d.http_port),
            store_backend: env_parse("STORE_BACKEND", d.store_backend),
            environment: std::env::var("ENVIRONMENT").unwrap_or(d.environment),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(d.log_level),
            log_dir: std::env::var("LOG_DIR").ok().filter(|v| !v.is_empty()),
            retry_max_retries: env_parse("RETRY_MAX_RETRIES", d.retry_max_retries),
            retry_base_delay_ms: env_parse("RETRY_BASE_DELAY_MS", d.retry_base_delay_ms),
            throttle_ms: env_parse("THROTTLE_MS", d.throttle_ms),
            batch_size: env_parse("BATCH_SIZE", d.batch_size),
            batch_delay_ms: env_parse("BATCH_DELAY_MS", d.batch_delay_ms),
            tax_rate: env_parse("TAX_RATE", d.tax_rate),
            delivery_fee: env_parse("DELIVERY_FEE", d.delivery_fee),
            prep_time_minutes: env_parse("PREP_TIME_MINUTES", d.prep_time_minutes),
        }
    }

    /// In-memory store, no pauses; used by tests
    pub fn in_memory() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            throttle_ms: 0,
            batch_delay_ms: 0,
            retry_base_delay_ms: 1,
            ..Self::default()
        }
    }

    /// Location of the redb file
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("platter.redb")
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_retries,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    pub fn resilient_access(&self) -> ResilientAccess {
        ResilientAccess::new(
            self.retry_policy(),
            Duration::from_millis(self.throttle_ms),
            BatchConfig {
                size: self.batch_size.max(1),
                delay_between: Duration::from_millis(self.batch_delay_ms),
            },
        )
    }

    pub fn pricing(&self) -> PricingPolicy {
        PricingPolicy {
            tax_rate: self.tax_rate,
            delivery_fee: self.delivery_fee,
            prep_time_minutes: self.prep_time_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.store_backend, StoreBackend::Redb);
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.pricing(), PricingPolicy::default());
        assert_eq!(config.resilient_access().batch_config(), BatchConfig::default());
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!(" REDB ".parse::<StoreBackend>().unwrap(), StoreBackend::Redb);
        assert!("mongo".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_database_path_under_work_dir() {
        let config = Config {
            work_dir: "/srv/platter".into(),
            ..Config::default()
        };
        assert_eq!(config.database_path(), PathBuf::from("/srv/platter/platter.redb"));
    }
}
