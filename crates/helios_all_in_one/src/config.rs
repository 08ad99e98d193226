use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Location stamped on samples that arrive without one
    #[serde(default = "default_site_name")]
    pub site_name: String,

    /// Where samples and insights are kept (postgres, memory)
    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,

    // Insight derivation
    /// Samples read after each ingest. Must be non-zero. At 24 the period
    /// summary never fires per sample; larger values let it become the
    /// per-sample insight.
    #[serde(default = "default_insight_window_size")]
    pub insight_window_size: usize,

    /// Samples read by a manual generation run. Must be non-zero. Below 25
    /// the period summary has nothing to compare against.
    #[serde(default = "default_generation_window_size")]
    pub generation_window_size: usize,

    // NATS configuration
    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// NATS JetStream stream carrying telemetry samples
    #[serde(default = "default_nats_telemetry_stream")]
    pub nats_telemetry_stream: String,

    /// NATS subject pattern for consumer filter
    #[serde(default = "default_nats_telemetry_subject")]
    pub nats_telemetry_subject: String,

    /// Durable consumer name
    #[serde(default = "default_nats_consumer_name")]
    pub nats_consumer_name: String,

    /// Batch size for consumer
    #[serde(default = "default_nats_batch_size")]
    pub nats_batch_size: usize,

    /// Max wait time for batches in seconds
    #[serde(default = "default_nats_batch_wait_secs")]
    pub nats_batch_wait_secs: u64,

    /// Deliveries after which a message is abandoned
    #[serde(default = "default_nats_max_deliver")]
    pub nats_max_deliver: i64,

    /// Delay before a rejected message is redelivered, in milliseconds
    #[serde(default = "default_nats_redelivery_delay_ms")]
    pub nats_redelivery_delay_ms: u64,

    /// Startup timeout for initialization operations in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    // PostgreSQL configuration
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    #[serde(default = "default_postgres_max_pool_size")]
    pub postgres_max_pool_size: usize,

    /// Path to PostgreSQL migrations directory
    #[serde(default = "default_postgres_migrations_dir")]
    pub postgres_migrations_dir: String,

    /// Path to goose binary
    #[serde(default = "default_postgres_goose_binary_path")]
    pub postgres_goose_binary_path: String,

    // OpenTelemetry configuration
    /// OpenTelemetry OTLP endpoint (gRPC)
    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    /// Enable OpenTelemetry export
    #[serde(default = "default_otel_enabled")]
    pub otel_enabled: bool,

    /// Service name for OpenTelemetry resource
    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_site_name() -> String {
    "São Paulo, BR".to_string()
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Postgres
}

fn default_insight_window_size() -> usize {
    24
}

fn default_generation_window_size() -> usize {
    48
}

// NATS defaults
fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_nats_telemetry_stream() -> String {
    "telemetry_samples".to_string()
}

fn default_nats_telemetry_subject() -> String {
    "telemetry_samples.>".to_string()
}

fn default_nats_consumer_name() -> String {
    "helios-insight-engine".to_string()
}

fn default_nats_batch_size() -> usize {
    30
}

fn default_nats_batch_wait_secs() -> u64 {
    5
}

fn default_nats_max_deliver() -> i64 {
    10
}

fn default_nats_redelivery_delay_ms() -> u64 {
    2_000
}

fn default_startup_timeout_secs() -> u64 {
    30
}

// PostgreSQL defaults
fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "helios".to_string()
}

fn default_postgres_username() -> String {
    "helios".to_string()
}

fn default_postgres_password() -> String {
    "helios".to_string()
}

fn default_postgres_max_pool_size() -> usize {
    5
}

fn default_postgres_migrations_dir() -> String {
    "crates/common/migrations/postgres".to_string()
}

fn default_postgres_goose_binary_path() -> String {
    "goose".to_string()
}

// OpenTelemetry defaults
fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_enabled() -> bool {
    false
}

fn default_otel_service_name() -> String {
    "helios".to_string()
}

impl ServiceConfig {
    /// Load configuration from `HELIOS_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(Environment::with_prefix("HELIOS"))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.insight_window_size == 0 {
            return Err(ConfigError::Message(
                "insight_window_size must be greater than zero".to_string(),
            ));
        }
        if self.generation_window_size == 0 {
            return Err(ConfigError::Message(
                "generation_window_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure tests run serially and don't interfere with each other
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "HELIOS_LOG_LEVEL",
        "HELIOS_SITE_NAME",
        "HELIOS_STORAGE_BACKEND",
        "HELIOS_NATS_BATCH_SIZE",
        "HELIOS_INSIGHT_WINDOW_SIZE",
        "HELIOS_GENERATION_WINDOW_SIZE",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: Test runs with mutex lock to prevent concurrent env access
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_default_config() {
        let _lock = TEST_LOCK.lock().unwrap();
        clear_env();

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.site_name, "São Paulo, BR");
        assert_eq!(config.storage_backend, StorageBackend::Postgres);
        assert_eq!(config.insight_window_size, 24);
        assert_eq!(config.generation_window_size, 48);
        assert_eq!(config.nats_telemetry_subject, "telemetry_samples.>");
        assert_eq!(config.nats_max_deliver, 10);
    }

    #[test]
    fn test_custom_config() {
        let _lock = TEST_LOCK.lock().unwrap();

        // SAFETY: Test runs with mutex lock to prevent concurrent env access
        unsafe {
            std::env::set_var("HELIOS_LOG_LEVEL", "debug");
            std::env::set_var("HELIOS_SITE_NAME", "Lisbon, PT");
            std::env::set_var("HELIOS_STORAGE_BACKEND", "memory");
            std::env::set_var("HELIOS_NATS_BATCH_SIZE", "10");
        }

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.site_name, "Lisbon, PT");
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.nats_batch_size, 10);

        clear_env();
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let _lock = TEST_LOCK.lock().unwrap();

        // SAFETY: Test runs with mutex lock to prevent concurrent env access
        unsafe {
            std::env::set_var("HELIOS_STORAGE_BACKEND", "sqlite");
        }

        assert!(ServiceConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    fn test_zero_window_sizes_are_rejected() {
        let _lock = TEST_LOCK.lock().unwrap();

        for var in ["HELIOS_INSIGHT_WINDOW_SIZE", "HELIOS_GENERATION_WINDOW_SIZE"] {
            clear_env();
            // SAFETY: Test runs with mutex lock to prevent concurrent env access
            unsafe {
                std::env::set_var(var, "0");
            }

            let err = ServiceConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("must be greater than zero"), "{}", var);
        }

        clear_env();
    }
}
