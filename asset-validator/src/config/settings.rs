//! Settings structs and loading logic.
//!
//! All settings have sensible defaults and can be overridden via
//! environment variables or a configuration file.

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Ethereum JSON-RPC node connection.
    pub node: NodeSettings,
    /// Adaptive block-range / log-scanner tuning.
    pub scan: ScanSettings,
    /// Receipt-fetcher worker pool.
    pub receipts: ReceiptSettings,
    /// Ranged quantile digest tuning.
    pub digest: DigestSettings,
    /// Ignore-list glob classification.
    pub ignore: IgnoreSettings,
    /// Kafka request/response service shell.
    pub kafka: KafkaSettings,
    /// CoinMarketCap-style external cross-check client.
    pub cmc: CmcSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings from built-in defaults, an optional TOML file, and
    /// `VALIDATOR__`-prefixed environment variables, in that order of
    /// increasing precedence.
    ///
    /// # Errors
    /// Returns `ConfigError` if configuration is invalid or cannot be loaded.
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("node.url", "http://localhost:8545")?
            .set_default("node.request_timeout_secs", 5)?
            .set_default("node.max_retries", 3)?
            .set_default("scan.target_time_secs", 2.0)?
            .set_default("scan.min_batch_size", 2)?
            .set_default("scan.max_batch_size", 1_000_000)?
            .set_default("scan.speed_change_factor", 1.0)?
            .set_default("scan.exception_speed_factor", 0.1)?
            .set_default("scan.max_change_ratio", 2.0)?
            .set_default("scan.protocol_error_backoff_secs", 10)?
            .set_default("receipts.concurrency", 100)?
            .set_default("digest.hard_fork_block", 4_370_000)?
            .set_default("digest.delta", 0.01)?
            .set_default("ignore.globs", Vec::<String>::new())?
            .set_default("kafka.brokers", "localhost:9092")?
            .set_default("kafka.group_id", "mygroup")?
            .set_default("kafka.input_topic", "asset_validation_request")?
            .set_default("kafka.output_topic", "asset_validation_response")?
            .set_default("kafka.poll_timeout_secs", 15)?
            .set_default("cmc.base_url", "https://api.coinmarketcap.com")?
            .set_default("cmc.api_key", "")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("VALIDATOR")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Load settings from a specific file path, ignoring defaults and
    /// environment variables. Used by tests that want a fully explicit
    /// configuration.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    /// Validate settings and return any validation errors.
    ///
    /// Every field is checked rather than stopping at the first problem,
    /// so a misconfigured deployment gets a complete report in one pass.
    ///
    /// # Errors
    /// Returns a list of validation error messages.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.node.url.is_empty() {
            errors.push("node.url cannot be empty".into());
        }
        if self.node.request_timeout_secs == 0 {
            errors.push("node.request_timeout_secs must be non-zero".into());
        }

        if self.scan.min_batch_size == 0 {
            errors.push("scan.min_batch_size must be non-zero".into());
        }
        if self.scan.min_batch_size > self.scan.max_batch_size {
            errors.push("scan.min_batch_size cannot exceed scan.max_batch_size".into());
        }
        if self.scan.target_time_secs <= 0.0 {
            errors.push("scan.target_time_secs must be positive".into());
        }
        if self.scan.max_change_ratio < 1.0 {
            errors.push("scan.max_change_ratio must be at least 1.0".into());
        }

        if self.receipts.concurrency == 0 {
            errors.push("receipts.concurrency must be non-zero".into());
        }

        if self.digest.delta <= 0.0 || self.digest.delta >= 1.0 {
            errors.push("digest.delta must be between 0 and 1".into());
        }

        if self.kafka.brokers.is_empty() {
            errors.push("kafka.brokers cannot be empty".into());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Ethereum JSON-RPC node connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSettings {
    /// HTTP(S) RPC endpoint URL.
    pub url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Maximum automatic retries for transient errors at the client level.
    pub max_retries: u32,
}

impl NodeSettings {
    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Adaptive block-range and log-scanner tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanSettings {
    /// Target latency per `eth_getLogs` call, in seconds.
    pub target_time_secs: f64,
    /// Minimum batch size (block count per interval).
    pub min_batch_size: u64,
    /// Maximum batch size.
    pub max_batch_size: u64,
    /// Multiplier applied to the latency-derived ratio before clamping.
    pub speed_change_factor: f64,
    /// Shrink factor applied to the batch size on a transient error.
    pub exception_speed_factor: f64,
    /// Maximum ratio by which the batch size may change in one step.
    pub max_change_ratio: f64,
    /// Fixed backoff after a node-protocol error, in seconds.
    pub protocol_error_backoff_secs: u64,
}

impl ScanSettings {
    /// Get the target per-call latency as a `Duration`.
    #[must_use]
    pub const fn target_time(&self) -> Duration {
        Duration::from_secs(self.target_time_secs as u64)
    }

    /// Get the fixed post-protocol-error backoff as a `Duration`.
    #[must_use]
    pub const fn protocol_error_backoff(&self) -> Duration {
        Duration::from_secs(self.protocol_error_backoff_secs)
    }
}

/// Receipt-fetcher worker-pool settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptSettings {
    /// Maximum number of in-flight receipt/transaction fetches.
    pub concurrency: usize,
}

/// Ranged quantile digest tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct DigestSettings {
    /// Block height of the last relevant hard fork, the lower band boundary.
    pub hard_fork_block: u64,
    /// Target relative accuracy of the backing sketch, converted into the
    /// significant-figures precision `hdrhistogram` is built with (see
    /// `src/digest.rs`).
    pub delta: f64,
}

/// Ignore-list glob classification.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct IgnoreSettings {
    /// Glob patterns: `method`, `SYMBOL.method`, `SYMBOL.*`, `*.method`.
    pub globs: Vec<String>,
}

/// Kafka request/response service shell settings.
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaSettings {
    /// Comma-separated bootstrap broker list.
    pub brokers: String,
    /// Consumer group id.
    pub group_id: String,
    /// Input (request) topic.
    pub input_topic: String,
    /// Output (response) topic.
    pub output_topic: String,
    /// Poll timeout in seconds.
    pub poll_timeout_secs: u64,
}

impl KafkaSettings {
    /// Get the poll timeout as a `Duration`.
    #[must_use]
    pub const fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

/// CoinMarketCap-style external cross-check client settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CmcSettings {
    /// Base URL of the asset-map endpoint.
    pub base_url: String,
    /// API key. Sourced from configuration, never compiled in.
    pub api_key: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format (`pretty` or `json`).
    pub format: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn node_durations() {
        let node = NodeSettings {
            url: "http://localhost:8545".into(),
            request_timeout_secs: 5,
            max_retries: 3,
        };

        assert_eq!(node.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn scan_durations() {
        let scan = ScanSettings {
            target_time_secs: 2.0,
            min_batch_size: 2,
            max_batch_size: 1_000_000,
            speed_change_factor: 1.0,
            exception_speed_factor: 0.1,
            max_change_ratio: 2.0,
            protocol_error_backoff_secs: 10,
        };

        assert_eq!(scan.target_time(), Duration::from_secs(2));
        assert_eq!(scan.protocol_error_backoff(), Duration::from_secs(10));
    }

    #[test]
    fn defaults_load_and_are_valid() {
        let settings = Settings::load(None).expect("defaults alone must deserialize");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validation_catches_zero_concurrency() {
        let mut settings = create_valid_settings();
        settings.receipts.concurrency = 0;

        let result = settings.validate();
        assert!(result.is_err());
        let errors = result.unwrap_err();
        assert!(errors.iter().any(|e| e.contains("concurrency")));
    }

    #[test]
    fn validation_catches_min_exceeds_max() {
        let mut settings = create_valid_settings();
        settings.scan.min_batch_size = 20;
        settings.scan.max_batch_size = 10;

        let result = settings.validate();
        assert!(result.is_err());
        let errors = result.unwrap_err();
        assert!(errors.iter().any(|e| e.contains("min_batch_size")));
    }

    #[test]
    fn validation_accumulates_multiple_errors() {
        let mut settings = create_valid_settings();
        settings.node.url = String::new();
        settings.receipts.concurrency = 0;

        let errors = settings.validate().expect_err("must fail");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn environment_override_takes_precedence() {
        std::env::set_var("VALIDATOR__NODE__URL", "https://example.invalid");
        let settings = Settings::load(None).expect("must load");
        std::env::remove_var("VALIDATOR__NODE__URL");
        assert_eq!(settings.node.url, "https://example.invalid");
    }

    fn create_valid_settings() -> Settings {
        Settings {
            node: NodeSettings {
                url: "http://localhost:8545".into(),
                request_timeout_secs: 5,
                max_retries: 3,
            },
            scan: ScanSettings {
                target_time_secs: 2.0,
                min_batch_size: 2,
                max_batch_size: 1_000_000,
                speed_change_factor: 1.0,
                exception_speed_factor: 0.1,
                max_change_ratio: 2.0,
                protocol_error_backoff_secs: 10,
            },
            receipts: ReceiptSettings { concurrency: 100 },
            digest: DigestSettings {
                hard_fork_block: 4_370_000,
                delta: 0.01,
            },
            ignore: IgnoreSettings { globs: vec![] },
            kafka: KafkaSettings {
                brokers: "localhost:9092".into(),
                group_id: "mygroup".into(),
                input_topic: "asset_validation_request".into(),
                output_topic: "asset_validation_response".into(),
                poll_timeout_secs: 15,
            },
            cmc: CmcSettings {
                base_url: "https://api.coinmarketcap.com".into(),
                api_key: String::new(),
            },
            logging: LoggingSettings {
                level: "info".into(),
                format: "pretty".into(),
            },
        }
    }
}
