//! Configuration loading and validation for the asset validator.
//!
//! Configuration is loaded from multiple sources in order of precedence
//! (highest wins):
//!
//! 1. Environment variables, prefixed `VALIDATOR__` with `__` as the
//!    section separator (e.g. `VALIDATOR__NODE__URL`).
//! 2. An optional TOML file passed via `--config`.
//! 3. Built-in defaults.
//!
//! # Example
//!
//! ```ignore
//! use asset_validator::config::Settings;
//!
//! let settings = Settings::load(None)?;
//! println!("node URL: {}", settings.node.url);
//! ```

mod settings;

pub use settings::{
    CmcSettings, DigestSettings, IgnoreSettings, KafkaSettings, LoggingSettings, NodeSettings,
    ReceiptSettings, ScanSettings, Settings,
};
