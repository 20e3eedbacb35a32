//! Runtime configuration for automat.
//!
//! Settings for the scheduler thread and the log subscriber, stored as TOML
//! in the platform config directory.
//!
//! # Features
//!
//! - **Config File**: Load and save [`RuntimeConfig`] from TOML files
//! - **Validation**: Reject values the scheduler thread cannot use
//! - **Paths**: Platform-specific config directory
//!
//! # Example
//!
//! ```rust,no_run
//! use automat_config::{RuntimeConfig, config_file_path};
//!
//! let mut config = RuntimeConfig::load_or_default(None).unwrap();
//! config.scheduler.log_executed_tasks = true;
//! config.save(config_file_path()).unwrap();
//!
//! let options = config.thread_options();
//! ```

mod error;
mod runtime;

/// Platform-specific configuration paths.
pub mod paths;

/// Validation of runtime settings.
pub mod validation;

pub use error::{ConfigError, FileOp};
pub use paths::{CONFIG_FILE_NAME, config_file_path, ensure_user_config_dir, user_config_dir};
pub use runtime::{LoggingConfig, RuntimeConfig, SchedulerConfig, ThreadConfig};
pub use validation::{
    MAX_POLL_INTERVAL_MS, MIN_POLL_INTERVAL_MS, ValidationError, ValidationResult,
    validate_config, validate_filter, validate_poll_interval,
};
