//! Runtime configuration file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use automat_core::ThreadOptions;

use crate::error::{ConfigError, FileOp};
use crate::validation::{ValidationResult, validate_config};

/// Settings read by the scheduler thread and the log subscriber.
///
/// Every section and key is optional; missing values take their defaults.
///
/// # TOML Format
///
/// ```toml
/// [scheduler]
/// log_executed_tasks = false
/// poll_interval_ms = 50
///
/// [thread]
/// name = "automat"
///
/// [logging]
/// filter = "info"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Task queue settings.
    pub scheduler: SchedulerConfig,
    /// Scheduler thread settings.
    pub thread: ThreadConfig,
    /// Log subscriber settings.
    pub logging: LoggingConfig,
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Log every executed task at debug level.
    pub log_executed_tasks: bool,
    /// How long the idle scheduler thread waits before checking for shutdown.
    pub poll_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            log_executed_tasks: false,
            poll_interval_ms: 50,
        }
    }
}

/// `[thread]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ThreadConfig {
    /// Name of the scheduler thread.
    pub name: String,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            name: "automat".to_string(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io(FileOp::Read, path, e))?;
        Self::from_toml(&content)
    }

    /// Load `path` if given, else the user config file if it exists, else
    /// the defaults.
    ///
    /// An explicitly given path must exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = crate::paths::config_file_path();
        if default_path.is_file() {
            Self::load(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::io(FileOp::CreateDir, parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::io(FileOp::Write, path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every section.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_config(self)
    }

    /// Options for spawning the scheduler thread.
    pub fn thread_options(&self) -> ThreadOptions {
        ThreadOptions {
            name: self.thread.name.clone(),
            poll_interval: Duration::from_millis(self.scheduler.poll_interval_ms),
            log_executed_tasks: self.scheduler.log_executed_tasks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    #[test]
    fn empty_file_gives_defaults() {
        let config = RuntimeConfig::from_toml("").unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.scheduler.poll_interval_ms, 50);
        assert_eq!(config.thread.name, "automat");
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = RuntimeConfig::from_toml(
            r#"
            [scheduler]
            log_executed_tasks = true
            "#,
        )
        .unwrap();
        assert!(config.scheduler.log_executed_tasks);
        assert_eq!(config.scheduler.poll_interval_ms, 50);
        assert_eq!(config.thread, ThreadConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = RuntimeConfig::from_toml("[scheduler]\npoll_interval_ms = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ValidationError::PollIntervalOutOfRange { value: 0, .. })
        ));
    }

    #[test]
    fn wrong_types_are_parse_errors() {
        let err = RuntimeConfig::from_toml("[thread]\nname = 7\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn thread_options_follow_the_config() {
        let mut config = RuntimeConfig::default();
        config.thread.name = "worker".to_string();
        config.scheduler.poll_interval_ms = 5;
        config.scheduler.log_executed_tasks = true;
        let options = config.thread_options();
        assert_eq!(options.name, "worker");
        assert_eq!(options.poll_interval, Duration::from_millis(5));
        assert!(options.log_executed_tasks);
    }

    #[test]
    fn to_toml_has_every_section() {
        let text = RuntimeConfig::default().to_toml().unwrap();
        assert!(text.contains("[scheduler]"));
        assert!(text.contains("[thread]"));
        assert!(text.contains("[logging]"));
    }
}
