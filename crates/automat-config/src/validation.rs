//! Validation of runtime settings.
//!
//! Parsing only checks types. The checks here reject values that parse but
//! that the scheduler thread or the log subscriber cannot use.

use thiserror::Error;

use crate::RuntimeConfig;

/// Smallest accepted idle poll interval in milliseconds.
pub const MIN_POLL_INTERVAL_MS: u64 = 1;

/// Largest accepted idle poll interval in milliseconds.
pub const MAX_POLL_INTERVAL_MS: u64 = 10_000;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Poll interval outside the accepted range.
    #[error("poll interval {value} ms out of range [{min}, {max}]")]
    PollIntervalOutOfRange {
        /// The rejected value.
        value: u64,
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
    },

    /// The scheduler thread needs a name.
    #[error("thread name must not be empty")]
    EmptyThreadName,

    /// The logging filter does not parse.
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter {
        /// The rejected filter.
        filter: String,
        /// What the parser complained about.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Checks an idle poll interval.
pub fn validate_poll_interval(value: u64) -> ValidationResult<()> {
    if (MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::PollIntervalOutOfRange {
            value,
            min: MIN_POLL_INTERVAL_MS,
            max: MAX_POLL_INTERVAL_MS,
        })
    }
}

/// Checks a `tracing` filter directive such as `info,automat_core=debug`.
pub fn validate_filter(filter: &str) -> ValidationResult<()> {
    tracing_subscriber::EnvFilter::builder()
        .parse(filter)
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidFilter {
            filter: filter.to_string(),
            reason: e.to_string(),
        })
}

/// Checks every section of `config`, collecting all failures.
pub fn validate_config(config: &RuntimeConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();
    if let Err(e) = validate_poll_interval(config.scheduler.poll_interval_ms) {
        errors.push(e);
    }
    if config.thread.name.trim().is_empty() {
        errors.push(ValidationError::EmptyThreadName);
    }
    if let Err(e) = validate_filter(&config.logging.filter) {
        errors.push(e);
    }
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_interval_bounds() {
        assert!(validate_poll_interval(1).is_ok());
        assert!(validate_poll_interval(10_000).is_ok());
        assert_eq!(
            validate_poll_interval(0),
            Err(ValidationError::PollIntervalOutOfRange {
                value: 0,
                min: 1,
                max: 10_000
            })
        );
    }

    #[test]
    fn filters() {
        assert!(validate_filter("info").is_ok());
        assert!(validate_filter("warn,automat_core=debug").is_ok());
        assert!(validate_filter("automat_core=loud").is_err());
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&RuntimeConfig::default()), Ok(()));
    }

    #[test]
    fn single_failure_is_not_wrapped() {
        let mut config = RuntimeConfig::default();
        config.thread.name = "  ".to_string();
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::EmptyThreadName)
        );
    }

    #[test]
    fn failures_are_collected() {
        let mut config = RuntimeConfig::default();
        config.thread.name = String::new();
        config.scheduler.poll_interval_ms = 0;
        let Err(ValidationError::Multiple(errors)) = validate_config(&config) else {
            panic!("expected multiple errors");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ValidationError::EmptyThreadName));
    }
}
