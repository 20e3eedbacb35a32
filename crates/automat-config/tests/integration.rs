//! Integration tests for automat-config.
//!
//! These tests go through the file system and into a running scheduler thread.

use std::sync::mpsc;

use automat_config::{ConfigError, FileOp, RuntimeConfig};
use automat_core::AutomatThread;
use tempfile::TempDir;

/// Saving and loading a config yields the same settings.
#[test]
fn test_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");

    let mut config = RuntimeConfig::default();
    config.scheduler.log_executed_tasks = true;
    config.scheduler.poll_interval_ms = 20;
    config.thread.name = "graph".to_string();
    config.logging.filter = "warn,automat_core=debug".to_string();
    config.save(&path).unwrap();

    let loaded = RuntimeConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

/// Missing parent directories are created on save.
#[test]
fn test_save_creates_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("config.toml");

    RuntimeConfig::default().save(&path).unwrap();
    assert!(path.is_file());
}

/// A hand-written file with an invalid value is rejected on load.
#[test]
fn test_load_rejects_invalid_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[thread]\nname = \"\"\n").unwrap();

    let err = RuntimeConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got: {err}");
}

/// A missing explicit path is an error, not a silent default.
#[test]
fn test_explicit_path_must_exist() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");

    let err = RuntimeConfig::load_or_default(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Io { op: FileOp::Read, .. }));
}

/// The configured name reaches the scheduler thread.
#[test]
fn test_thread_options_spawn_a_named_thread() {
    let mut config = RuntimeConfig::default();
    config.thread.name = "configured-automat".to_string();
    config.scheduler.poll_interval_ms = 5;

    let (tx, rx) = mpsc::channel();
    let thread = AutomatThread::spawn(config.thread_options(), move |_rt| {
        let name = std::thread::current().name().map(str::to_string);
        tx.send(name).unwrap();
    })
    .unwrap();

    assert_eq!(rx.recv().unwrap().as_deref(), Some("configured-automat"));
    thread.stop().unwrap();
}
