//! Errors from loading and saving a runtime configuration.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::validation::ValidationError;

/// Filesystem step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    /// Reading the configuration file.
    Read,
    /// Writing the configuration file.
    Write,
    /// Creating the directory that holds it.
    CreateDir,
}

impl fmt::Display for FileOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileOp::Read => "cannot read",
            FileOp::Write => "cannot write",
            FileOp::CreateDir => "cannot create directory",
        })
    }
}

/// Why a configuration could not be loaded or stored.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file or its directory could not be accessed.
    #[error("{op} '{}': {source}", .path.display())]
    Io {
        /// Step that failed.
        op: FileOp,
        /// File or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The text is not a valid configuration document.
    #[error("malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be turned back into TOML.
    #[error("cannot encode configuration: {0}")]
    Encode(#[from] toml::ser::Error),

    /// The document parsed but holds settings the scheduler cannot run with.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

impl ConfigError {
    pub(crate) fn io(op: FileOp, path: &Path, source: std::io::Error) -> Self {
        ConfigError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Path of the file behind an I/O failure.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}
