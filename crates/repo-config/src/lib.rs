//! Repository configuration table backed by a JSON file.
//!
//! Implements [`trigger::RepositoryConfigSource`] over a document of the form
//!
//! ```json
//! {
//!   "dummy-repo": {
//!     "build_overrides": {
//!       "environment_variables": [{ "name": "foo", "type": "PLAINTEXT", "value": "bar" }]
//!     }
//!   }
//! }
//! ```
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** File access and parsing live here. The [`trigger`]
//! crate sees only [`trigger::RepositoryConfigSource`].
//!
//! ## Reload behaviour
//!
//! The file is validated once when opened: a missing or unparsable file is a
//! start-up error. After that every lookup re-reads it, so edits take effect
//! on the next invocation without a restart. A file that becomes unreadable
//! later fails only the lookups made while it is broken.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use trigger::{
    ConfigError, InMemoryRepositoryConfig, RepositoryConfig, RepositoryConfigSource,
    RepositoryName,
};

/// Errors reading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The file could not be read.
    #[error("failed to read repository configuration '{}'", path.display())]
    Read {
        /// The configuration file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid configuration document.
    #[error("invalid repository configuration '{}'", path.display())]
    Parse {
        /// The configuration file path.
        path: PathBuf,
        /// Where and why decoding failed.
        #[source]
        source: serde_json::Error,
    },
}

/// A [`RepositoryConfigSource`] that reads a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileRepositoryConfig {
    path: PathBuf,
}

impl JsonFileRepositoryConfig {
    /// Opens the configuration file, verifying that it exists and parses.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigFileError> {
        let path = path.into();
        let table = read_table(&path)?;
        info!(
            path = %path.display(),
            repositories = table.len(),
            "Repository configuration loaded"
        );
        Ok(Self { path })
    }

    /// The file backing this source.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RepositoryConfigSource for JsonFileRepositoryConfig {
    fn lookup(&self, repository: &RepositoryName) -> Result<RepositoryConfig, ConfigError> {
        let table = read_table(&self.path).map_err(|e| ConfigError::Unavailable {
            message: error_chain(&e),
        })?;
        debug!(path = %self.path.display(), repository = %repository, "Looking up repository configuration");
        table.lookup(repository)
    }
}

fn read_table(path: &Path) -> Result<InMemoryRepositoryConfig, ConfigFileError> {
    let bytes = std::fs::read(path).map_err(|source| ConfigFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    InMemoryRepositoryConfig::from_json(&bytes).map_err(|source| ConfigFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
