//! Error types for the build-trigger domain.
//!
//! [`TriggerError`] is the single error type that flows out of interpretation
//! and dispatch. Collaborator errors ([`RunnerError`] from the build runner,
//! [`ConfigError`] from the repository configuration source) are defined here
//! too so that infrastructure crates can produce them without depending on
//! each other.
//!
//! At the handler boundary every [`TriggerError`] collapses into one of two
//! caller-visible classes via [`TriggerError::status`]: the runner's
//! [`RunnerError::Validation`] becomes [`DispatchStatus::InvalidOverride`],
//! everything else becomes [`DispatchStatus::InternalError`].

use thiserror::Error;

use crate::{DispatchStatus, RepositoryName};

// ---------------------------------------------------------------------------
// Dispatch stages
// ---------------------------------------------------------------------------

/// The non-terminal states an invocation passes through.
///
/// `Received → Interpreted → ConfigResolved → Dispatched`; the terminal states
/// are the [`DispatchStatus`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchStage {
    /// The envelope has been received but not yet interpreted.
    Received,
    /// Repository and source version are known.
    Interpreted,
    /// The repository's overrides have been loaded.
    ConfigResolved,
    /// The runner accepted the start request.
    Dispatched,
}

impl std::fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Interpreted => "interpreted",
            Self::ConfigResolved => "config_resolved",
            Self::Dispatched => "dispatched",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

/// Errors reported by a [`crate::BuildRunner`].
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The runner rejected the request's parameters against its schema
    /// (unknown override name, wrong value shape).
    ///
    /// This is the only runner failure the caller gets to see distinctly.
    #[error("build runner rejected the request parameters: {message}")]
    Validation {
        /// The runner's description of the rejected parameters.
        message: String,
    },

    /// The runner answered with a non-success status other than a validation
    /// rejection.
    #[error("build runner returned status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The runner could not be reached.
    #[error("build runner unavailable: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The runner answered successfully but the body could not be understood.
    #[error("unexpected build runner response: {message}")]
    InvalidResponse {
        /// What was wrong with the body.
        message: String,
    },
}

/// Errors reported by a [`crate::RepositoryConfigSource`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The table has no entry for the repository.
    #[error("repository '{repository}' is not configured")]
    NotFound {
        /// The repository that was looked up.
        repository: RepositoryName,
    },

    /// The table could not be read or parsed.
    #[error("repository configuration unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Trigger errors
// ---------------------------------------------------------------------------

/// Everything that can go wrong while handling one event.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The event kind is neither `push` nor `pull_request`.
    #[error("unsupported event kind '{kind}'")]
    UnsupportedEvent {
        /// The event kind as received.
        kind: String,
    },

    /// The envelope or payload is missing a required field or has the wrong
    /// shape.
    #[error("malformed payload: {reason}")]
    MalformedPayload {
        /// Which field was missing or invalid.
        reason: String,
    },

    /// The repository has no entry in the configuration table.
    #[error("repository '{repository}' is not configured")]
    UnknownRepository {
        /// The repository named by the payload.
        repository: RepositoryName,
    },

    /// The configuration table itself could not be read.
    #[error("repository configuration unavailable: {message}")]
    ConfigUnavailable {
        /// Description of the failure.
        message: String,
    },

    /// The runner rejected one or more override parameters.
    #[error("invalid build override: {message}")]
    InvalidOverride {
        /// The runner's description of the rejection.
        message: String,
    },

    /// Any other runner failure (transport, unexpected status, bad response).
    #[error("build runner failure")]
    Runner(#[source] RunnerError),
}

impl TriggerError {
    /// Shorthand for building a [`TriggerError::MalformedPayload`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
        }
    }

    /// The caller-visible classification of this error.
    pub fn status(&self) -> DispatchStatus {
        match self {
            Self::InvalidOverride { .. } => DispatchStatus::InvalidOverride,
            _ => DispatchStatus::InternalError,
        }
    }

    /// The stage the invocation had reached when this error was raised.
    pub fn stage(&self) -> DispatchStage {
        match self {
            Self::UnsupportedEvent { .. } | Self::MalformedPayload { .. } => {
                DispatchStage::Received
            }
            Self::UnknownRepository { .. } | Self::ConfigUnavailable { .. } => {
                DispatchStage::Interpreted
            }
            Self::InvalidOverride { .. } | Self::Runner(_) => DispatchStage::ConfigResolved,
        }
    }

    /// Short machine-readable label, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedEvent { .. } => "unsupported_event",
            Self::MalformedPayload { .. } => "malformed_payload",
            Self::UnknownRepository { .. } => "unknown_repository",
            Self::ConfigUnavailable { .. } => "config_unavailable",
            Self::InvalidOverride { .. } => "invalid_override",
            Self::Runner(_) => "runner_unavailable",
        }
    }
}

impl From<RunnerError> for TriggerError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::Validation { message } => Self::InvalidOverride { message },
            other => Self::Runner(other),
        }
    }
}

impl From<ConfigError> for TriggerError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { repository } => Self::UnknownRepository { repository },
            ConfigError::Unavailable { message } => Self::ConfigUnavailable { message },
        }
    }
}
