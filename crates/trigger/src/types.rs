//! Shared value types for the build-trigger domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! structure: the event kind, the repository overrides, the interpreted event
//! handed from the interpreter to the dispatcher, and the dispatch result that
//! is the handler's only observable output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BuildId, CloneUrl, RepositoryName, SourceVersion};

// ---------------------------------------------------------------------------
// Event kinds
// ---------------------------------------------------------------------------

/// The GitHub event kind, taken from the `X-GitHub-Event` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A push to a branch or tag.
    Push,
    /// Any pull request activity (opened, synchronize, closed, ...).
    PullRequest,
    /// Any other event; carried verbatim so it can be logged.
    Other(String),
}

impl EventKind {
    /// Parses a discriminator header value. Never fails: unknown values become
    /// [`EventKind::Other`].
    pub fn parse(value: &str) -> Self {
        match value {
            "push" => Self::Push,
            "pull_request" => Self::PullRequest,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the wire name of the event kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Push => "push",
            Self::PullRequest => "pull_request",
            Self::Other(other) => other,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------

/// Source provider type passed to the build runner with every build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    /// Source hosted on GitHub.
    #[serde(rename = "GITHUB")]
    GitHub,
}

impl SourceType {
    /// Returns the runner's name for this source type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GitHub => "GITHUB",
        }
    }
}

// ---------------------------------------------------------------------------
// Repository configuration
// ---------------------------------------------------------------------------

/// Named build parameters applied to every build of one repository.
///
/// Keys and values are handed to the build runner exactly as configured; the
/// trigger never inspects, adds, or removes entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildOverrides(serde_json::Map<String, serde_json::Value>);

impl BuildOverrides {
    /// Returns the value configured for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    /// Number of configured overrides.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no overrides are configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the underlying JSON object.
    pub fn as_map(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.0
    }
}

/// One entry of the repository configuration table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Overrides spread into every build started for the repository.
    ///
    /// `codebuild_cfg` is accepted as an alias so existing configuration files
    /// keep working.
    #[serde(default, alias = "codebuild_cfg")]
    pub build_overrides: BuildOverrides,
}

// ---------------------------------------------------------------------------
// Interpreted events
// ---------------------------------------------------------------------------

/// What the interpreter extracted from one webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpretedEvent {
    /// The repository the event belongs to.
    pub repository: RepositoryName,
    /// Where the runner should clone the repository from.
    pub clone_url: CloneUrl,
    /// The event kind (always `Push` or `PullRequest`).
    pub kind: EventKind,
    /// The revision to build.
    pub source_version: SourceVersion,
}

// ---------------------------------------------------------------------------
// Dispatch results
// ---------------------------------------------------------------------------

/// Message returned when a build was started.
pub const MESSAGE_STARTED: &str = "Build was successfully started";
/// Message returned when the runner rejected the repository's overrides.
pub const MESSAGE_INVALID_OVERRIDE: &str = "One or more build override attributes are invalid";
/// Message returned for every other failure.
pub const MESSAGE_INTERNAL_ERROR: &str = "Error while processing request";

/// Classification of one handled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// The runner accepted the build.
    Started,
    /// The runner rejected one or more override parameters.
    InvalidOverride,
    /// Any other failure.
    InternalError,
}

impl DispatchStatus {
    /// The status code reported to the caller.
    ///
    /// These values are part of the compatibility surface with webhook relays.
    pub fn status_code(self) -> u16 {
        match self {
            Self::Started => 302,
            Self::InvalidOverride => 400,
            Self::InternalError => 500,
        }
    }

    /// The fixed message reported to the caller.
    pub fn message(self) -> &'static str {
        match self {
            Self::Started => MESSAGE_STARTED,
            Self::InvalidOverride => MESSAGE_INVALID_OVERRIDE,
            Self::InternalError => MESSAGE_INTERNAL_ERROR,
        }
    }
}

/// The outcome of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    /// Outcome classification.
    pub status: DispatchStatus,
    /// Fixed, caller-facing message for `status`.
    pub message: String,
    /// The started build. Only set when `status` is [`DispatchStatus::Started`].
    pub build_id: Option<BuildId>,
}

impl DispatchResult {
    /// A successfully started build.
    pub fn started(build_id: BuildId) -> Self {
        Self {
            status: DispatchStatus::Started,
            message: MESSAGE_STARTED.to_string(),
            build_id: Some(build_id),
        }
    }

    /// A failed dispatch with the given classification.
    pub fn failed(status: DispatchStatus) -> Self {
        Self {
            status,
            message: status.message().to_string(),
            build_id: None,
        }
    }

    /// Shorthand for [`DispatchStatus::status_code`].
    pub fn status_code(&self) -> u16 {
        self.status.status_code()
    }

    /// Converts the result into its wire form.
    pub fn to_response(&self) -> DispatchResponse {
        DispatchResponse {
            status_code: self.status_code(),
            message: self.message.clone(),
            build_id: self.build_id.clone(),
        }
    }
}

/// Wire form of a [`DispatchResult`].
///
/// `{"statusCode": 302, "message": "...", "build_id": "..."}`; `build_id` is
/// omitted unless a build was started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResponse {
    /// 302, 400, or 500.
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// Fixed message for the status.
    pub message: String,
    /// The started build, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_id: Option<BuildId>,
}

// ---------------------------------------------------------------------------
// Build descriptions
// ---------------------------------------------------------------------------

/// Lifecycle state of a build as reported by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildStatus {
    InProgress,
    Succeeded,
    Failed,
    Fault,
    TimedOut,
    Stopped,
    /// A status this crate does not know about.
    Unknown(String),
}

impl From<String> for BuildStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "IN_PROGRESS" => Self::InProgress,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "FAULT" => Self::Fault,
            "TIMED_OUT" => Self::TimedOut,
            "STOPPED" => Self::Stopped,
            _ => Self::Unknown(value),
        }
    }
}

impl From<BuildStatus> for String {
    fn from(value: BuildStatus) -> Self {
        match value {
            BuildStatus::InProgress => "IN_PROGRESS".to_string(),
            BuildStatus::Succeeded => "SUCCEEDED".to_string(),
            BuildStatus::Failed => "FAILED".to_string(),
            BuildStatus::Fault => "FAULT".to_string(),
            BuildStatus::TimedOut => "TIMED_OUT".to_string(),
            BuildStatus::Stopped => "STOPPED".to_string(),
            BuildStatus::Unknown(other) => other,
        }
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from(self.clone()))
    }
}

/// Summary of one build, as returned by [`crate::BuildRunner::get_builds`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub id: BuildId,
    pub status: BuildStatus,
    #[serde(default)]
    pub source_version: Option<String>,
    #[serde(default)]
    pub start_time: Option<Timestamp>,
    #[serde(default)]
    pub end_time: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
