//! Core decision engine for the webhook build trigger.
//!
//! This crate maps an inbound GitHub webhook event plus a per-repository
//! configuration table onto one build invocation, and classifies the outcome
//! into the small response taxonomy webhook relays rely on. Infrastructure
//! crates implement the port traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed ([`BuildRunner`], [`RepositoryConfigSource`]);
//! infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`RepositoryName`, `SourceVersion`, etc.) |
//! | [`types`] | Value types (`EventKind`, `BuildOverrides`, `DispatchResult`, etc.) |
//! | [`errors`] | `TriggerError` taxonomy and collaborator errors |
//! | [`envelope`] | Inbound event envelopes |
//! | [`interpreter`] | Event kind + payload → repository and source version |
//! | [`ports`] | `BuildRunner` and `RepositoryConfigSource` traits |
//! | [`memory`] | In-memory configuration table |
//! | [`dispatcher`] | The single entry point: lookup, start, classify |

pub mod dispatcher;
pub mod envelope;
pub mod errors;
pub mod identifiers;
pub mod interpreter;
pub mod memory;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use dispatcher::Dispatcher;
pub use envelope::{EventEnvelope, EVENT_KIND_HEADER};
pub use errors::{ConfigError, DispatchStage, RunnerError, TriggerError};
pub use identifiers::{
    BuildId, CloneUrl, EmptyIdentifier, InvocationId, ProjectName, PullRequestNumber,
    RepositoryName, SourceVersion,
};
pub use interpreter::{interpret, pull_request_source_version, push_source_version};
pub use memory::InMemoryRepositoryConfig;
pub use ports::{BuildRunner, RepositoryConfigSource, StartBuildRequest};
pub use types::{
    BuildOverrides, BuildStatus, BuildSummary, DispatchResponse, DispatchResult, DispatchStatus,
    EventKind, InterpretedEvent, RepositoryConfig, SourceType, Timestamp, MESSAGE_INTERNAL_ERROR,
    MESSAGE_INVALID_OVERRIDE, MESSAGE_STARTED,
};
