//! Build runner client adapter.
//!
//! Implements the [`trigger::BuildRunner`] trait over the build runner's JSON
//! API. Start requests carry the four fixed parameters (`project`,
//! `source_location`, `source_type`, `source_version`) with the repository's
//! overrides spread alongside them as additional top-level fields.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, authentication, override schema checks,
//! and response decoding all live here. The [`trigger`] crate sees only
//! [`trigger::BuildRunner`] and [`trigger::RunnerError`].
//!
//! ## Failure mapping
//!
//! | Condition | Error |
//! |-----------|-------|
//! | override not in the schema, or wrong value shape | `RunnerError::Validation` (nothing sent) |
//! | any non-2xx, 400 / 422 included | `RunnerError::Rejected` |
//! | connection or timeout failure | `RunnerError::Transport` |
//! | undecodable 2xx body | `RunnerError::InvalidResponse` |

mod client;
mod schema;

pub use client::{HttpBuildRunner, DEFAULT_TIMEOUT};
pub use reqwest::Url;
pub use schema::validate_overrides;
