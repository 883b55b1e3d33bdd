//! The event interpreter.
//!
//! Turns an [`EventEnvelope`] into an [`InterpretedEvent`]: which repository
//! the event belongs to, where to clone it from, and which revision to build.
//! Interpretation is a pure function of the envelope.
//!
//! # Source versions
//!
//! | Event | Condition | Source version |
//! |-------|-----------|----------------|
//! | `push` | | last `/`-separated segment of `ref` |
//! | `pull_request` | `action == "closed"` and merged | `pull_request.base.ref` |
//! | `pull_request` | anything else | `pr/<pull_request.number>` |
//!
//! Every other event kind is rejected with [`TriggerError::UnsupportedEvent`].

use serde::Deserialize;

use crate::{
    CloneUrl, EventEnvelope, EventKind, InterpretedEvent, PullRequestNumber, RepositoryName,
    SourceVersion, TriggerError,
};

// ============================================================================
// Raw payload structures
//
// Only the fields the trigger reads are declared; GitHub sends many more and
// they are ignored.
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawRepository {
    name: String,
    clone_url: String,
}

#[derive(Debug, Deserialize)]
struct RawPushPayload {
    #[serde(rename = "ref")]
    git_ref: String,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    action: String,
    merged: Option<bool>,
    pull_request: RawPullRequest,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: u64,
    merged: Option<bool>,
    base: Option<RawRef>,
}

#[derive(Debug, Deserialize)]
struct RawRef {
    #[serde(rename = "ref")]
    git_ref: String,
}

// ============================================================================
// Interpretation
// ============================================================================

/// Interprets one webhook event.
///
/// The event kind is checked before the body is parsed, so an unsupported
/// event is reported as such even when its body is empty.
pub fn interpret(envelope: &EventEnvelope) -> Result<InterpretedEvent, TriggerError> {
    let (repository, source_version) = match envelope.event_kind() {
        EventKind::Push => {
            let payload: RawPushPayload = parse_body(envelope.body())?;
            let source_version = push_source_version(&payload.git_ref).ok_or_else(|| {
                TriggerError::malformed(format!("ref '{}' names no branch", payload.git_ref))
            })?;
            (payload.repository, source_version)
        }
        EventKind::PullRequest => {
            let payload: RawPullRequestPayload = parse_body(envelope.body())?;
            // Older relays put `merged` at the top level; GitHub nests it.
            let merged = payload
                .merged
                .or(payload.pull_request.merged)
                .unwrap_or(false);
            let source_version = pull_request_source_version(
                &payload.action,
                merged,
                PullRequestNumber::new(payload.pull_request.number),
                payload.pull_request.base.as_ref().map(|b| b.git_ref.as_str()),
            )?;
            (payload.repository, source_version)
        }
        EventKind::Other(kind) => {
            return Err(TriggerError::UnsupportedEvent { kind: kind.clone() });
        }
    };

    let clone_url = CloneUrl::new(repository.clone_url)
        .ok_or_else(|| TriggerError::malformed("repository.clone_url is empty"))?;
    let repository = RepositoryName::new(repository.name)
        .ok_or_else(|| TriggerError::malformed("repository.name is empty"))?;

    Ok(InterpretedEvent {
        repository,
        clone_url,
        kind: envelope.event_kind().clone(),
        source_version,
    })
}

/// Source version for a push: the last `/`-separated segment of the ref.
///
/// `"refs/heads/main"` becomes `"main"`. Branch names that themselves contain
/// `/` keep only their final segment. Returns `None` when that segment is
/// empty.
pub fn push_source_version(git_ref: &str) -> Option<SourceVersion> {
    git_ref.rsplit('/').next().and_then(SourceVersion::new)
}

/// Source version for pull request activity.
///
/// A merged close builds the branch the pull request merged into; everything
/// else builds `pr/<number>`.
pub fn pull_request_source_version(
    action: &str,
    merged: bool,
    number: PullRequestNumber,
    base_ref: Option<&str>,
) -> Result<SourceVersion, TriggerError> {
    if action == "closed" && merged {
        let base_ref =
            base_ref.ok_or_else(|| TriggerError::malformed("pull_request.base.ref is missing"))?;
        SourceVersion::new(base_ref)
            .ok_or_else(|| TriggerError::malformed("pull_request.base.ref is empty"))
    } else {
        SourceVersion::new(format!("pr/{number}"))
            .ok_or_else(|| TriggerError::malformed("pull request number is empty"))
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, TriggerError> {
    serde_json::from_str(body).map_err(|e| TriggerError::malformed(format!("invalid payload: {e}")))
}
