//! Inbound event envelopes.
//!
//! The validation front end forwards each authenticated webhook delivery as an
//! invocation document:
//!
//! ```json
//! {
//!   "requestPayload": {
//!     "headers": { "X-GitHub-Event": "push", "...": "..." },
//!     "body": "{\"repository\": {...}, \"ref\": \"refs/heads/main\"}"
//!   }
//! }
//! ```
//!
//! `body` is the raw webhook payload as a JSON-encoded *string*; it is parsed
//! later by the interpreter, once the event kind is known to be actionable.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{EventKind, TriggerError};

/// Header carrying the GitHub event kind.
pub const EVENT_KIND_HEADER: &str = "X-GitHub-Event";

/// One inbound webhook delivery. Constructed per invocation and discarded
/// after handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEnvelope {
    event_kind: EventKind,
    headers: BTreeMap<String, String>,
    body: String,
}

#[derive(Debug, Deserialize)]
struct RawInvocation {
    #[serde(rename = "requestPayload")]
    request_payload: RawRequest,
}

#[derive(Debug, Deserialize)]
struct RawRequest {
    headers: BTreeMap<String, String>,
    body: String,
}

impl EventEnvelope {
    /// Builds an envelope from delivery headers and the raw body.
    ///
    /// The event kind is read from [`EVENT_KIND_HEADER`], matched
    /// case-insensitively since relays differ in how they normalise header
    /// names. A missing header is a malformed payload.
    pub fn new(
        headers: BTreeMap<String, String>,
        body: impl Into<String>,
    ) -> Result<Self, TriggerError> {
        let event_kind = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(EVENT_KIND_HEADER))
            .map(|(_, value)| EventKind::parse(value))
            .ok_or_else(|| TriggerError::malformed(format!("missing {EVENT_KIND_HEADER} header")))?;

        Ok(Self {
            event_kind,
            headers,
            body: body.into(),
        })
    }

    /// Decodes an invocation document (see the module docs).
    pub fn from_invocation(document: &[u8]) -> Result<Self, TriggerError> {
        let raw: RawInvocation = serde_json::from_slice(document)
            .map_err(|e| TriggerError::malformed(format!("invalid invocation document: {e}")))?;
        Self::new(raw.request_payload.headers, raw.request_payload.body)
    }

    /// The event kind named by the discriminator header.
    pub fn event_kind(&self) -> &EventKind {
        &self.event_kind
    }

    /// All delivery headers, as received.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Looks up a header by name, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The raw JSON-encoded payload.
    pub fn body(&self) -> &str {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn reads_event_kind_from_header() {
        let envelope = EventEnvelope::new(headers(&[("X-GitHub-Event", "push")]), "{}").unwrap();
        assert_eq!(envelope.event_kind(), &EventKind::Push);
        assert_eq!(envelope.body(), "{}");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let envelope = EventEnvelope::new(
            headers(&[
                ("x-github-event", "pull_request"),
                ("X-GitHub-Delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958"),
            ]),
            "{}",
        )
        .unwrap();
        assert_eq!(envelope.event_kind(), &EventKind::PullRequest);
        assert_eq!(
            envelope.header("x-github-delivery"),
            Some("72d3162e-cc78-11e3-81ab-4c9367dc0958")
        );
    }

    #[test]
    fn missing_event_header_is_malformed() {
        let err = EventEnvelope::new(headers(&[("Content-Type", "application/json")]), "{}")
            .unwrap_err();
        assert!(matches!(err, TriggerError::MalformedPayload { .. }));
    }

    #[test]
    fn decodes_invocation_document() {
        let body = json!({ "ref": "refs/heads/main" }).to_string();
        let document = json!({
            "requestPayload": {
                "headers": { "X-GitHub-Event": "push" },
                "body": body,
            }
        });

        let envelope = EventEnvelope::from_invocation(document.to_string().as_bytes()).unwrap();
        assert_eq!(envelope.event_kind(), &EventKind::Push);
        assert_eq!(envelope.body(), body);
    }

    #[test]
    fn invocation_without_request_payload_is_malformed() {
        let document = json!({ "headers": {}, "body": "{}" }).to_string();
        let err = EventEnvelope::from_invocation(document.as_bytes()).unwrap_err();
        assert!(matches!(err, TriggerError::MalformedPayload { .. }));
    }

    #[test]
    fn non_string_body_is_malformed() {
        let document = json!({
            "requestPayload": {
                "headers": { "X-GitHub-Event": "push" },
                "body": { "ref": "refs/heads/main" },
            }
        })
        .to_string();
        let err = EventEnvelope::from_invocation(document.as_bytes()).unwrap_err();
        assert!(matches!(err, TriggerError::MalformedPayload { .. }));
    }
}
