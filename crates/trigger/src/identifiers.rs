//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example, a
//! [`RepositoryName`] with a [`ProjectName`] even though both are `String` under
//! the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display, and a
// serde form that rejects empty strings the same way `new` does.
// ---------------------------------------------------------------------------

/// An empty string was supplied where an identifier is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("identifier must not be empty")]
pub struct EmptyIdentifier;

macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = EmptyIdentifier;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or(EmptyIdentifier)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers - String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// The short name of a GitHub repository (`repository.name` in the webhook
    /// payload, e.g. `"dummy-repo"`).
    ///
    /// This is the key into the repository configuration table.
    RepositoryName
}

string_id! {
    /// The URL the build runner clones the repository from
    /// (`repository.clone_url` in the webhook payload).
    CloneUrl
}

string_id! {
    /// The build project every build is started in.
    ///
    /// Fixed for the lifetime of the process.
    ProjectName
}

string_id! {
    /// Identifier the build runner assigns to a started build.
    BuildId
}

string_id! {
    /// The revision specifier a build checks out: a branch name, or
    /// `pr/<number>` for pull-request activity that has not been merged.
    SourceVersion
}

// ---------------------------------------------------------------------------
// Identifiers - GitHub-integer-backed
// ---------------------------------------------------------------------------

/// A GitHub pull request number, taken verbatim from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PullRequestNumber(u64);

impl PullRequestNumber {
    /// Creates a new pull request number from a raw integer.
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for PullRequestNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers - UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single handler invocation.
///
/// Generated fresh for every inbound event and recorded on the invocation span
/// so all log lines from one invocation can be correlated. It never appears in
/// the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a new random invocation identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_are_rejected() {
        assert!(RepositoryName::new("").is_none());
        assert!(CloneUrl::new(String::new()).is_none());
        assert!(SourceVersion::new("").is_none());
    }

    #[test]
    fn string_ids_serialize_transparently() {
        let name = RepositoryName::new("dummy-repo").unwrap();
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"dummy-repo\"");

        let id: BuildId = serde_json::from_str("\"test-build:1234\"").unwrap();
        assert_eq!(id.as_str(), "test-build:1234");
    }

    #[test]
    fn empty_strings_are_rejected_when_deserializing() {
        assert!(serde_json::from_str::<BuildId>("\"\"").is_err());
        assert!(serde_json::from_str::<Vec<RepositoryName>>(r#"["dummy-repo", ""]"#).is_err());
    }

    #[test]
    fn pull_request_numbers_display_as_integers() {
        assert_eq!(PullRequestNumber::new(17).to_string(), "17");
    }

    #[test]
    fn invocation_ids_are_unique() {
        assert_ne!(InvocationId::new_random(), InvocationId::new_random());
    }
}
