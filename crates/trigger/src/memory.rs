//! In-memory repository configuration table.

use std::collections::HashMap;

use crate::{ConfigError, RepositoryConfig, RepositoryConfigSource, RepositoryName};

/// A repository configuration table held in memory.
///
/// Used for fixtures and embedded configuration, and as the parsed form of a
/// configuration document by file-backed sources.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryRepositoryConfig {
    table: HashMap<String, RepositoryConfig>,
}

impl InMemoryRepositoryConfig {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the entry for `repository`.
    pub fn with_repository(mut self, repository: RepositoryName, config: RepositoryConfig) -> Self {
        self.table.insert(repository.as_str().to_string(), config);
        self
    }

    /// Parses a configuration document: a JSON object keyed by repository
    /// name whose values are [`RepositoryConfig`] entries.
    pub fn from_json(document: &[u8]) -> Result<Self, serde_json::Error> {
        let table = serde_json::from_slice(document)?;
        Ok(Self { table })
    }

    /// Number of configured repositories.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if no repository is configured.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl RepositoryConfigSource for InMemoryRepositoryConfig {
    fn lookup(&self, repository: &RepositoryName) -> Result<RepositoryConfig, ConfigError> {
        self.table
            .get(repository.as_str())
            .cloned()
            .ok_or_else(|| ConfigError::NotFound {
                repository: repository.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn lookup_returns_configured_overrides() {
        let source = InMemoryRepositoryConfig::from_json(
            json!({
                "dummy-repo": {
                    "codebuild_cfg": {
                        "environment_variables": [
                            { "name": "foo", "type": "PLAINTEXT", "value": "bar" }
                        ]
                    }
                }
            })
            .to_string()
            .as_bytes(),
        )
        .unwrap();

        let config = source
            .lookup(&RepositoryName::new("dummy-repo").unwrap())
            .unwrap();
        assert_eq!(
            config.build_overrides.get("environment_variables"),
            Some(&json!([{ "name": "foo", "type": "PLAINTEXT", "value": "bar" }]))
        );
    }

    #[test]
    fn absent_repository_is_not_found() {
        let source = InMemoryRepositoryConfig::new()
            .with_repository(RepositoryName::new("a").unwrap(), RepositoryConfig::default());
        let err = source.lookup(&RepositoryName::new("b").unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { repository } if repository.as_str() == "b"));
    }

    #[test]
    fn document_must_be_an_object_of_entries() {
        assert!(InMemoryRepositoryConfig::from_json(b"[]").is_err());
        assert!(InMemoryRepositoryConfig::from_json(br#"{"repo": 5}"#).is_err());
    }
}
