//! Port traits for the trigger's two collaborators.
//!
//! Infrastructure crates implement these; the [`crate::Dispatcher`] receives
//! them as injected trait objects so tests can substitute recording fakes.

use async_trait::async_trait;

use crate::{
    BuildId, BuildOverrides, BuildSummary, CloneUrl, ConfigError, ProjectName, RepositoryConfig,
    RepositoryName, RunnerError, SourceType, SourceVersion,
};

/// Everything the runner needs to start one build.
///
/// `overrides` are spread by the runner as additional named parameters next
/// to the fixed ones.
#[derive(Debug, Clone, PartialEq)]
pub struct StartBuildRequest {
    pub project: ProjectName,
    pub source_location: CloneUrl,
    pub source_type: SourceType,
    pub source_version: SourceVersion,
    pub overrides: BuildOverrides,
}

/// The external build execution service.
#[async_trait]
pub trait BuildRunner: Send + Sync {
    /// Starts a build and returns its identifier.
    ///
    /// Must fail with [`RunnerError::Validation`] when any override is not
    /// part of the runner's parameter schema.
    async fn start(&self, request: StartBuildRequest) -> Result<BuildId, RunnerError>;

    /// Lists the builds of a project, most recent first.
    async fn list_builds(&self, project: &ProjectName) -> Result<Vec<BuildId>, RunnerError>;

    /// Describes the given builds. Unknown ids are omitted from the result.
    async fn get_builds(&self, ids: &[BuildId]) -> Result<Vec<BuildSummary>, RunnerError>;
}

/// Read-only access to the repository configuration table.
pub trait RepositoryConfigSource: Send + Sync {
    /// Returns the configuration for `repository`.
    ///
    /// A repository without an entry is [`ConfigError::NotFound`]; there is no
    /// default configuration.
    fn lookup(&self, repository: &RepositoryName) -> Result<RepositoryConfig, ConfigError>;
}
