//! The dispatcher: the handler's single entry point.
//!
//! For every event the dispatcher interprets the envelope, resolves the
//! repository's overrides, asks the [`BuildRunner`] to start a build, and
//! classifies the outcome into a [`DispatchResult`]. Nothing escapes
//! [`Dispatcher::handle`]: full error detail goes to the log, the caller only
//! sees the coarse classification and its fixed message.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn, Span};

use crate::{
    interpret, BuildId, BuildRunner, DispatchResult, DispatchStage, DispatchStatus, EventEnvelope,
    InterpretedEvent, InvocationId, ProjectName, RepositoryConfigSource, SourceType,
    StartBuildRequest, TriggerError,
};

/// Maps inbound events to build invocations.
///
/// Holds no per-invocation state, so one instance may serve any number of
/// concurrent invocations.
pub struct Dispatcher {
    project: ProjectName,
    runner: Arc<dyn BuildRunner>,
    config: Arc<dyn RepositoryConfigSource>,
}

impl Dispatcher {
    /// Creates a dispatcher that starts builds in `project`.
    pub fn new(
        project: ProjectName,
        runner: Arc<dyn BuildRunner>,
        config: Arc<dyn RepositoryConfigSource>,
    ) -> Self {
        Self {
            project,
            runner,
            config,
        }
    }

    /// The project every build is started in.
    pub fn project(&self) -> &ProjectName {
        &self.project
    }

    /// Handles a raw invocation document (see [`EventEnvelope::from_invocation`]).
    ///
    /// A document that cannot be decoded is classified like any other
    /// malformed payload.
    #[instrument(
        name = "invocation",
        skip_all,
        fields(
            invocation_id = %InvocationId::new_random(),
            event_kind = tracing::field::Empty,
            repository = tracing::field::Empty,
        )
    )]
    pub async fn handle_invocation(&self, document: &[u8]) -> DispatchResult {
        let outcome = match EventEnvelope::from_invocation(document) {
            Ok(envelope) => self.process(&envelope).await,
            Err(err) => Err(err),
        };
        conclude(outcome)
    }

    /// Handles one event envelope.
    #[instrument(
        name = "invocation",
        skip_all,
        fields(
            invocation_id = %InvocationId::new_random(),
            event_kind = tracing::field::Empty,
            repository = tracing::field::Empty,
        )
    )]
    pub async fn handle(&self, envelope: &EventEnvelope) -> DispatchResult {
        conclude(self.process(envelope).await)
    }

    async fn process(&self, envelope: &EventEnvelope) -> Result<BuildId, TriggerError> {
        let span = Span::current();
        span.record("event_kind", envelope.event_kind().as_str());

        let event = interpret(envelope)?;
        span.record("repository", event.repository.as_str());
        debug!(
            stage = %DispatchStage::Interpreted,
            source_version = %event.source_version,
            "Event interpreted"
        );

        self.dispatch(&event).await
    }

    /// Resolves the repository's overrides and starts the build.
    ///
    /// The runner is only called once the repository is known to be
    /// configured. The overrides reach the runner exactly as configured.
    pub async fn dispatch(&self, event: &InterpretedEvent) -> Result<BuildId, TriggerError> {
        let config = self.config.lookup(&event.repository)?;
        debug!(
            stage = %DispatchStage::ConfigResolved,
            overrides = %serde_json::Value::Object(config.build_overrides.as_map().clone()),
            "Repository build overrides resolved"
        );

        let request = StartBuildRequest {
            project: self.project.clone(),
            source_location: event.clone_url.clone(),
            source_type: SourceType::GitHub,
            source_version: event.source_version.clone(),
            overrides: config.build_overrides,
        };

        info!(project = %self.project, source_version = %event.source_version, "Starting build");
        let build_id = self.runner.start(request).await?;
        debug!(stage = %DispatchStage::Dispatched, "Runner accepted build");

        Ok(build_id)
    }
}

/// Collapses an invocation outcome into the caller-visible result, logging
/// the detail the caller does not get.
fn conclude(outcome: Result<BuildId, TriggerError>) -> DispatchResult {
    let result = match outcome {
        Ok(build_id) => {
            info!(build_id = %build_id, "Build started");
            DispatchResult::started(build_id)
        }
        Err(err) => {
            match err.status() {
                DispatchStatus::InvalidOverride => warn!(
                    kind = err.kind(),
                    stage = %err.stage(),
                    error = %err,
                    "Build runner rejected repository overrides"
                ),
                _ => error!(
                    kind = err.kind(),
                    stage = %err.stage(),
                    error = %err,
                    detail = ?err,
                    "Error while processing event"
                ),
            }
            DispatchResult::failed(err.status())
        }
    };

    debug!(
        status_code = result.status_code(),
        message = %result.message,
        "Response"
    );
    result
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{
        BuildSummary, ConfigError, InMemoryRepositoryConfig, RepositoryConfig, RepositoryName,
        RunnerError,
    };

    /// Records every start request and answers with a canned outcome.
    struct RecordingRunner {
        outcome: fn() -> Result<BuildId, RunnerError>,
        calls: Mutex<Vec<StartBuildRequest>>,
    }

    impl RecordingRunner {
        fn new(outcome: fn() -> Result<BuildId, RunnerError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<StartBuildRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BuildRunner for RecordingRunner {
        async fn start(&self, request: StartBuildRequest) -> Result<BuildId, RunnerError> {
            self.calls.lock().unwrap().push(request);
            (self.outcome)()
        }

        async fn list_builds(&self, _project: &ProjectName) -> Result<Vec<BuildId>, RunnerError> {
            Ok(Vec::new())
        }

        async fn get_builds(&self, _ids: &[BuildId]) -> Result<Vec<BuildSummary>, RunnerError> {
            Ok(Vec::new())
        }
    }

    fn accepted() -> Result<BuildId, RunnerError> {
        Ok(BuildId::new("test-build:0001").unwrap())
    }

    fn unreachable_runner() -> Result<BuildId, RunnerError> {
        Err(RunnerError::Transport {
            message: "connection refused".to_string(),
        })
    }

    /// A configuration store that cannot be reached.
    struct UnavailableConfig;

    impl RepositoryConfigSource for UnavailableConfig {
        fn lookup(&self, _repository: &RepositoryName) -> Result<RepositoryConfig, ConfigError> {
            Err(ConfigError::Unavailable {
                message: "configuration store timed out".to_string(),
            })
        }
    }

    fn config() -> Arc<InMemoryRepositoryConfig> {
        let overrides = serde_json::from_value(json!({ "image": "aws/codebuild/standard:7.0" }))
            .unwrap();
        Arc::new(InMemoryRepositoryConfig::new().with_repository(
            RepositoryName::new("dummy-repo").unwrap(),
            RepositoryConfig {
                build_overrides: overrides,
            },
        ))
    }

    fn dispatcher(runner: Arc<RecordingRunner>) -> Dispatcher {
        Dispatcher::new(ProjectName::new("test-build").unwrap(), runner, config())
    }

    fn push(repository: &str) -> EventEnvelope {
        let body = json!({
            "ref": "refs/heads/main",
            "repository": {
                "name": repository,
                "clone_url": format!("https://github.com/user/{repository}.git")
            }
        });
        let headers = BTreeMap::from([("X-GitHub-Event".to_string(), "push".to_string())]);
        EventEnvelope::new(headers, body.to_string()).unwrap()
    }

    #[tokio::test]
    async fn started_build_reports_build_id() {
        let runner = RecordingRunner::new(accepted);
        let result = dispatcher(runner.clone()).handle(&push("dummy-repo")).await;

        assert_eq!(result.status, DispatchStatus::Started);
        assert_eq!(result.status_code(), 302);
        assert_eq!(result.build_id.unwrap().as_str(), "test-build:0001");

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].project.as_str(), "test-build");
        assert_eq!(
            calls[0].source_location.as_str(),
            "https://github.com/user/dummy-repo.git"
        );
        assert_eq!(calls[0].source_type, SourceType::GitHub);
        assert_eq!(calls[0].source_version.as_str(), "main");
        assert_eq!(
            calls[0].overrides.get("image"),
            Some(&json!("aws/codebuild/standard:7.0"))
        );
    }

    #[tokio::test]
    async fn unknown_repository_never_reaches_runner() {
        let runner = RecordingRunner::new(accepted);
        let result = dispatcher(runner.clone()).handle(&push("other-repo")).await;

        assert_eq!(result.status, DispatchStatus::InternalError);
        assert_eq!(result.message, "Error while processing request");
        assert!(result.build_id.is_none());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn unavailable_config_is_internal_error_without_runner_call() {
        let runner = RecordingRunner::new(accepted);
        let dispatcher = Dispatcher::new(
            ProjectName::new("test-build").unwrap(),
            runner.clone(),
            Arc::new(UnavailableConfig),
        );

        let result = dispatcher.handle(&push("dummy-repo")).await;

        assert_eq!(result.status, DispatchStatus::InternalError);
        assert_eq!(result.status_code(), 500);
        assert_eq!(result.message, "Error while processing request");
        assert!(result.build_id.is_none());
        assert!(runner.calls().is_empty());

        let event = interpret(&push("dummy-repo")).unwrap();
        let err = dispatcher.dispatch(&event).await.unwrap_err();
        assert!(matches!(err, TriggerError::ConfigUnavailable { .. }));
        assert_eq!(err.stage(), DispatchStage::Interpreted);
    }

    #[tokio::test]
    async fn transport_failure_is_internal_error() {
        let runner = RecordingRunner::new(unreachable_runner);
        let result = dispatcher(runner.clone()).handle(&push("dummy-repo")).await;

        assert_eq!(result.status_code(), 500);
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn dispatch_surfaces_unknown_repository() {
        let runner = RecordingRunner::new(accepted);
        let event = interpret(&push("other-repo")).unwrap();
        let err = dispatcher(runner).dispatch(&event).await.unwrap_err();
        assert!(matches!(err, TriggerError::UnknownRepository { .. }));
    }

    #[tokio::test]
    async fn undecodable_invocation_is_internal_error() {
        let runner = RecordingRunner::new(accepted);
        let result = dispatcher(runner.clone())
            .handle_invocation(b"{\"requestPayload\": 3}")
            .await;

        assert_eq!(result.status, DispatchStatus::InternalError);
        assert!(runner.calls().is_empty());
    }
}
