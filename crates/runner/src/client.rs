//! HTTP transport for the build runner.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use trigger::{
    BuildId, BuildRunner, BuildSummary, ProjectName, RunnerError, StartBuildRequest,
};

use crate::schema::validate_overrides;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to the build runner's JSON API.
///
/// | Operation | Request |
/// |-----------|---------|
/// | start | `POST {base}/builds` |
/// | list | `GET {base}/projects/{project}/builds` |
/// | describe | `POST {base}/builds/batch-get` |
#[derive(Debug, Clone)]
pub struct HttpBuildRunner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct StartBuildBody<'a> {
    project: &'a str,
    source_location: &'a str,
    source_type: &'a str,
    source_version: &'a str,
    #[serde(flatten)]
    overrides: &'a Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct StartBuildResponse {
    build: StartedBuild,
}

#[derive(Debug, Deserialize)]
struct StartedBuild {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ListBuildsResponse {
    #[serde(default)]
    ids: Vec<BuildId>,
}

#[derive(Debug, Serialize)]
struct BatchGetBody<'a> {
    ids: &'a [BuildId],
}

#[derive(Debug, Deserialize)]
struct BatchGetResponse {
    #[serde(default)]
    builds: Vec<BuildSummary>,
}

// ---------------------------------------------------------------------------

impl HttpBuildRunner {
    /// Creates a client for the runner at `base_url`.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, RunnerError> {
        if base_url.cannot_be_a_base() {
            return Err(RunnerError::Transport {
                message: format!("runner URL '{base_url}' cannot be used as a base URL"),
            });
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .map_err(|e| RunnerError::Transport {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Sends `token` as a bearer token with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// The runner's base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RunnerError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| RunnerError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(classify_rejection(status, message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RunnerError::InvalidResponse {
                message: e.to_string(),
            })
    }
}

/// Maps a non-success status onto a [`RunnerError`].
///
/// The runner's error body does not identify which parameter it refused, so
/// even 400 and 422 are rejections rather than override validation failures.
fn classify_rejection(status: StatusCode, message: String) -> RunnerError {
    let message = if message.is_empty() {
        status.canonical_reason().unwrap_or_default().to_string()
    } else {
        message
    };

    RunnerError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl BuildRunner for HttpBuildRunner {
    async fn start(&self, request: StartBuildRequest) -> Result<BuildId, RunnerError> {
        if let Err(err) = validate_overrides(&request.overrides) {
            warn!(project = %request.project, error = %err, "Overrides rejected before sending");
            return Err(err);
        }

        let body = StartBuildBody {
            project: request.project.as_str(),
            source_location: request.source_location.as_str(),
            source_type: request.source_type.as_str(),
            source_version: request.source_version.as_str(),
            overrides: request.overrides.as_map(),
        };

        let url = self.endpoint(&["builds"]);
        debug!(url = %url, overrides = request.overrides.len(), "Requesting build start");
        let response: StartBuildResponse = self.send(self.client.post(url).json(&body)).await?;

        BuildId::new(response.build.id).ok_or_else(|| RunnerError::InvalidResponse {
            message: "runner returned an empty build id".to_string(),
        })
    }

    async fn list_builds(&self, project: &ProjectName) -> Result<Vec<BuildId>, RunnerError> {
        let url = self.endpoint(&["projects", project.as_str(), "builds"]);
        debug!(url = %url, "Listing builds");
        let response: ListBuildsResponse = self.send(self.client.get(url)).await?;
        Ok(response.ids)
    }

    async fn get_builds(&self, ids: &[BuildId]) -> Result<Vec<BuildSummary>, RunnerError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.endpoint(&["builds", "batch-get"]);
        debug!(url = %url, count = ids.len(), "Describing builds");
        let response: BatchGetResponse = self
            .send(self.client.post(url).json(&BatchGetBody { ids }))
            .await?;
        Ok(response.builds)
    }
}
