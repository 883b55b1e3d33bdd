//! Webhook build trigger entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: flags with environment fallbacks (see
//!    [`config::Cli`]).
//! 2. **Wire observability**: `tracing-subscriber` with a JSON layer and an
//!    optional OpenTelemetry OTLP exporter. All `tracing` spans and structured
//!    events emitted by every crate in the workspace flow through this layer.
//! 3. **Construct infrastructure**: the HTTP build runner client and the
//!    file-backed repository configuration, injected into the
//!    [`trigger::Dispatcher`].
//! 4. **Run the command**:
//!    - `handle`: decode one invocation document, dispatch it, and print the
//!      response JSON. The exit status is zero whatever the classification;
//!      the response carries it.
//!    - `builds`: list and describe the project's most recent builds.

mod config;
mod telemetry;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use repo_config::JsonFileRepositoryConfig;
use runner::HttpBuildRunner;
use tokio::io::AsyncReadExt;
use trigger::{BuildRunner, Dispatcher, ProjectName};

use crate::config::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let telemetry = telemetry::init(cli.log_format, cli.otlp_endpoint.as_deref())?;

    let outcome = run(cli).await;
    if let Err(err) = &outcome {
        tracing::error!(error = ?err, "Command failed");
    }

    telemetry.shutdown();
    outcome
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let project = ProjectName::new(cli.project).context("build project name must not be empty")?;

    let mut runner = HttpBuildRunner::new(
        cli.runner_url,
        Duration::from_secs(cli.runner_timeout_secs),
    )
    .context("failed to create build runner client")?;
    if let Some(token) = cli.runner_token {
        runner = runner.with_token(token);
    }

    match cli.command {
        Command::Handle { path } => {
            let config = JsonFileRepositoryConfig::open(&cli.repo_config)
                .context("failed to open repository configuration")?;
            let dispatcher = Dispatcher::new(project, Arc::new(runner), Arc::new(config));

            let document = read_document(path.as_deref()).await?;
            let result = dispatcher.handle_invocation(&document).await;
            println!("{}", serde_json::to_string(&result.to_response())?);
        }
        Command::Builds { limit } => {
            let mut ids = runner
                .list_builds(&project)
                .await
                .context("failed to list builds")?;
            ids.truncate(limit);

            let builds = runner
                .get_builds(&ids)
                .await
                .context("failed to describe builds")?;
            for build in builds {
                println!("{}", serde_json::to_string(&build)?);
            }
        }
    }

    Ok(())
}

async fn read_document(path: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read invocation document '{}'", path.display())),
        None => {
            let mut document = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut document)
                .await
                .context("failed to read invocation document from stdin")?;
            Ok(document)
        }
    }
}
