//! Command-line and environment configuration.
//!
//! Every flag has an environment-variable fallback so the binary can run
//! unchanged behind an invoker that only passes environment.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use runner::Url;

/// Starts builds for GitHub webhook events.
#[derive(Debug, Parser)]
#[command(name = "build-trigger", version, about)]
pub struct Cli {
    /// Build project every build is started in.
    #[arg(long, env = "BUILD_PROJECT_NAME")]
    pub project: String,

    /// Repository configuration table (JSON).
    #[arg(long, env = "REPO_CONFIG_PATH", default_value = "repo_cfg.json")]
    pub repo_config: PathBuf,

    /// Base URL of the build runner API.
    #[arg(long, env = "BUILD_RUNNER_URL")]
    pub runner_url: Url,

    /// Bearer token for the build runner API.
    #[arg(long, env = "BUILD_RUNNER_TOKEN", hide_env_values = true)]
    pub runner_token: Option<String>,

    /// Build runner request timeout, in seconds.
    #[arg(long, env = "BUILD_RUNNER_TIMEOUT_SECS", default_value_t = 30)]
    pub runner_timeout_secs: u64,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint. Span export is disabled when unset.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Handle one invocation document and print the response.
    Handle {
        /// File holding the invocation document. Reads stdin when omitted.
        path: Option<PathBuf>,
    },

    /// Describe the project's most recent builds.
    Builds {
        /// Maximum number of builds to describe.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable, for local runs.
    Pretty,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_handle_with_flags() {
        let cli = Cli::try_parse_from([
            "build-trigger",
            "--project",
            "test-build",
            "--runner-url",
            "http://localhost:8080/",
            "--repo-config",
            "/etc/trigger/repo_cfg.json",
            "--log-format",
            "pretty",
            "handle",
            "event.json",
        ])
        .unwrap();

        assert_eq!(cli.project, "test-build");
        assert_eq!(cli.runner_url.as_str(), "http://localhost:8080/");
        assert_eq!(cli.repo_config, PathBuf::from("/etc/trigger/repo_cfg.json"));
        assert_eq!(cli.log_format, LogFormat::Pretty);
        assert!(matches!(
            cli.command,
            Command::Handle { path: Some(ref p) } if p == &PathBuf::from("event.json")
        ));
    }

    #[test]
    fn rejects_invalid_runner_url() {
        let result = Cli::try_parse_from([
            "build-trigger",
            "--project",
            "test-build",
            "--runner-url",
            "not a url",
            "builds",
        ]);
        assert!(result.is_err());
    }
}
