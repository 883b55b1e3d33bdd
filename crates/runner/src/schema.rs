//! Override parameter schema.
//!
//! The runner accepts a fixed set of named override parameters on top of the
//! four parameters every start request carries. Overrides are checked here
//! before anything is sent, so a misconfigured repository is reported as a
//! validation failure rather than an opaque server error.

use serde_json::Value;
use trigger::{BuildOverrides, RunnerError};

/// Expected JSON shape of an override value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    String,
    Integer,
    Boolean,
    Array,
    Object,
}

impl Shape {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Integer => "a non-negative integer",
            Self::Boolean => "a boolean",
            Self::Array => "an array",
            Self::Object => "an object",
        }
    }
}

/// Every override the runner understands, with its value shape.
const OVERRIDE_PARAMETERS: &[(&str, Shape)] = &[
    ("artifacts", Shape::Object),
    ("build_status_config", Shape::Object),
    ("buildspec", Shape::String),
    ("cache", Shape::Object),
    ("certificate", Shape::String),
    ("compute_type", Shape::String),
    ("debug_session_enabled", Shape::Boolean),
    ("encryption_key", Shape::String),
    ("environment_type", Shape::String),
    ("environment_variables", Shape::Array),
    ("git_clone_depth", Shape::Integer),
    ("git_submodules_config", Shape::Object),
    ("idempotency_token", Shape::String),
    ("image", Shape::String),
    ("image_pull_credentials_type", Shape::String),
    ("insecure_ssl", Shape::Boolean),
    ("logs_config", Shape::Object),
    ("privileged_mode", Shape::Boolean),
    ("queued_timeout_in_minutes", Shape::Integer),
    ("registry_credential", Shape::Object),
    ("report_build_status", Shape::Boolean),
    ("secondary_artifacts", Shape::Array),
    ("secondary_sources", Shape::Array),
    ("secondary_sources_version", Shape::Array),
    ("service_role", Shape::String),
    ("source_auth", Shape::Object),
    ("timeout_in_minutes", Shape::Integer),
];

/// Checks every override against the schema.
///
/// All problems are collected into one [`RunnerError::Validation`] so the
/// operator sees the full list in a single log line.
pub fn validate_overrides(overrides: &BuildOverrides) -> Result<(), RunnerError> {
    let mut problems = Vec::new();

    for (name, value) in overrides.as_map() {
        match OVERRIDE_PARAMETERS.iter().find(|(known, _)| *known == name.as_str()) {
            None => problems.push(format!("unknown parameter \"{name}\"")),
            Some((_, shape)) if !shape.matches(value) => {
                problems.push(format!("parameter \"{name}\" must be {}", shape.describe()));
            }
            Some(_) => {}
        }
    }

    // Environment variables are the most common override; check their entries too.
    if let Some(Value::Array(variables)) = overrides.get("environment_variables") {
        for (index, variable) in variables.iter().enumerate() {
            let named = variable.get("name").is_some_and(Value::is_string);
            let valued = variable.get("value").is_some_and(Value::is_string);
            if !named || !valued {
                problems.push(format!(
                    "environment_variables[{index}] must have string \"name\" and \"value\""
                ));
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(RunnerError::Validation {
            message: problems.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn overrides(value: Value) -> BuildOverrides {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn known_overrides_pass() {
        let result = validate_overrides(&overrides(json!({
            "environment_variables": [{ "name": "foo", "type": "PLAINTEXT", "value": "bar" }],
            "image": "aws/codebuild/standard:7.0",
            "privileged_mode": true,
            "timeout_in_minutes": 30
        })));
        assert!(result.is_ok());
    }

    #[test]
    fn no_overrides_pass() {
        assert!(validate_overrides(&BuildOverrides::default()).is_ok());
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = validate_overrides(&overrides(json!({ "colour": "blue" }))).unwrap_err();
        match err {
            RunnerError::Validation { message } => assert!(message.contains("\"colour\"")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn fixed_parameters_cannot_be_overridden() {
        let err = validate_overrides(&overrides(json!({ "source_version": "main" })));
        assert!(matches!(err, Err(RunnerError::Validation { .. })));
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        let err = validate_overrides(&overrides(json!({ "timeout_in_minutes": "thirty" })));
        assert!(matches!(err, Err(RunnerError::Validation { .. })));

        let err = validate_overrides(&overrides(json!({
            "environment_variables": [{ "name": "foo" }]
        })));
        assert!(matches!(err, Err(RunnerError::Validation { .. })));
    }

    #[test]
    fn all_problems_are_reported_together() {
        let err = validate_overrides(&overrides(json!({
            "colour": "blue",
            "image": 7
        })))
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("\"colour\""), "{message}");
        assert!(message.contains("\"image\""), "{message}");
    }
}
