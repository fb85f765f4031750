//! Input validation for configuration values and user-supplied choices
//!
//! These checks run in the dispatcher pre-hook before any request is sent, so
//! a misconfigured environment fails fast with a readable message.

use crate::error::{ConfigError, ValidationError};
use reqwest::Url;
use uuid::Uuid;

/// Validate that an access token was resolved from the flag or environment
pub fn validate_access_token(token: &str) -> Result<(), ConfigError> {
    if token.trim().is_empty() {
        return Err(ConfigError::MissingAccessToken);
    }
    Ok(())
}

/// Validate that the server URL is absolute, uses http(s) and names a host
pub fn validate_server_url(url: &str) -> Result<(), ConfigError> {
    if url.is_empty() {
        return Err(ConfigError::MissingServerUrl);
    }

    let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidServerUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidServerUrl {
            url: url.to_string(),
            reason: "URL must start with http:// or https://".to_string(),
        });
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::InvalidServerUrl {
            url: url.to_string(),
            reason: "URL must contain a host".to_string(),
        });
    }

    Ok(())
}

/// Validate a workflow identifier: a UUID, or `name[.run]`.
///
/// The name part accepts letters, digits, `-` and `_`. The run number may be
/// empty (`myanalysis.`); otherwise it is dot-separated integers (`2`, `2.1`).
pub fn validate_workflow(workflow: &str) -> Result<(), ConfigError> {
    if workflow.is_empty() {
        return Err(ConfigError::MissingWorkflow);
    }

    if Uuid::parse_str(workflow).is_ok() {
        return Ok(());
    }

    let invalid = |reason: &str| ConfigError::InvalidWorkflow {
        workflow: workflow.to_string(),
        reason: reason.to_string(),
    };

    let (name, run_number) = match workflow.split_once('.') {
        Some((name, run)) => (name, Some(run)),
        None => (workflow, None),
    };

    if name.is_empty() {
        return Err(invalid("workflow name cannot be empty"));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid(
            "only letters, digits, '-' and '_' are allowed in workflow names",
        ));
    }

    if let Some(run) = run_number.filter(|run| !run.is_empty()) {
        let well_formed = run
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
        if !well_formed {
            return Err(invalid("run number must be numeric, e.g. 'myanalysis.2'"));
        }
    }

    Ok(())
}

/// Validate that `value` is one of the accepted `choices` for `option`
pub fn validate_choice(value: &str, choices: &[&str], option: &str) -> Result<(), ValidationError> {
    if choices.contains(&value) {
        return Ok(());
    }
    Err(ValidationError::InvalidChoice {
        option: option.to_string(),
        value: value.to_string(),
        available: choices.join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_access_token() {
        assert!(validate_access_token("1234").is_ok());
        assert!(matches!(
            validate_access_token(""),
            Err(ConfigError::MissingAccessToken)
        ));
        assert!(validate_access_token("   ").is_err());
    }

    #[test]
    fn test_validate_server_url_accepts_valid_urls() {
        assert!(validate_server_url("http://localhost:30080").is_ok());
        assert!(validate_server_url("https://reana.cern.ch").is_ok());
        assert!(validate_server_url("https://reana.cern.ch/").is_ok());
    }

    #[test]
    fn test_validate_server_url_rejects_invalid_urls() {
        assert!(matches!(
            validate_server_url(""),
            Err(ConfigError::MissingServerUrl)
        ));
        assert!(validate_server_url("localhost:30443").is_err());
        assert!(validate_server_url("ftp://example.com").is_err());
        assert!(validate_server_url("not a url").is_err());
    }

    #[test]
    fn test_validate_workflow_names() {
        assert!(validate_workflow("my_workflow").is_ok());
        assert!(validate_workflow("myanalysis.2").is_ok());
        assert!(validate_workflow("myanalysis.2.1").is_ok());
        assert!(validate_workflow("myanalysis.").is_ok());
        assert!(validate_workflow("root6-roofit").is_ok());
        assert!(validate_workflow("3b2ad8d8-1b5e-4c0a-b1e8-6f1f1c1d1e1f").is_ok());
    }

    #[test]
    fn test_validate_workflow_rejects_invalid() {
        assert!(matches!(
            validate_workflow(""),
            Err(ConfigError::MissingWorkflow)
        ));
        assert!(validate_workflow(".2").is_err());
        assert!(validate_workflow("my workflow").is_err());
        assert!(validate_workflow("myanalysis.two").is_err());
    }

    #[test]
    fn test_validate_choice() {
        assert!(validate_choice("jupyter", &["jupyter"], "interactive session type").is_ok());
        let err = validate_choice("vscode", &["jupyter", "notebook"], "interactive session type")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for 'interactive session type': 'vscode' is not part of 'jupyter, notebook'"
        );
    }
}
