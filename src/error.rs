use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Cli(#[from] CliError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Display(#[from] DisplayError),
    /// User-facing text produced by the translator or a command refinement.
    #[error("{0}")]
    Message(String),
    /// The failure was already reported to the user.
    #[error("")]
    Empty,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },
    #[error("HTTP error: {status} {}", .message.as_deref().unwrap_or("Unknown error"))]
    Http {
        status: u16,
        endpoint: String,
        message: Option<String>,
        payload: Value,
    },
    #[error("failed to parse response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl ApiError {
    /// Server-provided message carried by a structured error body.
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiError::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            ApiError::Http { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "please provide your access token by using the -t/--access-token flag, or by setting the REANA_ACCESS_TOKEN environment variable"
    )]
    MissingAccessToken,
    #[error("please set REANA_SERVER_URL environment variable")]
    MissingServerUrl,
    #[error("'{url}' is not a valid URL: {reason}")]
    InvalidServerUrl { url: String, reason: String },
    #[error(
        "workflow name must be provided, either with the -w/--workflow flag or by setting the REANA_WORKON environment variable"
    )]
    MissingWorkflow,
    #[error("'{workflow}' is not a valid workflow name or UUID: {reason}")]
    InvalidWorkflow { workflow: String, reason: String },
}

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("wrong input format. Please use --filter filter_name=filter_value")]
    FilterFormat,
    #[error("filter '{key}' is not valid\nAvailable filters are: {available}")]
    UnknownFilter { key: String, available: String },
    #[error("filter '{key}' does not accept a single value\nSingle-value filters are: {available}")]
    NotSingleFilter { key: String, available: String },
    #[error("filter '{key}' does not accept multiple values\nMulti-value filters are: {available}")]
    NotMultiFilter { key: String, available: String },
    #[error("input value '{value}' for filter '{key}' is not valid\nAvailable values are: {available}")]
    FilterValue {
        key: String,
        value: String,
        available: String,
    },
    #[error("invalid value for '{option} column': '{column}' is not part of '{available}'")]
    UnknownColumn {
        option: String,
        column: String,
        available: String,
    },
    #[error("invalid value for '{option}': '{value}' is not part of '{available}'")]
    InvalidChoice {
        option: String,
        value: String,
        available: String,
    },
    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("table formatting failed: {0}")]
    TableFormat(String),
    #[error("terminal output error: {0}")]
    TerminalOutput(#[from] std::io::Error),
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn is_empty(&self) -> bool {
        matches!(self, AppError::Empty)
    }

    pub fn troubleshooting_hint(&self) -> Option<String> {
        match self {
            AppError::Config(ConfigError::MissingAccessToken) => {
                Some("'reana-client ping' can be used to verify your token".to_string())
            }
            AppError::Config(ConfigError::MissingServerUrl) => {
                Some("export REANA_SERVER_URL=https://reana.cern.ch".to_string())
            }
            AppError::Config(ConfigError::MissingWorkflow) => {
                Some("'reana-client list' shows the workflows you can use".to_string())
            }
            _ => None,
        }
    }
}

/// Maps an error from the call path to the text the user should see.
///
/// Transport failures become a server-not-reachable message keyed to the
/// configured server URL; structured API errors surface their `message`.
/// Anything else is returned untouched.
pub fn translate(error: AppError, server_url: &str) -> AppError {
    match error {
        AppError::Api(ApiError::Transport { .. }) => AppError::Message(format!(
            "'{}' not found, please verify the provided server URL or check your internet connection",
            server_url
        )),
        AppError::Api(api_error) => match api_error.message() {
            Some(message) => AppError::Message(message.to_string()),
            None => AppError::Api(api_error),
        },
        other => other,
    }
}
