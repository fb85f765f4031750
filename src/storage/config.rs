use std::collections::HashMap;

pub const SERVER_URL_KEY: &str = "server-url";
pub const ACCESS_TOKEN_KEY: &str = "access-token";
pub const WORKFLOW_KEY: &str = "workflow";
pub const TLS_SKIP_VERIFY_KEY: &str = "tls-skip-verify";

/// Environment variables bound into the store, as `(variable, key)` pairs.
pub const ENV_BINDINGS: [(&str, &str); 4] = [
    ("REANA_SERVER_URL", SERVER_URL_KEY),
    ("REANA_ACCESS_TOKEN", ACCESS_TOKEN_KEY),
    ("REANA_WORKON", WORKFLOW_KEY),
    ("REANA_TLS_SKIP_VERIFY", TLS_SKIP_VERIFY_KEY),
];

/// Read-only snapshot of the process configuration.
///
/// Built once before any command runs; commands receive the resolved values
/// through the dispatcher and never mutate the store.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Builds a snapshot from `(variable, value)` pairs, keeping only bound
    /// variables.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut values = HashMap::new();
        for (name, value) in vars {
            if let Some((_, key)) = ENV_BINDINGS
                .iter()
                .find(|(variable, _)| *variable == name.as_ref())
            {
                values.insert(key.to_string(), value.into());
            }
        }
        Self { values }
    }

    pub fn with_value(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn server_url(&self) -> &str {
        self.get(SERVER_URL_KEY).unwrap_or_default()
    }

    pub fn tls_skip_verify(&self) -> bool {
        matches!(
            self.get(TLS_SKIP_VERIFY_KEY)
                .map(|v| v.trim().to_ascii_lowercase())
                .as_deref(),
            Some("1" | "true" | "yes")
        )
    }

    /// Explicit flag value wins over the stored value.
    pub fn resolve(&self, key: &str, flag: Option<&str>) -> String {
        match flag {
            Some(value) => value.to_string(),
            None => self.get(key).unwrap_or_default().to_string(),
        }
    }
}

/// Values resolved for a single command invocation.
///
/// Produced by the dispatcher pre-hook from the [`Config`] snapshot and the
/// command-line flags, then handed to the command handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub server_url: String,
    pub access_token: String,
    pub workflow: String,
    pub tls_skip_verify: bool,
}
