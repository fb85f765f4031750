use crate::api::client::ReanaClient;
use crate::api::models::SecretPayload;
use crate::cli::main_types::{SecretsAddArgs, SecretsDeleteArgs, SecretsListArgs};
use crate::display::{Severity, display_json_output, display_message, display_table};
use crate::error::{ApiError, AppError, CliError, ValidationError};
use crate::storage::config::Session;
use crate::utils::text::quoted_list;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Handler for user secrets
pub struct SecretsHandler;

impl SecretsHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle_add<W: Write>(
        &self,
        session: &Session,
        args: &SecretsAddArgs,
        out: &mut W,
    ) -> Result<(), AppError> {
        let secrets = collect_secrets(&args.env, &args.file)?;
        let names: Vec<String> = secrets.keys().cloned().collect();

        let client = ReanaClient::from_session(session)?;
        match client.add_secrets(&secrets, args.overwrite).await {
            Ok(_) => {}
            Err(e) if e.status() == Some(409) => return Err(existing_secrets_error(e, &names)),
            Err(e) => return Err(e.into()),
        }

        display_message(
            out,
            &format!("Secrets {} were successfully uploaded.", names.join(", ")),
            Severity::Success,
            false,
        )?;
        Ok(())
    }

    pub async fn handle_list<W: Write>(
        &self,
        session: &Session,
        args: &SecretsListArgs,
        out: &mut W,
    ) -> Result<(), AppError> {
        let client = ReanaClient::from_session(session)?;
        let secrets = client.list_secrets().await?;

        if args.json {
            display_json_output(&secrets, out)?;
            return Ok(());
        }
        let header = vec!["NAME".to_string(), "TYPE".to_string()];
        let rows: Vec<Vec<String>> = secrets
            .iter()
            .map(|secret| vec![secret.name.clone(), secret.secret_type.clone()])
            .collect();
        display_table(&header, &rows, out)?;
        Ok(())
    }

    pub async fn handle_delete<W: Write>(
        &self,
        session: &Session,
        args: &SecretsDeleteArgs,
        out: &mut W,
    ) -> Result<(), AppError> {
        let client = ReanaClient::from_session(session)?;
        match client.delete_secrets(&args.names).await {
            Ok(_) => {}
            Err(e) if e.status() == Some(404) => return Err(missing_secrets_error(e)),
            Err(e) => return Err(e.into()),
        }

        display_message(
            out,
            &format!("Secrets {} were successfully deleted.", args.names.join(", ")),
            Severity::Success,
            false,
        )?;
        Ok(())
    }
}

impl Default for SecretsHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the upload body from `--env NAME=VALUE` and `--file PATH` options.
fn collect_secrets(
    env: &[String],
    files: &[String],
) -> Result<BTreeMap<String, SecretPayload>, AppError> {
    if env.is_empty() && files.is_empty() {
        return Err(ValidationError::Other(
            "missing secrets, use --env NAME=VALUE or --file PATH".to_string(),
        )
        .into());
    }

    let mut secrets = BTreeMap::new();
    for literal in env {
        let (name, value) = literal.split_once('=').ok_or_else(|| {
            ValidationError::Other(format!(
                "wrong format for --env '{}'. Please use --env NAME=VALUE",
                literal
            ))
        })?;
        secrets.insert(
            name.to_string(),
            SecretPayload {
                value: STANDARD.encode(value.as_bytes()),
                secret_type: "env".to_string(),
            },
        );
    }

    for path in files {
        let contents = std::fs::read(path).map_err(|source| CliError::FileIo {
            path: path.clone(),
            source,
        })?;
        let name = Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        secrets.insert(
            name,
            SecretPayload {
                value: STANDARD.encode(&contents),
                secret_type: "file".to_string(),
            },
        );
    }
    Ok(secrets)
}

/// Secret names listed in an error payload, if it is an array.
fn payload_names(error: &ApiError) -> Option<Vec<String>> {
    match error.payload() {
        Some(Value::Array(items)) if !items.is_empty() => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(name) => name.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        _ => None,
    }
}

/// A 409 names the secrets that already exist. The server message wins,
/// then the names in the payload, then every uploaded name.
fn existing_secrets_error(error: ApiError, uploaded: &[String]) -> AppError {
    if let Some(message) = error.message() {
        return AppError::Message(message.to_string());
    }
    let names = payload_names(&error).unwrap_or_else(|| uploaded.to_vec());
    AppError::Message(format!(
        "Operation cancelled. Secret {} already exists. If you want to change it use overwrite",
        names.join(", ")
    ))
}

/// A 404 lists the names the server does not know.
fn missing_secrets_error(error: ApiError) -> AppError {
    match payload_names(&error) {
        Some(names) => AppError::Message(format!(
            "secrets {} do not exist. Nothing was deleted",
            quoted_list(&names)
        )),
        None => error.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collect_env_secrets() {
        let secrets =
            collect_secrets(&["PASSWORD=s3cr=t".to_string()], &[]).unwrap();
        assert_eq!(
            secrets["PASSWORD"],
            SecretPayload {
                value: STANDARD.encode("s3cr=t"),
                secret_type: "env".to_string(),
            }
        );
    }

    #[test]
    fn test_collect_secrets_errors() {
        assert!(matches!(
            collect_secrets(&[], &[]),
            Err(AppError::Validation(ValidationError::Other(_)))
        ));
        assert!(matches!(
            collect_secrets(&["NOVALUE".to_string()], &[]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            collect_secrets(&[], &["/nonexistent/reana/secret.txt".to_string()]),
            Err(AppError::Cli(CliError::FileIo { .. }))
        ));
    }

    #[test]
    fn test_missing_secrets_error() {
        let error = ApiError::Http {
            status: 404,
            endpoint: "/api/secrets/".to_string(),
            message: None,
            payload: json!(["secret1"]),
        };
        assert_eq!(
            missing_secrets_error(error).to_string(),
            "secrets ['secret1'] do not exist. Nothing was deleted"
        );

        let error = ApiError::Http {
            status: 404,
            endpoint: "/api/secrets/".to_string(),
            message: Some("Not found".to_string()),
            payload: json!({"message": "Not found"}),
        };
        assert!(matches!(missing_secrets_error(error), AppError::Api(_)));
    }

    #[test]
    fn test_existing_secrets_error() {
        let uploaded = vec!["PASSWORD".to_string(), "USER".to_string()];
        let conflict = |message: Option<&str>, payload| ApiError::Http {
            status: 409,
            endpoint: "/api/secrets/".to_string(),
            message: message.map(str::to_string),
            payload,
        };

        assert_eq!(
            existing_secrets_error(conflict(None, json!(["USER"])), &uploaded).to_string(),
            "Operation cancelled. Secret USER already exists. If you want to change it use overwrite"
        );
        assert_eq!(
            existing_secrets_error(conflict(Some("Secret USER exists"), json!({})), &uploaded)
                .to_string(),
            "Secret USER exists"
        );
        assert_eq!(
            existing_secrets_error(conflict(None, Value::Null), &uploaded).to_string(),
            "Operation cancelled. Secret PASSWORD, USER already exists. If you want to change it use overwrite"
        );
    }
}
