use crate::api::client::ReanaClient;
use crate::api::models::{QuotaResource, QuotaStat, UserInfo};
use crate::cli::main_types::{InfoArgs, QuotaReport, QuotaShowArgs};
use crate::display::{display_json_output, display_line};
use crate::error::{AppError, ValidationError};
use crate::storage::config::Session;
use crate::utils::validation::validate_choice;
use crossterm::style::Stylize;
use serde_json::Value;
use std::io::Write;

pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `/api/info` fields in display order
const INFO_FIELDS: &[&str] = &[
    "compute_backends",
    "default_workspace",
    "workspaces_available",
    "default_kubernetes_memory_limit",
    "kubernetes_max_memory_limit",
    "default_kubernetes_jobs_timeout",
    "maximum_kubernetes_jobs_timeout",
    "maximum_workspace_retention_period",
    "maximum_interactive_session_inactivity_period",
    "interactive_session_recommended_jupyter_images",
    "supported_workflow_engines",
    "dask_enabled",
];

/// Handler for server-level commands
pub struct ServerHandler;

impl ServerHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle_ping<W: Write>(&self, session: &Session, out: &mut W) -> Result<(), AppError> {
        let client = ReanaClient::from_session(session)?;
        let user = client.you().await?;
        tracing::info!("authenticated against {}", session.server_url);

        display_line(out, &format!("REANA server: {}", session.server_url))?;
        display_line(
            out,
            &format!(
                "REANA server version: {}",
                user.reana_server_version.as_deref().unwrap_or("unknown")
            ),
        )?;
        display_line(out, &format!("REANA client version: {}", CLIENT_VERSION))?;
        display_line(out, &format!("Authenticated as: {}", authenticated_as(&user)))?;
        display_line(out, "Status: Connected")?;
        Ok(())
    }

    pub async fn handle_info<W: Write>(
        &self,
        session: &Session,
        args: &InfoArgs,
        out: &mut W,
    ) -> Result<(), AppError> {
        let client = ReanaClient::from_session(session)?;
        let info = client.info().await?;
        if args.json {
            display_json_output(&info, out)?;
            return Ok(());
        }

        let Value::Object(fields) = &info else {
            return Ok(());
        };
        let unknown = fields.keys().filter(|key| !INFO_FIELDS.contains(&key.as_str()));
        let ordered = INFO_FIELDS
            .iter()
            .filter_map(|key| fields.get_key_value(*key).map(|(key, _)| key))
            .chain(unknown);
        for key in ordered {
            if let Some(line) = info_line(key, &fields[key.as_str()]) {
                display_line(out, &line)?;
            }
        }
        Ok(())
    }

    pub fn handle_version<W: Write>(&self, out: &mut W) -> Result<(), AppError> {
        display_line(out, CLIENT_VERSION)?;
        Ok(())
    }

    pub async fn handle_quota_show<W: Write>(
        &self,
        session: &Session,
        args: &QuotaShowArgs,
        out: &mut W,
    ) -> Result<(), AppError> {
        let client = ReanaClient::from_session(session)?;
        let user = client.you().await?;
        let available: Vec<&str> = user.quota.keys().map(String::as_str).collect();

        if args.resources {
            for name in &available {
                display_line(out, name)?;
            }
            return Ok(());
        }

        let resource_name = args.resource.as_deref().ok_or_else(|| {
            ValidationError::Other(format!(
                "missing option '--resource'. Available resources are: {}",
                available.join(", ")
            ))
        })?;
        validate_choice(resource_name, &available, "resource")?;
        let resource = &user.quota[resource_name];

        let line = quota_report(resource_name, resource, args.report, args.human_readable);
        display_line(out, &line)?;
        Ok(())
    }
}

impl Default for ServerHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn authenticated_as(user: &UserInfo) -> String {
    match user.full_name.as_deref().filter(|name| !name.is_empty()) {
        Some(full_name) => format!("{} <{}>", full_name, user.email),
        None => format!("<{}>", user.email),
    }
}

/// `Title: value` for a `{"title": ..., "value": ...}` info field
fn info_line(key: &str, field: &Value) -> Option<String> {
    let title = match field.get("title") {
        Some(Value::String(title)) => title.clone(),
        _ => key.replace('_', " "),
    };
    let value = field.get("value")?;
    Some(format!("{}: {}", title, info_value(value)))
}

fn info_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(info_value).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

fn raw_unit(resource: &str) -> &'static str {
    match resource {
        "cpu" => "milliseconds",
        "disk" => "bytes",
        _ => "",
    }
}

fn render_stat(resource: &str, stat: &QuotaStat, human_readable: bool) -> String {
    if human_readable && !stat.human_readable.is_empty() {
        return stat.human_readable.clone();
    }
    let unit = raw_unit(resource);
    if unit.is_empty() {
        stat.raw.to_string()
    } else {
        format!("{} {}", stat.raw, unit)
    }
}

fn quota_report(
    name: &str,
    resource: &QuotaResource,
    report: Option<QuotaReport>,
    human_readable: bool,
) -> String {
    let has_limit = resource.limit.raw > 0.0;
    let has_usage = resource.usage.raw > 0.0 || !resource.usage.human_readable.is_empty();
    let usage = render_stat(name, &resource.usage, human_readable);
    let limit = render_stat(name, &resource.limit, human_readable);

    match report {
        Some(QuotaReport::Limit) if has_limit => limit,
        Some(QuotaReport::Limit) => "No limit".to_string(),
        Some(QuotaReport::Usage) if has_usage => usage,
        Some(QuotaReport::Usage) => "No usage".to_string(),
        None if has_limit => {
            let percentage = (resource.usage.raw * 100.0 / resource.limit.raw).round() as i64;
            let line = format!("{} out of {} used ({}%)", usage, limit, percentage);
            match resource.health.as_deref() {
                Some("healthy") => line.green().to_string(),
                Some("warning") => line.yellow().to_string(),
                Some("critical") => line.red().to_string(),
                _ => line,
            }
        }
        None => format!("{} used", usage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cpu_quota(limit: f64) -> QuotaResource {
        serde_json::from_value(json!({
            "usage": {"raw": 325000, "human_readable": "5m 25s"},
            "limit": {"raw": limit, "human_readable": "10m 50s"},
            "health": "healthy"
        }))
        .unwrap()
    }

    #[test]
    fn test_authenticated_as() {
        let mut user = UserInfo {
            email: "john.doe@example.org".to_string(),
            ..UserInfo::default()
        };
        assert_eq!(authenticated_as(&user), "<john.doe@example.org>");
        user.full_name = Some("John Doe".to_string());
        assert_eq!(authenticated_as(&user), "John Doe <john.doe@example.org>");
    }

    #[test]
    fn test_info_line() {
        let field = json!({"title": "List of supported compute backends", "value": ["kubernetes", "slurmcern"]});
        assert_eq!(
            info_line("compute_backends", &field).as_deref(),
            Some("List of supported compute backends: kubernetes, slurmcern")
        );
        let field = json!({"title": "Default timeout for Kubernetes jobs", "value": null});
        assert_eq!(
            info_line("default_kubernetes_jobs_timeout", &field).as_deref(),
            Some("Default timeout for Kubernetes jobs: None")
        );
        assert!(info_line("broken", &json!("no object")).is_none());
    }

    #[test]
    fn test_quota_report_modes() {
        let quota = cpu_quota(650000.0);
        assert_eq!(quota_report("cpu", &quota, Some(QuotaReport::Limit), true), "10m 50s");
        assert_eq!(
            quota_report("cpu", &quota, Some(QuotaReport::Limit), false),
            "650000 milliseconds"
        );
        assert_eq!(quota_report("cpu", &quota, Some(QuotaReport::Usage), true), "5m 25s");
        let full = quota_report("cpu", &quota, None, true);
        assert!(full.contains("5m 25s out of 10m 50s used (50%)"));
    }

    #[test]
    fn test_quota_report_without_limit() {
        let quota = cpu_quota(0.0);
        assert_eq!(quota_report("cpu", &quota, Some(QuotaReport::Limit), true), "No limit");
        assert_eq!(quota_report("cpu", &quota, None, true), "5m 25s used");
        assert_eq!(
            quota_report("disk", &QuotaResource::default(), Some(QuotaReport::Usage), false),
            "No usage"
        );
    }
}
