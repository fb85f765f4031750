use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Custom deserializer: some endpoints ship a JSON document encoded as a
/// string field. Decodes it, falling back to the raw string when it is not
/// valid JSON.
fn deserialize_embedded_json<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
        Value::String(s) => Ok(serde_json::from_str(&s).unwrap_or(Value::String(s))),
        other => Ok(other),
    }
}

// User and quota models
#[derive(Debug, Deserialize, Clone, Default)]
pub struct UserInfo {
    #[serde(default)]
    pub email: String,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub reana_server_version: Option<String>,
    #[serde(default)]
    pub quota: BTreeMap<String, QuotaResource>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct QuotaResource {
    #[serde(default)]
    pub usage: QuotaStat,
    #[serde(default)]
    pub limit: QuotaStat,
    pub health: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct QuotaStat {
    #[serde(default)]
    pub raw: f64,
    #[serde(default)]
    pub human_readable: String,
}

// Workflow models
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct FileSize {
    #[serde(default)]
    pub raw: i64,
    #[serde(default)]
    pub human_readable: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct JobCount {
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkflowProgress {
    pub run_started_at: Option<String>,
    pub run_finished_at: Option<String>,
    pub total: Option<JobCount>,
    pub finished: Option<JobCount>,
    pub current_command: Option<String>,
    pub current_step_name: Option<String>,
}

impl WorkflowProgress {
    /// `finished/total`, when the engine reported any jobs
    pub fn summary(&self) -> Option<String> {
        let total = self.total.as_ref().map_or(0, |count| count.total);
        if total <= 0 {
            return None;
        }
        let finished = self.finished.as_ref().map_or(0, |count| count.total);
        Some(format!("{}/{}", finished, total))
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Workflow {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    pub user: Option<String>,
    pub created: Option<String>,
    pub progress: Option<WorkflowProgress>,
    pub size: Option<FileSize>,
    pub session_type: Option<String>,
    pub session_uri: Option<String>,
    pub session_status: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkflowList {
    #[serde(default)]
    pub items: Vec<Workflow>,
    pub total: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkflowStatusResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    pub user: Option<String>,
    pub created: Option<String>,
    pub progress: Option<WorkflowProgress>,
}

impl From<WorkflowStatusResponse> for Workflow {
    fn from(status: WorkflowStatusResponse) -> Self {
        Workflow {
            id: status.id,
            name: status.name,
            status: status.status,
            user: status.user,
            created: status.created,
            progress: status.progress,
            ..Workflow::default()
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StartResponse {
    #[serde(default)]
    pub status: String,
    pub workflow_name: Option<String>,
    pub run_number: Option<Value>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct StartRequest {
    pub operational_options: BTreeMap<String, String>,
    pub input_parameters: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkflowParameters {
    #[serde(default, rename = "type")]
    pub workflow_type: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct DeleteRequest {
    pub all_runs: bool,
    pub workspace: bool,
}

// Workspace models
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DiskUsageEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: FileSize,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DiskUsage {
    pub workflow_id: Option<String>,
    pub workflow_name: Option<String>,
    #[serde(default)]
    pub disk_usage_info: Vec<DiskUsageEntry>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkspaceFile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: FileSize,
    #[serde(rename = "last-modified")]
    pub last_modified: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkspaceListing {
    #[serde(default)]
    pub items: Vec<WorkspaceFile>,
    pub total: Option<i64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DeletedFile {
    #[serde(default)]
    pub size: i64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FailedFile {
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DeleteFilesResponse {
    #[serde(default)]
    pub deleted: BTreeMap<String, DeletedFile>,
    #[serde(default)]
    pub failed: BTreeMap<String, FailedFile>,
}

// Logs and diff models
#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkflowLogsResponse {
    #[serde(default, deserialize_with = "deserialize_embedded_json")]
    pub logs: Value,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct JobLog {
    pub workflow_uuid: Option<String>,
    pub job_name: Option<String>,
    pub compute_backend: Option<String>,
    pub backend_job_id: Option<String>,
    pub docker_img: Option<String>,
    pub cmd: Option<String>,
    pub status: Option<String>,
    pub logs: Option<String>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct WorkflowLogs {
    pub workflow_logs: Option<String>,
    #[serde(default)]
    pub job_logs: BTreeMap<String, JobLog>,
    pub engine_specific: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkflowDiff {
    #[serde(default, deserialize_with = "deserialize_embedded_json")]
    pub reana_specification: Value,
    #[serde(default)]
    pub workspace_listing: Value,
}

// Interactive session models
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OpenSessionResponse {
    #[serde(default)]
    pub path: String,
}

// Secret models
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SecretPayload {
    pub value: String,
    #[serde(rename = "type")]
    pub secret_type: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Secret {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub secret_type: String,
}
