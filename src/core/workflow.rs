//! Workflow lifecycle: statuses, start-time options and the follow poller

use crate::api::client::{ReanaClient, WorkspaceQuery};
use crate::display::message::{Severity, display_message};
use crate::error::{AppError, DisplayError, ValidationError};
use crate::utils::text::format_file_url;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStatus {
    Created,
    Queued,
    Pending,
    Running,
    Finished,
    Failed,
    Stopped,
    Deleted,
}

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 8] = [
        WorkflowStatus::Created,
        WorkflowStatus::Queued,
        WorkflowStatus::Pending,
        WorkflowStatus::Running,
        WorkflowStatus::Finished,
        WorkflowStatus::Failed,
        WorkflowStatus::Stopped,
        WorkflowStatus::Deleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Created => "created",
            WorkflowStatus::Queued => "queued",
            WorkflowStatus::Pending => "pending",
            WorkflowStatus::Running => "running",
            WorkflowStatus::Finished => "finished",
            WorkflowStatus::Failed => "failed",
            WorkflowStatus::Stopped => "stopped",
            WorkflowStatus::Deleted => "deleted",
        }
    }

    pub fn change_message(&self) -> &'static str {
        match self {
            WorkflowStatus::Created => "has been created",
            WorkflowStatus::Queued => "has been queued",
            WorkflowStatus::Pending => "is pending",
            WorkflowStatus::Running => "is running",
            WorkflowStatus::Finished => "has been finished",
            WorkflowStatus::Failed => "has failed",
            WorkflowStatus::Stopped => "has been stopped",
            WorkflowStatus::Deleted => "has been deleted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Finished
                | WorkflowStatus::Failed
                | WorkflowStatus::Stopped
                | WorkflowStatus::Deleted
        )
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(WorkflowStatus::as_str).collect()
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| ValidationError::InvalidChoice {
                option: "status".to_string(),
                value: value.to_string(),
                available: Self::names().join(", "),
            })
    }
}

/// `<workflow> <change message>`; unknown statuses are reported verbatim.
pub fn status_change_message(workflow: &str, status: &str) -> String {
    match WorkflowStatus::from_str(status) {
        Ok(status) => format!("{} {}", workflow, status.change_message()),
        Err(_) => format!("{} status is {}", workflow, status),
    }
}

/// Option name accepted on the command line, and the name each workflow
/// engine expects for it.
const OPERATIONAL_OPTIONS: &[(&str, &[(&str, &str)])] = &[
    ("CACHE", &[("serial", "CACHE")]),
    ("FROM", &[("serial", "FROM")]),
    ("TARGET", &[("serial", "TARGET"), ("cwl", "--target")]),
    ("toplevel", &[("yadage", "toplevel")]),
    ("initdir", &[("yadage", "initdir")]),
    ("initfiles", &[("yadage", "initfiles")]),
    ("accept_metadir", &[("yadage", "accept_metadir")]),
    ("report", &[("snakemake", "report")]),
];

/// Check `options` against the engine of `workflow_type` and return them
/// under the names that engine expects.
pub fn validate_operational_options(
    workflow_type: &str,
    options: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, ValidationError> {
    let mut translated = BTreeMap::new();
    for (key, value) in options {
        let (_, engines) = OPERATIONAL_OPTIONS
            .iter()
            .find(|(name, _)| name == key)
            .ok_or_else(|| {
                ValidationError::Other(format!("operational option '{}' not supported", key))
            })?;
        let (_, engine_name) = engines
            .iter()
            .find(|(engine, _)| *engine == workflow_type)
            .ok_or_else(|| {
                ValidationError::Other(format!(
                    "operational option '{}' not supported for {} workflows",
                    key, workflow_type
                ))
            })?;
        translated.insert(engine_name.to_string(), value.clone());
    }
    Ok(translated)
}

/// Parse repeated `KEY=VALUE` options; keys keep their case.
pub fn parse_assignments(
    values: &[String],
    flag: &str,
) -> Result<BTreeMap<String, String>, ValidationError> {
    let mut parsed = BTreeMap::new();
    for value in values {
        let (key, assigned) = value.split_once('=').ok_or_else(|| {
            ValidationError::Other(format!(
                "wrong input format for {}: '{}'. Please use {} KEY=VALUE",
                flag, value, flag
            ))
        })?;
        parsed.insert(key.to_string(), assigned.to_string());
    }
    Ok(parsed)
}

/// Source of workflow state for the follow poller
#[async_trait]
pub trait WorkflowMonitor {
    async fn current_status(&self, workflow: &str) -> Result<String, AppError>;

    async fn output_file_urls(&self, workflow: &str) -> Result<Vec<String>, AppError>;
}

#[async_trait]
impl WorkflowMonitor for ReanaClient {
    async fn current_status(&self, workflow: &str) -> Result<String, AppError> {
        Ok(self.workflow_status(workflow).await?.status)
    }

    async fn output_file_urls(&self, workflow: &str) -> Result<Vec<String>, AppError> {
        let listing = self.workspace(workflow, &WorkspaceQuery::default()).await?;
        Ok(listing
            .items
            .iter()
            .map(|file| format_file_url(&self.base_url, workflow, &file.name))
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct FollowParams {
    pub check_interval: Duration,
}

impl Default for FollowParams {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}

/// Poll until the workflow reaches a terminal status.
///
/// `finished` lists the output files; any other terminal status is reported
/// as an error line and yields [`AppError::Empty`].
pub async fn follow_workflow<M, W>(
    monitor: &M,
    workflow: &str,
    initial_status: &str,
    params: &FollowParams,
    out: &mut W,
) -> Result<(), AppError>
where
    M: WorkflowMonitor + ?Sized,
    W: Write,
{
    let mut status = initial_status.to_string();
    loop {
        match WorkflowStatus::from_str(&status) {
            Ok(WorkflowStatus::Finished) => {
                display_message(out, "Listing workflow output files...", Severity::Info, false)?;
                for url in monitor.output_file_urls(workflow).await? {
                    writeln!(out, "{}", url).map_err(DisplayError::from)?;
                }
                return Ok(());
            }
            Ok(terminal) if terminal.is_terminal() => {
                display_message(out, "the workflow did not finish", Severity::Error, false)?;
                return Err(AppError::Empty);
            }
            _ => {}
        }

        tokio::time::sleep(params.check_interval).await;
        let next = monitor.current_status(workflow).await?;
        tracing::debug!("workflow {} polled status: {}", workflow, next);
        if next != status {
            display_message(
                out,
                &status_change_message(workflow, &next),
                Severity::Success,
                false,
            )?;
            status = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedMonitor {
        statuses: Mutex<Vec<&'static str>>,
        polls: Mutex<usize>,
    }

    impl ScriptedMonitor {
        fn new(statuses: &[&'static str]) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().rev().copied().collect()),
                polls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl WorkflowMonitor for ScriptedMonitor {
        async fn current_status(&self, _workflow: &str) -> Result<String, AppError> {
            *self.polls.lock().unwrap() += 1;
            let next = self.statuses.lock().unwrap().pop();
            next.map(str::to_string)
                .ok_or_else(|| AppError::Message("no more statuses".to_string()))
        }

        async fn output_file_urls(&self, workflow: &str) -> Result<Vec<String>, AppError> {
            Ok(vec![format!("https://reana.io/api/workflows/{}/workspace/out.txt", workflow)])
        }
    }

    fn no_wait() -> FollowParams {
        FollowParams {
            check_interval: Duration::ZERO,
        }
    }

    #[test]
    fn test_status_names_round_trip() {
        for status in WorkflowStatus::ALL {
            assert_eq!(WorkflowStatus::from_str(status.as_str()), Ok(status));
        }
        assert!(WorkflowStatus::from_str("bogus").is_err());
        assert!(WorkflowStatus::Finished.is_terminal());
        assert!(!WorkflowStatus::Running.is_terminal());
    }

    #[test]
    fn test_status_change_message() {
        assert_eq!(status_change_message("wf", "running"), "wf is running");
        assert_eq!(status_change_message("wf", "finished"), "wf has been finished");
        assert_eq!(status_change_message("wf", "failed"), "wf has failed");
        assert_eq!(status_change_message("wf", "odd"), "wf status is odd");
    }

    #[test]
    fn test_validate_operational_options() {
        let options = BTreeMap::from([("TARGET".to_string(), "gendata".to_string())]);
        let serial = validate_operational_options("serial", &options).unwrap();
        assert_eq!(serial.get("TARGET").map(String::as_str), Some("gendata"));

        let cwl = validate_operational_options("cwl", &options).unwrap();
        assert_eq!(cwl.get("--target").map(String::as_str), Some("gendata"));

        let err = validate_operational_options("yadage", &options).unwrap_err();
        assert_eq!(
            err.to_string(),
            "operational option 'TARGET' not supported for yadage workflows"
        );

        let unknown = BTreeMap::from([("nope".to_string(), "1".to_string())]);
        assert!(validate_operational_options("serial", &unknown).is_err());
    }

    #[test]
    fn test_parse_assignments() {
        let parsed = parse_assignments(
            &["Events=10".to_string(), "expr=a=b".to_string()],
            "--parameter",
        )
        .unwrap();
        assert_eq!(parsed.get("Events").map(String::as_str), Some("10"));
        assert_eq!(parsed.get("expr").map(String::as_str), Some("a=b"));
        assert!(parse_assignments(&["novalue".to_string()], "--parameter").is_err());
    }

    #[tokio::test]
    async fn test_follow_until_finished() {
        let monitor = ScriptedMonitor::new(&["running", "running", "finished"]);
        let mut out = Vec::new();
        follow_workflow(&monitor, "my_workflow", "queued", &no_wait(), &mut out)
            .await
            .unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("my_workflow is running"));
        assert!(output.contains("my_workflow has been finished"));
        assert!(output.contains("Listing workflow output files..."));
        assert!(output.contains("https://reana.io/api/workflows/my_workflow/workspace/out.txt"));
        // the repeated running status is reported once
        assert_eq!(output.matches("is running").count(), 1);
        assert_eq!(*monitor.polls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_follow_failed_run() {
        let monitor = ScriptedMonitor::new(&["failed"]);
        let mut out = Vec::new();
        let result =
            follow_workflow(&monitor, "my_workflow", "running", &no_wait(), &mut out).await;

        assert!(matches!(result, Err(AppError::Empty)));
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("my_workflow has failed"));
        assert!(output.contains("the workflow did not finish"));
    }

    #[tokio::test]
    async fn test_follow_already_finished_does_not_poll() {
        let monitor = ScriptedMonitor::new(&[]);
        let mut out = Vec::new();
        follow_workflow(&monitor, "wf", "finished", &no_wait(), &mut out)
            .await
            .unwrap();
        assert_eq!(*monitor.polls.lock().unwrap(), 0);
    }
}
