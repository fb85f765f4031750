use crate::api::client::{ReanaClient, WorkflowListQuery};
use crate::api::models::{DeleteRequest, JobLog, StartRequest, Workflow, WorkflowLogs};
use crate::cli::main_types::{DeleteArgs, DiffArgs, ListArgs, LogsArgs, StartArgs, StatusArgs};
use crate::core::filters::Filters;
use crate::core::format::{apply_format, parse_format};
use crate::core::frame::{Column, DataFrame};
use crate::core::workflow::{
    FollowParams, WorkflowStatus, follow_workflow, parse_assignments, status_change_message,
    validate_operational_options,
};
use crate::display::{Severity, display_frame, display_json_output, display_line, display_message};
use crate::error::{ApiError, AppError, ValidationError};
use crate::storage::config::Session;
use crate::utils::text::{
    duration_seconds, format_data_size, format_session_uri, split_workflow_name,
};
use crate::utils::validation::validate_workflow;
use crossterm::style::Stylize;
use serde_json::Value;
use std::io::Write;

const LIST_SINGLE_FILTERS: &[&str] = &["name"];
const LIST_MULTI_FILTERS: &[&str] = &["status"];
const LOG_FILTERS: &[&str] = &["compute_backend", "docker_img", "status", "step"];
const COMPUTE_BACKENDS: &[&str] = &["kubernetes", "htcondorcern", "slurmcern"];
const JOB_STATUSES: &[&str] = &["created", "queued", "running", "finished", "failed", "stopped"];

/// Handler for workflow lifecycle commands
#[derive(Default)]
pub struct WorkflowHandler {
    follow: FollowParams,
}

impl WorkflowHandler {
    pub fn new(follow: FollowParams) -> Self {
        Self { follow }
    }

    pub async fn handle_list<W: Write>(
        &self,
        session: &Session,
        args: &ListArgs,
        out: &mut W,
    ) -> Result<(), AppError> {
        let filters = Filters::new(LIST_SINGLE_FILTERS, LIST_MULTI_FILTERS, &args.filter)?;
        filters.validate_values("status", &WorkflowStatus::names())?;
        let directives = parse_format(&args.format, true);

        let mut status = filters.get_multi("status")?;
        if status.is_empty() && !args.show_deleted_runs && !args.sessions {
            status = WorkflowStatus::ALL
                .iter()
                .filter(|s| **s != WorkflowStatus::Deleted)
                .map(|s| s.to_string())
                .collect();
        }

        let query = WorkflowListQuery {
            workflow_type: (if args.sessions { "interactive" } else { "batch" }).to_string(),
            verbose: args.verbose,
            page: args.page.page,
            size: args.page.size,
            search: filters.get_json(LIST_SINGLE_FILTERS)?,
            workflow_id_or_name: session.workflow.clone(),
            include_progress: args.include_progress || args.verbose,
            include_workspace_size: args.include_workspace_size || args.verbose,
            status,
        };

        let client = ReanaClient::from_session(session)?;
        let response = client.list_workflows(&query).await?;
        tracing::info!("retrieved {} workflows", response.items.len());

        let columns = list_columns(args);
        let frame = workflows_frame(&response.items, &columns, args.human_readable, session)?;
        let frame = frame.sort(&args.sort, true)?;
        let frame = apply_format(&frame, &directives)?;
        display_frame(&frame, args.json, out)?;
        Ok(())
    }

    pub async fn handle_status<W: Write>(
        &self,
        session: &Session,
        args: &StatusArgs,
        out: &mut W,
    ) -> Result<(), AppError> {
        let directives = parse_format(&args.format, false);
        let client = ReanaClient::from_session(session)?;
        let status = client.workflow_status(&session.workflow).await?;

        let mut columns = vec!["name", "run_number", "created", "started", "ended", "status", "progress"];
        if args.verbose {
            columns.extend(["id", "user", "command"]);
        }
        if args.include_duration || args.verbose {
            columns.push("duration");
        }

        let frame = workflows_frame(&[Workflow::from(status)], &columns, false, session)?;
        let frame = apply_format(&frame, &directives)?;
        display_frame(&frame, args.json, out)?;
        Ok(())
    }

    pub async fn handle_start<W: Write>(
        &self,
        session: &Session,
        args: &StartArgs,
        out: &mut W,
    ) -> Result<(), AppError> {
        let workflow = session.workflow.as_str();
        let parameters = parse_assignments(&args.parameters, "--parameter")?;
        let options = parse_assignments(&args.options, "--option")?;
        let client = ReanaClient::from_session(session)?;

        let mut request = StartRequest::default();
        if !parameters.is_empty() || !options.is_empty() {
            let specification = client.workflow_parameters(workflow).await?;
            request.operational_options =
                validate_operational_options(&specification.workflow_type, &options)?;
            for name in parameters.keys() {
                if !specification.parameters.contains_key(name) {
                    display_message(
                        out,
                        &format!("given parameter - {}, is not in reana.yaml", name),
                        Severity::Error,
                        false,
                    )?;
                }
            }
            request.input_parameters = parameters;
        }

        let response = client.start_workflow(workflow, &request).await?;
        tracing::info!("workflow {} started with status {}", workflow, response.status);
        display_message(
            out,
            &status_change_message(workflow, &response.status),
            Severity::Success,
            false,
        )?;

        if args.follow {
            follow_workflow(&client, workflow, &response.status, &self.follow, out).await?;
        }
        Ok(())
    }

    pub async fn handle_delete<W: Write>(
        &self,
        session: &Session,
        args: &DeleteArgs,
        out: &mut W,
    ) -> Result<(), AppError> {
        let workflow = session.workflow.as_str();
        let request = DeleteRequest {
            all_runs: args.include_all_runs,
            workspace: args.include_workspace,
        };
        let client = ReanaClient::from_session(session)?;
        client.delete_workflow(workflow, &request).await?;

        let message = if args.include_all_runs {
            let (name, _) = split_workflow_name(workflow);
            format!("All the runs of workflow {} have been deleted.", name)
        } else {
            format!("{} has been deleted.", workflow)
        };
        display_message(out, &message, Severity::Success, false)?;
        Ok(())
    }

    pub async fn handle_logs<W: Write>(
        &self,
        session: &Session,
        args: &LogsArgs,
        out: &mut W,
    ) -> Result<(), AppError> {
        let filters = Filters::new(&[], LOG_FILTERS, &args.filter)?;
        filters.validate_values("compute_backend", COMPUTE_BACKENDS)?;
        filters.validate_values("status", JOB_STATUSES)?;

        let client = ReanaClient::from_session(session)?;
        let response = client
            .workflow_logs(&session.workflow, args.page.page, args.page.size)
            .await?;
        let mut logs: WorkflowLogs = match response.logs {
            Value::Null => WorkflowLogs::default(),
            document => serde_json::from_value(document).map_err(|e| ApiError::Decode {
                endpoint: format!("/api/workflows/{}/logs", session.workflow),
                message: e.to_string(),
            })?,
        };

        let mut criteria = Vec::new();
        for key in LOG_FILTERS {
            let values = filters.get_multi(key)?;
            if !values.is_empty() {
                criteria.push((*key, values));
            }
        }
        logs.job_logs
            .retain(|_, job| criteria.iter().all(|(key, values)| job_matches(job, key, values)));

        if args.json {
            display_json_output(&logs, out)?;
            return Ok(());
        }
        render_logs(&logs, !filters.is_empty(), out)
    }

    pub async fn handle_diff<W: Write>(
        &self,
        session: &Session,
        args: &DiffArgs,
        out: &mut W,
    ) -> Result<(), AppError> {
        validate_workflow(&args.workflow_a)?;
        validate_workflow(&args.workflow_b)?;

        let client = ReanaClient::from_session(session)?;
        let diff = client
            .diff(&args.workflow_a, &args.workflow_b, args.brief, args.context_lines)
            .await?;

        let mut specification_differs = false;
        if let Value::Object(sections) = &diff.reana_specification {
            for (section, content) in sections {
                let lines = diff_lines(content);
                if lines.is_empty() {
                    continue;
                }
                specification_differs = true;
                display_message(
                    out,
                    &format!("Differences in workflow {}", section),
                    Severity::Info,
                    false,
                )?;
                for line in lines {
                    display_line(out, &colorize_diff_line(&line))?;
                }
            }
        }
        if !specification_differs {
            display_message(out, "No differences in REANA specifications.", Severity::Info, false)?;
        }

        let workspace = diff_lines(&diff.workspace_listing);
        if !workspace.is_empty() {
            display_message(out, "Differences in workflow workspace", Severity::Info, false)?;
            for line in workspace {
                display_line(out, &colorize_diff_line(&line))?;
            }
        }
        Ok(())
    }
}

fn list_columns(args: &ListArgs) -> Vec<&'static str> {
    if args.sessions {
        return vec!["name", "run_number", "created", "session_type", "session_uri", "session_status"];
    }
    let mut columns = vec!["name", "run_number", "created", "started", "ended", "status"];
    if args.verbose {
        columns.extend(["id", "user"]);
    }
    if args.include_workspace_size || args.verbose {
        columns.push("size");
    }
    if args.include_progress || args.verbose {
        columns.push("progress");
    }
    if args.include_duration || args.verbose {
        columns.push("duration");
    }
    columns
}

fn workflow_column(
    name: &str,
    workflows: &[Workflow],
    human_readable: bool,
    session: &Session,
) -> Result<Column, ValidationError> {
    let strings = |f: &dyn Fn(&Workflow) -> Option<String>| -> Column {
        Column::Str(workflows.iter().map(f).collect())
    };
    let progress = |w: &Workflow| w.progress.clone().unwrap_or_default();

    let column = match name {
        "name" => strings(&|w| Some(split_workflow_name(&w.name).0)),
        "run_number" => strings(&|w| Some(split_workflow_name(&w.name).1).filter(|r| !r.is_empty())),
        "created" => strings(&|w| w.created.clone()),
        "started" => strings(&|w| progress(w).run_started_at),
        "ended" => strings(&|w| progress(w).run_finished_at),
        "status" => strings(&|w| Some(w.status.clone())),
        "id" => strings(&|w| Some(w.id.clone()).filter(|id| !id.is_empty())),
        "user" => strings(&|w| w.user.clone()),
        "progress" => strings(&|w| progress(w).summary()),
        "command" => strings(&|w| progress(w).current_command),
        "session_type" => strings(&|w| w.session_type.clone()),
        "session_status" => strings(&|w| w.session_status.clone()),
        "session_uri" => strings(&|w| {
            w.session_uri
                .as_deref()
                .map(|path| format_session_uri(&session.server_url, path, &session.access_token))
        }),
        "size" if human_readable => strings(&|w| {
            w.size.as_ref().map(|size| {
                if size.human_readable.is_empty() {
                    format_data_size(size.raw)
                } else {
                    size.human_readable.clone()
                }
            })
        }),
        "size" => Column::Int(workflows.iter().map(|w| w.size.as_ref().map(|s| s.raw)).collect()),
        "duration" => Column::Int(
            workflows
                .iter()
                .map(|w| {
                    let progress = progress(w);
                    duration_seconds(
                        progress.run_started_at.as_deref(),
                        progress.run_finished_at.as_deref(),
                    )
                })
                .collect(),
        ),
        other => {
            return Err(ValidationError::Other(format!("unknown workflow column '{}'", other)));
        }
    };
    Ok(column)
}

fn workflows_frame(
    workflows: &[Workflow],
    columns: &[&str],
    human_readable: bool,
    session: &Session,
) -> Result<DataFrame, ValidationError> {
    let mut frame = DataFrame::new();
    for name in columns {
        frame.add_column(name, workflow_column(name, workflows, human_readable, session)?)?;
    }
    Ok(frame)
}

fn job_matches(job: &JobLog, key: &str, values: &[String]) -> bool {
    let field = match key {
        "compute_backend" => job.compute_backend.as_deref(),
        "docker_img" => job.docker_img.as_deref(),
        "status" => job.status.as_deref(),
        "step" => job.job_name.as_deref(),
        _ => None,
    };
    match field {
        Some(field) => values.iter().any(|value| value.eq_ignore_ascii_case(field)),
        None => false,
    }
}

fn render_logs<W: Write>(logs: &WorkflowLogs, filtered: bool, out: &mut W) -> Result<(), AppError> {
    if let Some(workflow_logs) = logs.workflow_logs.as_deref().filter(|l| !l.is_empty()) {
        display_message(out, "Workflow engine logs", Severity::Info, false)?;
        display_line(out, workflow_logs)?;
    }
    if let Some(engine_logs) = logs.engine_specific.as_deref().filter(|l| !l.is_empty()) {
        display_message(out, "Engine internal logs", Severity::Info, false)?;
        display_line(out, engine_logs)?;
    }

    if logs.job_logs.is_empty() {
        let message = if filtered {
            "The given filters did not match any job logs."
        } else {
            "The workflow has not produced any job logs yet."
        };
        display_message(out, message, Severity::Info, false)?;
        return Ok(());
    }

    display_message(out, "Job logs", Severity::Info, false)?;
    for (job_id, job) in &logs.job_logs {
        let step = job.job_name.as_deref().unwrap_or(job_id);
        display_message(out, &format!("Step: {}", step), Severity::Info, false)?;
        let details = [
            ("Workflow ID", &job.workflow_uuid),
            ("Compute backend", &job.compute_backend),
            ("Job ID", &job.backend_job_id),
            ("Docker image", &job.docker_img),
            ("Command", &job.cmd),
            ("Status", &job.status),
            ("Started", &job.started_at),
            ("Finished", &job.finished_at),
        ];
        for (label, value) in details {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                display_message(out, &format!("{}: {}", label, value), Severity::Info, true)?;
            }
        }
        match job.logs.as_deref().filter(|l| !l.is_empty()) {
            Some(job_logs) => {
                display_message(out, "Logs:", Severity::Info, true)?;
                display_line(out, job_logs)?;
            }
            None => display_message(out, "Step has not produced any logs yet.", Severity::Info, true)?,
        }
    }
    Ok(())
}

fn diff_lines(content: &Value) -> Vec<String> {
    match content {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Value::String(s) => s.lines().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

fn colorize_diff_line(line: &str) -> String {
    if line.starts_with("@@") {
        line.cyan().to_string()
    } else if line.starts_with('+') {
        line.green().to_string()
    } else if line.starts_with('-') {
        line.red().to_string()
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{FileSize, WorkflowProgress};
    use serde_json::json;

    fn session() -> Session {
        Session {
            server_url: "https://reana.io".to_string(),
            access_token: "tok".to_string(),
            ..Session::default()
        }
    }

    fn workflow(name: &str, status: &str, created: &str) -> Workflow {
        Workflow {
            id: format!("id-{}", name),
            name: name.to_string(),
            status: status.to_string(),
            created: Some(created.to_string()),
            ..Workflow::default()
        }
    }

    #[test]
    fn test_workflows_frame_splits_run_number() {
        let workflows = [workflow("analysis.2", "finished", "2022-07-28T12:00:00")];
        let frame =
            workflows_frame(&workflows, &["name", "run_number", "status"], false, &session()).unwrap();
        assert_eq!(frame.stringify(), vec![vec!["analysis", "2", "finished"]]);
    }

    #[test]
    fn test_workflows_frame_nulls_and_sizes() {
        let mut sized = workflow("a.1", "running", "2022-07-28T12:00:00");
        sized.size = Some(FileSize {
            raw: 4608,
            human_readable: String::new(),
        });
        let no_size = workflow("b.1", "created", "2022-07-28T13:00:00");

        let frame = workflows_frame(
            &[sized.clone(), no_size.clone()],
            &["name", "size", "started"],
            true,
            &session(),
        )
        .unwrap();
        assert_eq!(
            frame.stringify(),
            vec![vec!["a", "4.5 KiB", "-"], vec!["b", "-", "-"]]
        );

        let frame = workflows_frame(&[sized, no_size], &["size"], false, &session()).unwrap();
        assert_eq!(frame.to_records(), vec![json!({"size": 4608}), json!({"size": null})]);
    }

    #[test]
    fn test_workflows_frame_progress_and_duration() {
        let mut finished = workflow("a.1", "finished", "2022-07-28T12:00:00");
        finished.progress = Some(WorkflowProgress {
            run_started_at: Some("2022-07-28T12:00:00".to_string()),
            run_finished_at: Some("2022-07-28T12:01:05".to_string()),
            total: Some(crate::api::models::JobCount { total: 2 }),
            finished: Some(crate::api::models::JobCount { total: 2 }),
            ..WorkflowProgress::default()
        });
        let frame =
            workflows_frame(&[finished], &["progress", "duration"], false, &session()).unwrap();
        assert_eq!(frame.stringify(), vec![vec!["2/2", "65"]]);
    }

    #[test]
    fn test_session_uri_column() {
        let mut interactive = workflow("nb.1", "running", "2022-07-28T12:00:00");
        interactive.session_uri = Some("/abc".to_string());
        let frame = workflows_frame(&[interactive], &["session_uri"], false, &session()).unwrap();
        assert_eq!(frame.stringify(), vec![vec!["https://reana.io/abc?token=tok"]]);
    }

    #[test]
    fn test_sorted_by_created_newest_first() {
        let workflows = [
            workflow("old.1", "finished", "2022-01-01T00:00:00"),
            workflow("new.1", "finished", "2023-01-01T00:00:00"),
        ];
        let frame = workflows_frame(&workflows, &["name", "created"], false, &session())
            .unwrap()
            .sort("CREATED", true)
            .unwrap();
        assert_eq!(frame.stringify()[0][0], "new");
    }

    #[test]
    fn test_job_matches() {
        let job = JobLog {
            job_name: Some("gendata".to_string()),
            compute_backend: Some("Kubernetes".to_string()),
            status: Some("finished".to_string()),
            ..JobLog::default()
        };
        assert!(job_matches(&job, "step", &["gendata".to_string()]));
        assert!(job_matches(&job, "compute_backend", &["kubernetes".to_string()]));
        assert!(!job_matches(&job, "status", &["failed".to_string()]));
        assert!(!job_matches(&job, "docker_img", &["busybox".to_string()]));
    }

    #[test]
    fn test_diff_lines() {
        assert_eq!(diff_lines(&json!(["@@ -1 +1 @@", "-a", "+b"])).len(), 3);
        assert_eq!(diff_lines(&json!("line1\nline2")), vec!["line1", "line2"]);
        assert!(diff_lines(&json!(null)).is_empty());
        assert!(colorize_diff_line("+added").contains("+added"));
        assert_eq!(colorize_diff_line(" context"), " context");
    }

    #[test]
    fn test_render_logs() {
        let logs: WorkflowLogs = serde_json::from_value(json!({
            "workflow_logs": "engine started",
            "job_logs": {
                "1": {"job_name": "gendata", "status": "finished", "logs": "generated 10 events", "docker_img": "reanahub/reana-env-root6"}
            }
        }))
        .unwrap();
        let mut out = Vec::new();
        render_logs(&logs, false, &mut out).unwrap();
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Workflow engine logs"));
        assert!(output.contains("engine started"));
        assert!(output.contains("Step: gendata"));
        assert!(output.contains("Docker image: reanahub/reana-env-root6"));
        assert!(output.contains("generated 10 events"));
        assert!(!output.contains("Compute backend"));
    }
}
