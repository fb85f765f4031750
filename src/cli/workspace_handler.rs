use crate::api::client::{ReanaClient, WorkspaceQuery};
use crate::api::models::{DiskUsageEntry, WorkspaceFile};
use crate::cli::main_types::{DuArgs, LsArgs, MvArgs, RmArgs};
use crate::core::filters::Filters;
use crate::core::format::{apply_format, parse_format};
use crate::core::frame::{Column, DataFrame};
use crate::core::workflow::WorkflowStatus;
use crate::display::{Severity, display_frame, display_line, display_message, display_table};
use crate::error::{AppError, translate};
use crate::storage::config::Session;
use crate::utils::text::{format_data_size, format_file_url};
use std::io::Write;

const DU_FILTERS: &[&str] = &["name", "size"];
const LS_FILTERS: &[&str] = &["name", "size", "last-modified"];

/// Path fragments never shown in disk usage reports
const BLACKLISTED_PATHS: &[&str] = &[".git/", "/.git/"];

pub struct WorkspaceHandler;

impl WorkspaceHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle_du<W: Write>(
        &self,
        session: &Session,
        args: &DuArgs,
        out: &mut W,
    ) -> Result<(), AppError> {
        let filters = Filters::new(DU_FILTERS, &[], &args.filter)?;
        let search = filters.get_json(DU_FILTERS)?;
        let name_filter = filters.get_single("name")?;
        let size_filter = filters.get_single("size")?;

        let client = ReanaClient::from_session(session)?;
        let usage = client
            .disk_usage(&session.workflow, args.summarize, &search)
            .await?;

        let entries: Vec<&DiskUsageEntry> = usage
            .disk_usage_info
            .iter()
            .filter(|entry| !is_blacklisted(&entry.name))
            .filter(|entry| name_filter.is_empty() || name_matches(&entry.name, &name_filter))
            .filter(|entry| size_filter.is_empty() || entry.size.raw.to_string() == size_filter)
            .collect();
        if entries.is_empty() {
            return Err(AppError::Message("no files matching filter criteria".to_string()));
        }

        let rows: Vec<Vec<String>> = if args.summarize {
            let total: i64 = entries.iter().map(|entry| entry.size.raw).sum();
            vec![vec![render_size(total, args.human_readable), ".".to_string()]]
        } else {
            entries
                .iter()
                .map(|entry| {
                    vec![
                        render_size(entry.size.raw, args.human_readable),
                        format!(".{}", entry.name),
                    ]
                })
                .collect()
        };
        let header = vec!["SIZE".to_string(), "NAME".to_string()];
        display_table(&header, &rows, out)?;
        Ok(())
    }

    pub async fn handle_ls<W: Write>(
        &self,
        session: &Session,
        args: &LsArgs,
        out: &mut W,
    ) -> Result<(), AppError> {
        let filters = Filters::new(LS_FILTERS, &[], &args.filter)?;
        let directives = parse_format(&args.format, true);
        let query = WorkspaceQuery {
            file_name: args.filename.clone(),
            page: args.page.page,
            size: args.page.size,
            search: filters.get_json(LS_FILTERS)?,
        };

        let client = ReanaClient::from_session(session)?;
        let listing = client.workspace(&session.workflow, &query).await?;
        tracing::info!("retrieved {} workspace files", listing.items.len());

        if args.url {
            for file in &listing.items {
                display_line(
                    out,
                    &format_file_url(&session.server_url, &session.workflow, &file.name),
                )?;
            }
            return Ok(());
        }

        let frame = files_frame(&listing.items, &args.sort, args.human_readable)?;
        let frame = apply_format(&frame, &directives)?;
        display_frame(&frame, args.json, out)?;
        Ok(())
    }

    pub async fn handle_rm<W: Write>(
        &self,
        session: &Session,
        args: &RmArgs,
        out: &mut W,
    ) -> Result<(), AppError> {
        let client = ReanaClient::from_session(session)?;
        let mut freed_space: i64 = 0;
        let mut failed = false;

        for pattern in &args.patterns {
            let response = match client.delete_file(&session.workflow, pattern).await {
                Ok(response) => response,
                Err(e) => {
                    failed = true;
                    let message = translate(e.into(), &session.server_url);
                    display_message(out, &message.to_string(), Severity::Error, false)?;
                    continue;
                }
            };

            for (name, deleted) in &response.deleted {
                freed_space += deleted.size;
                display_message(
                    out,
                    &format!("File {} was successfully deleted.", name),
                    Severity::Success,
                    false,
                )?;
            }
            for (name, failure) in &response.failed {
                failed = true;
                display_message(
                    out,
                    &format!("Something went wrong while deleting {}.\n{}", name, failure.error),
                    Severity::Error,
                    false,
                )?;
            }
            if response.deleted.is_empty() && response.failed.is_empty() {
                failed = true;
                display_message(
                    out,
                    &format!("{} did not match any existing file.", pattern),
                    Severity::Error,
                    false,
                )?;
            }
        }

        if freed_space > 0 {
            display_message(
                out,
                &format!("{} bytes freed up.", freed_space),
                Severity::Success,
                false,
            )?;
        }
        if failed {
            return Err(AppError::Empty);
        }
        Ok(())
    }

    pub async fn handle_mv<W: Write>(
        &self,
        session: &Session,
        args: &MvArgs,
        out: &mut W,
    ) -> Result<(), AppError> {
        let client = ReanaClient::from_session(session)?;
        let status = client.workflow_status(&session.workflow).await?;
        if status.status == WorkflowStatus::Running.as_str() {
            return Err(AppError::Message(
                "File(s) could not be moved for running workflow".to_string(),
            ));
        }

        client
            .move_files(&session.workflow, &args.source, &args.target)
            .await?;
        display_message(
            out,
            &format!("{} was successfully moved to {}.", args.source, args.target),
            Severity::Success,
            false,
        )?;
        Ok(())
    }
}

fn is_blacklisted(name: &str) -> bool {
    BLACKLISTED_PATHS.iter().any(|fragment| name.contains(fragment))
}

/// Glob match against the workspace path with or without its leading `/`,
/// falling back to substring search.
fn name_matches(name: &str, pattern: &str) -> bool {
    let relative = name.trim_start_matches('/');
    match glob::Pattern::new(pattern) {
        Ok(glob) if glob.matches(name) || glob.matches(relative) => true,
        _ => name.contains(pattern),
    }
}

fn render_size(bytes: i64, human_readable: bool) -> String {
    if human_readable {
        format_data_size(bytes)
    } else {
        bytes.to_string()
    }
}

/// Files table sorted descending by `sort_column`. Sizes are sorted as raw
/// bytes and only then rendered with binary units.
fn files_frame(
    files: &[WorkspaceFile],
    sort_column: &str,
    human_readable: bool,
) -> Result<DataFrame, AppError> {
    let names = Column::Str(files.iter().map(|f| Some(f.name.clone())).collect());
    let sizes = Column::Int(files.iter().map(|f| Some(f.size.raw)).collect());
    let modified = Column::Str(files.iter().map(|f| f.last_modified.clone()).collect());

    let mut frame = DataFrame::new()
        .with_column("name", names)?
        .with_column("size", sizes)?
        .with_column("last-modified", modified)?
        .sort(sort_column, true)?;

    if human_readable {
        if let Some(Column::Int(cells)) = frame.column("size") {
            let human = cells.iter().map(|cell| cell.map(format_data_size)).collect();
            frame.replace_column("size", Column::Str(human))?;
        }
    }
    Ok(frame)
}

impl Default for WorkspaceHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::FileSize;

    fn file(name: &str, raw: i64, modified: &str) -> WorkspaceFile {
        WorkspaceFile {
            name: name.to_string(),
            size: FileSize {
                raw,
                human_readable: String::new(),
            },
            last_modified: Some(modified.to_string()),
        }
    }

    #[test]
    fn test_blacklist() {
        assert!(is_blacklisted("/.git/config"));
        assert!(is_blacklisted("code/.git/HEAD"));
        assert!(!is_blacklisted("/code/gitdata.C"));
    }

    #[test]
    fn test_name_matches() {
        assert!(name_matches("/code/fitdata.C", "code/*.C"));
        assert!(name_matches("/code/fitdata.C", "/code/fitdata.C"));
        assert!(name_matches("/code/fitdata.C", "fitdata"));
        assert!(!name_matches("/code/fitdata.C", "*.py"));
    }

    #[test]
    fn test_render_size() {
        assert_eq!(render_size(4608, true), "4.5 KiB");
        assert_eq!(render_size(4608, false), "4608");
    }

    #[test]
    fn test_files_frame_sorted_by_last_modified() {
        let files = [
            file("old.txt", 10, "2022-07-28T12:00:00"),
            file("new.txt", 2048, "2022-07-29T12:00:00"),
        ];
        let frame = files_frame(&files, "last-modified", true).unwrap();
        assert_eq!(frame.header(), vec!["NAME", "SIZE", "LAST-MODIFIED"]);
        assert_eq!(
            frame.stringify(),
            vec![
                vec!["new.txt", "2 KiB", "2022-07-29T12:00:00"],
                vec!["old.txt", "10 Bytes", "2022-07-28T12:00:00"],
            ]
        );
    }

    #[test]
    fn test_files_frame_human_sizes_sorted_by_bytes() {
        let files = [
            file("small.txt", 900, "2022-07-28T12:00:00"),
            file("large.txt", 2048, "2022-07-28T12:00:00"),
            file("medium.txt", 1500, "2022-07-28T12:00:00"),
        ];
        let frame = files_frame(&files, "size", true).unwrap();
        let rows: Vec<(String, String)> = frame
            .stringify()
            .into_iter()
            .map(|row| (row[0].clone(), row[1].clone()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("large.txt".to_string(), "2 KiB".to_string()),
                ("medium.txt".to_string(), "1.46 KiB".to_string()),
                ("small.txt".to_string(), "900 Bytes".to_string()),
            ]
        );
    }

    #[test]
    fn test_files_frame_raw_sizes() {
        let frame = files_frame(&[file("a.txt", 12, "2022-07-28T12:00:00")], "name", false).unwrap();
        assert_eq!(frame.stringify(), vec![vec!["a.txt", "12", "2022-07-28T12:00:00"]]);
    }
}
