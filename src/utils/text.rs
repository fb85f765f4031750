use chrono::{NaiveDateTime, Utc};

const SIZE_UNITS: [&str; 6] = ["Bytes", "KiB", "MiB", "GiB", "TiB", "PiB"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Format a byte count with binary prefixes, keeping at most two decimals
///
/// # Examples
/// ```
/// use reana_client::utils::text::format_data_size;
/// assert_eq!(format_data_size(2048), "2 KiB");
/// assert_eq!(format_data_size(4608), "4.5 KiB");
/// assert_eq!(format_data_size(60), "60 Bytes");
/// ```
pub fn format_data_size(bytes: i64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value.abs() >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}

/// Split a workflow identifier into name and run number on the first `.`
///
/// # Examples
/// ```
/// use reana_client::utils::text::split_workflow_name;
/// assert_eq!(split_workflow_name("myanalysis.2.1"), ("myanalysis".to_string(), "2.1".to_string()));
/// assert_eq!(split_workflow_name("myanalysis"), ("myanalysis".to_string(), String::new()));
/// ```
pub fn split_workflow_name(workflow: &str) -> (String, String) {
    match workflow.split_once('.') {
        Some((name, run_number)) => (name.to_string(), run_number.to_string()),
        None => (workflow.to_string(), String::new()),
    }
}

pub fn format_session_uri(server_url: &str, path: &str, token: &str) -> String {
    format!("{}{}?token={}", server_url.trim_end_matches('/'), path, token)
}

pub fn format_file_url(server_url: &str, workflow: &str, file_name: &str) -> String {
    format!(
        "{}/api/workflows/{}/workspace/{}",
        server_url.trim_end_matches('/'),
        workflow,
        file_name.trim_start_matches('/')
    )
}

/// Render names the way the server echoes them back: `['a', 'b']`
pub fn quoted_list(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|name| format!("'{}'", name)).collect();
    format!("[{}]", quoted.join(", "))
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok()
}

/// Seconds between two server timestamps; a missing end means "still running".
pub fn duration_seconds(started: Option<&str>, finished: Option<&str>) -> Option<i64> {
    let start = parse_timestamp(started?)?;
    let end = match finished {
        Some(value) => parse_timestamp(value)?,
        None => Utc::now().naive_utc(),
    };
    Some((end - start).num_seconds())
}
