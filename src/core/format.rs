//! `--format column[=value]` directives

use crate::core::frame::DataFrame;
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq)]
pub struct FormatDirective {
    pub column: String,
    pub filter_rows: bool,
    pub value: Option<String>,
}

/// Parse `--format` options. A `=value` suffix filters rows only when
/// `filter_rows_enabled` is set; otherwise it is ignored.
pub fn parse_format<S: AsRef<str>>(options: &[S], filter_rows_enabled: bool) -> Vec<FormatDirective> {
    options
        .iter()
        .map(|option| match option.as_ref().split_once('=') {
            Some((column, value)) if filter_rows_enabled => FormatDirective {
                column: column.to_string(),
                filter_rows: true,
                value: Some(value.to_string()),
            },
            Some((column, _)) => FormatDirective {
                column: column.to_string(),
                filter_rows: false,
                value: None,
            },
            None => FormatDirective {
                column: option.as_ref().to_string(),
                filter_rows: false,
                value: None,
            },
        })
        .collect()
}

/// Project `table` to the directive columns and keep matching rows.
pub fn apply_format(
    table: &DataFrame,
    directives: &[FormatDirective],
) -> Result<DataFrame, ValidationError> {
    if directives.is_empty() {
        return Ok(table.clone());
    }

    let columns: Vec<&str> = directives.iter().map(|d| d.column.as_str()).collect();
    let mut projected = table.select(&columns)?;

    for directive in directives.iter().filter(|d| d.filter_rows) {
        let Some(column) = projected.column(&directive.column).cloned() else {
            continue;
        };
        let expected = directive.value.as_deref().unwrap_or_default();
        projected = projected.filter_rows(|row| column.cell_string(row).as_deref() == Some(expected));
    }

    Ok(projected)
}
