use crate::error::DisplayError;
use crossterm::style::Stylize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

/// Write `text` with the prefix and color of `severity`, newline-terminated.
pub fn display_message<W: Write + ?Sized>(
    out: &mut W,
    text: &str,
    severity: Severity,
    indented: bool,
) -> Result<(), DisplayError> {
    let prefix = match (severity, indented) {
        (Severity::Success, false) => "==> SUCCESS: ".green().bold(),
        (Severity::Success, true) => "  -> SUCCESS: ".green().bold(),
        (Severity::Error, false) => "==> ERROR: ".red().bold(),
        (Severity::Error, true) => "  -> ERROR: ".red().bold(),
        (Severity::Info, false) => "==> ".bold(),
        (Severity::Info, true) => "  -> INFO: ".cyan().bold(),
    };
    writeln!(out, "{}{}", prefix, text)?;
    Ok(())
}

/// Write `text` as is, newline-terminated.
pub fn display_line<W: Write + ?Sized>(out: &mut W, text: &str) -> Result<(), DisplayError> {
    writeln!(out, "{}", text)?;
    Ok(())
}
