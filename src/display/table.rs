use crate::core::frame::DataFrame;
use crate::error::DisplayError;
use comfy_table::{Attribute, Cell, Color, Table, presets};
use serde::Serialize;
use std::io::Write;

fn new_table(header: &[String]) -> Table {
    let mut table = Table::new();
    // No borders, no column or header separators
    table.load_preset(presets::NOTHING);
    table.set_header(
        header
            .iter()
            .map(|name| Cell::new(name).add_attribute(Attribute::Bold)),
    );
    table
}

fn check_shape(header: &[String], rows: &[Vec<String>]) -> Result<(), DisplayError> {
    if let Some((index, row)) = rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != header.len())
    {
        return Err(DisplayError::TableFormat(format!(
            "row {} has {} cells, expected {}",
            index,
            row.len(),
            header.len()
        )));
    }
    Ok(())
}

/// Render a borderless table with bold headers.
pub fn display_table<W: Write + ?Sized>(
    header: &[String],
    rows: &[Vec<String>],
    out: &mut W,
) -> Result<(), DisplayError> {
    check_shape(header, rows)?;
    let mut table = new_table(header);
    for row in rows {
        table.add_row(row);
    }
    writeln!(out, "{}", table.trim_fmt())?;
    Ok(())
}

/// Color for a workflow or job status cell
pub fn status_color(status: &str) -> Option<Color> {
    match status {
        "finished" => Some(Color::Green),
        "running" => Some(Color::Cyan),
        "failed" => Some(Color::Red),
        "stopped" | "deleted" => Some(Color::Yellow),
        "queued" | "pending" | "created" => Some(Color::Blue),
        _ => None,
    }
}

/// Like [`display_table`], coloring the cells of the `status` column.
pub fn display_status_table<W: Write + ?Sized>(
    header: &[String],
    rows: &[Vec<String>],
    out: &mut W,
) -> Result<(), DisplayError> {
    check_shape(header, rows)?;
    let status_index = header.iter().position(|name| name.eq_ignore_ascii_case("status"));
    let mut table = new_table(header);
    for row in rows {
        let cells = row.iter().enumerate().map(|(index, value)| {
            let cell = Cell::new(value);
            match (Some(index) == status_index, status_color(value)) {
                (true, Some(color)) => cell.fg(color),
                _ => cell,
            }
        });
        table.add_row(cells);
    }
    writeln!(out, "{}", table.trim_fmt())?;
    Ok(())
}

/// Two-space indented JSON followed by a newline.
pub fn display_json_output<W, T>(value: &T, out: &mut W) -> Result<(), DisplayError>
where
    W: Write + ?Sized,
    T: Serialize + ?Sized,
{
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Render a result table, as JSON records when `json` is set.
pub fn display_frame<W: Write + ?Sized>(
    frame: &DataFrame,
    json: bool,
    out: &mut W,
) -> Result<(), DisplayError> {
    if json {
        display_json_output(&frame.to_records(), out)
    } else {
        display_status_table(&frame.header(), &frame.stringify(), out)
    }
}
