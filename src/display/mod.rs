//! Output sink: status messages, borderless tables and JSON

pub mod message;
pub mod table;

pub use message::{Severity, display_line, display_message};
pub use table::{display_frame, display_json_output, display_status_table, display_table};
