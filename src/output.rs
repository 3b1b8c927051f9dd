//! Output formatting for CLI results

use chrono::Utc;
use serde::Serialize;
use tabled::settings::object::Rows;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::cli::OutputFormat;
use crate::error::Result;

/// JSON envelope with metadata
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a, T: ?Sized> {
    pub data: &'a T,
    pub meta: Metadata,
}

/// Metadata included in JSON output
#[derive(Debug, Serialize)]
pub struct Metadata {
    pub timestamp: String,
    pub version: String,
}

/// Format data as pretty-printed JSON wrapped in [`JsonOutput`]
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    let output = JsonOutput {
        data,
        meta: Metadata {
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format rows as a rounded table
pub fn format_table<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}

/// Print `rows` as a table, or `data` as JSON
pub fn print<R: Tabled, D: Serialize + ?Sized>(format: OutputFormat, rows: &[R], data: &D) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", format_table(rows)),
        OutputFormat::Json => println!("{}", format_json(data)?),
    }
    Ok(())
}
