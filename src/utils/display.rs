use colored::Colorize;
use prettytable::{format, Cell, Row, Table};
use serde_json::Value;
use std::time::Duration;

use crate::models::cache::CacheState;

/// Shown wherever a value is not available.
pub const PLACEHOLDER: &str = "--";

pub struct DisplayFormatter;

impl DisplayFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Panel title, tagged with the feed's cache state when it has one.
    pub fn format_header(&self, title: &str, state: Option<CacheState>) -> String {
        match state {
            Some(state) => format!(
                "\n=== {} [{}] ===",
                title.bright_white().bold(),
                self.format_state(state)
            ),
            None => format!("\n=== {} ===", title.bright_white().bold()),
        }
    }

    pub fn format_table(&self, headers: &[&str], rows: &[Vec<String>]) -> String {
        if rows.is_empty() {
            return "(no records)".dimmed().to_string();
        }

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.set_titles(Row::new(
            headers.iter().map(|h| Cell::new(h).style_spec("b")).collect(),
        ));
        for row in rows {
            table.add_row(Row::new(row.iter().map(|cell| Cell::new(cell)).collect()));
        }

        table.to_string()
    }

    /// Render a record field as text, `--` when absent or null.
    pub fn format_field(&self, record: &Value, key: &str) -> String {
        match record.get(key) {
            None | Some(Value::Null) => PLACEHOLDER.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn format_currency(&self, amount: f64) -> String {
        if amount < 0.0 {
            format!("-${:.2}", -amount)
        } else {
            format!("${:.2}", amount)
        }
    }

    pub fn format_metric_card(&self, label: &str, value: Option<String>) -> String {
        match value {
            Some(value) => format!("{:<16} {}", label, value.bright_white().bold()),
            None => format!("{:<16} {}", label, PLACEHOLDER.dimmed()),
        }
    }

    pub fn format_state(&self, state: CacheState) -> String {
        let label = state.to_string();
        match state {
            CacheState::Fresh => label.green().to_string(),
            CacheState::Stale => label.yellow().to_string(),
            CacheState::Empty => label.red().to_string(),
        }
    }

    pub fn format_age(&self, age: Option<Duration>) -> String {
        match age {
            None => "never".to_string(),
            Some(age) if age.as_secs() < 1 => "just now".to_string(),
            Some(age) if age.as_secs() < 60 => format!("{}s ago", age.as_secs()),
            Some(age) if age.as_secs() < 3600 => format!("{}m ago", age.as_secs() / 60),
            Some(age) => format!("{}h ago", age.as_secs() / 3600),
        }
    }
}

impl Default for DisplayFormatter {
    fn default() -> Self {
        Self::new()
    }
}
