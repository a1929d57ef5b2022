//! Output formatting utilities for CLI commands
//!
//! Provides consistent formatting for:
//! - Tables with column alignment
//! - Confidence percentages
//! - Validation summaries

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use groupwise_core::ValidationResult;
use serde::Serialize;

/// Format a confidence in [0, 1] as a whole percentage
///
/// Examples:
/// - 0.95 -> "95%"
/// - 0.5 -> "50%"
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.0}%", confidence.clamp(0.0, 1.0) * 100.0)
}

/// Wire name of a serde enum variant, e.g. `NO_CAPTURING_GROUPS`
pub fn wire_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => "?".to_string(),
    }
}

/// Print a table with headers
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }

    println!("{}", table);
}

/// Print a table with custom column colors
pub fn print_table_colored(headers: &[&str], rows: Vec<Vec<(String, Option<Color>)>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        let cells: Vec<Cell> = row
            .into_iter()
            .map(|(text, color)| {
                let cell = Cell::new(text);
                if let Some(c) = color {
                    cell.fg(c)
                } else {
                    cell
                }
            })
            .collect();
        table.add_row(cells);
    }

    println!("{}", table);
}

/// Print errors and warnings of a validation run
pub fn print_validation(result: &ValidationResult) {
    if result.valid {
        println!("Configuration is valid.");
    } else {
        println!("Configuration is invalid ({} error(s)).", result.errors.len());
    }
    if result.is_clean() {
        return;
    }

    let mut rows = Vec::with_capacity(result.errors.len() + result.warnings.len());
    for error in &result.errors {
        rows.push(vec![
            ("error".to_string(), Some(Color::Red)),
            (wire_name(&error.kind), None),
            (error.message.clone(), None),
            (error.hint.clone().unwrap_or_default(), Some(Color::DarkGrey)),
        ]);
    }
    for warning in &result.warnings {
        rows.push(vec![
            ("warning".to_string(), Some(Color::Yellow)),
            (wire_name(&warning.kind), None),
            (warning.message.clone(), None),
            (warning.hint.clone().unwrap_or_default(), Some(Color::DarkGrey)),
        ]);
    }
    print_table_colored(&["LEVEL", "KIND", "MESSAGE", "HINT"], rows);
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupwise_core::validate::ValidationErrorKind;

    #[test]
    fn test_format_confidence() {
        assert_eq!(format_confidence(0.95), "95%");
        assert_eq!(format_confidence(0.5), "50%");
        assert_eq!(format_confidence(1.7), "100%");
    }

    #[test]
    fn test_wire_name() {
        assert_eq!(wire_name(&ValidationErrorKind::NoCapturingGroups), "NO_CAPTURING_GROUPS");
        assert_eq!(wire_name(&groupwise_core::TokenType::GroupId), "GROUP_ID");
    }
}
