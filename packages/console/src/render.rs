//! Plain-text rendering of rows.

use std::fmt::Write;

use lambda_view_core::Entry;
use serde_json::Value;

const HEADERS: [&str; 4] = ["GROUP", "KEY", "TYPE", "VALUE"];

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render rows as an aligned table, in the order given.
pub fn render_rows(rows: &[Entry]) -> String {
    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|e| {
            [
                e.group.to_string(),
                e.key.clone(),
                e.value_type.to_string(),
                cell(&e.value),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (width, text) in widths.iter_mut().zip(row) {
            *width = (*width).max(text.chars().count());
        }
    }

    let mut out = String::new();
    let mut line = |columns: [&str; 4]| {
        let padded: Vec<String> = columns
            .iter()
            .zip(widths)
            .map(|(text, width)| format!("{:<width$}", text, width = width))
            .collect();
        let _ = writeln!(out, "{}", padded.join("  ").trim_end());
    };

    line(HEADERS);
    for row in &cells {
        line([&row[0], &row[1], &row[2], &row[3]]);
    }
    out
}
