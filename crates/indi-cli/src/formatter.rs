//! Output formatting for result sets.

use comfy_table::{Cell, ContentArrangement, Table};
use indi_lang::{ResultSet, Scalar};
use serde_json::{json, Value as JsonValue};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Formatted table output.
    Table,
    /// JSON array of objects, one per row.
    Json,
    /// Raw output, values separated by tabs.
    Raw,
}

/// Render `rows` under the requested field names.
pub fn format_result(headers: &[String], rows: &ResultSet, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_table(headers, rows),
        OutputFormat::Json => format_json(headers, rows),
        OutputFormat::Raw => format_raw(rows),
    }
}

fn format_table(headers: &[String], rows: &ResultSet) -> String {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(comfy_table::presets::UTF8_FULL);

    if !headers.is_empty() {
        table.set_header(headers.iter().map(Cell::new));
    }
    for row in rows {
        table.add_row(row.cells().iter().map(|cell| match cell {
            Some(v) => Cell::new(v.to_string()),
            None => Cell::new("NULL"),
        }));
    }
    table.to_string()
}

fn format_json(headers: &[String], rows: &ResultSet) -> String {
    let objects: Vec<JsonValue> = rows
        .iter()
        .map(|row| {
            let mut object = serde_json::Map::new();
            for (i, cell) in row.cells().iter().enumerate() {
                let name = headers
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("column_{i}"));
                object.insert(name, cell_to_json(cell));
            }
            JsonValue::Object(object)
        })
        .collect();
    serde_json::to_string_pretty(&objects).unwrap_or_else(|_| "[]".to_string())
}

fn format_raw(rows: &ResultSet) -> String {
    rows.iter()
        .map(|row| {
            row.cells()
                .iter()
                .map(|cell| cell.as_ref().map(Scalar::as_text).unwrap_or_default())
                .collect::<Vec<String>>()
                .join("\t")
        })
        .collect::<Vec<String>>()
        .join("\n")
}

fn cell_to_json(cell: &Option<Scalar>) -> JsonValue {
    match cell {
        None => JsonValue::Null,
        Some(Scalar::Int(n)) => json!(n),
        Some(Scalar::Text(s)) => json!(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indi_lang::Row;

    fn sample() -> (Vec<String>, ResultSet) {
        let headers = vec!["a".to_string(), "b".to_string()];
        let rows = vec![Row::from(vec![Some(Scalar::from("big")), Some(Scalar::Int(7))])];
        (headers, rows)
    }

    #[test]
    fn test_json_objects_keyed_by_field() {
        let (headers, rows) = sample();
        let out = format_result(&headers, &rows, OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["a"], "big");
        assert_eq!(parsed[0]["b"], 7);
    }

    #[test]
    fn test_raw_is_tab_separated() {
        let (_, rows) = sample();
        assert_eq!(format_result(&[], &rows, OutputFormat::Raw), "big\t7");
    }

    #[test]
    fn test_null_cells_render() {
        let headers = vec!["a".to_string()];
        let rows = vec![Row::from(vec![None])];
        let json = format_result(&headers, &rows, OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed[0]["a"].is_null());

        let table = format_result(&headers, &rows, OutputFormat::Table);
        assert!(table.contains("NULL"));
    }
}
