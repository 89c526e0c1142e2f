//! Tabular export of query results.
//!
//! `csv` writes a header row from the result variables and one row per
//! binding, unbound cells rendering empty. `json` writes an array of
//! row objects keyed by variable name, unbound cells rendering null.
//! A zero-row result is legal either way.

use bibgraph_sparql::{Binding, QueryResult};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("unknown export format: {0}")]
    UnknownFormat(String),

    #[error("CSV encoding failed: {0}")]
    Csv(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Render a query result in the requested tabular format (`csv` or
/// `json`).
pub fn format_query_result(result: &QueryResult, token: &str) -> Result<String, ExportError> {
    match token {
        "csv" => to_csv(result),
        "json" => to_json(result),
        other => Err(ExportError::UnknownFormat(other.to_string())),
    }
}

fn to_csv(result: &QueryResult) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(&result.variables)
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    for row in &result.rows {
        writer
            .write_record(row.iter().map(Binding::lexical))
            .map_err(|e| ExportError::Csv(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Csv(e.to_string()))
}

fn to_json(result: &QueryResult) -> Result<String, ExportError> {
    let rows: Vec<Value> = result
        .rows
        .iter()
        .map(|row| {
            let mut object = Map::new();
            for (variable, binding) in result.variables.iter().zip(row) {
                let value = match binding {
                    Binding::Unbound => Value::Null,
                    bound => Value::String(bound.lexical().to_string()),
                };
                object.insert(variable.clone(), value);
            }
            Value::Object(object)
        })
        .collect();
    Ok(serde_json::to_string_pretty(&Value::Array(rows))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bibgraph_core::{Iri, Literal};

    fn result() -> QueryResult {
        QueryResult {
            variables: vec!["s".to_string(), "title".to_string()],
            rows: vec![
                vec![
                    Binding::Iri(Iri::new("http://example.org/w/1")),
                    Binding::Literal(Literal::plain("Moby Dick")),
                ],
                vec![
                    Binding::Iri(Iri::new("http://example.org/w/2")),
                    Binding::Unbound,
                ],
            ],
        }
    }

    #[test]
    fn csv_renders_header_rows_and_empty_cells() {
        let csv = format_query_result(&result(), "csv").unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "s,title");
        assert_eq!(lines[1], "http://example.org/w/1,Moby Dick");
        assert_eq!(lines[2], "http://example.org/w/2,");
    }

    #[test]
    fn zero_row_csv_is_header_only() {
        let empty = QueryResult {
            variables: vec!["s".to_string(), "p".to_string(), "o".to_string()],
            rows: Vec::new(),
        };
        assert_eq!(format_query_result(&empty, "csv").unwrap(), "s,p,o\n");
    }

    #[test]
    fn json_renders_objects_with_null_for_unbound() {
        let json = format_query_result(&result(), "json").unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["title"], "Moby Dick");
        assert!(rows[1]["title"].is_null());
    }

    #[test]
    fn zero_row_json_is_an_empty_array() {
        let empty = QueryResult {
            variables: vec!["s".to_string()],
            rows: Vec::new(),
        };
        let parsed: Value =
            serde_json::from_str(&format_query_result(&empty, "json").unwrap()).unwrap();
        assert_eq!(parsed, Value::Array(Vec::new()));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(matches!(
            format_query_result(&result(), "xlsx"),
            Err(ExportError::UnknownFormat(_))
        ));
    }
}
