use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Read;

/// One result row: column name -> cell value, in column order.
pub type Row = Map<String, Value>;

/// Tabular result handed over by the reporting backend. Read-only input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let row_count = Some(rows.len());
        Self {
            columns,
            rows,
            row_count,
            ..Default::default()
        }
    }

    /// Create a QueryResult from JSON: either the full result object or a bare
    /// array of row objects.
    pub fn from_json(value: &Value) -> Result<Self> {
        let mut result = match value {
            Value::Object(_) => serde_json::from_value::<QueryResult>(value.clone())
                .context("Failed to decode query result object")?,
            Value::Array(items) => {
                let mut rows = Vec::with_capacity(items.len());
                for item in items {
                    let obj = item
                        .as_object()
                        .ok_or_else(|| anyhow!("Items in array must be objects"))?;
                    rows.push(obj.clone());
                }
                QueryResult::new(Vec::new(), rows)
            }
            _ => return Err(anyhow!("Query result must be a JSON object or an array of objects")),
        };

        if result.columns.is_empty() {
            result.columns = collect_columns(&result.rows);
        }
        if result.row_count.is_none() {
            result.row_count = Some(result.rows.len());
        }
        Ok(result)
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input).context("Query result is not valid JSON")?;
        Self::from_json(&value)
    }

    /// Create a QueryResult from CSV; every cell stays a string and is coerced later.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, record) in csv_reader.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read CSV record {}", idx + 1))?;
            let mut row = Row::new();
            for (header, cell) in headers.iter().zip(record.iter()) {
                row.insert(header.clone(), Value::String(cell.to_string()));
            }
            rows.push(row);
        }

        Ok(QueryResult::new(headers, rows))
    }
}

/// Column names in order of first appearance across the rows.
fn collect_columns(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Numeric reading of a cell: JSON numbers, or strings that parse as a finite float.
pub fn coerce_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_finite(s),
        _ => None,
    }
}

pub(crate) fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Label text for a cell. Missing and null cells become empty strings.
pub fn stringify_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => display_float(f),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

/// Integral floats print without a trailing `.0`.
pub(crate) fn display_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_object() {
        let value = json!({
            "columns": ["region", "sales"],
            "rows": [{"region": "East", "sales": 100}],
            "executionTimeMs": 12.5
        });
        let result = QueryResult::from_json(&value).unwrap();
        assert_eq!(result.columns, vec!["region", "sales"]);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.row_count, Some(1));
        assert_eq!(result.execution_time_ms, Some(12.5));
    }

    #[test]
    fn test_from_json_bare_array_derives_columns() {
        let value = json!([{"a": 1, "b": 2}, {"a": 3, "c": 4}]);
        let result = QueryResult::from_json(&value).unwrap();
        assert_eq!(result.columns, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_from_json_rejects_scalar() {
        assert!(QueryResult::from_json(&json!(42)).is_err());
        assert!(QueryResult::from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_from_csv() {
        let csv = "region,sales\nEast,100\nWest,9000\n";
        let result = QueryResult::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(result.columns, vec!["region", "sales"]);
        assert_eq!(result.rows[1]["sales"], json!("9000"));
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric(&json!(3)), Some(3.0));
        assert_eq!(coerce_numeric(&json!(" 2.5 ")), Some(2.5));
        assert_eq!(coerce_numeric(&json!("$1,200")), None);
        assert_eq!(coerce_numeric(&json!("NaN")), None);
        assert_eq!(coerce_numeric(&json!(true)), None);
        assert_eq!(coerce_numeric(&Value::Null), None);
    }

    #[test]
    fn test_stringify_value() {
        assert_eq!(stringify_value(Some(&json!("East"))), "East");
        assert_eq!(stringify_value(Some(&json!(100))), "100");
        assert_eq!(stringify_value(Some(&json!(100.0))), "100");
        assert_eq!(stringify_value(Some(&json!(12.5))), "12.5");
        assert_eq!(stringify_value(Some(&json!(false))), "false");
        assert_eq!(stringify_value(Some(&Value::Null)), "");
        assert_eq!(stringify_value(None), "");
    }
}
