use crate::error::ChartError;
use serde_json::Value;

/// An immutable parsed dataset: ordered rows of string cells under a header
/// row. Cell values keep their raw text; normalization happens downstream.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Parse comma- or tab-delimited text. The delimiter is auto-detected by
    /// comparing tab and comma counts in the first line; the first row is
    /// always treated as headers.
    pub fn from_delimited(text: &str) -> Result<Self, ChartError> {
        let delimiter = detect_delimiter(text);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ChartError::Fetch(format!("malformed header row: {e}")))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| ChartError::Fetch(format!("malformed data row: {e}")))?;
            let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            // Flexible parsing can leave short rows; pad so column indices
            // stay valid.
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Build a dataset from an inline JSON array of row objects, the second
    /// data source a visual specification may carry.
    pub fn from_json(value: &Value) -> Result<Self, ChartError> {
        let array = value
            .as_array()
            .ok_or_else(|| ChartError::InvalidSpec("inline data must be a JSON array of objects".to_string()))?;

        if array.is_empty() {
            return Err(ChartError::NoData { columns: Vec::new() });
        }

        let first_obj = array[0]
            .as_object()
            .ok_or_else(|| ChartError::InvalidSpec("inline data items must be objects".to_string()))?;
        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut rows = Vec::new();
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| ChartError::InvalidSpec("inline data items must be objects".to_string()))?;
            let mut row = Vec::new();
            for header in &headers {
                let cell = match obj.get(header) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::Bool(b)) => b.to_string(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => {
                        return Err(ChartError::InvalidSpec(format!(
                            "unsupported value {other} for field '{header}'"
                        )))
                    }
                };
                row.push(cell);
            }
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Cell access that reports blank cells as missing.
    pub fn cell<'a>(&'a self, row: &'a [String], idx: usize) -> Option<&'a str> {
        let raw = row.get(idx)?.trim();
        if raw.is_empty() {
            None
        } else {
            Some(raw)
        }
    }
}

/// Compare delimiter counts in the first line; more tabs than commas means
/// TSV.
fn detect_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or("");
    let tabs = first_line.matches('\t').count();
    let commas = first_line.matches(',').count();
    if tabs > commas {
        b'\t'
    } else {
        b','
    }
}
