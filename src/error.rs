use thiserror::Error;

/// Failure states of the chart pipeline.
///
/// The four variants are deliberately distinct user-facing conditions: a
/// misconfigured spec, a spec field that resolves to no dataset column, a
/// valid run that leaves nothing to chart, and a transport failure. They
/// must never be collapsed into one message.
#[derive(Debug, Error)]
pub enum ChartError {
    /// The visual specification is incomplete or contradictory. Detected
    /// before any fetch is attempted and never retried.
    #[error("invalid visual configuration: {0}")]
    InvalidSpec(String),

    /// A required field resolves to no column present in the dataset.
    #[error("field '{0}' not found in the dataset")]
    MissingField(String),

    /// Zero rows survived filtering. Lists the columns that were present so
    /// a content author can spot the mismatch.
    #[error("no chartable series found. Columns available: {}", columns.join(", "))]
    NoData { columns: Vec<String> },

    /// Network failure or non-OK status from both the direct and proxy
    /// attempts. Terminal for the render pass.
    #[error("failed to load dataset: {0}")]
    Fetch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_lists_columns() {
        let err = ChartError::NoData {
            columns: vec!["district".to_string(), "value".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("district, value"));
        assert!(msg.contains("No chartable series") || msg.contains("no chartable series"));
    }

    #[test]
    fn test_missing_field_names_the_field() {
        let err = ChartError::MissingField("year".to_string());
        assert!(err.to_string().contains("'year'"));
    }
}
