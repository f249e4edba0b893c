use crate::dataset::Dataset;
use crate::error::ChartError;

/// Header normalization used for matching only; display always keeps the
/// original header text. Strips BOM characters and whitespace, lower-cases,
/// and drops punctuation so that "\u{FEFF} District " matches "district".
pub fn normalize_field(name: &str) -> String {
    name.replace('\u{feff}', "")
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Find the column index a requested field name resolves to.
pub fn find_column(headers: &[String], name: &str) -> Option<usize> {
    let wanted = normalize_field(name);
    headers.iter().position(|h| normalize_field(h) == wanted)
}

/// Resolve a field that the active shape cannot chart without. A miss is a
/// configuration error, not a silently zeroed series.
pub fn require_column(headers: &[String], name: &str) -> Result<usize, ChartError> {
    find_column(headers, name).ok_or_else(|| ChartError::MissingField(name.to_string()))
}

/// Filter rows down to those with non-blank cells in every required column.
/// Order is preserved. Runs after field resolution so a header-name mismatch
/// surfaces as a missing field instead of dropping every row here.
pub fn filter_rows<'a>(data: &'a Dataset, required: &[usize]) -> Vec<&'a Vec<String>> {
    data.rows
        .iter()
        .filter(|row| required.iter().all(|&idx| data.cell(row, idx).is_some()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_strips_bom_case_punctuation() {
        assert_eq!(normalize_field("\u{feff} District "), "district");
        assert_eq!(normalize_field("Grower Type"), "growertype");
        assert_eq!(normalize_field("share_of_area"), "shareofarea");
    }

    #[test]
    fn test_find_column_is_insensitive() {
        let h = headers(&["\u{feff} District ", "Small Growers", "Big Growers"]);
        assert_eq!(find_column(&h, "district"), Some(0));
        assert_eq!(find_column(&h, "small-growers"), Some(1));
        assert_eq!(find_column(&h, "BIG GROWERS"), Some(2));
        assert_eq!(find_column(&h, "year"), None);
    }

    #[test]
    fn test_require_column_reports_missing() {
        let h = headers(&["district"]);
        let err = require_column(&h, "year").unwrap_err();
        assert!(matches!(err, ChartError::MissingField(name) if name == "year"));
    }

    #[test]
    fn test_filter_rows_drops_blank_required_cells() {
        let data = Dataset::from_delimited("district,value\nDhemaji,94\nGolaghat,\n,6\n").unwrap();
        let kept = filter_rows(&data, &[0, 1]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0][0], "Dhemaji");
    }

    #[test]
    fn test_filter_rows_preserves_order() {
        let data = Dataset::from_delimited("d,v\nB,1\nA,2\nC,3\n").unwrap();
        let kept = filter_rows(&data, &[0, 1]);
        let order: Vec<&str> = kept.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
    }
}
