//! Cell value normalization.
//!
//! Two entry points with deliberately different missing-value behavior:
//! `parse_number` yields 0.0 for anything unparseable and is safe in
//! summation contexts (a zero contributes nothing to a stack total), while
//! `parse_number_opt` yields `None` so that filter and gap decisions never
//! mistake a missing value for an observed zero.

/// Strip the noise commonly found in published tabular data: thousands
/// separators, percent signs, non-breaking spaces, surrounding whitespace,
/// and any other character that cannot be part of a number.
fn clean(raw: &str) -> String {
    raw.replace('\u{00a0}', "")
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-'))
        .collect()
}

/// Parse a raw cell into a number, treating unparseable input as 0.0.
///
/// Re-parsing the same string is stable; the function holds no state.
pub fn parse_number(raw: &str) -> f64 {
    parse_number_opt(raw).unwrap_or(0.0)
}

/// Parse a raw cell into a number, treating unparseable or empty input as
/// missing.
pub fn parse_number_opt(raw: &str) -> Option<f64> {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        return None;
    }
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => None,
    }
}
