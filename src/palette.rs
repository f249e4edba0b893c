//! Series color assignment: explicit overrides first, then highlight
//! detection, then a deterministic palette cycle. Same inputs always
//! produce the same map; exported images and test snapshots depend on it.

use crate::ir::Series;
use regex::Regex;
use std::collections::BTreeMap;

pub const BACKGROUND: &str = "#FFFFFF";
pub const INK: &str = "#111111";
pub const AXIS: &str = "#4B4B4B";
pub const MUTED: &str = "#6B6B6B";
pub const GRID: &str = "#E0E0E0";
pub const ACCENT: &str = "#D32F2F";

pub const SERIES_MUTED: [&str; 6] = [
    "#111111", "#4B4B4B", "#6B6B6B", "#8C8C8C", "#A3A3A3", "#C2C2C2",
];

pub const SERIES_MULTI: [&str; 9] = [
    "#D32F2F", "#4E79A7", "#59A14F", "#F28E2B", "#76B7B2", "#B07AA1", "#9C755F", "#EDC948",
    "#BAB0AC",
];

/// Name-pattern rules for picking the series a chart is "about". The
/// patterns are configuration, not logic: callers can supply their own set,
/// and the defaults carry the site's editorial conventions.
#[derive(Debug, Clone)]
pub struct HighlightRules {
    /// A series matching any of these is the highlight.
    pub patterns: Vec<Regex>,
    /// Series matching these are reference lines; if any is present, the
    /// first non-benchmark series is highlighted instead.
    pub benchmarks: Vec<Regex>,
}

impl Default for HighlightRules {
    fn default() -> Self {
        Self {
            patterns: compile(&[
                r"(?i)north[-\s]?east",
                r"(?i)\bnortheast\b",
                r"(?i)\bne\b",
                r"(?i)loss",
                r"(?i)decline",
                r"(?i)decrease",
                r"(?i)small",
                r"(?i)rural",
                r"(?i)surfaced",
            ]),
            benchmarks: compile(&[r"(?i)all india", r"(?i)\bindia\b", r"(?i)\btotal\b", r"(?i)overall"]),
        }
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().filter_map(|p| Regex::new(p).ok()).collect()
}

/// Pick the highlight series index by name patterns. A lone series is
/// always the highlight. Benchmark-only matches highlight the first
/// non-benchmark series.
pub fn pick_highlight_index(names: &[String], rules: &HighlightRules) -> Option<usize> {
    if names.len() <= 1 {
        return if names.is_empty() { None } else { Some(0) };
    }
    for matcher in &rules.patterns {
        if let Some(idx) = names.iter().position(|n| matcher.is_match(n)) {
            return Some(idx);
        }
    }
    let is_benchmark = |name: &String| rules.benchmarks.iter().any(|m| m.is_match(name));
    if names.iter().any(is_benchmark) {
        return names.iter().position(|n| !is_benchmark(n));
    }
    None
}

/// Fallback highlight: the series with the largest total of finite values,
/// provided that total is positive. Gaps contribute nothing.
pub fn pick_highlight_by_totals(series: &[Series]) -> Option<usize> {
    if series.is_empty() {
        return None;
    }
    let totals: Vec<f64> = series
        .iter()
        .map(|s| s.values.iter().flatten().filter(|v| v.is_finite()).sum())
        .collect();
    let (idx, max) = totals
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |acc, (i, &t)| {
            if t > acc.1 {
                (i, t)
            } else {
                acc
            }
        });
    if max > 0.0 {
        Some(idx)
    } else {
        None
    }
}

/// Assign one color per series name. Explicit overrides (keyed by raw
/// series key or display name) always win; a highlighted series gets the
/// accent color and the rest cycle the base palette with the accent
/// excluded so the highlight cannot collide.
pub fn assign_colors(
    series: &[(String, String)],
    overrides: Option<&BTreeMap<String, String>>,
    highlight: Option<usize>,
    base: &[&str],
) -> BTreeMap<String, String> {
    let cycle: Vec<&str> = if highlight.is_some() {
        base.iter()
            .filter(|c| !c.eq_ignore_ascii_case(ACCENT))
            .copied()
            .collect()
    } else {
        base.to_vec()
    };

    let mut map = BTreeMap::new();
    for (idx, (key, name)) in series.iter().enumerate() {
        let color = if let Some(c) = overrides.and_then(|o| o.get(key).or_else(|| o.get(name))) {
            c.clone()
        } else if highlight == Some(idx) {
            ACCENT.to_string()
        } else if cycle.is_empty() {
            MUTED.to_string()
        } else {
            cycle[idx % cycle.len()].to_string()
        };
        map.insert(name.clone(), color);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn pairs(list: &[&str]) -> Vec<(String, String)> {
        list.iter().map(|s| (s.to_string(), s.to_string())).collect()
    }

    #[test]
    fn test_pattern_highlight() {
        let rules = HighlightRules::default();
        let n = names(&["All India", "North-East"]);
        assert_eq!(pick_highlight_index(&n, &rules), Some(1));
    }

    #[test]
    fn test_benchmark_fallback() {
        let rules = HighlightRules::default();
        let n = names(&["All India", "Assam"]);
        assert_eq!(pick_highlight_index(&n, &rules), Some(1));
    }

    #[test]
    fn test_single_series_is_highlight() {
        let rules = HighlightRules::default();
        assert_eq!(pick_highlight_index(&names(&["GER"]), &rules), Some(0));
    }

    #[test]
    fn test_no_match_no_highlight() {
        let rules = HighlightRules::default();
        let n = names(&["Assam", "Manipur"]);
        assert_eq!(pick_highlight_index(&n, &rules), None);
    }

    #[test]
    fn test_totals_fallback() {
        let series = vec![
            Series {
                key: "a".to_string(),
                name: "a".to_string(),
                values: vec![Some(1.0), None, Some(2.0)],
                points: Vec::new(),
            },
            Series {
                key: "b".to_string(),
                name: "b".to_string(),
                values: vec![Some(10.0), Some(5.0), None],
                points: Vec::new(),
            },
        ];
        assert_eq!(pick_highlight_by_totals(&series), Some(1));
    }

    #[test]
    fn test_totals_fallback_all_zero() {
        let series = vec![Series {
            key: "a".to_string(),
            name: "a".to_string(),
            values: vec![Some(0.0)],
            points: Vec::new(),
        }];
        assert_eq!(pick_highlight_by_totals(&series), None);
    }

    #[test]
    fn test_overrides_win() {
        let mut overrides = BTreeMap::new();
        overrides.insert("big".to_string(), "#2B3C63".to_string());
        let map = assign_colors(&pairs(&["big", "small"]), Some(&overrides), Some(1), &SERIES_MUTED);
        assert_eq!(map["big"], "#2B3C63");
        assert_eq!(map["small"], ACCENT);
    }

    #[test]
    fn test_accent_excluded_from_cycle_when_highlighted() {
        let map = assign_colors(&pairs(&["a", "b", "c"]), None, Some(0), &SERIES_MULTI);
        assert_eq!(map["a"], ACCENT);
        assert_ne!(map["b"], ACCENT);
        assert_ne!(map["c"], ACCENT);
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let series = pairs(&["x", "y", "z"]);
        let first = assign_colors(&series, None, None, &SERIES_MUTED);
        let second = assign_colors(&series, None, None, &SERIES_MUTED);
        assert_eq!(first, second);
    }
}
