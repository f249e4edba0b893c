//! The single consolidated pipeline: resolve → normalize → transform →
//! color → assemble. Every chart-rendering surface goes through here; the
//! per-target variation lives entirely in the assembler's inputs.

use crate::dataset::Dataset;
use crate::error::ChartError;
use crate::options::{assemble, ChartOptions, LayoutOptions};
use crate::palette::{
    assign_colors, pick_highlight_by_totals, pick_highlight_index, HighlightRules, SERIES_MULTI,
    SERIES_MUTED,
};
use crate::spec::{PaletteKind, VisualSpec};
use crate::transform::build_series;

/// The totals-based highlight fallback only applies to small series counts;
/// with more series, "largest" stops meaning "the interesting one".
const TOTALS_HIGHLIGHT_MAX_SERIES: usize = 3;

/// Run the full transform for one visual against already-fetched rows.
pub fn run(
    spec: &VisualSpec,
    data: &Dataset,
    layout: &LayoutOptions,
) -> Result<ChartOptions, ChartError> {
    run_with_rules(spec, data, layout, &HighlightRules::default())
}

/// Same as [`run`] but with caller-supplied highlight rules, so the
/// editorial pattern list stays configuration rather than shared logic.
pub fn run_with_rules(
    spec: &VisualSpec,
    data: &Dataset,
    layout: &LayoutOptions,
    rules: &HighlightRules,
) -> Result<ChartOptions, ChartError> {
    spec.shape()?;
    let bundle = build_series(spec, data)?;

    let names: Vec<String> = bundle.series.iter().map(|s| s.name.clone()).collect();
    let highlight = match &spec.highlight_series {
        Some(wanted) => names
            .iter()
            .position(|n| n == wanted)
            .or_else(|| bundle.series.iter().position(|s| s.key == *wanted)),
        None => pick_highlight_index(&names, rules).or_else(|| {
            if names.len() <= TOTALS_HIGHLIGHT_MAX_SERIES {
                pick_highlight_by_totals(&bundle.series)
            } else {
                None
            }
        }),
    };

    let base = match spec.palette {
        PaletteKind::Muted => &SERIES_MUTED[..],
        PaletteKind::Multi => &SERIES_MULTI[..],
    };
    let keyed: Vec<(String, String)> = bundle
        .series
        .iter()
        .map(|s| (s.key.clone(), s.name.clone()))
        .collect();
    let colors = assign_colors(&keyed, spec.colors.as_ref(), highlight, base);

    Ok(assemble(spec, &bundle, &colors, layout))
}

/// Validate a spec, parse inline data if that is the declared source, and
/// run. Specs with a `dataUrl` must be fetched by the caller first.
pub fn run_inline(spec: &VisualSpec, layout: &LayoutOptions) -> Result<ChartOptions, ChartError> {
    spec.validate()?;
    let value = spec.data.as_ref().ok_or_else(|| {
        ChartError::InvalidSpec("spec has a dataUrl; fetch the dataset first".to_string())
    })?;
    let dataset = Dataset::from_json(value)?;
    run(spec, &dataset, layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stacked_spec() -> VisualSpec {
        VisualSpec {
            x: Some("District".to_string()),
            stacks: Some(vec!["Small Growers".to_string(), "Big Growers".to_string()]),
            data_url: Some("https://example.org/tea.csv".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_end_to_end_stacked_proportions() {
        let data = Dataset::from_delimited(
            "District,Small Growers,Big Growers\nDhemaji,94,6\nGolaghat,0,100\n",
        )
        .unwrap();
        let options = run(&stacked_spec(), &data, &LayoutOptions::default()).unwrap();

        assert_eq!(options.x_axis.data, vec!["Dhemaji", "Golaghat"]);
        assert_eq!(options.series.len(), 2);
        let small = &options.series[0];
        let big = &options.series[1];
        assert_eq!(small.name, "Small Growers");
        assert_eq!(small.data, vec![Some(94.0), Some(0.0)]);
        assert_eq!(big.data, vec![Some(6.0), Some(100.0)]);
        assert_eq!(options.y_axis.max, Some(100.0));
    }

    #[test]
    fn test_highlight_heuristic_reaches_colors() {
        // "Small Growers" matches the default highlight patterns.
        let data = Dataset::from_delimited(
            "District,Small Growers,Big Growers\nDhemaji,94,6\n",
        )
        .unwrap();
        let options = run(&stacked_spec(), &data, &LayoutOptions::default()).unwrap();
        let small = options.series.iter().find(|s| s.name == "Small Growers").unwrap();
        assert_eq!(small.color.as_deref(), Some(crate::palette::ACCENT));
    }

    #[test]
    fn test_colors_deterministic_across_runs() {
        let data = Dataset::from_delimited(
            "District,Small Growers,Big Growers\nDhemaji,94,6\n",
        )
        .unwrap();
        let a = run(&stacked_spec(), &data, &LayoutOptions::default()).unwrap();
        let b = run(&stacked_spec(), &data, &LayoutOptions::default()).unwrap();
        let colors_a: Vec<_> = a.series.iter().map(|s| s.color.clone()).collect();
        let colors_b: Vec<_> = b.series.iter().map(|s| s.color.clone()).collect();
        assert_eq!(colors_a, colors_b);
    }

    #[test]
    fn test_explicit_highlight_series() {
        let data = Dataset::from_delimited(
            "year,state,ger\n2019,Assam,20\n2019,Manipur,25\n2020,Assam,22\n2020,Manipur,24\n",
        )
        .unwrap();
        let spec = VisualSpec {
            x: Some("year".to_string()),
            y: Some("ger".to_string()),
            series_field: Some("state".to_string()),
            highlight_series: Some("Manipur".to_string()),
            data_url: Some("https://example.org/ger.csv".to_string()),
            ..Default::default()
        };
        let options = run(&spec, &data, &LayoutOptions::default()).unwrap();
        let manipur = options.series.iter().find(|s| s.name == "Manipur").unwrap();
        assert_eq!(manipur.color.as_deref(), Some(crate::palette::ACCENT));
    }

    #[test]
    fn test_run_inline_uses_embedded_rows() {
        let spec = VisualSpec {
            x: Some("district".to_string()),
            y: Some("value".to_string()),
            data: Some(json!([
                {"district": "A", "value": "1,200"},
                {"district": "B", "value": 800}
            ])),
            ..Default::default()
        };
        let options = run_inline(&spec, &LayoutOptions::default()).unwrap();
        assert_eq!(options.series[0].data, vec![Some(1200.0), Some(800.0)]);
    }

    #[test]
    fn test_invalid_spec_rejected_before_data_access() {
        let spec = VisualSpec {
            x: Some("district".to_string()),
            data: Some(json!([{"district": "A"}])),
            ..Default::default()
        };
        assert!(matches!(
            run_inline(&spec, &LayoutOptions::default()),
            Err(ChartError::InvalidSpec(_))
        ));
    }
}
