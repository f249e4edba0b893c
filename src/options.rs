//! Chart option assembly: the last step before the rendering sink. Combines
//! transformed series, colors, and spec display hints into a serializable
//! configuration object. Formatting and layout heuristics only; no value is
//! re-derived here.

use crate::ir::{ScatterPoint, SeriesBundle};
use crate::spec::{VisualSpec, VisualType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Container geometry the chart is being rendered into.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    800
}
fn default_height() -> u32 {
    420
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 420,
        }
    }
}

/// Below this width, labels rotate, margins grow, and the legend wraps.
const NARROW_WIDTH: u32 = 640;

/// The final renderable configuration handed to the rendering sink.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub background_color: String,
    pub tooltip: Tooltip,
    pub legend: Legend,
    pub grid: Grid,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub series: Vec<SeriesOptions>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<FacetOptions>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// How the sink should format values in tooltips and labels.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ValueFormat {
    Percent { precision: usize },
    Number { units: Option<String> },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    pub trigger: String,
    pub value_format: ValueFormat,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    pub show: bool,
    pub top: u32,
    pub data: Vec<String>,
    pub columns: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Grid {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    #[serde(rename = "type")]
    pub axis_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub axis_label: AxisLabel,
    /// Category labels the sink should draw emphasized.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub emphasized: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisLabel {
    pub rotate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatter: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesOptions {
    pub name: String,
    #[serde(rename = "type")]
    pub series_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub smooth: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub data: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<ScatterPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<SeriesLabel>,
}

/// Stacked-bar value labels: hidden below a minimum share so thin segments
/// stay unlabeled.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesLabel {
    pub show: bool,
    pub min_value: f64,
    pub precision: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetOptions {
    pub title: String,
    pub categories: Vec<String>,
    pub values: Vec<f64>,
    pub color: String,
}

/// Human-readable fallback for an axis title derived from a raw field name:
/// underscores and hyphens become spaces, words are title-cased.
pub fn humanize_label(field: &str) -> String {
    field
        .replace(['_', '-'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Append a units suffix unless the label already mentions it.
fn with_units(label: String, units: Option<&str>) -> String {
    match units {
        Some(u) if !u.is_empty() && !label.to_lowercase().contains(&u.to_lowercase()) => {
            format!("{label} ({u})")
        }
        _ => label,
    }
}

fn series_type_for(chart_type: VisualType) -> &'static str {
    match chart_type {
        VisualType::Line => "line",
        VisualType::Bar => "bar",
        // Tables render their fallback chart as a line.
        VisualType::Table => "line",
        VisualType::Scatter => "scatter",
    }
}

/// Combine the transformed bundle, assigned colors, and spec hints into the
/// final configuration.
pub fn assemble(
    spec: &VisualSpec,
    bundle: &SeriesBundle,
    colors: &BTreeMap<String, String>,
    layout: &LayoutOptions,
) -> ChartOptions {
    let narrow = layout.width < NARROW_WIDTH;
    let stacked = spec.stacks.is_some() || spec.stack_field.is_some();
    let series_type = series_type_for(spec.chart_type);

    let x_name = spec
        .x_label
        .clone()
        .or_else(|| spec.x.as_deref().map(humanize_label));
    let y_source = spec
        .y
        .as_deref()
        .or(spec.value_field.as_deref())
        .unwrap_or("value");
    let y_name = with_units(
        spec.y_label
            .clone()
            .unwrap_or_else(|| humanize_label(y_source)),
        spec.units.as_deref(),
    );

    let value_format = if bundle.proportion {
        ValueFormat::Percent {
            precision: spec.label_precision.unwrap_or(1),
        }
    } else {
        ValueFormat::Number {
            units: spec.units.clone(),
        }
    };

    let label = if stacked {
        Some(SeriesLabel {
            show: true,
            min_value: spec.label_min.unwrap_or(5.0),
            precision: spec.label_precision.unwrap_or(0),
        })
    } else {
        None
    };

    let series: Vec<SeriesOptions> = bundle
        .series
        .iter()
        .map(|s| SeriesOptions {
            name: s.name.clone(),
            series_type: series_type.to_string(),
            stack: if stacked {
                Some("total".to_string())
            } else {
                None
            },
            smooth: spec.chart_type == VisualType::Line,
            color: colors.get(&s.name).cloned(),
            data: s.values.clone(),
            points: s.points.clone(),
            label: label.clone(),
        })
        .collect();

    let scatter = spec.chart_type == VisualType::Scatter && spec.facet_field.is_none();
    let legend_data: Vec<String> = bundle.series.iter().map(|s| s.name.clone()).collect();

    let facet_color = colors
        .values()
        .next()
        .cloned()
        .unwrap_or_else(|| crate::palette::ACCENT.to_string());
    let facets: Vec<FacetOptions> = bundle
        .facets
        .iter()
        .map(|f| FacetOptions {
            title: f.title.clone(),
            categories: f.categories.clone(),
            values: f.values.clone(),
            color: facet_color.clone(),
        })
        .collect();

    ChartOptions {
        background_color: crate::palette::BACKGROUND.to_string(),
        tooltip: Tooltip {
            trigger: if scatter { "item" } else { "axis" }.to_string(),
            value_format,
        },
        legend: Legend {
            show: legend_data.len() > 1,
            top: 8,
            data: legend_data,
            columns: if narrow { 2 } else { 4 },
        },
        grid: Grid {
            top: 48,
            right: 24,
            bottom: if narrow { 72 } else { 36 },
            left: if narrow { 44 } else { 56 },
        },
        x_axis: Axis {
            axis_type: if scatter { "value" } else { "category" }.to_string(),
            data: bundle.categories.clone(),
            name: x_name,
            max: None,
            axis_label: AxisLabel {
                rotate: if narrow { 30.0 } else { 0.0 },
                formatter: None,
            },
            emphasized: spec.highlight_categories.clone().unwrap_or_default(),
        },
        y_axis: Axis {
            axis_type: "value".to_string(),
            data: Vec::new(),
            name: Some(y_name),
            max: if bundle.proportion {
                Some(100.0)
            } else {
                bundle.value_max
            },
            axis_label: AxisLabel {
                rotate: 0.0,
                formatter: if bundle.proportion {
                    Some("{value}%".to_string())
                } else {
                    None
                },
            },
            emphasized: Vec::new(),
        },
        series,
        facets,
        warnings: bundle.warnings.clone(),
    }
}
