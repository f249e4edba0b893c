use crate::error::ChartError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rendering family of a visual, as authored in content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualType {
    Line,
    #[default]
    Bar,
    Table,
    Scatter,
}

/// Which series palette a spec asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteKind {
    #[default]
    Muted,
    Multi,
}

/// Declarative description of one chart's data bindings and display rules,
/// authored as camelCase JSON in the content store.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualSpec {
    #[serde(rename = "type")]
    pub chart_type: VisualType,

    // Data bindings
    pub x: Option<String>,
    pub y: Option<String>,
    /// Wide-form stacking: the ordered value columns to stack.
    pub stacks: Option<Vec<String>>,
    /// Long-form stacking: pivoted into wide form keyed by `x`.
    pub stack_field: Option<String>,
    pub value_field: Option<String>,
    /// Long-form multi-series discriminator.
    pub series_field: Option<String>,
    /// Per-series value column lookup; absent means all series share `y`.
    pub series_value_fields: Option<BTreeMap<String, String>>,
    pub facet_field: Option<String>,
    pub group_field: Option<String>,
    pub symbol_field: Option<String>,

    // Orderings and labels
    pub category_order: Option<Vec<String>>,
    pub facet_order: Option<Vec<String>>,
    pub labels: Option<BTreeMap<String, String>>,
    pub stack_labels: Option<BTreeMap<String, String>>,
    pub sort_by_value: Option<bool>,

    // Color and emphasis
    pub colors: Option<BTreeMap<String, String>>,
    pub highlight_series: Option<String>,
    pub highlight_categories: Option<Vec<String>>,
    pub palette: PaletteKind,

    // Data source: exactly one of these.
    pub data_url: Option<String>,
    pub data: Option<serde_json::Value>,

    // Formatting hints
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub units: Option<String>,
    /// Stacked values as percentage-of-category-total. Defaults to true
    /// whenever stacks are present; set to false to plot raw values.
    pub proportion: Option<bool>,
    /// Minimum value at which stacked bar labels are drawn.
    pub label_min: Option<f64>,
    pub label_precision: Option<usize>,
    /// Bounded random offset applied to rendered scatter positions.
    pub jitter: Option<f64>,
}

/// Structural pattern of a visual. Classification precedence is fixed:
/// stacked > faceted > multi-series > scatter > single-series. Specs can
/// satisfy several predicates at once and the first match wins.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    StackedWide { x: String, stacks: Vec<String> },
    StackedLong { x: String, stack: String, value: String },
    Faceted { x: String, y: String, facet: String },
    MultiSeries { x: String, series: String },
    Scatter { x: String, y: String },
    SingleSeries { x: String, y: String },
}

impl VisualSpec {
    /// Classify the spec into its shape, rejecting specs that do not
    /// declare enough fields to chart anything. Runs before any fetch.
    pub fn shape(&self) -> Result<Shape, ChartError> {
        let require_x = || {
            self.x
                .clone()
                .ok_or_else(|| ChartError::InvalidSpec("an x field is required".to_string()))
        };

        if let Some(stacks) = &self.stacks {
            if !stacks.is_empty() {
                return Ok(Shape::StackedWide {
                    x: require_x()?,
                    stacks: stacks.clone(),
                });
            }
        }

        if let (Some(stack), Some(value)) = (&self.stack_field, &self.value_field) {
            return Ok(Shape::StackedLong {
                x: require_x()?,
                stack: stack.clone(),
                value: value.clone(),
            });
        }

        if let Some(facet) = &self.facet_field {
            let y = self.y.clone().ok_or_else(|| {
                ChartError::InvalidSpec("faceted visuals require a y field".to_string())
            })?;
            return Ok(Shape::Faceted {
                x: require_x()?,
                y,
                facet: facet.clone(),
            });
        }

        if let Some(series) = &self.series_field {
            if self.y.is_none() && self.series_value_fields.is_none() {
                return Err(ChartError::InvalidSpec(
                    "a seriesField needs either y or seriesValueFields".to_string(),
                ));
            }
            return Ok(Shape::MultiSeries {
                x: require_x()?,
                series: series.clone(),
            });
        }

        if self.chart_type == VisualType::Scatter {
            let y = self.y.clone().ok_or_else(|| {
                ChartError::InvalidSpec("scatter visuals require both x and y fields".to_string())
            })?;
            return Ok(Shape::Scatter { x: require_x()?, y });
        }

        let y = self.y.clone().ok_or_else(|| {
            ChartError::InvalidSpec(
                "a value source is required: y, stacks, or seriesField".to_string(),
            )
        })?;
        Ok(Shape::SingleSeries { x: require_x()?, y })
    }

    /// Full pre-fetch validation: shape plus the data source rule.
    pub fn validate(&self) -> Result<Shape, ChartError> {
        match (&self.data_url, &self.data) {
            (None, None) => {
                return Err(ChartError::InvalidSpec(
                    "a dataUrl or inline data is required".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(ChartError::InvalidSpec(
                    "dataUrl and inline data are mutually exclusive".to_string(),
                ))
            }
            _ => {}
        }
        self.shape()
    }

    pub fn proportion_mode(&self) -> bool {
        self.proportion.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_spec() -> VisualSpec {
        VisualSpec {
            x: Some("district".to_string()),
            y: Some("value".to_string()),
            data_url: Some("https://example.org/data.csv".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_series_default() {
        let shape = base_spec().validate().unwrap();
        assert!(matches!(shape, Shape::SingleSeries { .. }));
    }

    #[test]
    fn test_stacks_take_precedence_over_series_field() {
        let spec = VisualSpec {
            stacks: Some(vec!["small".to_string(), "big".to_string()]),
            series_field: Some("kind".to_string()),
            ..base_spec()
        };
        assert!(matches!(spec.shape().unwrap(), Shape::StackedWide { .. }));
    }

    #[test]
    fn test_facet_beats_series_and_scatter() {
        let spec = VisualSpec {
            chart_type: VisualType::Scatter,
            facet_field: Some("state".to_string()),
            series_field: Some("kind".to_string()),
            ..base_spec()
        };
        assert!(matches!(spec.shape().unwrap(), Shape::Faceted { .. }));
    }

    #[test]
    fn test_stacked_long_requires_both_fields() {
        let spec = VisualSpec {
            stack_field: Some("grower".to_string()),
            y: None,
            ..base_spec()
        };
        // Without valueField the pair is incomplete, and with y absent the
        // spec has no value source at all.
        assert!(spec.shape().is_err());
    }

    #[test]
    fn test_spec_without_value_source_fails_closed() {
        let spec = VisualSpec {
            y: None,
            ..base_spec()
        };
        assert!(matches!(spec.validate(), Err(ChartError::InvalidSpec(_))));
    }

    #[test]
    fn test_spec_without_data_source_rejected() {
        let spec = VisualSpec {
            data_url: None,
            ..base_spec()
        };
        assert!(matches!(spec.validate(), Err(ChartError::InvalidSpec(_))));
    }

    #[test]
    fn test_both_data_sources_rejected() {
        let spec = VisualSpec {
            data: Some(serde_json::json!([{"district": "A", "value": 1}])),
            ..base_spec()
        };
        assert!(matches!(spec.validate(), Err(ChartError::InvalidSpec(_))));
    }

    #[test]
    fn test_camel_case_deserialization() {
        let spec: VisualSpec = serde_json::from_str(
            r#"{"type":"bar","x":"District","stacks":["Small Growers","Big Growers"],
                "dataUrl":"https://example.org/tea.csv","yLabel":"Share of Tea Area (%)"}"#,
        )
        .unwrap();
        assert_eq!(spec.chart_type, VisualType::Bar);
        assert_eq!(spec.y_label.as_deref(), Some("Share of Tea Area (%)"));
        assert!(matches!(spec.validate().unwrap(), Shape::StackedWide { .. }));
    }

    #[test]
    fn test_proportion_defaults_on() {
        assert!(base_spec().proportion_mode());
        let spec = VisualSpec {
            proportion: Some(false),
            ..base_spec()
        };
        assert!(!spec.proportion_mode());
    }
}
