//! Intermediate representation between the shape transformer and the chart
//! option assembler. Everything here is already normalized: categories are
//! ordered display keys, series values are parsed numbers with explicit
//! gaps, derived quantities (axis maxima, share percentages) are computed.

use serde::Serialize;

/// Transformer output for one visual.
#[derive(Debug, Clone, Default)]
pub struct SeriesBundle {
    /// Ordered category display labels for the primary axis. Empty for
    /// scatter and faceted shapes.
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    /// One panel per facet value, in facet order. Empty unless faceted.
    pub facets: Vec<FacetPanel>,
    /// Padded value-axis maximum shared across facets or scatter points.
    pub value_max: Option<f64>,
    /// True when stacked values were normalized to percentage-of-total.
    pub proportion: bool,
    /// Content-author diagnostics, e.g. stacked rows that do not sum to
    /// ~100%.
    pub warnings: Vec<String>,
}

/// One renderable series.
#[derive(Debug, Clone, Default)]
pub struct Series {
    /// Raw key the series came from (column name or discriminator value);
    /// color overrides are looked up by key first.
    pub key: String,
    /// Display name after label substitution.
    pub name: String,
    /// Per-category values aligned with `SeriesBundle::categories`. `None`
    /// is a gap: the (category, series) pair was absent from the data and
    /// must not be drawn as zero.
    pub values: Vec<Option<f64>>,
    /// Scatter points; empty for category-based shapes.
    pub points: Vec<ScatterPoint>,
}

/// A single scatter observation. `draw_x`/`draw_y` carry any jitter; the
/// stored `x`/`y` never change.
#[derive(Debug, Clone, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub draw_x: f64,
    pub draw_y: f64,
    /// Marker shape key from the spec's symbol field, if any.
    pub symbol: Option<String>,
}

/// One small-multiples panel: independently sorted, sharing the bundle's
/// `value_max` so cross-facet comparison stays valid.
#[derive(Debug, Clone, Default)]
pub struct FacetPanel {
    pub title: String,
    pub categories: Vec<String>,
    pub values: Vec<f64>,
}
