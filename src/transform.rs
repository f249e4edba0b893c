use crate::category::{display_label, normalize_category, order_categories};
use crate::dataset::Dataset;
use crate::error::ChartError;
use crate::ir::{FacetPanel, ScatterPoint, Series, SeriesBundle};
use crate::numeric::{parse_number, parse_number_opt};
use crate::resolve::{filter_rows, require_column};
use crate::spec::{Shape, VisualSpec};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Rows whose stacked totals drift further than this from 100% are flagged
/// for the content author (raw-value mode only; proportion mode normalizes).
const IMBALANCE_TOLERANCE_PCT: f64 = 2.0;

/// Value-axis padding: a small proportional buffer, then round up to the
/// nearest multiple of 10 so bars and points never touch the chart edge.
pub fn padded_max(raw_max: f64) -> f64 {
    ((raw_max * 1.02 + 2.0) / 10.0).ceil() * 10.0
}

/// Main entry point: convert a spec plus parsed rows into ordered categories
/// and per-series numeric arrays. Exactly one shape algorithm runs, chosen
/// by the spec's classification.
pub fn build_series(spec: &VisualSpec, data: &Dataset) -> Result<SeriesBundle, ChartError> {
    match spec.shape()? {
        Shape::StackedWide { x, stacks } => transform_stacked_wide(spec, data, &x, &stacks),
        Shape::StackedLong { x, stack, value } => {
            transform_stacked_long(spec, data, &x, &stack, &value)
        }
        Shape::Faceted { x, y, facet } => transform_faceted(spec, data, &x, &y, &facet),
        Shape::MultiSeries { x, series } => transform_multi_series(spec, data, &x, &series),
        Shape::Scatter { x, y } => transform_scatter(spec, data, &x, &y),
        Shape::SingleSeries { x, y } => transform_single_series(spec, data, &x, &y),
    }
}

fn no_data(data: &Dataset) -> ChartError {
    ChartError::NoData {
        columns: data.headers.clone(),
    }
}

/// Wide-form stacked bars: one row per category, one column per stack key.
/// Duplicate categories accumulate. In proportion mode every value becomes a
/// share of its category total; a zero total floors the denominator to 1 so
/// the category renders as all-zero shares instead of dividing by zero.
fn transform_stacked_wide(
    spec: &VisualSpec,
    data: &Dataset,
    x: &str,
    stacks: &[String],
) -> Result<SeriesBundle, ChartError> {
    let x_idx = require_column(&data.headers, x)?;
    let stack_idxs: Vec<usize> = stacks
        .iter()
        .map(|s| require_column(&data.headers, s))
        .collect::<Result<_, _>>()?;

    let mut required = vec![x_idx];
    required.extend(&stack_idxs);
    let rows = filter_rows(data, &required);
    if rows.is_empty() {
        return Err(no_data(data));
    }

    // Accumulate per category per key. Unparseable cells sum as zero, which
    // is safe here: a literal zero contributes nothing to the total.
    let mut totals: HashMap<String, Vec<f64>> = HashMap::new();
    let mut raw_categories = Vec::new();
    for row in &rows {
        let cat = normalize_category(&row[x_idx]);
        let entry = totals
            .entry(cat.clone())
            .or_insert_with(|| vec![0.0; stacks.len()]);
        for (i, &idx) in stack_idxs.iter().enumerate() {
            entry[i] += parse_number(&row[idx]);
        }
        raw_categories.push(cat);
    }

    let mut categories = order_categories(
        raw_categories.iter().map(|c| c.as_str()),
        spec.category_order.as_deref(),
    );
    finish_stacked(spec, &mut categories, &totals, stacks)
}

/// Long-form stacked bars: one row per (category, stack key), pivoted into
/// the wide structure before the shared stacking logic runs.
fn transform_stacked_long(
    spec: &VisualSpec,
    data: &Dataset,
    x: &str,
    stack: &str,
    value: &str,
) -> Result<SeriesBundle, ChartError> {
    let x_idx = require_column(&data.headers, x)?;
    let stack_idx = require_column(&data.headers, stack)?;
    let value_idx = require_column(&data.headers, value)?;

    let rows = filter_rows(data, &[x_idx, stack_idx, value_idx]);
    if rows.is_empty() {
        return Err(no_data(data));
    }

    // Stack keys in first-seen order become the pivoted columns.
    let stacks = order_categories(rows.iter().map(|r| r[stack_idx].as_str()), None);

    let mut totals: HashMap<String, Vec<f64>> = HashMap::new();
    let mut raw_categories = Vec::new();
    for row in &rows {
        let cat = normalize_category(&row[x_idx]);
        let key = normalize_category(&row[stack_idx]);
        let entry = totals
            .entry(cat.clone())
            .or_insert_with(|| vec![0.0; stacks.len()]);
        if let Some(pos) = stacks.iter().position(|s| *s == key) {
            entry[pos] += parse_number(&row[value_idx]);
        }
        raw_categories.push(cat);
    }

    let mut categories = order_categories(
        raw_categories.iter().map(|c| c.as_str()),
        spec.category_order.as_deref(),
    );
    finish_stacked(spec, &mut categories, &totals, &stacks)
}

/// Shared tail of both stacked shapes: optional sort by total, proportion
/// normalization or fraction auto-scaling, and imbalance diagnostics.
fn finish_stacked(
    spec: &VisualSpec,
    categories: &mut Vec<String>,
    totals: &HashMap<String, Vec<f64>>,
    stacks: &[String],
) -> Result<SeriesBundle, ChartError> {
    let proportion = spec.proportion_mode();

    if spec.sort_by_value.unwrap_or(false) {
        // Stable descending sort by category total; explicit ordering has
        // already been applied, so this only reorders what sort asks for.
        categories.sort_by(|a, b| {
            let ta: f64 = totals.get(a).map(|v| v.iter().sum()).unwrap_or(0.0);
            let tb: f64 = totals.get(b).map(|v| v.iter().sum()).unwrap_or(0.0);
            tb.partial_cmp(&ta).unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    // Raw-value mode: data authored as fractions (everything <= 1) is read
    // as shares and scaled to percents.
    let mut scale = 1.0;
    if !proportion {
        let max_val = totals
            .values()
            .flat_map(|v| v.iter())
            .fold(0.0f64, |a, &b| a.max(b));
        if max_val > 0.0 && max_val <= 1.000001 {
            scale = 100.0;
        }
    }

    let mut series: Vec<Series> = stacks
        .iter()
        .map(|key| Series {
            key: key.clone(),
            name: display_label(spec.stack_labels.as_ref(), key),
            values: Vec::with_capacity(categories.len()),
            points: Vec::new(),
        })
        .collect();

    let mut warnings = Vec::new();
    for cat in categories.iter() {
        let values = match totals.get(cat) {
            Some(v) => v,
            None => continue,
        };
        let total: f64 = values.iter().sum();
        if proportion {
            let denom = if total == 0.0 { 1.0 } else { total };
            for (i, &v) in values.iter().enumerate() {
                series[i].values.push(Some(v / denom * 100.0));
            }
        } else {
            let scaled_total = total * scale;
            if (scaled_total - 100.0).abs() > IMBALANCE_TOLERANCE_PCT {
                warnings.push(format!("{cat} ({scaled_total:.1}%)"));
            }
            for (i, &v) in values.iter().enumerate() {
                series[i].values.push(Some(v * scale));
            }
        }
    }

    Ok(SeriesBundle {
        categories: categories
            .iter()
            .map(|c| display_label(spec.labels.as_ref(), c))
            .collect(),
        series,
        facets: Vec::new(),
        value_max: None,
        proportion,
        warnings,
    })
}

/// Faceted small multiples: one mini bar chart per facet value, each sorted
/// by descending value, all sharing one padded value-axis maximum so the
/// panels stay comparable.
fn transform_faceted(
    spec: &VisualSpec,
    data: &Dataset,
    x: &str,
    y: &str,
    facet: &str,
) -> Result<SeriesBundle, ChartError> {
    let x_idx = require_column(&data.headers, x)?;
    let y_idx = require_column(&data.headers, y)?;
    let facet_idx = require_column(&data.headers, facet)?;

    let rows = filter_rows(data, &[x_idx, y_idx, facet_idx]);
    if rows.is_empty() {
        return Err(no_data(data));
    }

    let facet_order = order_categories(
        rows.iter().map(|r| r[facet_idx].as_str()),
        spec.facet_order.as_deref(),
    );

    let mut raw_max = f64::NEG_INFINITY;
    let mut facets = Vec::new();
    for facet_key in &facet_order {
        let mut entries: Vec<(String, f64)> = Vec::new();
        for row in &rows {
            if normalize_category(&row[facet_idx]) != *facet_key {
                continue;
            }
            // Unparseable values were not filtered out above; skip them here
            // rather than plotting zeros.
            if let Some(v) = parse_number_opt(&row[y_idx]) {
                entries.push((display_label(spec.labels.as_ref(), row[x_idx].trim()), v));
            }
        }
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        for (_, v) in &entries {
            raw_max = raw_max.max(*v);
        }
        facets.push(FacetPanel {
            title: facet_key.clone(),
            categories: entries.iter().map(|(c, _)| c.clone()).collect(),
            values: entries.iter().map(|(_, v)| *v).collect(),
        });
    }

    if facets.iter().all(|f| f.values.is_empty()) {
        return Err(no_data(data));
    }

    Ok(SeriesBundle {
        categories: Vec::new(),
        series: Vec::new(),
        facets,
        value_max: Some(padded_max(raw_max.max(0.0))),
        proportion: false,
        warnings: Vec::new(),
    })
}

/// Long-form multi-series: one series per distinct discriminator value.
/// A (category, series) pair absent from the data is a gap, never a zero;
/// missing survey coverage must not read as an observed zero.
fn transform_multi_series(
    spec: &VisualSpec,
    data: &Dataset,
    x: &str,
    series_field: &str,
) -> Result<SeriesBundle, ChartError> {
    let x_idx = require_column(&data.headers, x)?;
    let series_idx = require_column(&data.headers, series_field)?;

    // Shared value column, unless a per-series column lookup is given.
    let shared_y_idx = match &spec.y {
        Some(y) => Some(require_column(&data.headers, y)?),
        None => None,
    };

    let mut required = vec![x_idx, series_idx];
    if let Some(idx) = shared_y_idx {
        required.push(idx);
    }
    let rows = filter_rows(data, &required);
    if rows.is_empty() {
        return Err(no_data(data));
    }

    let categories = order_categories(
        rows.iter().map(|r| r[x_idx].as_str()),
        spec.category_order.as_deref(),
    );
    let series_keys = order_categories(rows.iter().map(|r| r[series_idx].as_str()), None);

    let mut cells: HashMap<(String, String), f64> = HashMap::new();
    for row in &rows {
        let cat = normalize_category(&row[x_idx]);
        let key = normalize_category(&row[series_idx]);
        let value_idx = match (&spec.series_value_fields, shared_y_idx) {
            (Some(lookup), _) => match lookup.get(&key) {
                Some(col) => require_column(&data.headers, col)?,
                // Series without a mapped column fall back to the shared
                // value column when present.
                None => match shared_y_idx {
                    Some(idx) => idx,
                    None => continue,
                },
            },
            (None, Some(idx)) => idx,
            (None, None) => continue,
        };
        if let Some(v) = parse_number_opt(&row[value_idx]) {
            cells.insert((cat, key), v);
        }
    }

    let series: Vec<Series> = series_keys
        .iter()
        .map(|key| Series {
            key: key.clone(),
            name: display_label(spec.stack_labels.as_ref(), key),
            values: categories
                .iter()
                .map(|cat| cells.get(&(cat.clone(), key.clone())).copied())
                .collect(),
            points: Vec::new(),
        })
        .collect();

    Ok(SeriesBundle {
        categories: categories
            .iter()
            .map(|c| display_label(spec.labels.as_ref(), c))
            .collect(),
        series,
        facets: Vec::new(),
        value_max: None,
        proportion: false,
        warnings: Vec::new(),
    })
}

/// Scatter with optional grouping, symbols, and jitter. Jitter offsets only
/// the rendered position; the stored values stay untouched. The offset
/// stream is seeded from the group name so repeated runs draw identically.
fn transform_scatter(
    spec: &VisualSpec,
    data: &Dataset,
    x: &str,
    y: &str,
) -> Result<SeriesBundle, ChartError> {
    let x_idx = require_column(&data.headers, x)?;
    let y_idx = require_column(&data.headers, y)?;
    let group_idx = match &spec.group_field {
        Some(g) => Some(require_column(&data.headers, g)?),
        None => None,
    };
    let symbol_idx = spec
        .symbol_field
        .as_ref()
        .and_then(|s| crate::resolve::find_column(&data.headers, s));

    let mut required = vec![x_idx, y_idx];
    if let Some(idx) = group_idx {
        required.push(idx);
    }
    let rows = filter_rows(data, &required);
    if rows.is_empty() {
        return Err(no_data(data));
    }

    let group_keys = match group_idx {
        Some(idx) => order_categories(rows.iter().map(|r| r[idx].as_str()), None),
        None => vec![display_label(
            spec.stack_labels.as_ref(),
            spec.y_label.as_deref().unwrap_or(y),
        )],
    };

    let jitter = spec.jitter.unwrap_or(0.0);
    let mut raw_max = f64::NEG_INFINITY;
    let mut series = Vec::new();
    for key in &group_keys {
        let mut rng = StdRng::seed_from_u64(seed_for(key));
        let mut points = Vec::new();
        for row in &rows {
            if let Some(idx) = group_idx {
                if normalize_category(&row[idx]) != *key {
                    continue;
                }
            }
            // Non-numeric coordinates exclude the point; this is a filter
            // decision, so zeros are not substituted.
            let (px, py) = match (parse_number_opt(&row[x_idx]), parse_number_opt(&row[y_idx])) {
                (Some(px), Some(py)) => (px, py),
                _ => continue,
            };
            let (dx, dy) = if jitter > 0.0 {
                (
                    rng.random_range(-jitter..=jitter),
                    rng.random_range(-jitter..=jitter),
                )
            } else {
                (0.0, 0.0)
            };
            raw_max = raw_max.max(py);
            points.push(ScatterPoint {
                x: px,
                y: py,
                draw_x: px + dx,
                draw_y: py + dy,
                symbol: symbol_idx.and_then(|idx| data.cell(row, idx).map(normalize_category)),
            });
        }
        series.push(Series {
            key: key.clone(),
            name: display_label(spec.stack_labels.as_ref(), key),
            values: Vec::new(),
            points,
        });
    }

    if series.iter().all(|s| s.points.is_empty()) {
        return Err(no_data(data));
    }

    Ok(SeriesBundle {
        categories: Vec::new(),
        series,
        facets: Vec::new(),
        value_max: Some(padded_max(raw_max.max(0.0))),
        proportion: false,
        warnings: Vec::new(),
    })
}

/// Single-series default: one category field, one value field. Duplicate
/// categories aggregate by sum.
fn transform_single_series(
    spec: &VisualSpec,
    data: &Dataset,
    x: &str,
    y: &str,
) -> Result<SeriesBundle, ChartError> {
    let x_idx = require_column(&data.headers, x)?;
    let y_idx = require_column(&data.headers, y)?;

    let rows = filter_rows(data, &[x_idx, y_idx]);
    if rows.is_empty() {
        return Err(no_data(data));
    }

    let mut categories = order_categories(
        rows.iter().map(|r| r[x_idx].as_str()),
        spec.category_order.as_deref(),
    );

    let mut sums: HashMap<String, f64> = HashMap::new();
    for row in &rows {
        let cat = normalize_category(&row[x_idx]);
        *sums.entry(cat).or_insert(0.0) += parse_number(&row[y_idx]);
    }

    if spec.sort_by_value.unwrap_or(false) {
        categories.sort_by(|a, b| {
            let va = sums.get(a).copied().unwrap_or(0.0);
            let vb = sums.get(b).copied().unwrap_or(0.0);
            vb.partial_cmp(&va).unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    let name = spec
        .y_label
        .clone()
        .unwrap_or_else(|| display_label(spec.stack_labels.as_ref(), y));
    let series = vec![Series {
        key: y.to_string(),
        name,
        values: categories
            .iter()
            .map(|cat| Some(sums.get(cat).copied().unwrap_or(0.0)))
            .collect(),
        points: Vec::new(),
    }];

    Ok(SeriesBundle {
        categories: categories
            .iter()
            .map(|c| display_label(spec.labels.as_ref(), c))
            .collect(),
        series,
        facets: Vec::new(),
        value_max: None,
        proportion: false,
        warnings: Vec::new(),
    })
}

fn seed_for(key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}
