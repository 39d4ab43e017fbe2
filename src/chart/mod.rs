//! Aligning several series onto one chart axis.
//!
//! Series are appended independently, so they can differ in length and in
//! when they started. The longest series (the reference) supplies the time
//! axis and every other series is placed on it.
//!
//! Placement matches the first value of a series against the reference
//! series' *values* and left-pads with zeros up to the matching position.
//! This is a compatibility heuristic inherited from the chart frontend,
//! not a timestamp join; keep it unless the frontend contract changes.

use crate::core::{Result, Series};
use crate::storage::SeriesStore;
use chrono::{Local, TimeZone, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;

/// Values of one series laid out on the chart axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    /// Series name
    pub name: String,
    /// One value per leading axis position
    pub values: Vec<i64>,
}

/// Chart-ready view of one or more series sharing a time axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlignedChart {
    /// Axis timestamps in milliseconds
    pub axis: Vec<i64>,
    /// Axis timestamps formatted as local `H:M:S`
    pub labels: Vec<String>,
    /// Charted series in name order
    pub series: Vec<ChartSeries>,
}

impl AlignedChart {
    fn new(axis: Vec<i64>, series: Vec<ChartSeries>) -> Self {
        let labels = axis.iter().map(|ts| format_label(*ts)).collect();
        Self {
            axis,
            labels,
            series,
        }
    }

    /// True when nothing was charted
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Values charted for `name`
    pub fn values(&self, name: &str) -> Option<&[i64]> {
        self.series
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.values.as_slice())
    }
}

/// Align every series in `series` onto the axis of the longest one.
///
/// Ties go to the lexicographically smallest name.
pub fn align(series: &BTreeMap<String, Series>) -> AlignedChart {
    let Some((reference_name, reference)) = reference_series(series) else {
        return AlignedChart::default();
    };

    let axis = reference.timestamps();
    let reference_values = reference.values();

    let charted = series
        .iter()
        .map(|(name, s)| {
            let values = if name == reference_name {
                reference_values.clone()
            } else {
                place_on_axis(s, &reference_values, axis.len())
            };
            ChartSeries {
                name: name.clone(),
                values,
            }
        })
        .collect();

    AlignedChart::new(axis, charted)
}

/// Chart a single series against its own timestamps.
pub fn align_single(name: &str, series: &Series) -> AlignedChart {
    AlignedChart::new(
        series.timestamps(),
        vec![ChartSeries {
            name: name.to_string(),
            values: series.values(),
        }],
    )
}

/// Read the requested series from `store` and align them.
///
/// An empty `names` charts every stored series. Multiple names are read
/// from one snapshot that touches only those keys; names without data chart
/// as empty series.
pub fn align_for_chart(store: &dyn SeriesStore, names: &[String]) -> Result<AlignedChart> {
    match names {
        [] => Ok(align(&store.list_all()?)),
        [name] => Ok(align_single(name, &store.get(name)?)),
        _ => Ok(align(&store.get_many(names)?)),
    }
}

/// Format an axis timestamp as local time without a date, e.g. `9:05:07` -> `9:5:7`.
pub fn format_label(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(t) => format!("{}:{}:{}", t.hour(), t.minute(), t.second()),
        None => timestamp_ms.to_string(),
    }
}

fn reference_series(series: &BTreeMap<String, Series>) -> Option<(&String, &Series)> {
    let mut best: Option<(&String, &Series)> = None;
    for (name, s) in series {
        match best {
            Some((_, current)) if current.len() >= s.len() => {},
            _ => best = Some((name, s)),
        }
    }
    best
}

fn place_on_axis(series: &Series, reference_values: &[i64], axis_len: usize) -> Vec<i64> {
    let values = series.values();
    let Some(first) = values.first() else {
        return values;
    };

    let offset = reference_values.iter().position(|v| v == first).unwrap_or(0);
    // Never pad a series past the end of the axis.
    let pad = offset.min(axis_len.saturating_sub(values.len()));

    let mut placed = vec![0; pad];
    placed.extend(values);
    placed
}
