//! Multi-series alignment onto a common daily calendar.
//!
//! The two risky-asset series gate which dates exist; the rate series is
//! forward-filled onto those dates and the optional real-leveraged series is
//! attached where it has a value.

use crate::domain::error::RotatorError;
use crate::domain::series::{parse_series, Observation};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Minimum number of aligned rows required before a simulation may run.
pub const MIN_ALIGNED_ROWS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignedRow {
    pub date: NaiveDate,
    pub asset_a: f64,
    pub asset_b: f64,
    /// Annual short-term rate in percent, forward-filled.
    pub rate_pct: f64,
    pub leveraged: Option<f64>,
}

/// The input series a run consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesRole {
    AssetA,
    AssetB,
    Rate,
    Leveraged,
}

impl SeriesRole {
    /// Key under the `[data]` config section.
    pub fn config_key(self) -> &'static str {
        match self {
            SeriesRole::AssetA => "asset_a",
            SeriesRole::AssetB => "asset_b",
            SeriesRole::Rate => "rate",
            SeriesRole::Leveraged => "leveraged",
        }
    }
}

impl fmt::Display for SeriesRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeriesRole::AssetA => "asset A",
            SeriesRole::AssetB => "asset B",
            SeriesRole::Rate => "rate",
            SeriesRole::Leveraged => "leveraged",
        };
        f.pad(name)
    }
}

/// Raw delimited text for every input role, as handed over by a [`DataPort`].
///
/// [`DataPort`]: crate::ports::data_port::DataPort
#[derive(Debug, Clone, Default)]
pub struct RawSeriesSet {
    pub asset_a: String,
    pub asset_b: String,
    pub rate: String,
    pub leveraged: Option<String>,
}

/// Join parsed series into aligned rows.
///
/// Only dates present in both risky-asset series with strictly positive
/// prices produce a row. The rate starts at the first positive observation
/// anywhere in `rate` (or 0) and is updated whenever the rate series has a
/// value on one of the risky-asset dates.
pub fn align_series(
    asset_a: &[Observation],
    asset_b: &[Observation],
    rate: &[Observation],
    leveraged: &[Observation],
) -> Vec<AlignedRow> {
    let a_map: HashMap<NaiveDate, f64> = asset_a.iter().map(|o| (o.date, o.value)).collect();
    let b_map: HashMap<NaiveDate, f64> = asset_b.iter().map(|o| (o.date, o.value)).collect();
    let rate_map: HashMap<NaiveDate, f64> = rate.iter().map(|o| (o.date, o.value)).collect();
    let lev_map: HashMap<NaiveDate, f64> = leveraged.iter().map(|o| (o.date, o.value)).collect();

    let dates: BTreeSet<NaiveDate> = a_map.keys().chain(b_map.keys()).copied().collect();

    let mut last_rate = rate
        .iter()
        .find(|o| o.value > 0.0)
        .map(|o| o.value)
        .unwrap_or(0.0);

    let mut rows = Vec::with_capacity(dates.len());
    for date in dates {
        if let Some(&r) = rate_map.get(&date) {
            last_rate = r;
        }

        let (Some(&a), Some(&b)) = (a_map.get(&date), b_map.get(&date)) else {
            continue;
        };
        if a <= 0.0 || b <= 0.0 {
            continue;
        }

        rows.push(AlignedRow {
            date,
            asset_a: a,
            asset_b: b,
            rate_pct: last_rate,
            leveraged: lev_map.get(&date).copied(),
        });
    }
    rows
}

/// Restrict rows to the inclusive `[start, end]` window.
pub fn filter_window(
    rows: Vec<AlignedRow>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<AlignedRow> {
    rows.into_iter()
        .filter(|r| start.is_none_or(|s| r.date >= s) && end.is_none_or(|e| r.date <= e))
        .collect()
}

fn parse_required(content: &str, role: SeriesRole) -> Result<Vec<Observation>, RotatorError> {
    let observations = parse_series(content);
    if observations.is_empty() {
        return Err(RotatorError::EmptySeries {
            series: role.to_string(),
        });
    }
    Ok(observations)
}

/// Parse, align and window the raw inputs, enforcing [`MIN_ALIGNED_ROWS`].
pub fn prepare_dataset(
    raw: &RawSeriesSet,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<AlignedRow>, RotatorError> {
    let asset_a = parse_required(&raw.asset_a, SeriesRole::AssetA)?;
    let asset_b = parse_required(&raw.asset_b, SeriesRole::AssetB)?;
    let rate = parse_required(&raw.rate, SeriesRole::Rate)?;
    let leveraged = raw
        .leveraged
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_series)
        .unwrap_or_default();

    let rows = filter_window(align_series(&asset_a, &asset_b, &rate, &leveraged), start, end);

    if rows.len() < MIN_ALIGNED_ROWS {
        return Err(RotatorError::InsufficientData {
            rows: rows.len(),
            minimum: MIN_ALIGNED_ROWS,
        });
    }
    Ok(rows)
}
