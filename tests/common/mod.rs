#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use rotator::domain::align::{AlignedRow, SeriesRole};
use rotator::domain::error::RotatorError;
use rotator::domain::frequency::RebalanceFrequency;
use rotator::domain::strategy::StrategyParams;
use rotator::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub series: HashMap<SeriesRole, String>,
    pub errors: HashMap<SeriesRole, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, role: SeriesRole, content: String) -> Self {
        self.series.insert(role, content);
        self
    }

    pub fn with_error(mut self, role: SeriesRole, reason: &str) -> Self {
        self.errors.insert(role, reason.to_string());
        self
    }

    /// Asset A, asset B and rate files for the same calendar.
    pub fn with_prices(
        self,
        dates: &[NaiveDate],
        asset_a: impl Fn(usize) -> f64,
        asset_b: impl Fn(usize) -> f64,
        rate: f64,
    ) -> Self {
        self.with_series(SeriesRole::AssetA, series_csv("Date,Close", dates, asset_a))
            .with_series(SeriesRole::AssetB, series_csv("Date,Adj Close", dates, asset_b))
            .with_series(SeriesRole::Rate, series_csv("DATE,DTB3", dates, |_| rate))
    }
}

impl DataPort for MockDataPort {
    fn fetch_raw(&self, role: SeriesRole) -> Result<Option<String>, RotatorError> {
        if let Some(reason) = self.errors.get(&role) {
            return Err(RotatorError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self.series.get(&role).cloned())
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Consecutive calendar days starting at `start`.
pub fn calendar_days(start: &str, count: usize) -> Vec<NaiveDate> {
    let first = date(start);
    (0..count)
        .map(|i| first + chrono::Duration::days(i as i64))
        .collect()
}

/// Monday-to-Friday dates starting at (or after) `start`.
pub fn business_days(start: &str, count: usize) -> Vec<NaiveDate> {
    let mut d = date(start);
    let mut out = Vec::with_capacity(count);
    while out.len() < count {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(d);
        }
        d += chrono::Duration::days(1);
    }
    out
}

pub fn series_csv(header: &str, dates: &[NaiveDate], value: impl Fn(usize) -> f64) -> String {
    let mut out = format!("{header}\n");
    for (i, d) in dates.iter().enumerate() {
        out.push_str(&format!("{},{}\n", d.format("%Y-%m-%d"), value(i)));
    }
    out
}

pub fn make_rows(
    dates: &[NaiveDate],
    asset_a: impl Fn(usize) -> f64,
    asset_b: impl Fn(usize) -> f64,
    rate: f64,
) -> Vec<AlignedRow> {
    dates
        .iter()
        .enumerate()
        .map(|(i, &d)| AlignedRow {
            date: d,
            asset_a: asset_a(i),
            asset_b: asset_b(i),
            rate_pct: rate,
            leveraged: None,
        })
        .collect()
}

pub fn params(lookback: u32, smoothing: usize, frequency: RebalanceFrequency, cost: f64) -> StrategyParams {
    StrategyParams {
        lookback_months: lookback,
        smoothing_days: smoothing,
        frequency,
        transaction_cost_pct: cost,
        initial_capital: 10_000.0,
    }
}

/// A deterministic wavy price path so momentum leadership changes over time.
pub fn wave(base: f64, period: f64, drift: f64) -> impl Fn(usize) -> f64 {
    move |i| base * (1.0 + 0.15 * (i as f64 / period).sin()) * (1.0 + drift).powi(i as i32)
}
