//! Delimited-text series parsing.
//!
//! Turns a raw CSV blob (Yahoo OHLCV export, FRED download, or a bare
//! `date,value` file) into a date-sorted sequence of [`Observation`]s.
//! Malformed lines are dropped silently; only a wholly unusable blob comes
//! back empty, and callers escalate that to [`RotatorError::EmptySeries`].
//!
//! [`RotatorError::EmptySeries`]: crate::domain::error::RotatorError::EmptySeries

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

/// Header names accepted for the date column, matched exactly after lowercasing.
pub const DATE_HEADERS: [&str; 4] = ["date", "time", "day", "observation_date"];

/// Header names accepted for the value column, in priority order.
pub const VALUE_HEADERS: [&str; 10] = [
    "adj close",
    "adjclose",
    "close",
    "price",
    "value",
    "rate",
    "yield",
    "irx",
    "tnx",
    "dgs3mo",
];

/// Column index of "Adj Close" in a Yahoo-style OHLCV export.
const YAHOO_ADJ_CLOSE_INDEX: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

/// Resolve `(date_index, value_index)` from a lowercased, trimmed header.
pub fn detect_columns(header: &[String]) -> (usize, usize) {
    let date_idx = header
        .iter()
        .position(|h| DATE_HEADERS.contains(&h.as_str()))
        .unwrap_or(0);

    let value_idx = VALUE_HEADERS
        .iter()
        .find_map(|kw| header.iter().position(|h| h == kw))
        .unwrap_or(if header.len() >= 6 {
            YAHOO_ADJ_CLOSE_INDEX
        } else {
            1
        });

    (date_idx, value_idx)
}

/// Rewrite a slash-delimited date into `YYYY-MM-DD`; anything else passes through.
///
/// `Y/M/D` is recognised by a leading component above 1000. Otherwise, when
/// the last component is a year, a first component above 12 cannot be a
/// month and the date is read as `D/M/Y`; every other case is read as
/// `M/D/Y`. This is ambiguous for dates such as `03/04/2020` (always taken as
/// March 4th) and is kept that way so historical alignments stay stable.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    if !raw.contains('/') {
        return raw.to_string();
    }

    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != 3 {
        return raw.to_string();
    }

    let nums: Option<Vec<u32>> = parts.iter().map(|p| p.trim().parse().ok()).collect();
    let Some(nums) = nums else {
        return raw.to_string();
    };
    let (p0, p1, p2) = (nums[0], nums[1], nums[2]);

    if p0 > 1000 {
        format!("{p0}-{p1:02}-{p2:02}")
    } else if p2 > 1000 {
        if p0 > 12 {
            format!("{p2}-{p1:02}-{p0:02}")
        } else {
            format!("{p2}-{p0:02}-{p1:02}")
        }
    } else {
        raw.to_string()
    }
}

/// `\d{4}-\d{2}-\d{2}`, checked by hand.
fn is_iso_shaped(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Parse a raw delimited blob into observations sorted by date.
///
/// Duplicate dates keep the last line in file order.
pub fn parse_series(content: &str) -> Vec<Observation> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut records = rdr.records();

    let header: Vec<String> = match records.next() {
        Some(Ok(record)) => record.iter().map(|h| h.trim().to_lowercase()).collect(),
        _ => return Vec::new(),
    };
    let (date_idx, value_idx) = detect_columns(&header);

    let mut observations = Vec::new();
    let mut dropped = 0usize;

    for record in records {
        let Ok(record) = record else {
            dropped += 1;
            continue;
        };
        let (Some(date_raw), Some(value_raw)) = (record.get(date_idx), record.get(value_idx))
        else {
            dropped += 1;
            continue;
        };

        let date_str = normalize_date(date_raw);
        let date = if is_iso_shaped(&date_str) {
            NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").ok()
        } else {
            None
        };

        match (date, value_raw.parse::<f64>()) {
            (Some(date), Ok(value)) if value.is_finite() => {
                observations.push(Observation { date, value })
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(dropped, kept = observations.len(), "dropped malformed series lines");
    }

    observations.sort_by_key(|o| o.date);

    let mut deduped: Vec<Observation> = Vec::with_capacity(observations.len());
    for obs in observations {
        match deduped.last_mut() {
            Some(last) if last.date == obs.date => *last = obs,
            _ => deduped.push(obs),
        }
    }
    deduped
}
