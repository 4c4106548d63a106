//! Rebalance frequency and the rebalance-event rule.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RebalanceFrequency {
    Weekly,
    Monthly,
    Quarterly,
    #[serde(rename = "Semi-Annually")]
    SemiAnnually,
    Annually,
}

impl RebalanceFrequency {
    pub const ALL: [RebalanceFrequency; 5] = [
        RebalanceFrequency::Weekly,
        RebalanceFrequency::Monthly,
        RebalanceFrequency::Quarterly,
        RebalanceFrequency::SemiAnnually,
        RebalanceFrequency::Annually,
    ];

    /// Strict lookup by display name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.to_string().eq_ignore_ascii_case(name))
    }

    /// Lookup that falls back to `Monthly` for unrecognised names.
    pub fn parse_lenient(name: &str) -> Self {
        Self::from_name(name).unwrap_or(RebalanceFrequency::Monthly)
    }

    /// Whether the row dated `current` is a rebalance event given the next row's date.
    ///
    /// The caller treats the final row as an event regardless.
    pub fn is_event(self, current: NaiveDate, next: NaiveDate) -> bool {
        let month_change = current.month() != next.month();
        match self {
            RebalanceFrequency::Weekly => {
                next.weekday().num_days_from_sunday() < current.weekday().num_days_from_sunday()
                    || (next - current).num_days() > 6
            }
            RebalanceFrequency::Monthly => month_change,
            RebalanceFrequency::Quarterly => month_change && current.month() % 3 == 0,
            RebalanceFrequency::SemiAnnually => month_change && current.month() % 6 == 0,
            RebalanceFrequency::Annually => current.year() != next.year(),
        }
    }
}

impl fmt::Display for RebalanceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RebalanceFrequency::Weekly => "Weekly",
            RebalanceFrequency::Monthly => "Monthly",
            RebalanceFrequency::Quarterly => "Quarterly",
            RebalanceFrequency::SemiAnnually => "Semi-Annually",
            RebalanceFrequency::Annually => "Annually",
        };
        write!(f, "{name}")
    }
}

/// Rebalance flag for row `index` of a date sequence; the last row is always an event.
pub fn is_rebalance_at(dates: &[NaiveDate], index: usize, freq: RebalanceFrequency) -> bool {
    match dates.get(index + 1) {
        Some(&next) => freq.is_event(dates[index], next),
        None => true,
    }
}
