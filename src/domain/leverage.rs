//! Synthetic leveraged series construction.
//!
//! Asset B is replaced by a compounded series whose daily return is the real
//! leveraged instrument's return where both adjacent rows carry it, and
//! `leverage × return(B)` everywhere else.

use crate::domain::align::AlignedRow;
use chrono::NaiveDate;
use serde::Serialize;

pub const DEFAULT_LEVERAGE: f64 = 3.0;

/// Lower bound for synthetic prices so later ratios never see a non-positive price.
pub const PRICE_FLOOR: f64 = 0.01;

/// One row of the inspection view: inputs next to the hybrid leveraged price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HybridPoint {
    pub date: NaiveDate,
    pub asset_a: f64,
    pub asset_b: f64,
    pub synthetic_leveraged: f64,
    pub is_real_leveraged: bool,
}

fn real_price(row: &AlignedRow) -> Option<f64> {
    row.leveraged.filter(|v| *v > 0.0)
}

fn effective_return(prev: &AlignedRow, curr: &AlignedRow, leverage: f64) -> f64 {
    match (real_price(prev), real_price(curr)) {
        (Some(p), Some(c)) => (c - p) / p,
        _ => leverage * (curr.asset_b - prev.asset_b) / prev.asset_b,
    }
}

/// The compounded hybrid price path, starting at row 0's asset B price.
fn hybrid_prices(rows: &[AlignedRow], leverage: f64) -> Vec<f64> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };

    let mut prices = Vec::with_capacity(rows.len());
    let mut price = first.asset_b;
    prices.push(price);

    for pair in rows.windows(2) {
        let ret = effective_return(&pair[0], &pair[1], leverage);
        price = (price * (1.0 + ret)).max(PRICE_FLOOR);
        prices.push(price);
    }
    prices
}

/// Return a copy of `rows` with asset B replaced by the synthetic leveraged series.
///
/// The input is never modified, so the same dataset can be re-synthesised and
/// yields the same result.
pub fn synthesize_leveraged(rows: &[AlignedRow], leverage: f64) -> Vec<AlignedRow> {
    rows.iter()
        .zip(hybrid_prices(rows, leverage))
        .map(|(row, price)| AlignedRow {
            asset_b: price,
            ..*row
        })
        .collect()
}

/// Diagnostic view of the hybrid construction; asset B stays unleveraged.
pub fn leverage_view(rows: &[AlignedRow], leverage: f64) -> Vec<HybridPoint> {
    rows.iter()
        .zip(hybrid_prices(rows, leverage))
        .map(|(row, price)| HybridPoint {
            date: row.date,
            asset_a: row.asset_a,
            asset_b: row.asset_b,
            synthetic_leveraged: price,
            is_real_leveraged: real_price(row).is_some(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(day: u32, b: f64, lev: Option<f64>) -> AlignedRow {
        AlignedRow {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            asset_a: 50.0,
            asset_b: b,
            rate_pct: 4.0,
            leveraged: lev,
        }
    }

    #[test]
    fn starts_at_unleveraged_opening_price() {
        let rows = vec![row(1, 100.0, None), row(2, 101.0, None)];
        let out = synthesize_leveraged(&rows, DEFAULT_LEVERAGE);
        assert_eq!(out[0].asset_b, rows[0].asset_b);
    }

    #[test]
    fn synthetic_triples_daily_return() {
        let rows = vec![row(1, 100.0, None), row(2, 101.0, None), row(3, 99.99, None)];
        let out = synthesize_leveraged(&rows, 3.0);
        assert_relative_eq!(out[1].asset_b, 103.0, epsilon = 1e-9);
        assert_relative_eq!(out[2].asset_b, 103.0 * (1.0 - 0.03), epsilon = 1e-9);
    }

    #[test]
    fn real_returns_used_when_both_rows_carry_them() {
        let rows = vec![
            row(1, 100.0, Some(20.0)),
            row(2, 101.0, Some(22.0)),
            row(3, 102.0, None),
        ];
        let out = synthesize_leveraged(&rows, 3.0);
        assert_relative_eq!(out[1].asset_b, 110.0, epsilon = 1e-9);
        let synth = 3.0 * (102.0 - 101.0) / 101.0;
        assert_relative_eq!(out[2].asset_b, 110.0 * (1.0 + synth), epsilon = 1e-9);
    }

    #[test]
    fn non_positive_real_values_fall_back_to_synthetic() {
        let rows = vec![row(1, 100.0, Some(0.0)), row(2, 110.0, Some(30.0))];
        let out = synthesize_leveraged(&rows, 3.0);
        assert_relative_eq!(out[1].asset_b, 130.0, epsilon = 1e-9);
    }

    #[test]
    fn price_is_floored() {
        let rows = vec![row(1, 100.0, None), row(2, 50.0, None), row(3, 60.0, None)];
        let out = synthesize_leveraged(&rows, 3.0);
        assert_eq!(out[1].asset_b, PRICE_FLOOR);
        assert_relative_eq!(out[2].asset_b, PRICE_FLOOR * 1.6, epsilon = 1e-12);
    }

    #[test]
    fn input_and_asset_a_untouched() {
        let rows = vec![row(1, 100.0, None), row(2, 105.0, None)];
        let before = rows.clone();
        let out = synthesize_leveraged(&rows, 3.0);
        assert_eq!(rows, before);
        assert!(out.iter().zip(&rows).all(|(o, r)| o.asset_a == r.asset_a && o.date == r.date));
    }

    #[test]
    fn repeated_synthesis_is_identical() {
        let rows = vec![row(1, 100.0, None), row(2, 103.0, Some(5.0)), row(3, 98.0, Some(4.0))];
        assert_eq!(synthesize_leveraged(&rows, 3.0), synthesize_leveraged(&rows, 3.0));
    }

    #[test]
    fn single_row_and_empty_inputs() {
        assert!(synthesize_leveraged(&[], 3.0).is_empty());
        let one = vec![row(1, 100.0, None)];
        assert_eq!(synthesize_leveraged(&one, 3.0), one);
    }

    #[test]
    fn view_tags_real_rows_and_keeps_base_column() {
        let rows = vec![row(1, 100.0, None), row(2, 101.0, Some(10.0)), row(3, 102.0, Some(11.0))];
        let view = leverage_view(&rows, 3.0);
        let flags: Vec<bool> = view.iter().map(|p| p.is_real_leveraged).collect();
        assert_eq!(flags, vec![false, true, true]);
        assert_eq!(view[2].asset_b, 102.0);

        let synth = synthesize_leveraged(&rows, 3.0);
        for (v, s) in view.iter().zip(&synth) {
            assert_eq!(v.synthetic_leveraged, s.asset_b);
        }
    }
}
