//! Property-based tests for the engine invariants.
//!
//! These tests use proptest to check metrics, alignment, leverage and the
//! rotation engine across many generated inputs.

mod common;

use chrono::NaiveDate;
use common::*;
use proptest::prelude::*;
use rotator::domain::align::align_series;
use rotator::domain::frequency::{is_rebalance_at, RebalanceFrequency};
use rotator::domain::leverage::{synthesize_leveraged, PRICE_FLOOR};
use rotator::domain::metrics::Metrics;
use rotator::domain::series::{normalize_date, Observation};
use rotator::domain::strategy::{run_strategy, HistoryMode};
use rotator::domain::sweep::{run_sweep_on, ParamRange, SweepConfig};

fn frequency() -> impl Strategy<Value = RebalanceFrequency> {
    prop::sample::select(RebalanceFrequency::ALL.to_vec())
}

/// Positive price path built from bounded daily moves.
fn price_path(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.08f64..0.08f64, len).prop_map(|moves| {
        let mut price = 100.0;
        moves
            .into_iter()
            .map(|m| {
                price *= 1.0 + m;
                price
            })
            .collect()
    })
}

proptest! {
    /// A trajectory that never moves has no return, risk or drawdown.
    #[test]
    fn constant_trajectory_is_neutral(capital in 1.0f64..1e7, n in 2usize..600) {
        let m = Metrics::compute(&vec![capital; n], 0);
        prop_assert_eq!(m.cagr, 0.0);
        prop_assert_eq!(m.max_drawdown, 0.0);
        prop_assert_eq!(m.volatility, 0.0);
        prop_assert_eq!(m.sharpe_ratio, 0.0);
    }

    /// Drawdown is a fraction in [-1, 0] and volatility is never negative.
    #[test]
    fn metrics_are_bounded(curve in price_path(2..400)) {
        let m = Metrics::try_compute(&curve, 3).unwrap();
        prop_assert!(m.max_drawdown <= 0.0 && m.max_drawdown >= -1.0);
        prop_assert!(m.volatility >= 0.0);
        prop_assert!(m.cagr.is_finite());
        prop_assert_eq!(m.trade_count, 3);
        prop_assert_eq!(m.final_balance, *curve.last().unwrap());
    }

    /// Swapping the two risky inputs only swaps the asset columns.
    #[test]
    fn aligner_is_symmetric(
        a in prop::collection::vec(prop::option::of(0.5f64..500.0), 1..120),
        b in prop::collection::vec(prop::option::of(0.5f64..500.0), 1..120),
        rate in prop::collection::vec(prop::option::of(0.0f64..8.0), 1..120),
    ) {
        let dates = calendar_days("2020-01-01", 120);
        let obs = |values: &[Option<f64>]| -> Vec<Observation> {
            values
                .iter()
                .zip(&dates)
                .filter_map(|(&v, &date)| v.map(|value| Observation { date, value }))
                .collect()
        };
        let (a, b, rate) = (obs(&a), obs(&b), obs(&rate));

        let forward = align_series(&a, &b, &rate, &[]);
        let swapped = align_series(&b, &a, &rate, &[]);
        prop_assert_eq!(forward.len(), swapped.len());
        for (f, s) in forward.iter().zip(&swapped) {
            prop_assert_eq!(f.date, s.date);
            prop_assert_eq!(f.asset_a, s.asset_b);
            prop_assert_eq!(f.asset_b, s.asset_a);
            prop_assert_eq!(f.rate_pct, s.rate_pct);
        }
    }

    /// Synthetic leverage starts at the unleveraged opening price and stays above the floor.
    #[test]
    fn leverage_respects_start_and_floor(
        b in price_path(2..300),
        leverage in 1.0f64..5.0,
    ) {
        let dates = calendar_days("2015-06-01", b.len());
        let rows = make_rows(&dates, |_| 10.0, |i| b[i], 0.0);
        let synthetic = synthesize_leveraged(&rows, leverage);

        prop_assert_eq!(synthetic.len(), rows.len());
        prop_assert_eq!(synthetic[0].asset_b, rows[0].asset_b);
        prop_assert!(synthetic.iter().all(|r| r.asset_b >= PRICE_FLOOR));
        prop_assert!(synthetic.iter().zip(&rows).all(|(s, r)| s.asset_a == r.asset_a));
    }

    /// Month-first slash dates always normalise to the same ISO date.
    #[test]
    fn us_slash_dates_normalise(days in 0i64..40_000) {
        let date = NaiveDate::from_ymd_opt(1950, 1, 1).unwrap() + chrono::Duration::days(days);
        let slashed = date.format("%m/%d/%Y").to_string();
        prop_assert_eq!(normalize_date(&slashed), date.format("%Y-%m-%d").to_string());
    }

    /// Day-first slash dates are only recognised when the day cannot be a month.
    #[test]
    fn day_first_dates_normalise_when_unambiguous(days in 0i64..40_000) {
        let date = NaiveDate::from_ymd_opt(1950, 1, 1).unwrap() + chrono::Duration::days(days);
        prop_assume!(chrono::Datelike::day(&date) > 12);
        let slashed = date.format("%d/%m/%Y").to_string();
        prop_assert_eq!(normalize_date(&slashed), date.format("%Y-%m-%d").to_string());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Trades happen only on rebalance events and costs never change the decisions.
    #[test]
    fn engine_trades_only_on_events(
        a in price_path(50..260),
        b_moves in price_path(50..260),
        lookback in 1u32..4,
        smoothing in 0usize..15,
        freq in frequency(),
        cost in 0.0f64..2.0,
    ) {
        let n = a.len().min(b_moves.len());
        let dates = business_days("2018-01-01", n);
        let rows = make_rows(&dates, |i| a[i], |i| b_moves[i], 1.0);

        let events = (0..n).filter(|&i| is_rebalance_at(&dates, i, freq)).count();
        let free = run_strategy(&rows, &params(lookback, smoothing, freq, 0.0), HistoryMode::Skip);
        let costly = run_strategy(&rows, &params(lookback, smoothing, freq, cost), HistoryMode::Skip);

        prop_assert!(free.trade_count <= events);
        prop_assert_eq!(free.trade_count, costly.trade_count);
        prop_assert_eq!(free.final_holding, costly.final_holding);
        prop_assert_eq!(free.strategy_curve.len(), n + 1);
        prop_assert_eq!(free.strategy_curve[0], 10_000.0);
    }

    /// Sweep output follows lookback, then smoothing, then frequency order.
    #[test]
    fn sweep_preserves_nested_order(
        lb_start in 1u32..4,
        lb_len in 0u32..3,
        sm_start in 0u32..10,
        sm_step in 1u32..8,
        freqs in prop::collection::vec(frequency(), 1..3),
        parallel in any::<bool>(),
    ) {
        let dates = business_days("2019-01-01", 150);
        let rows = make_rows(&dates, wave(100.0, 9.0, 0.0005), wave(90.0, 14.0, 0.0003), 1.0);
        let config = SweepConfig {
            lookback: ParamRange::new(lb_start, lb_start + lb_len, 1),
            smoothing: ParamRange::new(sm_start, sm_start + 2 * sm_step, sm_step),
            frequencies: freqs,
            transaction_cost_pct: 0.1,
            initial_capital: 10_000.0,
            use_leverage: false,
            start_date: None,
            end_date: None,
            parallel,
        };
        let result = run_sweep_on(&rows, &config);
        let cells = config.cells();

        prop_assert_eq!(result.points.len(), cells.len());
        for (point, cell) in result.points.iter().zip(&cells) {
            prop_assert_eq!(point.lookback_months, cell.lookback_months);
            prop_assert_eq!(point.smoothing_days, cell.smoothing_days);
            prop_assert_eq!(point.frequency, cell.frequency);
        }
    }
}
