//! Single-run backtest orchestration.
//!
//! Parses and aligns the raw inputs, applies the optional synthetic
//! leverage, runs the rotation engine once with history recording, and
//! reduces the three balance curves to metrics.

use crate::domain::align::{prepare_dataset, AlignedRow, RawSeriesSet};
use crate::domain::error::RotatorError;
use crate::domain::leverage::{synthesize_leveraged, DEFAULT_LEVERAGE};
use crate::domain::metrics::Metrics;
use crate::domain::strategy::{run_strategy, HistoryMode, HistoryPoint, StrategyParams};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestConfig {
    pub params: StrategyParams,
    pub use_leverage: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Strategy metrics next to the buy-and-hold metrics of each asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetrics {
    pub strategy: Metrics,
    pub asset_a: Metrics,
    pub asset_b: Metrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub config: BacktestConfig,
    pub metrics: RunMetrics,
    pub history: Vec<HistoryPoint>,
    pub analysis: String,
}

/// Aligned rows for a run, with asset B swapped for the synthetic leveraged
/// series when `use_leverage` is set.
pub fn load_dataset(
    raw: &RawSeriesSet,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    use_leverage: bool,
) -> Result<Vec<AlignedRow>, RotatorError> {
    let rows = prepare_dataset(raw, start, end)?;
    if use_leverage {
        Ok(synthesize_leveraged(&rows, DEFAULT_LEVERAGE))
    } else {
        Ok(rows)
    }
}

pub fn run_backtest(raw: &RawSeriesSet, config: &BacktestConfig) -> Result<BacktestResult, RotatorError> {
    let rows = load_dataset(raw, config.start_date, config.end_date, config.use_leverage)?;
    Ok(run_backtest_on(&rows, config))
}

/// Run a single backtest over an already prepared dataset.
pub fn run_backtest_on(rows: &[AlignedRow], config: &BacktestConfig) -> BacktestResult {
    let sim = run_strategy(rows, &config.params, HistoryMode::Record);

    let metrics = RunMetrics {
        strategy: Metrics::compute(&sim.strategy_curve, sim.trade_count),
        asset_a: Metrics::compute(&sim.asset_a_curve, 1),
        asset_b: Metrics::compute(&sim.asset_b_curve, 1),
    };
    let analysis = analysis_summary(&metrics.strategy, &config.params, config.use_leverage);

    BacktestResult {
        config: config.clone(),
        metrics,
        history: sim.history.unwrap_or_default(),
        analysis,
    }
}

/// Short human-readable summary of a single run.
pub fn analysis_summary(metrics: &Metrics, params: &StrategyParams, leveraged: bool) -> String {
    let lev = if leveraged {
        " | 3x LEVERAGE (Synthetic)"
    } else {
        ""
    };
    format!(
        "ANALYSIS ({freq} Rebalancing{lev})\n\
         CAGR: {cagr:.1}% | Max DD: {dd:.1}% | Sharpe: {sharpe:.2}\n\
         Trades: {trades} | Signal: {smooth}d SMA, Lookback: {lb} Mo",
        freq = params.frequency,
        cagr = metrics.cagr * 100.0,
        dd = metrics.max_drawdown * 100.0,
        sharpe = metrics.sharpe_ratio,
        trades = metrics.trade_count,
        smooth = params.smoothing_days,
        lb = params.lookback_months,
    )
}
