//! Parameter sweep over lookback, smoothing and rebalance frequency.
//!
//! Every grid cell runs the rotation engine against one shared, read-only
//! dataset. Cells may run on the rayon pool; results always come back in
//! nested-loop order (lookback outer, smoothing middle, frequency inner).

use crate::domain::align::{AlignedRow, RawSeriesSet};
use crate::domain::backtest::load_dataset;
use crate::domain::error::RotatorError;
use crate::domain::frequency::RebalanceFrequency;
use crate::domain::metrics::Metrics;
use crate::domain::strategy::{run_strategy, HistoryMode, StrategyParams};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// Inclusive integer range `start..=end` stepping by `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamRange {
    pub start: u32,
    pub end: u32,
    pub step: u32,
}

impl ParamRange {
    pub fn new(start: u32, end: u32, step: u32) -> Self {
        Self { start, end, step }
    }

    pub fn single(value: u32) -> Self {
        Self::new(value, value, 1)
    }

    /// A zero step is treated as 1.
    pub fn values(&self) -> Vec<u32> {
        (self.start..=self.end)
            .step_by(self.step.max(1) as usize)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepConfig {
    pub lookback: ParamRange,
    pub smoothing: ParamRange,
    pub frequencies: Vec<RebalanceFrequency>,
    pub transaction_cost_pct: f64,
    pub initial_capital: f64,
    pub use_leverage: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub parallel: bool,
}

impl SweepConfig {
    /// Strategy parameters for every grid cell, in result order.
    pub fn cells(&self) -> Vec<StrategyParams> {
        let smoothing = self.smoothing.values();
        let mut cells = Vec::new();
        for lookback in self.lookback.values() {
            for &smooth in &smoothing {
                for &frequency in &self.frequencies {
                    cells.push(StrategyParams {
                        lookback_months: lookback,
                        smoothing_days: smooth as usize,
                        frequency,
                        transaction_cost_pct: self.transaction_cost_pct,
                        initial_capital: self.initial_capital,
                    });
                }
            }
        }
        cells
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub lookback_months: u32,
    pub smoothing_days: usize,
    pub frequency: RebalanceFrequency,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Benchmarks {
    pub asset_a: Metrics,
    pub asset_b: Metrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    pub config: SweepConfig,
    pub points: Vec<SweepPoint>,
    pub benchmarks: Benchmarks,
}

/// Buy-and-hold metrics for a price series scaled to start at `initial_capital`.
pub fn hold_benchmark(prices: &[f64], initial_capital: f64) -> Metrics {
    let Some(&first) = prices.first() else {
        return Metrics::compute(&[], 1);
    };
    let scale = initial_capital / first;
    let curve: Vec<f64> = prices.iter().map(|p| p * scale).collect();
    Metrics::compute(&curve, 1)
}

fn run_cell(rows: &[AlignedRow], params: StrategyParams) -> SweepPoint {
    let sim = run_strategy(rows, &params, HistoryMode::Skip);
    let metrics = Metrics::compute(&sim.strategy_curve, sim.trade_count);
    debug!(
        lookback = params.lookback_months,
        smoothing = params.smoothing_days,
        frequency = %params.frequency,
        cagr = metrics.cagr,
        trades = metrics.trade_count,
        "sweep cell done"
    );
    SweepPoint {
        lookback_months: params.lookback_months,
        smoothing_days: params.smoothing_days,
        frequency: params.frequency,
        metrics,
    }
}

pub fn run_sweep(raw: &RawSeriesSet, config: &SweepConfig) -> Result<SweepResult, RotatorError> {
    let rows = load_dataset(raw, config.start_date, config.end_date, config.use_leverage)?;
    Ok(run_sweep_on(&rows, config))
}

/// Run the full grid over an already prepared dataset.
pub fn run_sweep_on(rows: &[AlignedRow], config: &SweepConfig) -> SweepResult {
    let cells = config.cells();
    info!(
        cells = cells.len(),
        rows = rows.len(),
        parallel = config.parallel,
        "running parameter sweep"
    );

    let points: Vec<SweepPoint> = if config.parallel {
        cells.into_par_iter().map(|p| run_cell(rows, p)).collect()
    } else {
        cells.into_iter().map(|p| run_cell(rows, p)).collect()
    };

    let asset_a: Vec<f64> = rows.iter().map(|r| r.asset_a).collect();
    let asset_b: Vec<f64> = rows.iter().map(|r| r.asset_b).collect();
    let benchmarks = Benchmarks {
        asset_a: hold_benchmark(&asset_a, config.initial_capital),
        asset_b: hold_benchmark(&asset_b, config.initial_capital),
    };

    SweepResult {
        config: config.clone(),
        points,
        benchmarks,
    }
}
