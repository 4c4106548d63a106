//! Momentum rotation engine.
//!
//! Walks an aligned dataset once, holding at most one of the two risky
//! assets or cash. On rebalance events the smoothed momentum of each asset
//! over the lookback window is compared against the other and against the
//! risk-free rate pro-rated to the window; a change of holding costs a
//! proportional transaction fee.

use crate::domain::align::AlignedRow;
use crate::domain::frequency::{is_rebalance_at, RebalanceFrequency};
use crate::domain::metrics::TRADING_DAYS_PER_YEAR;
use chrono::NaiveDate;
use serde::Serialize;

/// Average calendar days per month used to convert lookback months to days.
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Fraction of the lookback window that must have elapsed before a signal is trusted.
pub const WARMUP_FRACTION: f64 = 0.9;

/// History is sampled every this many rows (plus the final row).
pub const HISTORY_STRIDE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Holding {
    #[default]
    Cash,
    AssetA,
    AssetB,
}

impl Holding {
    pub fn label<'a>(&self, asset_a: &'a str, asset_b: &'a str) -> &'a str {
        match self {
            Holding::Cash => "CASH",
            Holding::AssetA => asset_a,
            Holding::AssetB => asset_b,
        }
    }
}

/// Display names for the two risky assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetLabels {
    pub asset_a: String,
    pub asset_b: String,
}

impl Default for AssetLabels {
    fn default() -> Self {
        Self {
            asset_a: "A".to_string(),
            asset_b: "B".to_string(),
        }
    }
}

impl AssetLabels {
    pub fn holding(&self, held: Holding) -> &str {
        held.label(&self.asset_a, &self.asset_b)
    }
}

/// Whether the engine materialises a down-sampled history for charting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Record,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyParams {
    pub lookback_months: u32,
    /// Moving-average window in trading days; 0 or 1 disables smoothing.
    pub smoothing_days: usize,
    pub frequency: RebalanceFrequency,
    /// Cost per switch, in percent of the balance.
    pub transaction_cost_pct: f64,
    pub initial_capital: f64,
}

impl StrategyParams {
    pub fn lookback_days(&self) -> f64 {
        self.lookback_months as f64 * DAYS_PER_MONTH
    }

    /// Risk-free return pro-rated to the lookback window, as a fraction.
    pub fn hurdle(&self, rate_pct: f64) -> f64 {
        (rate_pct / 100.0) * (self.lookback_months as f64 / 12.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub strategy: f64,
    pub asset_a: f64,
    pub asset_b: f64,
    pub held: Holding,
    pub drawdown: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// Initial capital followed by one balance per row.
    pub strategy_curve: Vec<f64>,
    pub asset_a_curve: Vec<f64>,
    pub asset_b_curve: Vec<f64>,
    pub trade_count: usize,
    pub final_holding: Holding,
    pub history: Option<Vec<HistoryPoint>>,
}

#[derive(Debug, Clone)]
struct SimulationState {
    strategy_balance: f64,
    asset_a_balance: f64,
    asset_b_balance: f64,
    held: Holding,
    peak_balance: f64,
    trade_count: usize,
    lookback_cursor: usize,
}

impl SimulationState {
    fn new(initial_capital: f64) -> Self {
        Self {
            strategy_balance: initial_capital,
            asset_a_balance: initial_capital,
            asset_b_balance: initial_capital,
            held: Holding::Cash,
            peak_balance: initial_capital,
            trade_count: 0,
            lookback_cursor: 0,
        }
    }

    /// Apply one period of returns from `prev` to `today`.
    fn grow(&mut self, prev: &AlignedRow, today: &AlignedRow) {
        let ret_a = (today.asset_a - prev.asset_a) / prev.asset_a;
        let ret_b = (today.asset_b - prev.asset_b) / prev.asset_b;
        let ret_cash = (prev.rate_pct / 100.0) / TRADING_DAYS_PER_YEAR;

        let held_return = match self.held {
            Holding::AssetA => ret_a,
            Holding::AssetB => ret_b,
            Holding::Cash => ret_cash,
        };
        self.strategy_balance *= 1.0 + held_return;
        self.asset_a_balance *= 1.0 + ret_a;
        self.asset_b_balance *= 1.0 + ret_b;
    }

    /// Update the running peak and return the current drawdown (≤ 0).
    fn mark_drawdown(&mut self) -> f64 {
        if self.strategy_balance > self.peak_balance {
            self.peak_balance = self.strategy_balance;
        }
        (self.strategy_balance - self.peak_balance) / self.peak_balance
    }

    /// Switch holdings, charging the cost only when the holding changes.
    fn rebalance_to(&mut self, target: Holding, cost_fraction: f64) {
        if target != self.held {
            self.strategy_balance *= 1.0 - cost_fraction;
            self.held = target;
            self.trade_count += 1;
        }
    }
}

/// Simple moving average of `price` over the last `window` rows ending at `index`.
///
/// The window is clipped at the series start; `window <= 1` returns the raw price.
pub fn smoothed_price(
    rows: &[AlignedRow],
    index: usize,
    window: usize,
    price: fn(&AlignedRow) -> f64,
) -> f64 {
    if window <= 1 {
        return price(&rows[index]);
    }
    let start = (index + 1).saturating_sub(window);
    let slice = &rows[start..=index];
    slice.iter().map(price).sum::<f64>() / slice.len() as f64
}

/// Rotation decision from the two momenta and the hurdle.
///
/// Equal momenta fall through to the asset B branch.
pub fn select_holding(momentum_a: f64, momentum_b: f64, hurdle: f64) -> Holding {
    if momentum_a > momentum_b {
        if momentum_a > hurdle {
            Holding::AssetA
        } else {
            Holding::Cash
        }
    } else if momentum_b > hurdle {
        Holding::AssetB
    } else {
        Holding::Cash
    }
}

fn price_a(row: &AlignedRow) -> f64 {
    row.asset_a
}

fn price_b(row: &AlignedRow) -> f64 {
    row.asset_b
}

fn momentum(rows: &[AlignedRow], today: usize, past: usize, window: usize, price: fn(&AlignedRow) -> f64) -> f64 {
    let now = smoothed_price(rows, today, window, price);
    let then = smoothed_price(rows, past, window, price);
    (now - then) / then
}

fn elapsed_days(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64
}

/// Run the rotation strategy over `rows`.
///
/// Cells whose lookback never accumulates enough history simply stay in
/// cash with zero trades.
pub fn run_strategy(
    rows: &[AlignedRow],
    params: &StrategyParams,
    history_mode: HistoryMode,
) -> SimulationResult {
    let initial = params.initial_capital;
    let cost_fraction = params.transaction_cost_pct / 100.0;
    let target_days = params.lookback_days();
    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();

    let mut state = SimulationState::new(initial);

    let mut strategy_curve = Vec::with_capacity(rows.len() + 1);
    let mut asset_a_curve = Vec::with_capacity(rows.len() + 1);
    let mut asset_b_curve = Vec::with_capacity(rows.len() + 1);
    strategy_curve.push(initial);
    asset_a_curve.push(initial);
    asset_b_curve.push(initial);

    let mut history = match history_mode {
        HistoryMode::Record => Some(Vec::with_capacity(rows.len() / HISTORY_STRIDE + 2)),
        HistoryMode::Skip => None,
    };

    for (i, today) in rows.iter().enumerate() {
        if i > 0 {
            state.grow(&rows[i - 1], today);
        }
        let drawdown = state.mark_drawdown();

        if is_rebalance_at(&dates, i, params.frequency) {
            while state.lookback_cursor < i
                && elapsed_days(dates[state.lookback_cursor], today.date) > target_days
            {
                state.lookback_cursor += 1;
            }

            let past = state.lookback_cursor.saturating_sub(1);
            if elapsed_days(dates[past], today.date) >= target_days * WARMUP_FRACTION {
                let window = params.smoothing_days;
                let mom_a = momentum(rows, i, past, window, price_a);
                let mom_b = momentum(rows, i, past, window, price_b);
                let target = select_holding(mom_a, mom_b, params.hurdle(today.rate_pct));
                state.rebalance_to(target, cost_fraction);
            }
        }

        strategy_curve.push(state.strategy_balance);
        asset_a_curve.push(state.asset_a_balance);
        asset_b_curve.push(state.asset_b_balance);

        if let Some(points) = history.as_mut() {
            if i % HISTORY_STRIDE == 0 || i + 1 == rows.len() {
                points.push(HistoryPoint {
                    date: today.date,
                    strategy: state.strategy_balance,
                    asset_a: state.asset_a_balance,
                    asset_b: state.asset_b_balance,
                    held: state.held,
                    drawdown,
                });
            }
        }
    }

    SimulationResult {
        strategy_curve,
        asset_a_curve,
        asset_b_curve,
        trade_count: state.trade_count,
        final_holding: state.held,
        history,
    }
}
