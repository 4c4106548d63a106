//! Performance metrics over a balance trajectory.

use crate::domain::error::RotatorError;
use serde::Serialize;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Fixed annual risk-free rate used for the Sharpe ratio.
///
/// Independent of the rate series that drives the strategy's cash leg.
pub const SHARPE_RISK_FREE_RATE: f64 = 0.04;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub cagr: f64,
    /// Most negative running-peak drawdown, as a fraction (≤ 0).
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub final_balance: f64,
    /// Annualised standard deviation of per-period returns.
    pub volatility: f64,
    pub trade_count: usize,
}

impl Metrics {
    /// Reduce a balance trajectory to metrics; `trade_count` comes from the caller.
    ///
    /// An empty trajectory yields all-zero metrics.
    pub fn compute(curve: &[f64], trade_count: usize) -> Self {
        let (Some(&initial), Some(&final_balance)) = (curve.first(), curve.last()) else {
            return Metrics {
                cagr: 0.0,
                max_drawdown: 0.0,
                sharpe_ratio: 0.0,
                final_balance: 0.0,
                volatility: 0.0,
                trade_count,
            };
        };

        let years = curve.len() as f64 / TRADING_DAYS_PER_YEAR;
        let cagr = if years > 0.0 {
            (final_balance / initial).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (sharpe_ratio, volatility) = compute_risk_adjusted(curve);

        Metrics {
            cagr,
            max_drawdown: compute_max_drawdown(curve),
            sharpe_ratio,
            final_balance,
            volatility,
            trade_count,
        }
    }

    /// Like [`Metrics::compute`], but rejects trajectories too short or
    /// non-positive to carry meaningful returns.
    pub fn try_compute(curve: &[f64], trade_count: usize) -> Result<Self, RotatorError> {
        if curve.len() < 2 {
            return Err(RotatorError::DegenerateMetric {
                reason: format!("trajectory has {} points, need at least 2", curve.len()),
            });
        }
        if curve[0] <= 0.0 {
            return Err(RotatorError::DegenerateMetric {
                reason: format!("trajectory starts at non-positive balance {}", curve[0]),
            });
        }
        Ok(Self::compute(curve, trade_count))
    }
}

fn compute_max_drawdown(curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &value in curve {
        if value > peak {
            peak = value;
        }
        let dd = (value - peak) / peak;
        if dd < max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

/// Returns `(sharpe, annualised volatility)` using the sample standard deviation.
fn compute_risk_adjusted(curve: &[f64]) -> (f64, f64) {
    let returns: Vec<f64> = curve
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();

    if returns.is_empty() {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = if returns.len() > 1 {
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0)
    } else {
        0.0
    };
    let stddev = variance.sqrt();
    let volatility = stddev * TRADING_DAYS_PER_YEAR.sqrt();

    let sharpe = if volatility == 0.0 {
        0.0
    } else {
        (mean - SHARPE_RISK_FREE_RATE / TRADING_DAYS_PER_YEAR) / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    };

    (sharpe, volatility)
}
