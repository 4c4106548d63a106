//! Configuration validation.
//!
//! Validates all config fields before any data is read.

use crate::domain::error::RotatorError;
use crate::domain::frequency::RebalanceFrequency;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use tracing::warn;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_TRANSACTION_COST_PCT: f64 = 0.1;
pub const DEFAULT_LOOKBACK_MONTHS: i64 = 12;
pub const DEFAULT_SMOOTHING_DAYS: i64 = 0;
pub const DEFAULT_REBALANCE: &str = "Monthly";
pub const DEFAULT_SWEEP_FREQUENCIES: &str = "Monthly,Quarterly";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    validate_data_paths(config)?;
    validate_initial_capital(config)?;
    validate_transaction_cost(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    at_least(config, "strategy", "lookback_months", DEFAULT_LOOKBACK_MONTHS, 1)?;
    at_least(config, "strategy", "smoothing_days", DEFAULT_SMOOTHING_DAYS, 0)?;
    let rebalance = config
        .get_string("strategy", "rebalance")
        .unwrap_or_else(|| DEFAULT_REBALANCE.to_string());
    check_frequency_name(&rebalance);
    Ok(())
}

pub fn validate_sweep_config(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    validate_range(config, "lookback", 1, 12, 1, 1)?;
    validate_range(config, "smoothing", 1, 50, 5, 0)?;

    let names = frequency_names(config);
    if names.is_empty() {
        return Err(invalid("sweep", "frequencies", "at least one frequency is required"));
    }
    for name in &names {
        check_frequency_name(name);
    }
    Ok(())
}

/// Frequency names listed under `[sweep] frequencies`, comma separated.
pub fn frequency_names(config: &dyn ConfigPort) -> Vec<String> {
    config.get_list("sweep", "frequencies", DEFAULT_SWEEP_FREQUENCIES)
}

/// Parse an optional `YYYY-MM-DD` key; blank values count as unset.
pub fn optional_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, RotatorError> {
    match config.get_string(section, key).filter(|s| !s.trim().is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid(section, key, &format!("invalid {key} format, expected YYYY-MM-DD"))),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> RotatorError {
    RotatorError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn check_frequency_name(name: &str) {
    if RebalanceFrequency::from_name(name).is_none() {
        warn!(frequency = name, "unknown rebalance frequency, falling back to Monthly");
        eprintln!("warning: unknown rebalance frequency '{name}', using Monthly");
    }
}

fn validate_data_paths(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    for key in ["asset_a", "asset_b", "rate"] {
        match config.get_string("data", key) {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(RotatorError::ConfigMissing {
                    section: "data".to_string(),
                    key: key.to_string(),
                })
            }
        }
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    let value = config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL);
    if value <= 0.0 || !value.is_finite() {
        return Err(invalid("backtest", "initial_capital", "initial_capital must be positive"));
    }
    Ok(())
}

fn validate_transaction_cost(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    let value = config.get_double(
        "backtest",
        "transaction_cost_pct",
        DEFAULT_TRANSACTION_COST_PCT,
    );
    if !(0.0..100.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "transaction_cost_pct",
            "transaction_cost_pct must be in [0, 100)",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), RotatorError> {
    let start = optional_date(config, "backtest", "start_date")?;
    let end = optional_date(config, "backtest", "end_date")?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(invalid(
                "backtest",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

fn at_least(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
    minimum: i64,
) -> Result<i64, RotatorError> {
    let value = config.get_int(section, key, default);
    if value < minimum || value > u32::MAX as i64 {
        return Err(invalid(section, key, &format!("{key} must be at least {minimum}")));
    }
    Ok(value)
}

fn validate_range(
    config: &dyn ConfigPort,
    name: &str,
    default_start: i64,
    default_end: i64,
    default_step: i64,
    minimum: i64,
) -> Result<(), RotatorError> {
    let start_key = format!("{name}_start");
    let end_key = format!("{name}_end");
    let step_key = format!("{name}_step");

    let start = at_least(config, "sweep", &start_key, default_start, minimum)?;
    let end = at_least(config, "sweep", &end_key, default_end, minimum)?;
    at_least(config, "sweep", &step_key, default_step, 1)?;

    if start > end {
        return Err(invalid(
            "sweep",
            &start_key,
            &format!("{start_key} must not exceed {end_key}"),
        ));
    }
    Ok(())
}
