//! Pure domain logic: parsing, alignment, simulation and metrics.

pub mod align;
pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod frequency;
pub mod leverage;
pub mod metrics;
pub mod series;
pub mod strategy;
pub mod sweep;
