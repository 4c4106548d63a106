//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::RotatorError;
use crate::domain::leverage::HybridPoint;
use crate::domain::strategy::AssetLabels;
use crate::domain::sweep::SweepResult;
use std::path::Path;

/// Port for persisting run results.
pub trait ReportPort {
    fn write_backtest(
        &self,
        result: &BacktestResult,
        labels: &AssetLabels,
        output_path: &Path,
    ) -> Result<(), RotatorError>;

    fn write_sweep(&self, result: &SweepResult, output_path: &Path) -> Result<(), RotatorError>;

    fn write_inspection(
        &self,
        points: &[HybridPoint],
        labels: &AssetLabels,
        output_path: &Path,
    ) -> Result<(), RotatorError>;
}
