//! Raw series access port trait.

use crate::domain::align::{RawSeriesSet, SeriesRole};
use crate::domain::error::RotatorError;

pub trait DataPort {
    /// Raw delimited text for `role`, or `None` when no source is configured.
    fn fetch_raw(&self, role: SeriesRole) -> Result<Option<String>, RotatorError>;

    /// Collect every input; the three required roles must be present.
    fn fetch_all(&self) -> Result<RawSeriesSet, RotatorError> {
        let required = |role: SeriesRole| -> Result<String, RotatorError> {
            self.fetch_raw(role)?.ok_or_else(|| RotatorError::DataSource {
                reason: format!("no source configured for {role}"),
            })
        };

        Ok(RawSeriesSet {
            asset_a: required(SeriesRole::AssetA)?,
            asset_b: required(SeriesRole::AssetB)?,
            rate: required(SeriesRole::Rate)?,
            leveraged: self.fetch_raw(SeriesRole::Leveraged)?,
        })
    }
}
