use std::path::Path;

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

/// What to do with a series whose x values are not non-decreasing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsortedXPolicy {
    /// Bin by x like any other series. Columns come out left to right; samples
    /// within a column stay in index order.
    #[default]
    Reduce,
    /// Report `UnsupportedConfiguration` and leave the displayed data alone.
    Reject,
    /// Push the series to the surface without reducing it.
    PassThrough,
}

/// Tuning for refresh passes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecimationConfig {
    /// Reduce independent series on the rayon pool.
    pub parallel: bool,
    /// Below this many samples in total a pass stays on the calling thread.
    pub parallel_min_points: usize,
    pub unsorted_x: UnsortedXPolicy,
}

impl Default for DecimationConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_min_points: 65_536,
            unsorted_x: UnsortedXPolicy::Reduce,
        }
    }
}

impl DecimationConfig {
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    pub fn with_unsorted_x(mut self, policy: UnsortedXPolicy) -> Self {
        self.unsorted_x = policy;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).wrap_err("failed to parse decimation config")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Whether a pass over `total_points` samples should fan out.
    pub fn use_parallel(&self, total_points: usize) -> bool {
        self.parallel && total_points >= self.parallel_min_points
    }
}
