use serde::{Deserialize, Serialize};

use crate::error::{DecimateError, Result};

/// Visible x-interval of an axes.
///
/// `-inf` / `+inf` bounds mean "use the full data extent on that side".
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct XRange {
    pub min: f64,
    pub max: f64,
}

impl Default for XRange {
    fn default() -> Self {
        Self::FULL
    }
}

impl XRange {
    pub const FULL: XRange = XRange {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Range unbounded on both sides.
    pub fn full() -> Self {
        Self::FULL
    }

    #[inline]
    pub fn contains(&self, x: f64) -> bool {
        x >= self.min && x <= self.max
    }

    pub fn validate(&self) -> Result<()> {
        if self.min.is_nan() || self.max.is_nan() {
            return Err(DecimateError::invalid_input("x-range bound is NaN"));
        }
        if self.min > self.max {
            return Err(DecimateError::invalid_input(format!(
                "x-range is inverted: {} > {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

impl From<(f64, f64)> for XRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

/// What a refresh is computed against: the visible range and how many pixel
/// columns it spans.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub range: XRange,
    pub pixel_width: usize,
}

impl ViewState {
    pub fn new(range: impl Into<XRange>, pixel_width: usize) -> Self {
        Self {
            range: range.into(),
            pixel_width,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pixel_width == 0 {
            return Err(DecimateError::invalid_input("pixel width must be positive"));
        }
        self.range.validate()
    }
}
