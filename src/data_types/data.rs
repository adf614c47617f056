use serde::{Deserialize, Serialize};

/// Opaque style descriptor carried alongside a series (e.g. `"r--"`).
///
/// The decimation core never interprets it; it is handed back to whoever draws the line.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleTag(pub String);

impl StyleTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for StyleTag {
    fn from(tag: &str) -> Self {
        Self(tag.to_string())
    }
}

/// Output of the decimation engine.
///
/// Always owns its buffers, so the rendering layer may keep it after the source
/// series is gone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReducedSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl ReducedSeries {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
        }
    }

    /// Copies the given coordinates verbatim.
    pub fn copied(x: &[f64], y: &[f64]) -> Self {
        Self {
            x: x.to_vec(),
            y: y.to_vec(),
        }
    }

    #[inline]
    pub fn push(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.y.push(y);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Bit-level equality, treating NaN markers at the same position as equal.
    pub fn bit_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.0.to_bits() == b.0.to_bits() && a.1.to_bits() == b.1.to_bits())
    }
}
