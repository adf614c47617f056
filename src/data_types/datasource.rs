use serde::{Deserialize, Serialize};

use super::data::StyleTag;
use crate::error::{DecimateError, Result};

/// Handle of a registered series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesId(pub usize);

/// Handle of an x buffer, possibly shared by several series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BufferId(pub usize);

struct XBuffer {
    values: Vec<f64>,
    /// Non-decreasing, computed once on registration.
    sorted: bool,
}

struct SeriesEntry {
    x: BufferId,
    y: Vec<f64>,
    style: StyleTag,
}

/// Borrowed, read-only view of one series.
#[derive(Clone, Copy, Debug)]
pub struct SeriesView<'a> {
    pub id: SeriesId,
    pub x_buffer: BufferId,
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub style: &'a StyleTag,
    pub x_sorted: bool,
}

impl SeriesView<'_> {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Owner of every original x/y buffer.
///
/// Several series may point at the same x buffer ("one x, many y"). Series are
/// immutable once registered; ids are handed out in registration order.
#[derive(Default)]
pub struct SeriesStore {
    buffers: Vec<XBuffer>,
    series: Vec<SeriesEntry>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an x buffer that series can later be attached to.
    pub fn add_x_buffer(&mut self, x: Vec<f64>) -> BufferId {
        let sorted = x.windows(2).all(|w| w[0] <= w[1]);
        let id = BufferId(self.buffers.len());
        self.buffers.push(XBuffer { values: x, sorted });
        id
    }

    /// Attaches a y buffer to an existing x buffer.
    pub fn add_series(&mut self, x: BufferId, y: Vec<f64>, style: StyleTag) -> Result<SeriesId> {
        let buffer = self
            .buffers
            .get(x.0)
            .ok_or_else(|| DecimateError::invalid_input(format!("unknown x buffer {}", x.0)))?;
        if buffer.values.len() != y.len() {
            return Err(DecimateError::invalid_input(format!(
                "x has {} samples but y has {}",
                buffer.values.len(),
                y.len()
            )));
        }
        let id = SeriesId(self.series.len());
        self.series.push(SeriesEntry { x, y, style });
        Ok(id)
    }

    /// Registers a series with its own x buffer.
    pub fn add_xy(&mut self, x: Vec<f64>, y: Vec<f64>, style: StyleTag) -> Result<SeriesId> {
        if x.len() != y.len() {
            return Err(DecimateError::invalid_input(format!(
                "x has {} samples but y has {}",
                x.len(),
                y.len()
            )));
        }
        let buffer = self.add_x_buffer(x);
        self.add_series(buffer, y, style)
    }

    /// Registers several y series against one x buffer.
    ///
    /// Lengths are checked up front, so either every series is registered or none is.
    pub fn add_shared(
        &mut self,
        x: Vec<f64>,
        ys: Vec<(Vec<f64>, StyleTag)>,
    ) -> Result<Vec<SeriesId>> {
        if let Some((bad, _)) = ys.iter().find(|(y, _)| y.len() != x.len()) {
            return Err(DecimateError::invalid_input(format!(
                "shared x has {} samples but a y series has {}",
                x.len(),
                bad.len()
            )));
        }
        let buffer = self.add_x_buffer(x);
        ys.into_iter()
            .map(|(y, style)| self.add_series(buffer, y, style))
            .collect()
    }

    pub fn lookup(&self, id: SeriesId) -> Result<SeriesView<'_>> {
        let entry = self
            .series
            .get(id.0)
            .ok_or_else(|| DecimateError::invalid_input(format!("unknown series {}", id.0)))?;
        let buffer = &self.buffers[entry.x.0];
        Ok(SeriesView {
            id,
            x_buffer: entry.x,
            x: &buffer.values,
            y: &entry.y,
            style: &entry.style,
            x_sorted: buffer.sorted,
        })
    }

    pub fn ids(&self) -> impl Iterator<Item = SeriesId> + '_ {
        (0..self.series.len()).map(SeriesId)
    }

    pub fn iter(&self) -> impl Iterator<Item = SeriesView<'_>> + '_ {
        self.series.iter().enumerate().map(move |(i, entry)| {
            let buffer = &self.buffers[entry.x.0];
            SeriesView {
                id: SeriesId(i),
                x_buffer: entry.x,
                x: &buffer.values,
                y: &entry.y,
                style: &entry.style,
                x_sorted: buffer.sorted,
            }
        })
    }

    /// Number of registered series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Total number of y samples over all series.
    pub fn total_samples(&self) -> usize {
        self.series.iter().map(|s| s.y.len()).sum()
    }

    /// Finite x extent of a series, if it has any finite x.
    pub fn x_extent(&self, id: SeriesId) -> Option<(f64, f64)> {
        let view = self.lookup(id).ok()?;
        let mut bounds: Option<(f64, f64)> = None;
        for &x in view.x.iter().filter(|x| x.is_finite()) {
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(x), hi.max(x)),
                None => (x, x),
            });
        }
        bounds
    }

    /// Y-range within an x window, skipping missing values (for auto-scaling Y).
    pub fn y_range(&self, id: SeriesId, x_min: f64, x_max: f64) -> Option<(f64, f64)> {
        let view = self.lookup(id).ok()?;
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        let mut found = false;
        for (&x, &y) in view.x.iter().zip(view.y.iter()) {
            if x >= x_min && x <= x_max && !y.is_nan() {
                y_min = y_min.min(y);
                y_max = y_max.max(y);
                found = true;
            }
        }
        if found {
            Some((y_min, y_max))
        } else {
            None
        }
    }
}
