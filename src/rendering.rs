//! Rendering surface seam.
//!
//! The refresh controller never draws anything itself. It talks to a
//! [`RenderingSurface`], which owns the axes, reports their pixel width and
//! visible range, displays whatever reduced data it is handed, and calls back
//! when the view changes.

pub mod memory;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data_types::{ReducedSeries, SeriesId, XRange};
use crate::error::Result;

pub use memory::MemorySurface;

/// Handle of an axes owned by a rendering surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AxesHandle(pub usize);

/// Handle returned by [`RenderingSurface::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

/// Callback fired on a view change. It carries no payload; the receiver
/// queries the surface for the settled state.
pub type ViewCallback = Arc<dyn Fn() + Send + Sync>;

pub trait RenderingSurface: Send + Sync {
    /// Current width of the axes' plotting area in pixel columns.
    fn pixel_width(&self, axes: AxesHandle) -> Result<usize>;

    /// Current visible x-range; either bound may be infinite.
    fn visible_range(&self, axes: AxesHandle) -> Result<XRange>;

    /// Replaces the coordinates displayed for a series. Must be idempotent.
    fn set_series_data(&self, series: SeriesId, data: ReducedSeries) -> Result<()>;

    /// Registers callbacks for x-limit and size changes of an axes.
    fn subscribe(
        &self,
        axes: AxesHandle,
        on_range_changed: ViewCallback,
        on_size_changed: ViewCallback,
    ) -> Result<SubscriptionHandle>;

    fn unsubscribe(&self, _handle: SubscriptionHandle) {}
}

/// A group of axes sharing one x view (e.g. a dual-y plot).
///
/// Pixel width and range are always read from `primary`; changes on any member
/// trigger a refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAxes {
    pub primary: AxesHandle,
    pub linked: Vec<AxesHandle>,
}

impl LinkedAxes {
    pub fn single(axes: AxesHandle) -> Self {
        Self {
            primary: axes,
            linked: Vec::new(),
        }
    }

    pub fn with_linked(mut self, axes: AxesHandle) -> Self {
        if axes != self.primary && !self.linked.contains(&axes) {
            self.linked.push(axes);
        }
        self
    }

    /// Primary first, then the linked axes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = AxesHandle> + '_ {
        std::iter::once(self.primary).chain(self.linked.iter().copied())
    }
}

impl From<AxesHandle> for LinkedAxes {
    fn from(axes: AxesHandle) -> Self {
        Self::single(axes)
    }
}
