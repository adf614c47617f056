use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::trace;

use super::{AxesHandle, RenderingSurface, SubscriptionHandle, ViewCallback};
use crate::data_types::{ReducedSeries, SeriesId, XRange};
use crate::error::{DecimateError, Result};

struct AxesEntry {
    pixel_width: usize,
    range: XRange,
}

struct Subscription {
    handle: SubscriptionHandle,
    axes: AxesHandle,
    on_range_changed: ViewCallback,
    on_size_changed: ViewCallback,
}

#[derive(Default)]
struct Inner {
    axes: Vec<AxesEntry>,
    displayed: HashMap<SeriesId, ReducedSeries>,
    subscriptions: Vec<Subscription>,
    next_subscription: u64,
    pushes: usize,
}

/// Headless surface keeping everything in memory.
///
/// `resize` and `set_visible_range` fire subscribed callbacks synchronously on
/// the calling thread, after the internal lock has been released, so a
/// callback may call straight back into the surface.
#[derive(Default)]
pub struct MemorySurface {
    inner: Mutex<Inner>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_axes(&self, pixel_width: usize, range: XRange) -> AxesHandle {
        let mut inner = self.inner.lock();
        inner.axes.push(AxesEntry { pixel_width, range });
        AxesHandle(inner.axes.len() - 1)
    }

    /// Changes the pixel width of an axes and notifies its size subscribers.
    pub fn resize(&self, axes: AxesHandle, pixel_width: usize) -> Result<()> {
        if pixel_width == 0 {
            return Err(DecimateError::invalid_input("pixel width must be positive"));
        }
        let callbacks = {
            let mut inner = self.inner.lock();
            inner.axes_mut(axes)?.pixel_width = pixel_width;
            inner.callbacks_for(axes, |s| s.on_size_changed.clone())
        };
        trace!(axes = axes.0, pixel_width, "resize");
        callbacks.iter().for_each(|cb| cb());
        Ok(())
    }

    /// Changes the visible x-range of an axes and notifies its range subscribers.
    pub fn set_visible_range(&self, axes: AxesHandle, range: XRange) -> Result<()> {
        range.validate()?;
        let callbacks = {
            let mut inner = self.inner.lock();
            inner.axes_mut(axes)?.range = range;
            inner.callbacks_for(axes, |s| s.on_range_changed.clone())
        };
        trace!(axes = axes.0, min = range.min, max = range.max, "set_visible_range");
        callbacks.iter().for_each(|cb| cb());
        Ok(())
    }

    /// Data currently displayed for a series.
    pub fn displayed(&self, series: SeriesId) -> Option<ReducedSeries> {
        self.inner.lock().displayed.get(&series).cloned()
    }

    /// Number of successful `set_series_data` calls so far.
    pub fn push_count(&self) -> usize {
        self.inner.lock().pushes
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.lock().subscriptions.len()
    }
}

impl Inner {
    fn axes_ref(&self, axes: AxesHandle) -> Result<&AxesEntry> {
        self.axes
            .get(axes.0)
            .ok_or_else(|| DecimateError::upstream(format!("unknown axes {}", axes.0)))
    }

    fn axes_mut(&mut self, axes: AxesHandle) -> Result<&mut AxesEntry> {
        self.axes
            .get_mut(axes.0)
            .ok_or_else(|| DecimateError::upstream(format!("unknown axes {}", axes.0)))
    }

    fn callbacks_for(
        &self,
        axes: AxesHandle,
        pick: impl Fn(&Subscription) -> ViewCallback,
    ) -> Vec<ViewCallback> {
        self.subscriptions
            .iter()
            .filter(|s| s.axes == axes)
            .map(pick)
            .collect()
    }
}

impl RenderingSurface for MemorySurface {
    fn pixel_width(&self, axes: AxesHandle) -> Result<usize> {
        Ok(self.inner.lock().axes_ref(axes)?.pixel_width)
    }

    fn visible_range(&self, axes: AxesHandle) -> Result<XRange> {
        Ok(self.inner.lock().axes_ref(axes)?.range)
    }

    fn set_series_data(&self, series: SeriesId, data: ReducedSeries) -> Result<()> {
        if data.x.len() != data.y.len() {
            return Err(DecimateError::upstream("x and y lengths differ"));
        }
        let mut inner = self.inner.lock();
        inner.displayed.insert(series, data);
        inner.pushes += 1;
        Ok(())
    }

    fn subscribe(
        &self,
        axes: AxesHandle,
        on_range_changed: ViewCallback,
        on_size_changed: ViewCallback,
    ) -> Result<SubscriptionHandle> {
        let mut inner = self.inner.lock();
        inner.axes_ref(axes)?;
        let handle = SubscriptionHandle(inner.next_subscription);
        inner.next_subscription += 1;
        inner.subscriptions.push(Subscription {
            handle,
            axes,
            on_range_changed,
            on_size_changed,
        });
        Ok(handle)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.inner.lock().subscriptions.retain(|s| s.handle != handle);
    }
}
