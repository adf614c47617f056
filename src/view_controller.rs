//! Refresh orchestration.
//!
//! [`RefreshController`] re-derives every registered series whenever the
//! visible x-range or the pixel width of its axes changes. Pushing data to the
//! surface may synchronously raise further view-change notifications; those
//! arrive while the controller is `Busy` and are dropped, not queued.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::config::{DecimationConfig, UnsortedXPolicy};
use crate::data_types::{ReducedSeries, SeriesId, SeriesStore, ViewState};
use crate::decimation::reduce_view;
use crate::error::{DecimateError, Result};
use crate::rendering::{LinkedAxes, RenderingSurface, SubscriptionHandle, ViewCallback};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum RefreshState {
    #[default]
    Idle,
    Busy,
}

/// One series that could not be refreshed. Its displayed data was left as is.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesFailure {
    pub series: SeriesId,
    pub error: DecimateError,
}

/// Outcome of one refresh attempt.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RefreshReport {
    /// `None` when no usable view could be obtained.
    pub view: Option<ViewState>,
    pub refreshed: Vec<SeriesId>,
    pub failures: Vec<SeriesFailure>,
    /// Set when the whole pass was abandoned before any series was touched.
    pub error: Option<DecimateError>,
}

impl RefreshReport {
    fn abandoned(error: DecimateError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.error.is_none() && self.failures.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RefreshOutcome {
    Completed(RefreshReport),
    /// A pass was already running; the event was discarded.
    Dropped,
}

impl RefreshOutcome {
    pub fn report(&self) -> Option<&RefreshReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Dropped => None,
        }
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RefreshStats {
    pub passes: u64,
    pub dropped: u64,
}

/// Puts the state back to `Idle` on every exit path, unwinding included.
struct BusyGuard<'a> {
    state: &'a Mutex<RefreshState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock() = RefreshState::Idle;
    }
}

pub struct RefreshController {
    store: RwLock<SeriesStore>,
    surface: Arc<dyn RenderingSurface>,
    axes: LinkedAxes,
    config: DecimationConfig,
    state: Mutex<RefreshState>,
    stats: Mutex<RefreshStats>,
    last_report: Mutex<Option<RefreshReport>>,
    subscriptions: Mutex<Vec<SubscriptionHandle>>,
}

impl RefreshController {
    /// Subscribes to every axes in `axes` and runs the first pass synchronously,
    /// so the surface holds reduced data before anything is drawn.
    ///
    /// Fails if the surface refuses a subscription or cannot report the
    /// primary axes' view. Per-series failures of the first pass do not fail
    /// construction; they are available from [`Self::take_last_report`].
    pub fn new(
        store: SeriesStore,
        surface: Arc<dyn RenderingSurface>,
        axes: impl Into<LinkedAxes>,
        config: DecimationConfig,
    ) -> Result<Arc<Self>> {
        let controller = Arc::new(Self {
            store: RwLock::new(store),
            surface,
            axes: axes.into(),
            config,
            state: Mutex::new(RefreshState::Idle),
            stats: Mutex::new(RefreshStats::default()),
            last_report: Mutex::new(None),
            subscriptions: Mutex::new(Vec::new()),
        });

        for axes in controller.axes.iter() {
            let callback = Self::callback(Arc::downgrade(&controller));
            let handle = controller
                .surface
                .subscribe(axes, callback.clone(), callback)?;
            controller.subscriptions.lock().push(handle);
        }

        controller.refresh_now()?;
        Ok(controller)
    }

    fn callback(weak: Weak<Self>) -> ViewCallback {
        Arc::new(move || {
            if let Some(controller) = weak.upgrade() {
                controller.notify();
            }
        })
    }

    /// Entry point for surface callbacks. Errors cannot travel back through a
    /// callback, so they are logged and kept in the last report.
    pub fn notify(&self) {
        if let Err(err) = self.refresh_now() {
            warn!(%err, "refresh after view change failed");
        }
    }

    /// Samples the current view from the primary axes and refreshes.
    pub fn refresh_now(&self) -> Result<RefreshOutcome> {
        let Some(guard) = self.try_begin() else {
            return Ok(RefreshOutcome::Dropped);
        };
        let view = self.sample_view().map_err(|err| self.abandon(err))?;
        Ok(RefreshOutcome::Completed(self.run_pass(&guard, view)))
    }

    /// Handles a `ViewChanged(width, range)` event carrying an explicit view.
    pub fn handle_view_changed(&self, view: ViewState) -> Result<RefreshOutcome> {
        let Some(guard) = self.try_begin() else {
            return Ok(RefreshOutcome::Dropped);
        };
        view.validate().map_err(|err| self.abandon(err))?;
        Ok(RefreshOutcome::Completed(self.run_pass(&guard, view)))
    }

    /// Keeps a pass-level failure as the last report; the displayed data is untouched.
    fn abandon(&self, error: DecimateError) -> DecimateError {
        *self.last_report.lock() = Some(RefreshReport::abandoned(error.clone()));
        error
    }

    fn try_begin(&self) -> Option<BusyGuard<'_>> {
        let mut state = self.state.lock();
        if *state == RefreshState::Busy {
            drop(state);
            self.stats.lock().dropped += 1;
            debug!("view change dropped, refresh already in progress");
            return None;
        }
        *state = RefreshState::Busy;
        Some(BusyGuard { state: &self.state })
    }

    /// Reads pixel width and range from the primary axes.
    pub fn sample_view(&self) -> Result<ViewState> {
        let primary = self.axes.primary;
        let pixel_width = self.surface.pixel_width(primary)?;
        if pixel_width == 0 {
            return Err(DecimateError::upstream(format!(
                "axes {} reported a zero pixel width",
                primary.0
            )));
        }
        let range = self.surface.visible_range(primary)?;
        let view = ViewState::new(range, pixel_width);
        view.validate()
            .map_err(|err| DecimateError::upstream(format!("axes {} view: {err}", primary.0)))?;
        Ok(view)
    }

    fn run_pass(&self, _guard: &BusyGuard<'_>, view: ViewState) -> RefreshReport {
        let reduced = {
            let store = self.store.read();
            let ids: Vec<SeriesId> = store.ids().collect();
            debug!(
                series = ids.len(),
                pixel_width = view.pixel_width,
                min = view.range.min,
                max = view.range.max,
                "refresh pass"
            );
            let policy = self.config.unsorted_x;
            if self.config.use_parallel(store.total_samples()) {
                ids.par_iter()
                    .map(|&id| (id, prepare(&store, id, &view, policy)))
                    .collect::<Vec<_>>()
            } else {
                ids.iter()
                    .map(|&id| (id, prepare(&store, id, &view, policy)))
                    .collect::<Vec<_>>()
            }
        };

        // The store lock is released before the surface can call back into us.
        let mut report = RefreshReport {
            view: Some(view),
            ..Default::default()
        };
        for (id, result) in reduced {
            match result.and_then(|data| self.surface.set_series_data(id, data)) {
                Ok(()) => report.refreshed.push(id),
                Err(error) => {
                    warn!(series = id.0, %error, "series left unchanged");
                    report.failures.push(SeriesFailure { series: id, error });
                }
            }
        }

        self.stats.lock().passes += 1;
        *self.last_report.lock() = Some(report.clone());
        report
    }

    pub fn state(&self) -> RefreshState {
        *self.state.lock()
    }

    pub fn stats(&self) -> RefreshStats {
        *self.stats.lock()
    }

    /// Report of the most recent refresh attempt, including callback-driven and abandoned ones.
    pub fn take_last_report(&self) -> Option<RefreshReport> {
        self.last_report.lock().take()
    }

    pub fn axes(&self) -> &LinkedAxes {
        &self.axes
    }

    pub fn config(&self) -> &DecimationConfig {
        &self.config
    }

    pub fn store(&self) -> RwLockReadGuard<'_, SeriesStore> {
        self.store.read()
    }

    /// Mutates the store (e.g. to register more series), then refreshes.
    pub fn update_store<R>(&self, f: impl FnOnce(&mut SeriesStore) -> R) -> Result<(R, RefreshOutcome)> {
        let value = f(&mut self.store.write());
        let outcome = self.refresh_now()?;
        Ok((value, outcome))
    }
}

impl Drop for RefreshController {
    fn drop(&mut self) {
        for handle in self.subscriptions.get_mut().drain(..) {
            self.surface.unsubscribe(handle);
        }
    }
}

fn prepare(
    store: &SeriesStore,
    id: SeriesId,
    view: &ViewState,
    policy: UnsortedXPolicy,
) -> Result<ReducedSeries> {
    let series = store.lookup(id)?;
    let needs_reduction = series.len() > view.pixel_width.saturating_mul(2);
    if needs_reduction && !series.x_sorted {
        match policy {
            UnsortedXPolicy::Reduce => {}
            UnsortedXPolicy::Reject => {
                return Err(DecimateError::unsupported(format!(
                    "series {} has unsorted x and cannot be reduced by pixel column",
                    id.0
                )))
            }
            UnsortedXPolicy::PassThrough => return Ok(ReducedSeries::copied(series.x, series.y)),
        }
    }
    let reduced = reduce_view(&series, view)?;
    trace!(series = id.0, input = series.len(), output = reduced.len(), "reduced");
    Ok(reduced)
}
