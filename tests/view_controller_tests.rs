use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use pixel_decimate::decimation::{bin_index, reduce};
use pixel_decimate::rendering::ViewCallback;
use pixel_decimate::{
    AxesHandle, DecimateError, DecimationConfig, LinkedAxes, MemorySurface, ReducedSeries,
    RefreshController, RefreshState, RenderingSurface, Result, SeriesId, SeriesStore, StyleTag,
    SubscriptionHandle, UnsortedXPolicy, ViewState, XRange,
};

fn sine_store(n: usize) -> SeriesStore {
    let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let y1: Vec<f64> = x.iter().map(|v| (v / 100.0).sin()).collect();
    let y2: Vec<f64> = x.iter().map(|v| (v / 7.0).cos()).collect();
    let mut store = SeriesStore::new();
    store
        .add_shared(x, vec![(y1, StyleTag::from("-")), (y2, StyleTag::from("--"))])
        .unwrap();
    store
}

/// Surface whose data pushes can be made to fail or to resize the axes
/// synchronously, like a toolkit re-laying out after new data arrives.
struct ScriptedSurface {
    inner: MemorySurface,
    axes: AxesHandle,
    fail_series: Mutex<Option<SeriesId>>,
    resize_on_push: Mutex<Option<usize>>,
    panic_on_push: AtomicBool,
    fail_queries: AtomicBool,
}

impl ScriptedSurface {
    fn new(pixel_width: usize) -> Arc<Self> {
        let inner = MemorySurface::new();
        let axes = inner.add_axes(pixel_width, XRange::full());
        Arc::new(Self {
            inner,
            axes,
            fail_series: Mutex::new(None),
            resize_on_push: Mutex::new(None),
            panic_on_push: AtomicBool::new(false),
            fail_queries: AtomicBool::new(false),
        })
    }
}

impl RenderingSurface for ScriptedSurface {
    fn pixel_width(&self, axes: AxesHandle) -> Result<usize> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(DecimateError::upstream("axes detached"));
        }
        self.inner.pixel_width(axes)
    }

    fn visible_range(&self, axes: AxesHandle) -> Result<XRange> {
        self.inner.visible_range(axes)
    }

    fn set_series_data(&self, series: SeriesId, data: ReducedSeries) -> Result<()> {
        if self.panic_on_push.load(Ordering::SeqCst) {
            panic!("surface blew up");
        }
        if *self.fail_series.lock() == Some(series) {
            return Err(DecimateError::upstream("device lost"));
        }
        self.inner.set_series_data(series, data)?;
        let resize = self.resize_on_push.lock().take();
        if let Some(width) = resize {
            self.inner.resize(self.axes, width)?;
        }
        Ok(())
    }

    fn subscribe(
        &self,
        axes: AxesHandle,
        on_range_changed: ViewCallback,
        on_size_changed: ViewCallback,
    ) -> Result<SubscriptionHandle> {
        self.inner.subscribe(axes, on_range_changed, on_size_changed)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.inner.unsubscribe(handle)
    }
}

#[test]
fn test_construction_populates_first_view() {
    let surface = Arc::new(MemorySurface::new());
    let axes = surface.add_axes(200, XRange::full());
    let controller =
        RefreshController::new(sine_store(100_000), surface.clone(), axes, DecimationConfig::default())
            .unwrap();

    assert_eq!(controller.state(), RefreshState::Idle);
    assert_eq!(controller.stats().passes, 1);
    let report = controller.take_last_report().unwrap();
    assert!(report.is_clean());
    assert_eq!(report.refreshed, vec![SeriesId(0), SeriesId(1)]);
    for id in [SeriesId(0), SeriesId(1)] {
        let shown = surface.displayed(id).unwrap();
        assert!(shown.len() <= 402);
    }
}

#[test]
fn test_resize_and_zoom_rederive_view() {
    let surface = Arc::new(MemorySurface::new());
    let axes = surface.add_axes(100, XRange::full());
    let controller =
        RefreshController::new(sine_store(50_000), surface.clone(), axes, DecimationConfig::sequential())
            .unwrap();

    surface.resize(axes, 40).unwrap();
    assert_eq!(controller.stats().passes, 2);
    assert!(surface.displayed(SeriesId(0)).unwrap().len() <= 82);

    surface.set_visible_range(axes, XRange::new(1000.0, 1010.0)).unwrap();
    assert_eq!(controller.stats().passes, 3);
    // 11 samples in view, one per column, plus one neighbour beyond each edge.
    let shown = surface.displayed(SeriesId(1)).unwrap();
    assert_eq!(shown.x.first(), Some(&999.0));
    assert_eq!(shown.x.last(), Some(&1011.0));
    assert_eq!(shown.len(), 13);
}

#[test]
fn test_view_change_while_busy_is_dropped() {
    // The surface resizes itself while the first pass pushes data.
    let surface = ScriptedSurface::new(300);
    *surface.resize_on_push.lock() = Some(50);
    let controller =
        RefreshController::new(sine_store(100_000), surface.clone(), surface.axes, DecimationConfig::sequential())
            .unwrap();

    let stats = controller.stats();
    assert_eq!(stats.passes, 1);
    assert_eq!(stats.dropped, 1);
    assert_eq!(controller.state(), RefreshState::Idle);
    // Still reduced for the width sampled when the pass began.
    let stale = surface.inner.displayed(SeriesId(1)).unwrap();
    assert!(stale.len() > 102);

    // The settled state is observed by the next notification.
    surface.inner.resize(surface.axes, 50).unwrap();
    assert_eq!(controller.stats().passes, 2);
    assert!(surface.inner.displayed(SeriesId(1)).unwrap().len() <= 102);
}

#[test]
fn test_explicit_event_while_busy_is_dropped() {
    let surface = ScriptedSurface::new(64);
    let controller =
        RefreshController::new(sine_store(10_000), surface.clone(), surface.axes, DecimationConfig::sequential())
            .unwrap();

    let reentrant = Arc::new(Mutex::new(None));
    {
        let controller = controller.clone();
        let reentrant = reentrant.clone();
        let callback: ViewCallback = Arc::new(move || {
            let outcome = controller.handle_view_changed(ViewState::new(XRange::full(), 10));
            reentrant.lock().get_or_insert(outcome);
        });
        surface
            .inner
            .subscribe(surface.axes, callback.clone(), callback)
            .unwrap();
    }

    // Fires both the controller's own callback and the probe above from inside the pass.
    *surface.resize_on_push.lock() = Some(32);
    let outcome = controller.refresh_now().unwrap();
    assert!(!outcome.is_dropped());
    let probe = reentrant.lock().take().unwrap().unwrap();
    assert!(probe.is_dropped());

    let outcome = controller
        .handle_view_changed(ViewState::new(XRange::full(), 10))
        .unwrap();
    assert_eq!(outcome.report().unwrap().refreshed.len(), 2);
    assert!(surface.inner.displayed(SeriesId(0)).unwrap().len() <= 22);
}

#[test]
fn test_failed_series_keeps_previous_data() {
    let surface = ScriptedSurface::new(100);
    let controller =
        RefreshController::new(sine_store(20_000), surface.clone(), surface.axes, DecimationConfig::sequential())
            .unwrap();
    let before = surface.inner.displayed(SeriesId(1)).unwrap();

    *surface.fail_series.lock() = Some(SeriesId(1));
    surface.inner.resize(surface.axes, 30).unwrap();

    let report = controller.take_last_report().unwrap();
    assert_eq!(report.refreshed, vec![SeriesId(0)]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].series, SeriesId(1));
    assert!(matches!(
        report.failures[0].error,
        DecimateError::UpstreamRenderingFailure(_)
    ));
    assert_eq!(surface.inner.displayed(SeriesId(1)).unwrap(), before);
    assert!(surface.inner.displayed(SeriesId(0)).unwrap().len() <= 62);

    // A failed pass does not block the next one.
    *surface.fail_series.lock() = None;
    surface.inner.resize(surface.axes, 20).unwrap();
    assert!(controller.take_last_report().unwrap().is_clean());
    assert!(surface.inner.displayed(SeriesId(1)).unwrap().len() <= 42);
}

#[test]
fn test_failed_view_query_is_kept_in_last_report() {
    let surface = ScriptedSurface::new(100);
    let controller =
        RefreshController::new(sine_store(20_000), surface.clone(), surface.axes, DecimationConfig::sequential())
            .unwrap();
    let before = surface.inner.displayed(SeriesId(0)).unwrap();

    // Raised from inside a callback, so only the report can carry it.
    surface.fail_queries.store(true, Ordering::SeqCst);
    surface.inner.resize(surface.axes, 40).unwrap();

    let report = controller.take_last_report().unwrap();
    assert!(!report.is_clean());
    assert!(matches!(report.error, Some(DecimateError::UpstreamRenderingFailure(_))));
    assert_eq!(report.view, None);
    assert!(report.refreshed.is_empty());
    assert_eq!(controller.stats().passes, 1);
    assert_eq!(controller.state(), RefreshState::Idle);
    assert_eq!(surface.inner.displayed(SeriesId(0)).unwrap(), before);

    surface.fail_queries.store(false, Ordering::SeqCst);
    surface.inner.resize(surface.axes, 40).unwrap();
    let report = controller.take_last_report().unwrap();
    assert!(report.is_clean());
    assert_eq!(report.error, None);
    assert_eq!(controller.stats().passes, 2);
}

#[test]
fn test_panicking_surface_releases_busy_flag() {
    let surface = ScriptedSurface::new(100);
    let controller =
        RefreshController::new(sine_store(5_000), surface.clone(), surface.axes, DecimationConfig::sequential())
            .unwrap();

    surface.panic_on_push.store(true, Ordering::SeqCst);
    let result = catch_unwind(AssertUnwindSafe(|| controller.refresh_now()));
    assert!(result.is_err());
    assert_eq!(controller.state(), RefreshState::Idle);

    surface.panic_on_push.store(false, Ordering::SeqCst);
    let outcome = controller.refresh_now().unwrap();
    assert!(outcome.report().unwrap().is_clean());
}

#[test]
fn test_unsorted_x_policy() {
    let x: Vec<f64> = (0..1000).map(|i| ((i * 7919) % 1000) as f64).collect();
    let y: Vec<f64> = (0..1000).map(|i| i as f64).collect();
    let unsorted_store = || {
        let mut store = SeriesStore::new();
        store.add_xy(x.clone(), y.clone(), StyleTag::default()).unwrap();
        store
    };

    // Reduced by default, columns left to right.
    let surface = Arc::new(MemorySurface::new());
    let axes = surface.add_axes(100, XRange::full());
    let controller =
        RefreshController::new(unsorted_store(), surface.clone(), axes, DecimationConfig::sequential()).unwrap();
    assert_eq!(controller.config().unsorted_x, UnsortedXPolicy::Reduce);
    assert!(controller.take_last_report().unwrap().is_clean());
    let shown = surface.displayed(SeriesId(0)).unwrap();
    assert!(shown.len() <= 202);
    let columns: Vec<usize> = shown.x.iter().map(|&px| bin_index(px, 0.0, 999.0, 100)).collect();
    assert!(columns.windows(2).all(|w| w[0] <= w[1]));
    for (px, py) in shown.iter() {
        assert_eq!(px, x[py as usize]);
    }

    let surface = Arc::new(MemorySurface::new());
    let axes = surface.add_axes(100, XRange::full());
    let config = DecimationConfig::sequential().with_unsorted_x(UnsortedXPolicy::Reject);
    let controller = RefreshController::new(unsorted_store(), surface.clone(), axes, config).unwrap();
    let report = controller.take_last_report().unwrap();
    assert!(matches!(
        report.failures[0].error,
        DecimateError::UnsupportedConfiguration(_)
    ));
    assert!(surface.displayed(SeriesId(0)).is_none());

    let surface = Arc::new(MemorySurface::new());
    let axes = surface.add_axes(100, XRange::full());
    let config = DecimationConfig::sequential().with_unsorted_x(UnsortedXPolicy::PassThrough);
    let _controller = RefreshController::new(unsorted_store(), surface.clone(), axes, config).unwrap();
    let shown = surface.displayed(SeriesId(0)).unwrap();
    assert_eq!(shown.x, x);
    assert_eq!(shown.y, y);
}

#[test]
fn test_linked_axes_sample_primary_width() {
    let surface = Arc::new(MemorySurface::new());
    let primary = surface.add_axes(50, XRange::full());
    let secondary = surface.add_axes(400, XRange::full());
    let axes = LinkedAxes::single(primary).with_linked(secondary);
    let controller =
        RefreshController::new(sine_store(30_000), surface.clone(), axes, DecimationConfig::sequential())
            .unwrap();
    assert_eq!(surface.subscription_count(), 2);
    assert_eq!(controller.axes().iter().collect::<Vec<_>>(), vec![primary, secondary]);
    assert!(surface.displayed(SeriesId(0)).unwrap().len() <= 102);

    surface.resize(secondary, 800).unwrap();
    assert_eq!(controller.stats().passes, 2);
    assert!(surface.displayed(SeriesId(0)).unwrap().len() <= 102);

    surface.resize(primary, 10).unwrap();
    assert_eq!(controller.stats().passes, 3);
    assert!(surface.displayed(SeriesId(0)).unwrap().len() <= 22);

    drop(controller);
    assert_eq!(surface.subscription_count(), 0);
    // No controller left to notify.
    surface.resize(primary, 20).unwrap();
}

#[test]
fn test_invalid_explicit_view_is_rejected() {
    let surface = Arc::new(MemorySurface::new());
    let axes = surface.add_axes(50, XRange::full());
    let controller =
        RefreshController::new(sine_store(1000), surface.clone(), axes, DecimationConfig::sequential())
            .unwrap();
    let err = controller
        .handle_view_changed(ViewState::new(XRange::full(), 0))
        .unwrap_err();
    assert!(matches!(err, DecimateError::InvalidInput(_)));
    assert_eq!(controller.take_last_report().unwrap().error, Some(err));
    assert_eq!(controller.state(), RefreshState::Idle);
}

#[test]
fn test_parallel_pass_matches_direct_reduction() {
    let surface = Arc::new(MemorySurface::new());
    let axes = surface.add_axes(500, XRange::new(2_000.0, 150_000.0));
    let config = DecimationConfig {
        parallel_min_points: 0,
        ..DecimationConfig::default()
    };
    let controller = RefreshController::new(sine_store(200_000), surface.clone(), axes, config).unwrap();

    let store = controller.store();
    for series in store.iter() {
        let expected = reduce(series.x, series.y, 500, XRange::new(2_000.0, 150_000.0)).unwrap();
        assert!(surface.displayed(series.id).unwrap().bit_eq(&expected));
    }
}

#[test]
fn test_series_added_later_are_refreshed() {
    let surface = Arc::new(MemorySurface::new());
    let axes = surface.add_axes(80, XRange::full());
    let controller =
        RefreshController::new(SeriesStore::new(), surface.clone(), axes, DecimationConfig::sequential())
            .unwrap();
    assert_eq!(surface.push_count(), 0);

    let (id, outcome) = controller
        .update_store(|store| {
            let x: Vec<f64> = (0..5000).map(|i| i as f64).collect();
            let y: Vec<f64> = x.iter().map(|v| v.sqrt()).collect();
            store.add_xy(x, y, StyleTag::from("k")).unwrap()
        })
        .unwrap();
    assert_eq!(outcome.report().unwrap().refreshed, vec![id]);
    assert!(surface.displayed(id).unwrap().len() <= 162);
}

#[test]
fn test_failing_surface_query_fails_construction() {
    let surface = Arc::new(MemorySurface::new());
    let result = RefreshController::new(
        sine_store(100),
        surface,
        AxesHandle(7),
        DecimationConfig::default(),
    );
    assert!(matches!(result, Err(DecimateError::UpstreamRenderingFailure(_))));
}
