//! pixel_decimate: min/max line decimation bounded by screen resolution.
//!
//! A [`RefreshController`] keeps the lines shown on a [`RenderingSurface`]
//! reduced to at most two points per pixel column, re-deriving them whenever
//! the visible x-range or pixel width changes.

pub mod config;
pub mod data_types;
pub mod decimation;
pub mod error;
pub mod parser;
#[cfg(feature = "polars")]
pub mod polars_source;
pub mod rendering;
pub mod view_controller;

pub use config::{DecimationConfig, UnsortedXPolicy};
pub use data_types::{
    BufferId, ReducedSeries, SeriesId, SeriesStore, SeriesView, StyleTag, ViewState, XRange,
};
pub use decimation::{reduce, reduce_many_par, reduce_view};
pub use error::{DecimateError, Result};
pub use parser::{ParsedPlot, PlotArg, PlotSpecParser, SeriesGroup};
pub use rendering::{AxesHandle, LinkedAxes, MemorySurface, RenderingSurface, SubscriptionHandle};
pub use view_controller::{
    RefreshController, RefreshOutcome, RefreshReport, RefreshState, RefreshStats, SeriesFailure,
};
