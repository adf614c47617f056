use rayon::prelude::*;

use super::common::{bin_index, BinExtrema, EdgeScan};
use crate::data_types::{ReducedSeries, SeriesId, SeriesStore, SeriesView, ViewState, XRange};
use crate::error::{DecimateError, Result};

/// Reduces `(x, y)` to at most two points per pixel column of `range`.
///
/// Series of at most `2 * pixel_width` samples are returned unchanged. Otherwise
/// every column keeps the samples holding its minimum and maximum y in original
/// order, all-NaN columns collapse to a single NaN marker, and the nearest
/// sample beyond each viewport edge is kept so the line does not stop short.
/// The result has at most `min(x.len(), 2 * pixel_width + 2)` points.
pub fn reduce(x: &[f64], y: &[f64], pixel_width: usize, range: XRange) -> Result<ReducedSeries> {
    if x.len() != y.len() {
        return Err(DecimateError::invalid_input(format!(
            "x has {} samples but y has {}",
            x.len(),
            y.len()
        )));
    }
    if pixel_width == 0 {
        return Err(DecimateError::invalid_input("pixel width must be positive"));
    }
    range.validate()?;

    if x.len() <= pixel_width.saturating_mul(2) {
        return Ok(ReducedSeries::copied(x, y));
    }

    let edges = EdgeScan::scan(x, range);
    let budget = x.len().min(pixel_width * 2 + 2);
    let mut output = ReducedSeries::with_capacity(budget);

    let Some((lo, hi)) = edges.extent(x) else {
        // Nothing visible: keep only the samples a line would cross the viewport between.
        push_anchor(&mut output, x, y, edges.left_outside);
        push_anchor(&mut output, x, y, edges.right_outside);
        return Ok(output);
    };
    let span = hi - lo;

    let mut bins = vec![BinExtrema::default(); pixel_width];
    for (i, (&xi, &yi)) in x.iter().zip(y.iter()).enumerate() {
        if !xi.is_finite() || !range.contains(xi) {
            continue;
        }
        bins[bin_index(xi, lo, span, pixel_width)].observe(i, yi);
    }

    // In-range anchors are only needed when nothing lies beyond that edge.
    let inside_anchors = [
        if edges.left_outside.is_none() { edges.first_inside } else { None },
        if edges.right_outside.is_none() { edges.last_inside } else { None },
    ];

    push_anchor(&mut output, x, y, edges.left_outside);
    for (b, bin) in bins.iter().enumerate() {
        if bin.is_empty() {
            continue;
        }
        if bin.is_gap_only() {
            if let Some(first) = bin.first_index() {
                output.push(x[first], f64::NAN);
            }
            continue;
        }

        let (extrema, count) = bin.ordered_indices();
        let mut picked = [0usize; 4];
        picked[..count].copy_from_slice(&extrema[..count]);
        let mut len = count;
        for anchor in inside_anchors.into_iter().flatten() {
            if y[anchor].is_nan() || bin_index(x[anchor], lo, span, pixel_width) != b {
                continue;
            }
            if !picked[..len].contains(&anchor) {
                picked[len] = anchor;
                len += 1;
            }
        }
        picked[..len].sort_unstable();
        for &i in &picked[..len] {
            output.push(x[i], y[i]);
        }
    }
    push_anchor(&mut output, x, y, edges.right_outside);

    debug_assert!(output.len() <= budget);
    Ok(output)
}

#[inline]
fn push_anchor(output: &mut ReducedSeries, x: &[f64], y: &[f64], anchor: Option<usize>) {
    if let Some(i) = anchor {
        if !y[i].is_nan() {
            output.push(x[i], y[i]);
        }
    }
}

/// Reduces one stored series for a view.
pub fn reduce_view(series: &SeriesView<'_>, view: &ViewState) -> Result<ReducedSeries> {
    reduce(series.x, series.y, view.pixel_width, view.range)
}

/// Reduces several series of one store against the same view on the rayon pool.
///
/// Results come back in the order of `ids`. Series sharing an x buffer get
/// identical column boundaries since those depend on x alone.
pub fn reduce_many_par(
    store: &SeriesStore,
    ids: &[SeriesId],
    view: &ViewState,
) -> Vec<(SeriesId, Result<ReducedSeries>)> {
    ids.par_iter()
        .map(|&id| {
            let result = store
                .lookup(id)
                .and_then(|series| reduce_view(&series, view));
            (id, result)
        })
        .collect()
}
