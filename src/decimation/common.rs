use crate::data_types::XRange;

/// Running extrema of one pixel column.
///
/// Indices refer to positions in the original series. NaN values are counted
/// as present (so an all-NaN column can be told apart from an empty one) but
/// never become the min or max.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BinExtrema {
    first: Option<usize>,
    min: Option<(usize, f64)>,
    max: Option<(usize, f64)>,
}

impl BinExtrema {
    /// Feeds the sample at `idx`. Ties keep the earliest index.
    #[inline(always)]
    pub fn observe(&mut self, idx: usize, y: f64) {
        if self.first.is_none() {
            self.first = Some(idx);
        }
        if y.is_nan() {
            return;
        }
        match self.min {
            Some((_, m)) if y >= m => {}
            _ => self.min = Some((idx, y)),
        }
        match self.max {
            Some((_, m)) if y <= m => {}
            _ => self.max = Some((idx, y)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    /// Samples fell into this column but every one of them was NaN.
    pub fn is_gap_only(&self) -> bool {
        self.first.is_some() && self.min.is_none()
    }

    /// Index of the earliest sample seen, NaN or not.
    pub fn first_index(&self) -> Option<usize> {
        self.first
    }

    /// Min and max indices in original order, deduplicated.
    pub fn ordered_indices(&self) -> ([usize; 2], usize) {
        match (self.min, self.max) {
            (Some((lo, _)), Some((hi, _))) if lo == hi => ([lo, 0], 1),
            (Some((lo, _)), Some((hi, _))) => {
                if lo < hi {
                    ([lo, hi], 2)
                } else {
                    ([hi, lo], 2)
                }
            }
            _ => ([0, 0], 0),
        }
    }
}

/// Maps `x` in `[lo, lo + span]` to one of `width` equal-width columns.
#[inline(always)]
pub fn bin_index(x: f64, lo: f64, span: f64, width: usize) -> usize {
    if span <= 0.0 {
        return 0;
    }
    let pos = ((x - lo) / span * width as f64).floor();
    if pos <= 0.0 {
        0
    } else {
        (pos as usize).min(width - 1)
    }
}

/// Result of the first scan: where the in-range data lies and which samples
/// anchor the line at each viewport edge.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EdgeScan {
    /// In-range sample with the least x (earliest on ties).
    pub first_inside: Option<usize>,
    /// In-range sample with the greatest x (latest on ties).
    pub last_inside: Option<usize>,
    /// Greatest x strictly left of the range (latest on ties).
    pub left_outside: Option<usize>,
    /// Least x strictly right of the range (earliest on ties).
    pub right_outside: Option<usize>,
}

impl EdgeScan {
    pub fn scan(x: &[f64], range: XRange) -> Self {
        let mut scan = Self::default();
        for (i, &xi) in x.iter().enumerate() {
            if !xi.is_finite() {
                continue;
            }
            if xi < range.min {
                if scan.left_outside.map_or(true, |j| xi >= x[j]) {
                    scan.left_outside = Some(i);
                }
            } else if xi > range.max {
                if scan.right_outside.map_or(true, |j| xi < x[j]) {
                    scan.right_outside = Some(i);
                }
            } else {
                if scan.first_inside.map_or(true, |j| xi < x[j]) {
                    scan.first_inside = Some(i);
                }
                if scan.last_inside.map_or(true, |j| xi >= x[j]) {
                    scan.last_inside = Some(i);
                }
            }
        }
        scan
    }

    /// Finite extent of the in-range samples.
    pub fn extent(&self, x: &[f64]) -> Option<(f64, f64)> {
        Some((x[self.first_inside?], x[self.last_inside?]))
    }

    /// Anchor kept at the left viewport edge.
    pub fn left_anchor(&self) -> Option<usize> {
        self.left_outside.or(self.first_inside)
    }

    /// Anchor kept at the right viewport edge.
    pub fn right_anchor(&self) -> Option<usize> {
        self.right_outside.or(self.last_inside)
    }
}
