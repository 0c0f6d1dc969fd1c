//! Deterministic "nice" binning for numeric distributions.
//!
//! Bin policy:
//! * at most [`MAX_BINS`] bins of equal width;
//! * the width is the smallest step of the form `m × 10^k`, `m ∈ {1, 2, 5}`,
//!   for which the step-aligned extent fits in [`MAX_BINS`] bins;
//! * the first edge is `floor(min / step) × step`, the last
//!   `ceil(max / step) × step`;
//! * bins are half-open `[start, end)` except the last, which also includes
//!   its upper edge;
//! * if every value is equal to `v`, there is a single bin `[v, v + 1]`.

use serde::Serialize;

/// Upper bound on the number of bins produced by [`bin_values`].
pub const MAX_BINS: usize = 10;

const STEP_MULTIPLIERS: [f64; 3] = [1.0, 2.0, 5.0];

/// One histogram bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: u64,
}

/// Bin `values` according to the module-level policy.
///
/// Non-finite values are ignored. An empty input gives an empty histogram.
pub fn bin_values(values: &[f64]) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Vec::new();
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return vec![HistogramBin {
            start: min,
            end: min + 1.0,
            count: finite.len() as u64,
        }];
    }

    let Some(layout) = nice_layout(min, max, MAX_BINS) else {
        return vec![HistogramBin {
            start: min,
            end: max.max(min + 1.0),
            count: finite.len() as u64,
        }];
    };

    let mut bins: Vec<HistogramBin> = (0..layout.n_bins)
        .map(|i| HistogramBin {
            start: layout.edge(i),
            end: layout.edge(i + 1),
            count: 0,
        })
        .collect();

    // Assign against the stored edges so a value always lands in the bin
    // whose printed range contains it.
    for v in finite {
        let idx = bins
            .partition_point(|b| b.start <= v)
            .saturating_sub(1)
            .min(bins.len() - 1);
        bins[idx].count += 1;
    }

    bins
}

/// Step-aligned bin layout: edge `i` is `(first + i) × multiplier × 10^exponent`.
#[derive(Debug, Clone, Copy)]
struct Layout {
    multiplier: f64,
    exponent: i32,
    first: f64,
    n_bins: usize,
}

impl Layout {
    /// Edge `i`, computed from integer units so decimal steps stay exact
    /// (`3 / 10` rather than `3 × 0.1`).
    fn edge(&self, i: usize) -> f64 {
        let units = (self.first + i as f64) * self.multiplier;
        if self.exponent < 0 {
            units / 10_f64.powi(-self.exponent)
        } else {
            units * 10_f64.powi(self.exponent)
        }
    }
}

/// Pick the bin width and alignment for a non-degenerate extent.
///
/// Returns `None` when the span is too small or too large to express as a
/// finite step.
fn nice_layout(min: f64, max: f64, max_bins: usize) -> Option<Layout> {
    let raw_step = (max - min) / max_bins as f64;
    if !raw_step.is_normal() {
        return None;
    }
    let start = (raw_step.log10().floor() as i32).saturating_sub(1);

    for exponent in start..=f64::MAX_10_EXP + 1 {
        for multiplier in STEP_MULTIPLIERS {
            let step = multiplier * 10_f64.powi(exponent);
            if !step.is_finite() || step == 0.0 {
                return None;
            }
            let mut layout = Layout {
                multiplier,
                exponent,
                first: (min / step).floor(),
                n_bins: 0,
            };
            let mut last = (max / step).ceil();
            // Division can land one unit off an exact edge.
            if layout.edge(1) <= min {
                layout.first += 1.0;
            }
            if last - layout.first > 1.0 && layout.edge((last - layout.first - 1.0) as usize) >= max
            {
                last -= 1.0;
            }
            let n_bins = (last - layout.first).max(1.0);
            if n_bins <= max_bins as f64 {
                layout.n_bins = n_bins as usize;
                let (lo, hi) = (layout.edge(0), layout.edge(layout.n_bins));
                if !lo.is_finite() || !hi.is_finite() {
                    return None;
                }
                return Some(layout);
            }
        }
    }
    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────
