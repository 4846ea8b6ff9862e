//! Adaptive classification of per-region impact for map legends.
//!
//! Impact values are heavily skewed: a handful of regions near the shock
//! origin dwarf everything else. Breaks are therefore computed on the
//! strictly positive values below an outlier cutoff, on a logarithmic
//! scale when there is enough variety and on a linear scale otherwise.
//!
//! Edges always start at zero, the true maximum is always inside the top
//! bin, and edges are strictly increasing. Assignment is right-closed with
//! the lowest edge included, so every value lands in a class in
//! `0..class_count`.

use ripple_types::{BinningMode, ClassBreaks, Metric};

use crate::error::EngineError;

/// Default number of classes.
pub const DEFAULT_CLASS_COUNT: u8 = 5;

/// Default percentile above which values are treated as outliers.
pub const DEFAULT_OUTLIER_PERCENTILE: f64 = 99.0;

/// Computes class breaks and assigns values to classes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactClassifier {
    class_count: u8,
    outlier_percentile: f64,
}

impl Default for ImpactClassifier {
    fn default() -> Self {
        Self {
            class_count: DEFAULT_CLASS_COUNT,
            outlier_percentile: DEFAULT_OUTLIER_PERCENTILE,
        }
    }
}

impl ImpactClassifier {
    /// Create a classifier with `class_count` classes.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidParameter`] if `class_count` is zero.
    pub fn new(class_count: u8) -> Result<Self, EngineError> {
        if class_count == 0 {
            return Err(EngineError::InvalidParameter {
                name: "class_count",
                reason: String::from("at least one class is required"),
            });
        }
        Ok(Self {
            class_count,
            outlier_percentile: DEFAULT_OUTLIER_PERCENTILE,
        })
    }

    /// Replace the outlier percentile.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidParameter`] unless
    /// `0 < percentile <= 100`.
    pub fn with_outlier_percentile(mut self, percentile: f64) -> Result<Self, EngineError> {
        if !percentile.is_finite() || percentile <= 0.0 || percentile > 100.0 {
            return Err(EngineError::InvalidParameter {
                name: "outlier_percentile",
                reason: format!("must be in (0, 100], got {percentile}"),
            });
        }
        self.outlier_percentile = percentile;
        Ok(self)
    }

    /// Number of classes.
    pub const fn class_count(&self) -> u8 {
        self.class_count
    }

    /// Compute class breaks for one metric over a per-region series.
    pub fn breaks(&self, metric: Metric, values: &[f64]) -> ClassBreaks {
        let mut positive: Vec<f64> = values
            .iter()
            .copied()
            .filter(|v| v.is_finite() && *v > 0.0)
            .collect();
        positive.sort_by(f64::total_cmp);

        let Some(true_max) = positive.last().copied() else {
            return ClassBreaks {
                metric,
                mode: BinningMode::Empty,
                class_count: self.class_count,
                edges: vec![0.0],
            };
        };

        let cutoff = percentile(&positive, self.outlier_percentile);
        let mut kept: Vec<f64> = positive.into_iter().filter(|v| *v <= cutoff).collect();
        kept.dedup_by(|a, b| a.total_cmp(b).is_eq());

        let (low, high) = match (kept.first(), kept.last()) {
            (Some(low), Some(high)) => (*low, *high),
            _ => (true_max, true_max),
        };
        let points = usize::from(self.class_count);
        let mode = if kept.len() < points || kept.len() < 2 {
            BinningMode::Linear
        } else {
            BinningMode::Logarithmic
        };

        let mut edges = Vec::with_capacity(points.saturating_add(1));
        edges.push(0.0);
        match mode {
            BinningMode::Logarithmic => {
                edges.extend(spaced(low.ln(), high.ln(), points).into_iter().map(f64::exp));
            }
            BinningMode::Linear | BinningMode::Empty => edges.extend(spaced(low, high, points)),
        }
        if let Some(top) = edges.last_mut() {
            *top = top.max(true_max);
        }

        let mut increasing: Vec<f64> = Vec::with_capacity(edges.len());
        for edge in edges {
            if increasing.last().is_none_or(|previous| edge > *previous) {
                increasing.push(edge);
            }
        }

        ClassBreaks {
            metric,
            mode,
            class_count: self.class_count,
            edges: increasing,
        }
    }

    /// Class of `value` under `breaks`, always below the class count.
    ///
    /// Non-finite values are class 0. Values outside the edges are clamped
    /// to the first or last class.
    pub fn classify(&self, breaks: &ClassBreaks, value: f64) -> u8 {
        if !value.is_finite() {
            return 0;
        }
        let upper_edges = breaks.edges.get(1..).unwrap_or_default();
        let last_bin = upper_edges.len().saturating_sub(1);
        let bin = upper_edges
            .iter()
            .position(|edge| value <= *edge)
            .unwrap_or(last_bin);
        let top_class = self.class_count.saturating_sub(1);
        u8::try_from(bin).map_or(top_class, |class| class.min(top_class))
    }

    /// Compute breaks for `values` and classify each of them.
    pub fn assign(&self, metric: Metric, values: &[f64]) -> (ClassBreaks, Vec<u8>) {
        let breaks = self.breaks(metric, values);
        let classes = values.iter().map(|v| self.classify(&breaks, *v)).collect();
        (breaks, classes)
    }
}

/// Linearly interpolated percentile of an ascending, non-empty sample.
///
/// Returns zero for an empty sample.
pub fn percentile(sorted: &[f64], percentile: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return 0.0;
    };
    let rank = (percentile / 100.0).clamp(0.0, 1.0) * usize_to_f64(last);
    let lower = f64_to_index(rank.floor());
    let upper = f64_to_index(rank.ceil());
    let low = sorted.get(lower).copied().unwrap_or(0.0);
    let high = sorted.get(upper).copied().unwrap_or(low);
    (high - low).mul_add(rank - rank.floor(), low)
}

/// `count` evenly spaced points from `start` to `end` inclusive.
fn spaced(start: f64, end: f64, count: usize) -> Vec<f64> {
    let Some(steps) = count.checked_sub(1).filter(|s| *s > 0) else {
        return vec![end];
    };
    let step = (end - start) / usize_to_f64(steps);
    (0..count)
        .map(|i| step.mul_add(usize_to_f64(i), start))
        .collect()
}

#[allow(clippy::cast_precision_loss)]
const fn usize_to_f64(value: usize) -> f64 {
    value as f64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn f64_to_index(value: f64) -> usize {
    if value.is_finite() && value > 0.0 {
        value as usize
    } else {
        0
    }
}
