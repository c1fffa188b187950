use crate::ir::Series;

/// Shared vs independent scaling for a set of series.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleDecision {
    /// Per-series maximum, floored at 1 so it is always a safe denominator.
    pub series_max: Vec<f64>,
    pub shared_max: f64,
    pub min_series_max: f64,
    pub use_separate_scale: bool,
}

impl ScaleDecision {
    /// Maxima for series whose scale mode has already been decided.
    pub fn with_mode(series: &[Series], use_separate_scale: bool) -> Self {
        let (series_max, shared_max, min_series_max) = maxima(series);
        Self {
            series_max,
            shared_max,
            min_series_max,
            use_separate_scale,
        }
    }

    /// Denominator for normalizing values of series `index`.
    pub fn denominator(&self, index: usize) -> f64 {
        if self.use_separate_scale {
            self.own_max(index)
        } else {
            self.shared_max
        }
    }

    pub fn own_max(&self, index: usize) -> f64 {
        self.series_max.get(index).copied().unwrap_or(1.0)
    }

    pub fn ratio(&self) -> f64 {
        self.shared_max / self.min_series_max
    }
}

/// Maximum of a series, never below 1.
pub fn series_max(data: &[f64]) -> f64 {
    data.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max)
        .max(1.0)
}

/// Decide whether series need independent scales: true when there are at least
/// two series and the largest series max exceeds the smallest by more than `ratio`.
pub fn reconcile_scales(series: &[Series], ratio: f64) -> ScaleDecision {
    let (series_max, shared_max, min_series_max) = maxima(series);
    let use_separate_scale = series_max.len() >= 2 && shared_max / min_series_max > ratio;

    tracing::debug!(
        series = series_max.len(),
        shared_max,
        min_series_max,
        use_separate_scale,
        "reconciled series scales"
    );

    ScaleDecision {
        series_max,
        shared_max,
        min_series_max,
        use_separate_scale,
    }
}

/// Per-series maxima, their overall max, and the smallest positive one
/// (1 with fewer than two series).
fn maxima(series: &[Series]) -> (Vec<f64>, f64, f64) {
    let per_series: Vec<f64> = series.iter().map(|s| series_max(&s.data)).collect();

    let shared_max = per_series.iter().copied().fold(1.0_f64, f64::max);

    let min_series_max = if per_series.len() < 2 {
        1.0
    } else {
        per_series
            .iter()
            .copied()
            .filter(|m| *m > 0.0)
            .reduce(f64::min)
            .unwrap_or(1.0)
    };

    (per_series, shared_max, min_series_max)
}
