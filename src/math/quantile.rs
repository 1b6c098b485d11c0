//! Five-number summaries for box plots.

use serde::{Deserialize, Serialize};

/// Whisker reach in multiples of the interquartile range.
const WHISKER_IQR: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub count: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Smallest value within `q1 - 1.5 IQR`.
    pub lower_whisker: f64,
    /// Largest value within `q3 + 1.5 IQR`.
    pub upper_whisker: f64,
    /// Values beyond the whiskers, ascending.
    pub outliers: Vec<f64>,
}

/// Quantile `q` of an ascending slice, linearly interpolated between ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Box-plot summary of `values` (non-finite values are ignored).
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile_sorted(&sorted, 0.25)?;
    let median = quantile_sorted(&sorted, 0.5)?;
    let q3 = quantile_sorted(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let lo_fence = q1 - WHISKER_IQR * iqr;
    let hi_fence = q3 + WHISKER_IQR * iqr;

    let inside = sorted.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
    let lower_whisker = inside.clone().fold(f64::INFINITY, f64::min);
    let upper_whisker = inside.fold(f64::NEG_INFINITY, f64::max);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < lo_fence || *v > hi_fence)
        .collect();

    Some(BoxStats {
        count: sorted.len(),
        q1,
        median,
        q3,
        lower_whisker,
        upper_whisker,
        outliers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantiles_interpolate_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&v, 0.0), Some(1.0));
        assert_eq!(quantile_sorted(&v, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&v, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&v, 1.0), Some(4.0));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn box_stats_flags_outliers() {
        let stats = box_stats(&[5.0, 1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(stats.count, 6);
        assert_eq!(stats.median, 3.5);
        assert_eq!(stats.lower_whisker, 1.0);
        assert_eq!(stats.upper_whisker, 5.0);
        assert_eq!(stats.outliers, vec![100.0]);
    }

    #[test]
    fn single_value_collapses_the_box() {
        let stats = box_stats(&[7.0]).unwrap();
        assert_eq!((stats.q1, stats.median, stats.q3), (7.0, 7.0, 7.0));
        assert_eq!((stats.lower_whisker, stats.upper_whisker), (7.0, 7.0));
        assert!(stats.outliers.is_empty());
        assert!(box_stats(&[]).is_none());
    }
}
