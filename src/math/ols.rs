//! Ordinary least squares for chart trend lines.
//!
//! The mean-vs-median scatter overlays a straight line
//!
//! ```text
//! y = intercept + slope * x
//! ```
//!
//! fitted over every plotted point. We build the two-column design matrix
//! `[1, x]` and solve it with SVD, which copes with tall systems and with
//! nearly collinear inputs (e.g. all points bunched at one price level).

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Fitted straight line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendLine {
    pub intercept: f64,
    pub slope: f64,
    /// Coefficient of determination over the fitted points.
    pub r_squared: f64,
}

impl TrendLine {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y = a + b x` through `points`.
///
/// Needs at least two distinct x values; otherwise the slope is undefined and
/// the result is `None`.
pub fn fit_line(points: &[(f64, f64)]) -> Option<TrendLine> {
    let pts: Vec<(f64, f64)> = points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if pts.len() < 2 {
        return None;
    }

    let x0 = pts[0].0;
    if pts.iter().all(|(x, _)| (x - x0).abs() < 1e-12) {
        return None;
    }

    let n = pts.len();
    let x = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { pts[i].0 });
    let y = DVector::from_iterator(n, pts.iter().map(|(_, y)| *y));

    let beta = solve_least_squares(&x, &y)?;
    let line = TrendLine {
        intercept: beta[0],
        slope: beta[1],
        r_squared: 0.0,
    };

    let y_mean = y.mean();
    let ss_tot: f64 = pts.iter().map(|(_, y)| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = pts.iter().map(|(x, y)| (y - line.predict(*x)).powi(2)).sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

    Some(TrendLine { r_squared, ..line })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_line_recovers_exact_line() {
        let pts = [(1.0, 0.9), (2.0, 1.8), (4.0, 3.6)];
        let line = fit_line(&pts).unwrap();
        assert!(line.intercept.abs() < 1e-9);
        assert!((line.slope - 0.9).abs() < 1e-9);
        assert!((line.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fit_line_minimizes_squared_error() {
        // Symmetric noise around y = x.
        let pts = [(0.0, 1.0), (0.0, -1.0), (2.0, 3.0), (2.0, 1.0)];
        let line = fit_line(&pts).unwrap();
        assert!(line.intercept.abs() < 1e-9);
        assert!((line.slope - 1.0).abs() < 1e-9);
        assert!(line.r_squared < 1.0);
    }

    #[test]
    fn fit_line_needs_two_distinct_x() {
        assert!(fit_line(&[]).is_none());
        assert!(fit_line(&[(1.0, 2.0)]).is_none());
        assert!(fit_line(&[(1.0, 2.0), (1.0, 3.0)]).is_none());
    }
}
