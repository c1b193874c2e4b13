// src/processing/mod.rs
//! Signal processing pipeline for cyclic-loading test records

pub mod extrema;
pub mod features;
pub mod preprocess;
pub mod segmentation;
pub mod skeleton;
pub mod stiffness;

pub use extrema::*;
pub use features::*;
pub use preprocess::*;
pub use segmentation::*;
pub use skeleton::*;
pub use stiffness::*;

/// Least-squares line fit of `ys` against `xs`.
///
/// Returns `(slope, intercept)`, or `None` when fewer than 2 points are
/// given or the x values have no spread.
pub(crate) fn least_squares_line(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean_x = xs[..n].iter().sum::<f64>() / nf;
    let mean_y = ys[..n].iter().sum::<f64>() / nf;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for i in 0..n {
        let dx = xs[i] - mean_x;
        sxx += dx * dx;
        sxy += dx * (ys[i] - mean_y);
    }
    if sxx.abs() < f64::EPSILON {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_fit_recovers_exact_line() {
        let xs: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.5 * x - 4.0).collect();
        let (slope, intercept) = least_squares_line(&xs, &ys).unwrap();
        assert!((slope - 2.5).abs() < 1e-12);
        assert!((intercept + 4.0).abs() < 1e-9);
    }

    #[test]
    fn line_fit_rejects_degenerate_x() {
        assert!(least_squares_line(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(least_squares_line(&[1.0], &[1.0]).is_none());
    }
}
