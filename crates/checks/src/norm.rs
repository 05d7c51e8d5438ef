//! Distances between equally shaped arrays.
//!
//! All functions panic if the shapes differ; callers validate shapes first.

use ndarray::{ArrayView1, ArrayView2, Zip};

/// Euclidean norm of `a - b`.
pub(crate) fn l2_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    Zip::from(a)
        .and(b)
        .fold(0.0, |acc, x, y| acc + (x - y).powi(2))
        .sqrt()
}

/// Largest absolute component of `a - b`.
pub(crate) fn max_abs_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    Zip::from(a)
        .and(b)
        .fold(0.0, |acc, x, y| nan_max(acc, (x - y).abs()))
}

/// Largest absolute entry of `a - b`.
pub(crate) fn max_abs_distance_2d(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> f64 {
    Zip::from(a)
        .and(b)
        .fold(0.0, |acc, x, y| nan_max(acc, (x - y).abs()))
}

/// Like `f64::max`, but a NaN on either side wins.
fn nan_max(acc: f64, value: f64) -> f64 {
    if acc.is_nan() || value.is_nan() {
        f64::NAN
    } else {
        acc.max(value)
    }
}
