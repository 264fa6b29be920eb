//! Epsilon-tolerant scalar comparisons.
//!
//! All geometric classification in kdray goes through these helpers so the
//! tolerance is applied the same way everywhere.

/// Absolute tolerance for scalar comparisons.
pub const EPS: f64 = 1e-9;

/// `|a - b| < EPS`
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

/// `a` is less than `b` by more than `EPS`.
#[inline]
pub fn less(a: f64, b: f64) -> bool {
    a + EPS < b
}

/// `a` is greater than `b` by more than `EPS`.
#[inline]
pub fn greater(a: f64, b: f64) -> bool {
    a - EPS > b
}

#[inline]
pub fn less_eq(a: f64, b: f64) -> bool {
    less(a, b) || approx_eq(a, b)
}

#[inline]
pub fn greater_eq(a: f64, b: f64) -> bool {
    greater(a, b) || approx_eq(a, b)
}
