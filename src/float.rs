//! Epsilon-tolerant `f64` comparisons for layout arithmetic.
//!
//! Widths and extents are device-independent pixels; an absolute epsilon is
//! plenty at that scale and keeps the comparisons branch-free.

pub(crate) const EPSILON: f64 = 1e-9;

pub(crate) fn is_zero(value: f64) -> bool {
    value.abs() < EPSILON
}

pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// `a >= b` within tolerance.
pub(crate) fn ge(a: f64, b: f64) -> bool {
    a > b || approx_eq(a, b)
}

/// `a <= b` within tolerance.
pub(crate) fn le(a: f64, b: f64) -> bool {
    a < b || approx_eq(a, b)
}

/// `a > b` by more than tolerance.
pub(crate) fn gt(a: f64, b: f64) -> bool {
    a > b && !approx_eq(a, b)
}
