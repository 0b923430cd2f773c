//! Null-handling policy.
//!
//! Rolling statistics are computed fill-then-aggregate: a missing value counts
//! as a zero-valued game, so it moves both the numerator and the denominator of
//! a mean. Every stage that zero-fills calls [`fill_missing_as_zero`] so the
//! places where absence turns into zero stay greppable.

/// Treats an absent or NaN value as zero.
pub fn fill_missing_as_zero(value: Option<f64>) -> f64 {
    match value {
        Some(v) if !v.is_nan() => v,
        _ => 0.0,
    }
}

/// `numerator / denominator`, or zero when the denominator is zero or absent.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || denominator.is_nan() || numerator.is_nan() {
        0.0
    } else {
        numerator / denominator
    }
}
