//! Scalar kernels shared by the blending families.

/// Weights `(w1, w2)` for a mixture at position `p`: `w2 = p`, `w1 = 1 - p`.
pub fn mixture_weights(p: f64) -> (f64, f64) {
    (1.0 - p, p)
}

pub fn linear_mix(first: f64, second: f64, weight_1: f64, weight_2: f64) -> f64 {
    first * weight_1 + second * weight_2
}

/// `first + (second - first) * weight`; `weight` may leave [0, 1].
pub fn delta_extrapolate(first: f64, second: f64, weight: f64) -> f64 {
    first + (second - first) * weight
}

/// Integer rounding for mixed integer columns: nearest, ties to even.
pub fn round_integer(value: f64) -> f64 {
    value.round_ties_even()
}

pub fn clamp_threshold(value: f64, max_threshold: f64) -> f64 {
    let bound = max_threshold.abs();
    if value.is_nan() {
        return value;
    }
    value.clamp(-bound, bound)
}

/// `rate^years` for compounding growth over whole years.
pub fn compound_factor(rate: f64, years: i64) -> f64 {
    match i32::try_from(years) {
        Ok(years) => rate.powi(years),
        Err(_) => rate.powf(years as f64),
    }
}
