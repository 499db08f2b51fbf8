//! Numeric conversion helpers centralizing the float-to-integer casts used by
//! the phase arithmetic.

use num_traits::cast::cast;

/// Convert an `i32` into `f64`. Every `i32` is exactly representable.
#[must_use]
pub fn i32_to_f64(value: i32) -> f64 {
    f64::from(value)
}

/// Truncate a f64 toward zero and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn trunc_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).trunc();
    cast::<f64, i32>(clamped).unwrap_or(0)
}
