//!
//! # Exposure Grid Quantization & Validation
//!
//! Pure predicates and the coordinate-snapping function shared by every
//! drawing operation. Nothing here touches a sink or a counter; callers
//! decide what to do with a failed check.
//!

/// Quantize physical coordinate `v` (nm) to the nearest integer multiple of
/// the grid unit.
///
/// Tie-break at exact half-unit boundaries is round-half-away-from-zero,
/// the behavior of [f64::round]; the same rule applies at every call site.
pub fn quantize(v: f64, unit: f64) -> f64 {
    (v / unit).round() * unit
}

/// Whether quantized point (`x`, `y`) falls outside the square exposure field.
/// Both axes are checked against the closed interval [0, `field_size`].
pub fn out_of_bounds(x: f64, y: f64, field_size: f64) -> bool {
    x < 0.0 || x > field_size || y < 0.0 || y > field_size
}

/// Whether dose time `t` (µs) falls outside the device limits.
/// Both bounds are inclusive: `min <= t <= max` is legal.
pub fn out_of_dose(t: f64, min: f64, max: f64) -> bool {
    t < min || t > max
}
