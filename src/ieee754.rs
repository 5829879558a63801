//! Logical equality for IEEE 754 floating point literals.

/// Compare floating point numbers by bit pattern, collapsing the NaN space
/// into a single logical value.
///
/// Structural operations over expressions need an equality on double
/// literals that is reflexive and distinguishes distinct literals, so the
/// IEEE 754 comparison rules cannot be used directly. Under this comparison:
///
/// - `0.0 != -0.0`
/// - `NaN == NaN`
/// - `NaN == -NaN`
pub fn logical_eq(value0: f64, value1: f64) -> bool {
    value0.to_bits() == value1.to_bits() || value0.is_nan() && value1.is_nan()
}
