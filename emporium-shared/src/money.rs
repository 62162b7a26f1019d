/// Gateways bill in the smallest currency subdivision (kobo, cents).
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Convert a major-unit amount into gateway minor units.
///
/// Rounds to the nearest minor unit so that values such as `19.99`, which are
/// not exactly representable as `f64`, still map to `1999`.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * MINOR_UNITS_PER_MAJOR as f64).round() as i64
}
