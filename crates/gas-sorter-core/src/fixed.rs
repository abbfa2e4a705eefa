use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Fill ratios live in this type inside the core so that a transfer debits the
/// source by exactly what it credits the destination.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of host time (60 per second in game).
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use for configuration and host boundaries.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display and host boundaries.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Clamp a ratio into `[0, 1]`.
#[inline]
pub fn clamp_ratio(v: Fixed64) -> Fixed64 {
    v.clamp(Fixed64::ZERO, Fixed64::from_num(1))
}
