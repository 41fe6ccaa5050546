/// Convert a normalized color value to an 8-bit channel (clamped, rounded).
#[inline]
pub fn unit_to_u8(v: f32) -> u8 {
    if !v.is_finite() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Evenly spaced samples over `[0, 1]`, inclusive at both ends.
///
/// A single sample is `0.0`.
pub fn linspace_unit(count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n).map(|i| i as f64 / (n - 1) as f64).collect(),
    }
}
