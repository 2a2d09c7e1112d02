/// Euclidean distance between two equal-length vectors.
///
/// Uses f64 intermediate precision. Length checking is the caller's job;
/// mismatched tails are never silently truncated or padded here.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut sum: f64 = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let d = *x as f64 - *y as f64;
        sum += d * d;
    }
    sum.sqrt() as f32
}

/// Display heuristic mapping a distance to a 0..100 score. Not a
/// probability; only meaningful for accepted matches, but reported for
/// rejected ones as a diagnostic.
pub fn confidence(distance: f32) -> f32 {
    ((1.0 - distance) * 100.0).clamp(0.0, 100.0)
}
