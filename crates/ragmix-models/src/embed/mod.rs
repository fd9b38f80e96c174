pub mod bge;
pub mod hashing;
pub mod http;

/// Scales `v` to unit length in place; the zero vector is left alone.
pub(crate) fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
