// Sums run in f64 so a vector compared with itself narrows to exactly 1.0.

pub fn l2_norm(v: &[f32]) -> f64 {
	v.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt()
}

/// Cosine similarity with precomputed norms, clamped to [-1, 1].
/// Zero-norm inputs score 0.0.
pub fn cosine_with_norms(a: &[f32], a_norm: f64, b: &[f32], b_norm: f64) -> f32 {
	if a_norm == 0.0 || b_norm == 0.0 {
		return 0.0;
	}
	let dot: f64 = a.iter().zip(b).map(|(&x, &y)| f64::from(x) * f64::from(y)).sum();
	((dot / (a_norm * b_norm)) as f32).clamp(-1.0, 1.0)
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
	cosine_with_norms(a, l2_norm(a), b, l2_norm(b))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identical_and_orthogonal() {
		assert!((cosine(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]) - 1.0).abs() < 1e-6);
		assert_eq!(cosine(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
		assert!((cosine(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
	}

	#[test]
	fn zero_vector_scores_zero() {
		assert_eq!(cosine(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
		assert_eq!(cosine(&[1.0, 1.0], &[0.0, 0.0]), 0.0);
	}

	#[test]
	fn rounding_never_leaves_the_unit_range() {
		let v: Vec<f32> = (0..384).map(|i| ((i * 7919) % 1000) as f32 / 997.0 - 0.5).collect();
		let neg: Vec<f32> = v.iter().map(|x| -x).collect();
		assert_eq!(cosine(&v, &v), 1.0);
		assert_eq!(cosine(&v, &neg), -1.0);
	}

	#[test]
	fn scale_does_not_matter() {
		let a = cosine(&[1.0, 2.0], &[3.0, 1.0]);
		let b = cosine(&[10.0, 20.0], &[0.3, 0.1]);
		assert!((a - b).abs() < 1e-6);
	}
}
