/// Coordinate-wise arithmetic mean of a set of equal-length vectors.
///
/// The centroid is always computed from the full set, never incrementally
/// updated from the newest vector, so the stored embedding cannot drift
/// from partial histories. Returns an empty vector for empty input.
pub fn centroid(vectors: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = vectors.first() else {
        return Vec::new();
    };

    let mut mean = vec![0.0f32; first.len()];
    for vector in vectors {
        for (acc, value) in mean.iter_mut().zip(vector.iter()) {
            *acc += value;
        }
    }
    let n = vectors.len() as f32;
    for acc in mean.iter_mut() {
        *acc /= n;
    }
    mean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_vector_is_its_own_centroid() {
        let v = vec![0.25, -1.5, 3.0];
        assert_eq!(centroid(&[v.clone()]), v);
    }

    #[test]
    fn mean_of_two() {
        let c = centroid(&[vec![0.0, 2.0], vec![1.0, 0.0]]);
        assert_eq!(c, vec![0.5, 1.0]);
    }

    #[test]
    fn order_independent() {
        let a = vec![0.1, 0.9, -0.4];
        let b = vec![0.7, 0.2, 0.3];
        let c = vec![-0.5, 0.5, 0.8];

        let forward = centroid(&[a.clone(), b.clone(), c.clone()]);
        let reversed = centroid(&[c, b, a]);
        for (x, y) in forward.iter().zip(reversed.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(centroid(&[]).is_empty());
    }
}
