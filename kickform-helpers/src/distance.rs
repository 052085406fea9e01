use ndarray::ArrayView1;

use crate::Float;

/// A distance function between two feature vectors of equal length.
pub trait Distance<F: Float>: Clone + Send + Sync + Unpin {
    /// Computes the distance between two points.
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F;

    /// A faster proxy for `distance` that preserves its ordering.
    /// Defaults to the true distance.
    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        self.distance(a, b)
    }

    /// Converts a relative distance back into a true distance.
    fn rdist_to_dist(&self, rdist: F) -> F {
        rdist
    }

    /// Converts a true distance into a relative distance.
    fn dist_to_rdist(&self, dist: F) -> F {
        dist
    }
}

/// Euclidean (L2) distance, without normalization or per-dimension weights.
///
/// The relative distance is the squared Euclidean distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct L2Dist;

impl<F: Float> Distance<F> for L2Dist {
    #[inline]
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        self.rdistance(a, b).sqrt()
    }

    #[inline]
    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| (x - y) * (x - y))
            .sum()
    }

    #[inline]
    fn rdist_to_dist(&self, rdist: F) -> F {
        rdist.sqrt()
    }

    #[inline]
    fn dist_to_rdist(&self, dist: F) -> F {
        dist * dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_l2_distance() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0];
        assert_abs_diff_eq!(L2Dist.distance(a.view(), b.view()), 5.0);
        assert_abs_diff_eq!(L2Dist.rdistance(a.view(), b.view()), 25.0);
    }

    #[test]
    fn test_l2_conversions() {
        let d: f64 = L2Dist.rdist_to_dist(16.0);
        assert_abs_diff_eq!(d, 4.0);
        assert_abs_diff_eq!(Distance::<f64>::dist_to_rdist(&L2Dist, 4.0), 16.0);
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let a = array![0.3_f32, -1.2, 7.5];
        assert_eq!(L2Dist.distance(a.view(), a.view()), 0.0);
    }
}
