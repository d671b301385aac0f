//! Latent vector: the current point Z in latent space.

use rand::Rng;

use super::mapping::IndexMapping;
use crate::config::SamplingRange;
use crate::{Error, Result};

/// A point in latent space
#[derive(Debug, Clone, PartialEq)]
pub struct LatentVector {
    /// Raw coordinates
    pub vector: Vec<f32>,
}

impl LatentVector {
    /// Create a latent vector from raw coordinates
    #[must_use]
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector }
    }

    /// The origin of a `dim`-dimensional latent space
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self { vector: vec![0.0; dim] }
    }

    /// Draw every coordinate independently and uniformly from `range`.
    ///
    /// Fails with [`Config`](crate::Error::Config) when the range is empty,
    /// inverted, or not finite.
    pub fn sample<R: Rng>(rng: &mut R, dim: usize, range: SamplingRange) -> Result<Self> {
        if !range.is_valid() {
            return Err(Error::Config {
                message: format!(
                    "sampling range [{}, {}] must be finite with low < high",
                    range.low, range.high
                ),
            });
        }
        let vector = (0..dim).map(|_| rng.random_range(range.low..=range.high)).collect();
        Ok(Self { vector })
    }

    /// Overwrite the coordinate that `semantic` designates, leaving every
    /// other coordinate untouched.
    ///
    /// Fails with [`InvalidDimension`](crate::Error::InvalidDimension) without
    /// modifying the vector when `semantic` is outside the mapping.
    pub fn set_coordinate(
        &mut self,
        mapping: &IndexMapping,
        semantic: usize,
        value: f32,
    ) -> Result<()> {
        *self.slot(mapping, semantic)? = value;
        Ok(())
    }

    /// Add `delta` to the coordinate that `semantic` designates.
    pub fn offset_coordinate(
        &mut self,
        mapping: &IndexMapping,
        semantic: usize,
        delta: f32,
    ) -> Result<()> {
        *self.slot(mapping, semantic)? += delta;
        Ok(())
    }

    /// Replace the whole vector.
    pub fn replace(&mut self, other: LatentVector) {
        *self = other;
    }

    /// Coordinate at a semantic dimension
    pub fn semantic(&self, mapping: &IndexMapping, semantic: usize) -> Result<f32> {
        let raw = mapping.resolve(semantic)?;
        self.vector
            .get(raw)
            .copied()
            .ok_or(Error::LatentLength { expected: raw + 1, actual: self.vector.len() })
    }

    fn slot(&mut self, mapping: &IndexMapping, semantic: usize) -> Result<&mut f32> {
        let raw = mapping.resolve(semantic)?;
        let len = self.vector.len();
        self.vector.get_mut(raw).ok_or(Error::LatentLength { expected: raw + 1, actual: len })
    }

    /// Dimension of the latent space
    #[must_use]
    pub fn dim(&self) -> usize {
        self.vector.len()
    }

    /// Raw coordinates
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.vector
    }
}

impl From<Vec<f32>> for LatentVector {
    fn from(vector: Vec<f32>) -> Self {
        Self::new(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_SAMPLING_RANGE, LEGACY_SAMPLING_RANGE};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_dimension_and_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let z = LatentVector::sample(&mut rng, 400, DEFAULT_SAMPLING_RANGE).expect("valid range");
        assert_eq!(z.dim(), 400);
        assert!(z.vector.iter().all(|v| (-1.0..=1.0).contains(v)));
        // Uniform on [-1, 1]: both signs show up in 400 draws
        assert!(z.vector.iter().any(|v| *v > 0.0));
        assert!(z.vector.iter().any(|v| *v < 0.0));
    }

    #[test]
    fn test_sample_legacy_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let z = LatentVector::sample(&mut rng, 400, LEGACY_SAMPLING_RANGE).expect("valid range");
        assert!(z.vector.iter().all(|v| (-1.0..=0.0).contains(v)));
    }

    fn sample_seeded(seed: u64, dim: usize) -> LatentVector {
        LatentVector::sample(&mut StdRng::seed_from_u64(seed), dim, DEFAULT_SAMPLING_RANGE)
            .expect("default range is valid")
    }

    #[test]
    fn test_sample_is_seed_deterministic() {
        let a = sample_seeded(3, 64);
        let b = sample_seeded(3, 64);
        let c = sample_seeded(4, 64);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_sample_rejects_unusable_range() {
        let mut rng = StdRng::seed_from_u64(0);
        for range in [
            SamplingRange { low: 1.0, high: -1.0 },
            SamplingRange { low: 0.5, high: 0.5 },
            SamplingRange { low: f32::NAN, high: 1.0 },
            SamplingRange { low: -1.0, high: f32::INFINITY },
        ] {
            let err = LatentVector::sample(&mut rng, 4, range).expect_err("unusable range");
            assert!(matches!(err, Error::Config { .. }));
        }
    }

    #[test]
    fn test_set_coordinate_touches_one_index() {
        let mapping = IndexMapping::standard();
        let mut z = LatentVector::zeros(400);
        z.set_coordinate(&mapping, 28, 0.75).expect("28 is valid");
        assert_eq!(z.vector[380], 0.75);
        assert_eq!(z.vector.iter().filter(|v| **v != 0.0).count(), 1);
        assert_eq!(z.semantic(&mapping, 28).expect("valid"), 0.75);
    }

    #[test]
    fn test_set_coordinate_invalid_leaves_vector() {
        let mapping = IndexMapping::standard();
        let mut z = sample_seeded(1, 400);
        let before = z.clone();
        let err = z.set_coordinate(&mapping, 29, 1.0).expect_err("29 is invalid");
        assert!(matches!(err, Error::InvalidDimension { index: 29, .. }));
        assert_eq!(z, before);
    }

    #[test]
    fn test_offset_coordinate() {
        let mapping = IndexMapping::standard();
        let mut z = LatentVector::zeros(400);
        z.offset_coordinate(&mapping, 0, 0.5).expect("valid");
        z.offset_coordinate(&mapping, 0, -0.25).expect("valid");
        assert_eq!(z.vector[31], 0.25);
    }

    #[test]
    fn test_mapping_wider_than_vector() {
        let mut z = LatentVector::zeros(10);
        let err = z.set_coordinate(&IndexMapping::standard(), 0, 1.0).expect_err("raw 31 > 10");
        assert!(matches!(err, Error::LatentLength { expected: 32, actual: 10 }));
    }

    #[test]
    fn test_replace() {
        let mut z = LatentVector::zeros(3);
        z.replace(LatentVector::new(vec![1.0, 2.0, 3.0]));
        assert_eq!(z.as_slice(), &[1.0, 2.0, 3.0]);
    }

    proptest! {
        #[test]
        fn prop_set_coordinate_changes_exactly_one(
            semantic in 0usize..29,
            value in -10.0f32..10.0,
            seed in any::<u64>(),
        ) {
            let mapping = IndexMapping::standard();
            let mut z = sample_seeded(seed, 400);
            let before = z.clone();
            z.set_coordinate(&mapping, semantic, value).expect("valid dimension");

            let raw = mapping.resolve(semantic).expect("valid dimension");
            for (i, (a, b)) in before.vector.iter().zip(&z.vector).enumerate() {
                if i == raw {
                    prop_assert_eq!(b.to_bits(), value.to_bits());
                } else {
                    prop_assert_eq!(a.to_bits(), b.to_bits());
                }
            }
        }

        #[test]
        fn prop_sample_within_range(seed in any::<u64>()) {
            let z = sample_seeded(seed, 400);
            prop_assert!(z.vector.iter().all(|v| DEFAULT_SAMPLING_RANGE.contains(*v)));
        }
    }
}
