//! Random-direction projection
//!
//! Exploration samples a unit direction `u` and proposes `w + delta * u`.
//! If the proposal wins its duel, exploitation replays the same `u` with the
//! smaller step: `w + gamma * u`.

use crate::config::DirectionKind;
use duelrank_core::{Error, Result, SparseVector};
use rand::Rng;
use tracing::warn;

/// Zero-norm draws tolerated before giving up
pub const MAX_DIRECTION_DRAWS: usize = 8;

/// Unit-norm perturbation direction
#[derive(Debug, Clone, PartialEq)]
pub struct Direction(SparseVector);

impl Direction {
    /// The underlying unit vector
    pub fn vector(&self) -> &SparseVector {
        &self.0
    }

    /// Dimensionality
    pub fn dims(&self) -> usize {
        self.0.dims()
    }
}

/// Samples directions and applies steps along them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projector {
    dims: usize,
    distribution: DirectionKind,
}

impl Projector {
    /// Projector for `dims`-dimensional weights
    pub fn new(dims: usize, distribution: DirectionKind) -> Self {
        Projector { dims, distribution }
    }

    /// Dimensionality of sampled directions
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Draw i.i.d. coordinates and normalize to unit length.
    ///
    /// A draw with zero norm is discarded and redrawn.
    ///
    /// # Errors
    ///
    /// `Error::DegenerateDirection` when `dims` is 0 or every one of
    /// [`MAX_DIRECTION_DRAWS`] draws had zero norm.
    pub fn sample_direction<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Direction> {
        if self.dims == 0 {
            return Err(Error::DegenerateDirection(
                "cannot sample a direction in 0 dimensions".to_string(),
            ));
        }

        for attempt in 1..=MAX_DIRECTION_DRAWS {
            let mut coords: Vec<f32> = match self.distribution {
                DirectionKind::Positive => (0..self.dims).map(|_| rng.gen::<f32>()).collect(),
                DirectionKind::Symmetric => {
                    (0..self.dims).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
                }
            };

            let norm = coords
                .iter()
                .map(|&c| c as f64 * c as f64)
                .sum::<f64>()
                .sqrt();
            if norm > 0.0 && norm.is_finite() {
                for c in coords.iter_mut() {
                    *c = (*c as f64 / norm) as f32;
                }
                return Ok(Direction(SparseVector::from_dense(&coords)));
            }

            warn!(
                target: "duelrank::projection",
                attempt,
                dims = self.dims,
                "Discarding zero-norm direction draw"
            );
        }

        Err(Error::DegenerateDirection(format!(
            "{} consecutive zero-norm draws in {} dimensions",
            MAX_DIRECTION_DRAWS, self.dims
        )))
    }

    /// `weight + step_size * direction`
    ///
    /// # Errors
    ///
    /// Weight and direction must share dimensionality.
    pub fn project(
        &self,
        weight: &SparseVector,
        step_size: f32,
        direction: &Direction,
    ) -> Result<SparseVector> {
        weight.add_scaled(direction.vector(), step_size)
    }

    /// Sample a fresh direction and step along it.
    ///
    /// Returns the proposal together with the direction so a winning
    /// proposal can be replayed with the exploitation step.
    pub fn explore<R: Rng + ?Sized>(
        &self,
        weight: &SparseVector,
        step_size: f32,
        rng: &mut R,
    ) -> Result<(SparseVector, Direction)> {
        let direction = self.sample_direction(rng)?;
        let proposal = self.project(weight, step_size, &direction)?;
        Ok((proposal, direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_direction_is_unit_norm() {
        let projector = Projector::new(50, DirectionKind::Positive);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            let u = projector.sample_direction(&mut rng).unwrap();
            assert_eq!(u.dims(), 50);
            assert!((u.vector().norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_positive_direction_has_no_negative_coordinates() {
        let projector = Projector::new(64, DirectionKind::Positive);
        let mut rng = StdRng::seed_from_u64(2);
        let u = projector.sample_direction(&mut rng).unwrap();
        assert!(u.vector().values().iter().all(|&c| c >= 0.0));
    }

    #[test]
    fn test_symmetric_direction_reaches_negative_orthant() {
        let projector = Projector::new(64, DirectionKind::Symmetric);
        let mut rng = StdRng::seed_from_u64(3);
        let u = projector.sample_direction(&mut rng).unwrap();
        assert!((u.vector().norm() - 1.0).abs() < 1e-5);
        assert!(u.vector().values().iter().any(|&c| c < 0.0));
    }

    #[test]
    fn test_zero_dims_is_degenerate() {
        let projector = Projector::new(0, DirectionKind::Positive);
        let mut rng = StdRng::seed_from_u64(4);
        assert!(matches!(
            projector.sample_direction(&mut rng),
            Err(Error::DegenerateDirection(_))
        ));
    }

    #[test]
    fn test_zero_norm_draws_exhaust_retries() {
        // an RNG that only ever yields zero bits
        struct ZeroRng;
        impl rand::RngCore for ZeroRng {
            fn next_u32(&mut self) -> u32 {
                0
            }
            fn next_u64(&mut self) -> u64 {
                0
            }
            fn fill_bytes(&mut self, dest: &mut [u8]) {
                dest.fill(0);
            }
            fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
                dest.fill(0);
                Ok(())
            }
        }

        let projector = Projector::new(4, DirectionKind::Positive);
        assert!(matches!(
            projector.sample_direction(&mut ZeroRng),
            Err(Error::DegenerateDirection(_))
        ));
    }

    #[test]
    fn test_explore_then_replay() {
        let projector = Projector::new(8, DirectionKind::Positive);
        let mut rng = StdRng::seed_from_u64(5);
        let w = SparseVector::zeros(8);

        let (candidate, u) = projector.explore(&w, 1.0, &mut rng).unwrap();
        assert!((candidate.norm() - 1.0).abs() < 1e-5);

        let exploited = projector.project(&w, 0.01, &u).unwrap();
        for i in 0..8 {
            assert!((exploited.get(i) - 0.01 * candidate.get(i)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_same_seed_same_direction() {
        let projector = Projector::new(16, DirectionKind::Symmetric);
        let a = projector
            .sample_direction(&mut StdRng::seed_from_u64(9))
            .unwrap();
        let b = projector
            .sample_direction(&mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_project_dimension_mismatch() {
        let projector = Projector::new(4, DirectionKind::Positive);
        let u = projector
            .sample_direction(&mut StdRng::seed_from_u64(6))
            .unwrap();
        assert!(projector.project(&SparseVector::zeros(5), 1.0, &u).is_err());
    }
}
