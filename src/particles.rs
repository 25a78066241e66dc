//! Static particle sample coordinates.
//!
//! Particles never move in data space. Each one is a fixed UV coordinate that
//! picks a wind sample and a spot on the shell; only its rendered position
//! changes from frame to frame.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ParticleError;

/// Default number of particles.
pub const DEFAULT_PARTICLE_COUNT: u32 = 35_000;

/// An immutable set of particle coordinates in `[0, 1)²`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParticleSet {
    positions: Vec<Vec2>,
}

impl ParticleSet {
    /// Draw `count` independent uniform points. With a seed the set is
    /// reproducible; without one it is seeded from OS entropy.
    pub fn generate(count: u32, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let positions = (0..count)
            .map(|_| Vec2::new(rng.gen::<f32>(), rng.gen::<f32>()))
            .collect();
        tracing::debug!(count, ?seed, "generated particle set");
        Self { positions }
    }

    /// Use explicit coordinates. Every component must lie in `[0, 1)`.
    pub fn from_positions(positions: Vec<Vec2>) -> Result<Self, ParticleError> {
        let unit = 0.0..1.0;
        if let Some((index, p)) = positions
            .iter()
            .enumerate()
            .find(|(_, p)| !unit.contains(&p.x) || !unit.contains(&p.y))
        {
            return Err(ParticleError::OutOfRange {
                index,
                x: p.x,
                y: p.y,
            });
        }
        Ok(Self { positions })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    /// Vertex buffer contents, two `f32` per particle.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }
}
