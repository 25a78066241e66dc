//! The seam between [`WindRenderer`](crate::WindRenderer) and a drawing
//! device.

use crate::encode::EncodedTexture;
use crate::error::RenderError;
use crate::particles::ParticleSet;
use crate::state::RenderState;

/// A device that can hold one wind texture and one particle buffer and draw
/// the shell with them.
///
/// The renderer guarantees that [`draw`](Self::draw) is only called after at
/// least one successful [`upload_wind`](Self::upload_wind), and that
/// `particle_count` never exceeds the length of the last uploaded set.
pub trait RenderBackend {
    /// What a frame is drawn into.
    type Target<'a>;

    /// Replace the bound wind texture. Must be complete before the next
    /// draw reads it.
    fn upload_wind(&mut self, texture: &EncodedTexture) -> Result<(), RenderError>;

    /// Replace the particle buffer.
    fn upload_particles(&mut self, particles: &ParticleSet) -> Result<(), RenderError>;

    /// Clear `target` and draw `particle_count` point sprites.
    fn draw(
        &mut self,
        target: Self::Target<'_>,
        state: &RenderState,
        particle_count: u32,
    ) -> Result<(), RenderError>;
}
