//! The wind shell renderer.

use crate::backend::RenderBackend;
use crate::config::{ParticleUpload, RendererConfig};
use crate::encode::{encode, EncodedTexture};
use crate::error::RenderError;
use crate::field::WindField;
use crate::particles::ParticleSet;
use crate::state::RenderState;

/// What a call to [`WindRenderer::draw`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// No wind field has been bound yet; nothing was touched.
    Skipped,
    /// One pass was issued with this many particles.
    Drawn { particles: u32 },
}

/// Owns the particle set, the animation state and the bound wind texture,
/// and drives a [`RenderBackend`] once per frame.
///
/// ```ignore
/// let mut renderer = WindRenderer::new(SoftwareBackend::new(&config), config)?;
/// renderer.set_wind(&WindField::load_json("wind.json")?)?;
/// let mut frame = Framebuffer::new(800, 800);
/// loop {
///     renderer.draw(&mut frame)?;
/// }
/// ```
pub struct WindRenderer<B: RenderBackend> {
    backend: B,
    config: RendererConfig,
    particles: ParticleSet,
    particles_dirty: bool,
    state: RenderState,
    wind: Option<EncodedTexture>,
}

impl<B: RenderBackend> WindRenderer<B> {
    /// Validate `config`, generate the particle set and send it to the
    /// backend.
    pub fn new(backend: B, config: RendererConfig) -> Result<Self, RenderError> {
        config.validate()?;
        let particles = ParticleSet::generate(config.particle_count, config.seed);
        let mut renderer = Self {
            backend,
            config,
            particles,
            particles_dirty: true,
            state: RenderState::new(),
            wind: None,
        };
        renderer.sync_particles()?;
        Ok(renderer)
    }

    /// Encode `field` and bind it, replacing the previous field.
    pub fn set_wind(&mut self, field: &WindField) -> Result<(), RenderError> {
        tracing::info!(
            width = field.width(),
            height = field.height(),
            "binding wind field"
        );
        self.set_encoded_wind(encode(field))
    }

    /// Bind an already encoded texture. The previous binding stays active
    /// if the upload fails.
    pub fn set_encoded_wind(&mut self, texture: EncodedTexture) -> Result<(), RenderError> {
        self.backend.upload_wind(&texture)?;
        self.wind = Some(texture);
        Ok(())
    }

    /// Draw one frame into `target`.
    ///
    /// Does nothing until a wind field is bound. Otherwise advances time and
    /// rotation by one step and issues one pass.
    pub fn draw(&mut self, target: B::Target<'_>) -> Result<DrawOutcome, RenderError> {
        if self.wind.is_none() {
            tracing::trace!("no wind field bound, skipping frame");
            return Ok(DrawOutcome::Skipped);
        }

        self.state
            .advance(self.config.time_step, self.config.rotation_step);

        if self.config.particle_upload == ParticleUpload::EveryFrame {
            self.particles_dirty = true;
        }
        self.sync_particles()?;

        let count = self.particle_count();
        self.backend.draw(target, &self.state, count)?;
        Ok(DrawOutcome::Drawn { particles: count })
    }

    /// Regenerate the particle set from the configured seed (or fresh
    /// entropy when none is set).
    pub fn reset_particles(&mut self) -> Result<(), RenderError> {
        self.replace_particles(ParticleSet::generate(
            self.config.particle_count,
            self.config.seed,
        ))
    }

    /// Swap in a caller-provided particle set.
    pub fn replace_particles(&mut self, particles: ParticleSet) -> Result<(), RenderError> {
        tracing::debug!(count = particles.len(), "replacing particle set");
        self.particles = particles;
        self.particles_dirty = true;
        self.sync_particles()
    }

    fn sync_particles(&mut self) -> Result<(), RenderError> {
        if self.particles_dirty {
            self.backend.upload_particles(&self.particles)?;
            self.particles_dirty = false;
        }
        Ok(())
    }

    fn particle_count(&self) -> u32 {
        u32::try_from(self.particles.len()).unwrap_or(u32::MAX)
    }

    /// Whether a wind field has been bound.
    pub fn has_wind(&self) -> bool {
        self.wind.is_some()
    }

    /// The currently bound texture.
    pub fn wind_texture(&self) -> Option<&EncodedTexture> {
        self.wind.as_ref()
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
