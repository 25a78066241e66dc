//! # windshell
//!
//! Draws a global wind field as a cloud of point sprites floating on a
//! rotating sphere. Each particle sits at a fixed longitude/latitude, is
//! pushed outwards by the local wind speed and colored from calm to strong.
//!
//! ## Quick Start
//!
//! ```ignore
//! use windshell::prelude::*;
//!
//! let config = RendererConfig::default().with_seed(7);
//! let mut renderer = WindRenderer::new(SoftwareBackend::new(&config), config)?;
//! renderer.set_wind(&WindField::load_json("wind.json")?)?;
//!
//! let mut frame = Framebuffer::new(800, 800);
//! renderer.draw(&mut frame)?;
//! frame.save_png("frame.png")?;
//! ```
//!
//! ## Pieces
//!
//! | Stage | Module |
//! |-------|--------|
//! | Grid of `(u, v)` samples and JSON loading | [`field`] |
//! | Packing the grid into an RGBA8 texture | [`encode`] |
//! | Particle anchors in `[0, 1)^2` | [`particles`] |
//! | Sphere placement and perspective | [`projection`] |
//! | Point mask, depth shading, palette | [`shading`] |
//! | WGSL generation | [`shader`] |
//! | Frame loop | [`renderer`] |
//!
//! Two [`RenderBackend`]s ship with the crate: [`WgpuBackend`] draws on the
//! GPU and [`SoftwareBackend`] rasterizes the same frame on the CPU.
//!
//! ## Logging
//!
//! The crate logs through [`tracing`]. Install a subscriber to see it, e.g.
//! `RUST_LOG=windshell=debug`.

pub mod backend;
pub mod config;
pub mod encode;
pub mod error;
pub mod field;
pub mod gpu;
pub mod particles;
pub mod projection;
pub mod renderer;
pub mod shader;
pub mod shading;
pub mod software;
pub mod state;

pub use backend::RenderBackend;
pub use config::{Palette, ParticleUpload, RendererConfig};
pub use encode::{decode_channel, encode, encode_component, EncodedTexture};
pub use error::{ConfigError, FieldError, GpuError, ParticleError, RenderError, TextureError};
pub use field::{AxisRange, GeoExtent, WindBounds, WindField};
pub use glam::{Vec2, Vec3, Vec4};
pub use gpu::{GpuContext, GpuTarget, WgpuBackend};
pub use particles::{ParticleSet, DEFAULT_PARTICLE_COUNT};
pub use renderer::{DrawOutcome, WindRenderer};
pub use software::{DrawStats, Framebuffer, SoftwareBackend};
pub use state::RenderState;

/// Everything needed to load a field and draw it.
pub mod prelude {
    pub use crate::backend::RenderBackend;
    pub use crate::config::{Palette, ParticleUpload, RendererConfig};
    pub use crate::encode::EncodedTexture;
    pub use crate::error::RenderError;
    pub use crate::field::WindField;
    pub use crate::gpu::{GpuContext, GpuTarget, WgpuBackend};
    pub use crate::particles::ParticleSet;
    pub use crate::renderer::{DrawOutcome, WindRenderer};
    pub use crate::software::{Framebuffer, SoftwareBackend};
    pub use crate::state::RenderState;
    pub use crate::{Vec2, Vec3, Vec4};
}
