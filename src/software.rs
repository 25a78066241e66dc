//! CPU rasterizer backend.
//!
//! Evaluates [`project`] and [`shade_fragment`] for every particle and
//! composites the result into a [`Framebuffer`] with a `Less` depth test and
//! source-over alpha blending, the same fixed-function state the GPU
//! pipeline uses. Useful headless, in tests, and for offline snapshots.

use std::path::Path;

use glam::{Vec2, Vec4};

use crate::backend::RenderBackend;
use crate::config::{Palette, RendererConfig};
use crate::encode::EncodedTexture;
use crate::error::{RenderError, TextureError};
use crate::particles::ParticleSet;
use crate::projection::{project, ProjectedPoint, ShellParams};
use crate::shading::{blend_over, shade_fragment};
use crate::state::RenderState;

/// Linear RGBA color buffer with a matching depth buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    color: Vec<Vec4>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![Vec4::ZERO; len],
            depth: vec![1.0; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color at `(x, y)`, row 0 at the top.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec4> {
        (x < self.width && y < self.height)
            .then(|| self.color[y as usize * self.width as usize + x as usize])
    }

    /// Depth at `(x, y)`; 1.0 where nothing was drawn.
    pub fn depth(&self, x: u32, y: u32) -> Option<f32> {
        (x < self.width && y < self.height)
            .then(|| self.depth[y as usize * self.width as usize + x as usize])
    }

    /// Reset color to `color` and depth to the far plane.
    pub fn clear(&mut self, color: Vec4) {
        self.color.fill(color);
        self.depth.fill(1.0);
    }

    /// Number of pixels whose depth was written this frame.
    pub fn covered_pixels(&self) -> usize {
        self.depth.iter().filter(|&&d| d < 1.0).count()
    }

    /// 8-bit RGBA copy, values clamped to `[0, 1]`.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.color
            .iter()
            .flat_map(|c| c.to_array())
            .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }

    /// Write the color buffer as a PNG.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), TextureError> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.to_rgba8()).ok_or(
            TextureError::SizeMismatch {
                expected: self.width as usize * self.height as usize * 4,
                actual: self.color.len() * 4,
            },
        )?;
        img.save_with_format(path.as_ref(), image::ImageFormat::Png)?;
        Ok(())
    }
}

/// Counters accumulated by [`SoftwareBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawStats {
    /// Render passes executed (each one clears the target).
    pub passes: u64,
    /// Instanced draws issued; zero-particle passes issue none.
    pub draw_calls: u64,
    /// Fragments that passed the mask and depth test.
    pub fragments: u64,
}

/// CPU implementation of [`RenderBackend`].
#[derive(Debug, Clone)]
pub struct SoftwareBackend {
    params: ShellParams,
    palette: Palette,
    clear_color: Vec4,
    wind: Option<EncodedTexture>,
    particles: Vec<Vec2>,
    stats: DrawStats,
}

impl SoftwareBackend {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            params: ShellParams::from(config),
            palette: config.palette,
            clear_color: Vec4::from(config.clear_color),
            wind: None,
            particles: Vec::new(),
            stats: DrawStats::default(),
        }
    }

    pub fn stats(&self) -> DrawStats {
        self.stats
    }

    /// Vertex stage for the first `count` uploaded particles.
    pub fn project_particles(&self, rotation: f32, count: usize) -> Vec<ProjectedPoint> {
        let Some(wind) = &self.wind else {
            return Vec::new();
        };
        self.particles
            .iter()
            .take(count)
            .map(|&uv| project(uv, wind.sample(uv), rotation, &self.params))
            .collect()
    }
}

impl RenderBackend for SoftwareBackend {
    type Target<'a> = &'a mut Framebuffer;

    fn upload_wind(&mut self, texture: &EncodedTexture) -> Result<(), RenderError> {
        self.wind = Some(texture.clone());
        Ok(())
    }

    fn upload_particles(&mut self, particles: &ParticleSet) -> Result<(), RenderError> {
        self.particles = particles.positions().to_vec();
        Ok(())
    }

    fn draw(
        &mut self,
        target: &mut Framebuffer,
        state: &RenderState,
        particle_count: u32,
    ) -> Result<(), RenderError> {
        target.clear(self.clear_color);
        self.stats.passes += 1;

        let count = (particle_count as usize).min(self.particles.len());
        if count == 0 || self.wind.is_none() {
            return Ok(());
        }
        self.stats.draw_calls += 1;

        // Every particle is transformed independently; only the raster step
        // below depends on submission order.
        let points = self.project_particles(state.shader_rotation(), count);
        for point in points.iter().filter(|p| p.is_visible()) {
            self.stats.fragments += rasterize_point(target, point, &self.palette);
        }
        Ok(())
    }
}

/// Cover the point's square footprint, shade each pixel center and
/// composite. Returns the number of fragments written.
fn rasterize_point(target: &mut Framebuffer, point: &ProjectedPoint, palette: &Palette) -> u64 {
    let size = point.point_size;
    if size <= 0.0 || target.width == 0 || target.height == 0 {
        return 0;
    }
    let width = target.width as f32;
    let height = target.height as f32;
    let cx = (point.clip.x * 0.5 + 0.5) * width;
    let cy = (0.5 - point.clip.y * 0.5) * height;
    let half = size * 0.5;
    let depth = point.depth_range_value();

    let x0 = (cx - half).floor().max(0.0) as u32;
    let x1 = (cx + half).ceil().min(width) as u32;
    let y0 = (cy - half).floor().max(0.0) as u32;
    let y1 = (cy + half).ceil().min(height) as u32;

    let mut written = 0;
    for py in y0..y1 {
        for px in x0..x1 {
            let coord = Vec2::new(px as f32 + 0.5 - cx, py as f32 + 0.5 - cy) / size;
            if coord.x.abs() > 0.5 || coord.y.abs() > 0.5 {
                continue;
            }
            let Some(rgba) = shade_fragment(coord, point.strength, point.depth, palette) else {
                continue;
            };
            let i = py as usize * target.width as usize + px as usize;
            if depth >= target.depth[i] {
                continue;
            }
            target.depth[i] = depth;
            target.color[i] = blend_over(rgba, target.color[i]);
            written += 1;
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::decode_channel;

    fn neutral_texture() -> EncodedTexture {
        EncodedTexture::from_rgba(vec![128, 128, 128, 255], 1, 1).unwrap()
    }

    #[test]
    fn test_framebuffer_clear_and_pixels() {
        let mut fb = Framebuffer::new(4, 3);
        fb.clear(Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(fb.pixel(3, 2), Some(Vec4::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(fb.pixel(4, 0), None);
        assert_eq!(fb.depth(0, 0), Some(1.0));
        assert_eq!(fb.covered_pixels(), 0);
        assert_eq!(&fb.to_rgba8()[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_draw_without_wind_only_clears() {
        let mut backend = SoftwareBackend::new(&RendererConfig::default());
        backend
            .upload_particles(&ParticleSet::generate(10, Some(1)))
            .unwrap();
        let mut fb = Framebuffer::new(16, 16);
        backend.draw(&mut fb, &RenderState::new(), 10).unwrap();
        assert_eq!(backend.stats().draw_calls, 0);
        assert_eq!(backend.stats().fragments, 0);
    }

    #[test]
    fn test_center_particle_lands_right_of_center() {
        let mut backend = SoftwareBackend::new(&RendererConfig::default());
        backend.upload_wind(&neutral_texture()).unwrap();
        backend
            .upload_particles(&ParticleSet::from_positions(vec![Vec2::new(0.5, 0.5)]).unwrap())
            .unwrap();

        let mut fb = Framebuffer::new(100, 100);
        backend.draw(&mut fb, &RenderState::new(), 1).unwrap();

        let stats = backend.stats();
        assert_eq!(stats.draw_calls, 1);
        assert!(stats.fragments >= 1);
        // clip.x = 1.08 / 1.5 = 0.72 -> pixel 86
        let hit = (85..=87).any(|x| (49..=50).any(|y| fb.pixel(x, y).unwrap().w > 0.0));
        assert!(hit);
        assert_eq!(fb.covered_pixels() as u64, stats.fragments);
    }

    #[test]
    fn test_depth_test_keeps_nearer_point() {
        let mut fb = Framebuffer::new(8, 8);
        let palette = Palette::default();
        let near = ProjectedPoint {
            clip: Vec4::new(0.0, 0.0, -0.5, 1.0),
            point_size: 4.0,
            strength: 0.0,
            depth: -0.5,
        };
        let far = ProjectedPoint {
            clip: Vec4::new(0.0, 0.0, 0.5, 1.0),
            ..near
        };
        assert!(rasterize_point(&mut fb, &near, &palette) > 0);
        assert_eq!(rasterize_point(&mut fb, &far, &palette), 0);
        assert_eq!(fb.depth(4, 4), Some(0.25));
    }

    #[test]
    fn test_offscreen_point_writes_nothing() {
        let mut fb = Framebuffer::new(8, 8);
        let point = ProjectedPoint {
            clip: Vec4::new(5.0, -5.0, 0.0, 1.0),
            point_size: 3.0,
            strength: 0.0,
            depth: 0.0,
        };
        assert_eq!(rasterize_point(&mut fb, &point, &Palette::default()), 0);
    }

    #[test]
    fn test_particle_count_is_capped_by_upload() {
        let mut backend = SoftwareBackend::new(&RendererConfig::default());
        backend.upload_wind(&neutral_texture()).unwrap();
        backend
            .upload_particles(&ParticleSet::generate(3, Some(9)))
            .unwrap();
        assert_eq!(backend.project_particles(0.0, 100).len(), 3);
    }

    #[test]
    fn test_framebuffer_png_round_trip() {
        let mut fb = Framebuffer::new(5, 3);
        fb.clear(Vec4::new(0.0, 0.5, 1.0, 1.0));
        let path = std::env::temp_dir()
            .join(format!("windshell-framebuffer-{}.png", std::process::id()));

        fb.save_png(&path).unwrap();
        let loaded = image::open(&path).map(|img| img.into_rgba8());
        let _ = std::fs::remove_file(&path);

        let loaded = loaded.unwrap();
        assert_eq!(loaded.dimensions(), (5, 3));
        assert_eq!(loaded.into_raw(), fb.to_rgba8());
    }

    #[test]
    fn test_neutral_texture_draws_near_calm_points() {
        let mut backend = SoftwareBackend::new(&RendererConfig::default());
        backend.upload_wind(&neutral_texture()).unwrap();
        backend
            .upload_particles(&ParticleSet::from_positions(vec![Vec2::new(0.5, 0.5)]).unwrap())
            .unwrap();

        let point = backend.project_particles(0.0, 1)[0];
        let step = decode_channel(128);
        let strength = (2.0 * step * step).sqrt();
        assert!((point.strength - strength).abs() < 1e-6);
        assert!((point.strength - 0.005_546).abs() < 1e-5);
        assert!((point.point_size - (1.8 + 5.0 * strength)).abs() < 1e-6);
        assert!(point.point_size > 1.8 && point.point_size < 1.83);
    }
}

