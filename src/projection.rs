//! Per-particle transform onto the rotating shell.
//!
//! This is the reference model of the vertex stage. The WGSL emitted by
//! [`shader`](crate::shader) performs the same arithmetic; the software
//! backend calls [`project`] directly.
//!
//! For a particle at `uv` with decoded wind `w` and rotation `ψ`:
//!
//! ```text
//! λ = uv.x·2π − π + ψ          φ = uv.y·π − π/2
//! p = R·(cosφ·cosλ, sinφ, cosφ·sinλ)
//! x += w.x·k,  y += w.y·k       (screen-plane nudge, not a surface tangent)
//! s = 1 / (b − p.z·d)
//! clip = (x·s, y·s, p.z, 1)     size = size₀ + |w|·gain
//! ```

use std::f32::consts::PI;

use glam::{Vec2, Vec3, Vec4};

use crate::config::RendererConfig;

/// Geometry constants of the shell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShellParams {
    pub radius: f32,
    pub displacement_scale: f32,
    pub perspective_base: f32,
    pub perspective_depth: f32,
    pub point_size_base: f32,
    pub point_size_gain: f32,
}

impl From<&RendererConfig> for ShellParams {
    fn from(config: &RendererConfig) -> Self {
        Self {
            radius: config.shell_radius,
            displacement_scale: config.displacement_scale,
            perspective_base: config.perspective_base,
            perspective_depth: config.perspective_depth,
            point_size_base: config.point_size_base,
            point_size_gain: config.point_size_gain,
        }
    }
}

impl Default for ShellParams {
    fn default() -> Self {
        Self::from(&RendererConfig::default())
    }
}

/// Output of the vertex stage for one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    /// Clip-space position, `w` is always 1.
    pub clip: Vec4,
    /// Point diameter in pixels.
    pub point_size: f32,
    /// Length of the decoded wind vector.
    pub strength: f32,
    /// Undisplaced shell `z`, in `[-R, R]`.
    pub depth: f32,
}

impl ProjectedPoint {
    /// Clip `z` mapped into the `[0, 1]` depth range, the same mapping GL
    /// applies from NDC to window depth.
    #[inline]
    pub fn depth_range_value(&self) -> f32 {
        self.clip.z * 0.5 + 0.5
    }

    /// Whether the point survives depth clipping.
    #[inline]
    pub fn is_visible(&self) -> bool {
        (0.0..=1.0).contains(&self.depth_range_value())
    }
}

/// Longitude and latitude in radians of `uv` under rotation `rotation`.
#[inline]
pub fn lon_lat(uv: Vec2, rotation: f32) -> (f32, f32) {
    let lon = uv.x * 2.0 * PI - PI + rotation;
    let lat = uv.y * PI - PI / 2.0;
    (lon, lat)
}

/// Point on a sphere of `radius` at the given longitude/latitude.
#[inline]
pub fn shell_point(lon: f32, lat: f32, radius: f32) -> Vec3 {
    Vec3::new(
        radius * lat.cos() * lon.cos(),
        radius * lat.sin(),
        radius * lat.cos() * lon.sin(),
    )
}

/// Run the vertex stage for one particle.
pub fn project(uv: Vec2, wind: Vec2, rotation: f32, params: &ShellParams) -> ProjectedPoint {
    let strength = wind.length();
    let (lon, lat) = lon_lat(uv, rotation);
    let base = shell_point(lon, lat, params.radius);

    let x = base.x + wind.x * params.displacement_scale;
    let y = base.y + wind.y * params.displacement_scale;
    let z = base.z;

    let perspective = 1.0 / (params.perspective_base - z * params.perspective_depth);

    ProjectedPoint {
        clip: Vec4::new(x * perspective, y * perspective, z, 1.0),
        point_size: params.point_size_base + strength * params.point_size_gain,
        strength,
        depth: z,
    }
}
