//! Per-fragment shading of the point sprites.
//!
//! Reference model of the fragment stage. `point_coord` is the fragment's
//! position relative to the point center, in `[-0.5, 0.5]²`.

use glam::{Vec2, Vec3, Vec4};

use crate::config::Palette;

/// Fragments farther than this from the point center are discarded.
pub const POINT_MASK_RADIUS: f32 = 0.5;

/// Distance from the center where the alpha falloff begins.
pub const FALLOFF_START: f32 = 0.3;

/// GLSL/WGSL `smoothstep`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Brightness factor in `[0.5, 1]` from shell depth.
#[inline]
pub fn depth_shade(depth: f32) -> f32 {
    0.5 + 0.5 * smoothstep(-1.0, 1.0, depth)
}

/// Base color for a wind strength. Extrapolates past `strong` for
/// strengths above 1, like `mix` does on the GPU.
#[inline]
pub fn strength_color(strength: f32, palette: &Palette) -> Vec3 {
    Vec3::from(palette.calm).lerp(Vec3::from(palette.strong), strength)
}

/// Shade one fragment. Returns `None` when the circular mask discards it.
pub fn shade_fragment(
    point_coord: Vec2,
    strength: f32,
    depth: f32,
    palette: &Palette,
) -> Option<Vec4> {
    let d = point_coord.length();
    if d > POINT_MASK_RADIUS {
        return None;
    }

    let color = strength_color(strength, palette) * depth_shade(depth);
    let alpha = (1.0 - smoothstep(FALLOFF_START, POINT_MASK_RADIUS, d)) * palette.max_alpha;
    Some(color.extend(alpha))
}

/// Standard `src_alpha, one_minus_src_alpha` blending on all four channels.
#[inline]
pub fn blend_over(src: Vec4, dst: Vec4) -> Vec4 {
    src * src.w + dst * (1.0 - src.w)
}
