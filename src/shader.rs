//! WGSL generation for the wind shell pipeline.
//!
//! The render shader is built from [`RendererConfig`] values so every shell
//! constant lives in one place. The arithmetic mirrors
//! [`projection::project`](crate::projection::project) and
//! [`shading::shade_fragment`](crate::shading::shade_fragment).
//!
//! WebGPU has no sized point primitives, so each particle is drawn as an
//! instanced six-vertex quad spanning `point_size` pixels.

use bytemuck::{Pod, Zeroable};

use crate::config::RendererConfig;
use crate::shading::{FALLOFF_START, POINT_MASK_RADIUS};

/// Per-frame uniforms. Layout matches the WGSL `Uniforms` struct.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub time: f32,
    /// Rotation in radians, wrapped into `[0, 2π)`.
    pub rotation: f32,
    /// Render target size in pixels.
    pub viewport: [f32; 2],
}

/// Format an `f32` as a WGSL float literal.
fn lit(value: f32) -> String {
    format!("{:?}", value)
}

fn vec3_lit(v: [f32; 3]) -> String {
    format!("vec3<f32>({}, {}, {})", lit(v[0]), lit(v[1]), lit(v[2]))
}

/// Generate the vertex + fragment shader for `config`.
pub fn generate_render_shader(config: &RendererConfig) -> String {
    let radius = lit(config.shell_radius);
    let displacement = lit(config.displacement_scale);
    let perspective_base = lit(config.perspective_base);
    let perspective_depth = lit(config.perspective_depth);
    let size_base = lit(config.point_size_base);
    let size_gain = lit(config.point_size_gain);
    let calm = vec3_lit(config.palette.calm);
    let strong = vec3_lit(config.palette.strong);
    let max_alpha = lit(config.palette.max_alpha);
    let mask_radius = lit(POINT_MASK_RADIUS);
    let falloff_start = lit(FALLOFF_START);

    format!(
        r#"struct Uniforms {{
    time: f32,
    rotation: f32,
    viewport: vec2<f32>,
}};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(0) @binding(1)
var wind_tex: texture_2d<f32>;

@group(0) @binding(2)
var wind_sampler: sampler;

const PI: f32 = 3.141592653589793;
const SHELL_RADIUS: f32 = {radius};
const DISPLACEMENT_SCALE: f32 = {displacement};
const PERSPECTIVE_BASE: f32 = {perspective_base};
const PERSPECTIVE_DEPTH: f32 = {perspective_depth};
const POINT_SIZE_BASE: f32 = {size_base};
const POINT_SIZE_GAIN: f32 = {size_gain};
const CALM_COLOR: vec3<f32> = {calm};
const STRONG_COLOR: vec3<f32> = {strong};
const MAX_ALPHA: f32 = {max_alpha};
const MASK_RADIUS: f32 = {mask_radius};
const FALLOFF_START: f32 = {falloff_start};

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) point_coord: vec2<f32>,
    @location(1) strength: f32,
    @location(2) depth: f32,
}};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) particle_uv: vec2<f32>,
) -> VertexOutput {{
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let quad_pos = quad_vertices[vertex_index];

    let texel = textureSampleLevel(wind_tex, wind_sampler, particle_uv, 0.0);
    let wind = (texel.rg - vec2<f32>(0.5, 0.5)) * 2.0;
    let strength = length(wind);

    let lon = particle_uv.x * 2.0 * PI - PI + uniforms.rotation;
    let lat = particle_uv.y * PI - PI / 2.0;

    var x = SHELL_RADIUS * cos(lat) * cos(lon);
    var y = SHELL_RADIUS * sin(lat);
    let z = SHELL_RADIUS * cos(lat) * sin(lon);

    x += wind.x * DISPLACEMENT_SCALE;
    y += wind.y * DISPLACEMENT_SCALE;

    let perspective = 1.0 / (PERSPECTIVE_BASE - z * PERSPECTIVE_DEPTH);
    let point_size = POINT_SIZE_BASE + strength * POINT_SIZE_GAIN;

    // Half the point size in pixels, converted to NDC.
    let offset = quad_pos * point_size / max(uniforms.viewport, vec2<f32>(1.0, 1.0));

    var out: VertexOutput;
    out.clip_position = vec4<f32>(
        x * perspective + offset.x,
        y * perspective + offset.y,
        z * 0.5 + 0.5,
        1.0,
    );
    out.point_coord = quad_pos * 0.5;
    out.strength = strength;
    out.depth = z;
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let d = length(in.point_coord);
    if d > MASK_RADIUS {{
        discard;
    }}

    let depth_shade = smoothstep(-1.0, 1.0, in.depth);
    var color = mix(CALM_COLOR, STRONG_COLOR, in.strength);
    color *= 0.5 + 0.5 * depth_shade;

    let alpha = (1.0 - smoothstep(FALLOFF_START, MASK_RADIUS, d)) * MAX_ALPHA;
    return vec4<f32>(color, alpha);
}}
"#
    )
}
