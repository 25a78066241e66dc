//! Error types for windshell.
//!
//! Wind field construction, texture import, configuration, GPU setup and
//! per-frame drawing each have their own error enum. [`RenderError`] is what
//! the renderer and its backends return and wraps the others.

/// Errors raised while building a [`WindField`](crate::WindField).
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// Width or height is zero.
    #[error("wind grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },
    /// A component array does not hold `width * height` samples.
    #[error("component `{component}` has {actual} samples, expected {expected}")]
    ComponentLength {
        component: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The exporter JSON could not be parsed.
    #[error("invalid wind JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The wind file could not be read.
    #[error("failed to read wind file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while importing an encoded wind texture.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    /// Failed to decode or encode an image file.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    /// RGBA buffer length does not match the dimensions.
    #[error("RGBA data has {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    /// Zero-sized texture.
    #[error("encoded texture must be at least 1x1, got {width}x{height}")]
    Empty { width: u32, height: u32 },
}

/// Errors raised when particle positions break the `[0, 1)` invariant.
#[derive(Debug, thiserror::Error)]
pub enum ParticleError {
    #[error("particle {index} at ({x}, {y}) is outside [0, 1)")]
    OutOfRange { index: usize, x: f32, y: f32 },
}

/// Invalid [`RendererConfig`](crate::RendererConfig) values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("`{name}` must be finite")]
    NonFinite { name: &'static str },
    #[error("`{name}` must be greater than zero, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    /// Per-frame steps must keep time and rotation non-decreasing.
    #[error("`{name}` must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    /// The perspective divisor `base - z * depth` reaches zero inside the shell.
    #[error("perspective divisor vanishes for shell radius {radius}")]
    SingularPerspective { radius: f32 },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during GPU initialization and uploads.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    /// The surface reports no usable texture format for the adapter.
    #[error("surface has no supported texture format")]
    NoSurfaceFormat,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The generated WGSL failed to compile or the pipeline failed validation.
    #[error("shader compilation failed: {0}")]
    ShaderCompilation(String),
    /// The wind texture exceeds the device texture limit.
    #[error("wind texture {width}x{height} exceeds device limit {max}")]
    TextureTooLarge { width: u32, height: u32, max: u32 },
}

/// Errors returned by the renderer and its backends.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    /// The surface texture for the frame could not be acquired.
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
