//! Window surface setup for hosts that draw straight to a winit window.

use std::sync::Arc;

use winit::window::Window;

use crate::error::GpuError;

/// A configured window surface.
///
/// The device and queue are handed out separately so they can move into a
/// [`WgpuBackend`](super::WgpuBackend).
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Create instance, surface, adapter and device for `window` and
    /// configure the surface.
    pub async fn new(
        window: Arc<Window>,
    ) -> Result<(Self, wgpu::Device, wgpu::Queue), GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        tracing::info!(
            name = %info.name,
            backend = ?info.backend,
            device_type = ?info.device_type,
            "GPU adapter selected"
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: requested_limits(&adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format =
            pick_surface_format(&surface_caps.formats).ok_or(GpuError::NoSurfaceFormat)?;
        tracing::debug!(format = ?surface_format, "surface format selected");
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok((Self { surface, config }, device, queue))
    }

    /// Reconfigure after a window resize. Zero sizes are ignored.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(device, &self.config);
        }
    }

    /// Reconfigure with the current size, after the surface was lost.
    pub fn reconfigure(&self, device: &wgpu::Device) {
        self.surface.configure(device, &self.config);
    }
}

/// Default limits, with texture dimensions raised to whatever the adapter
/// supports so large wind grids still fit.
fn requested_limits(adapter: &wgpu::Limits) -> wgpu::Limits {
    wgpu::Limits::default().using_resolution(adapter.clone())
}

/// Prefer a non-sRGB format. The palette values are display-space colors and
/// blending happens on them directly; an sRGB target would gamma-encode them
/// on store and drift from the software backend's output.
fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first())
        .copied()
}
