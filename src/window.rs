use std::sync::Arc;

use windshell::{
    GpuContext, GpuTarget, RenderError, RendererConfig, WgpuBackend, WindField, WindRenderer,
};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

struct Viewer {
    window: Arc<Window>,
    context: GpuContext,
    renderer: WindRenderer<WgpuBackend>,
}

impl Viewer {
    async fn new(
        window: Arc<Window>,
        field: &WindField,
        config: RendererConfig,
    ) -> Result<Self, RenderError> {
        let (context, device, queue) = GpuContext::new(window.clone()).await?;
        let backend = WgpuBackend::new(device, queue, context.config.format, &config).await?;
        let mut renderer = WindRenderer::new(backend, config)?;
        renderer.set_wind(field)?;
        Ok(Self {
            window,
            context,
            renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        let device = self.renderer.backend().device();
        self.context.resize(device, width, height);
    }

    fn render(&mut self) -> Result<(), RenderError> {
        let output = self.context.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.renderer.draw(GpuTarget {
            view: &view,
            width: self.context.config.width,
            height: self.context.config.height,
        })?;
        self.window.pre_present_notify();
        output.present();
        Ok(())
    }
}

pub struct App {
    field: WindField,
    config: RendererConfig,
    viewer: Option<Viewer>,
    failed: bool,
}

impl App {
    pub fn new(field: WindField, config: RendererConfig) -> Self {
        Self {
            field,
            config,
            viewer: None,
            failed: false,
        }
    }

    /// Whether startup or rendering hit an unrecoverable error.
    pub fn failed(&self) -> bool {
        self.failed
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop) {
        self.failed = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        let window_attrs = Window::default_attributes()
            .with_title("windshell")
            .with_inner_size(winit::dpi::LogicalSize::new(900, 900));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("Failed to create window: {e}");
                self.fail(event_loop);
                return;
            }
        };

        match pollster::block_on(Viewer::new(window, &self.field, self.config.clone())) {
            Ok(viewer) => {
                viewer.window.request_redraw();
                self.viewer = Some(viewer);
            }
            Err(e) => {
                tracing::error!("Failed to initialize renderer: {e}");
                self.fail(event_loop);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(viewer) = &mut self.viewer else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                viewer.resize(size.width, size.height);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match logical_key {
                Key::Character(c) if c.eq_ignore_ascii_case("r") => {
                    if let Err(e) = viewer.renderer.reset_particles() {
                        tracing::warn!("Particle reset failed: {e}");
                    }
                }
                Key::Named(NamedKey::Escape) => event_loop.exit(),
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                match viewer.render() {
                    Ok(()) => {}
                    Err(RenderError::Surface(
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                    )) => {
                        let device = viewer.renderer.backend().device();
                        viewer.context.reconfigure(device);
                    }
                    Err(RenderError::Surface(wgpu::SurfaceError::Timeout)) => {
                        tracing::debug!("Surface timeout, skipping frame");
                    }
                    Err(e) => {
                        tracing::error!("Render error: {e}");
                        self.fail(event_loop);
                        return;
                    }
                }
                viewer.window.request_redraw();
            }
            _ => {}
        }
    }
}
