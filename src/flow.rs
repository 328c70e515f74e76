//! Host configuration, the scene and the application event loop.
//!
//! # Lifecycle
//!
//! The event loop follows this pattern:
//! 1. On resume: create the window and GPU context, load every primitive once
//! 2. Each redraw: `update(dt)` then `draw(dt)` on every primitive, in order
//! 3. Prepare and replay the recorded frame, then present
//! 4. On exit (exit key or window close): dispose every primitive
//!
//! A load failure ends the loop and is returned from [`run`].

use std::{iter, sync::Arc};

use anyhow::Context as _;
use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{
    context::Context,
    data_structures::primitive::Primitive,
    error::{Error, LoadState},
    gpu::GpuBackend,
    render::Frame,
};

/// Window and loop settings.
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// RGBA, each in 0.0..=1.0.
    pub clear_colour: [f64; 4],
    pub exit_key: KeyCode,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            title: "prim-ngin".to_string(),
            width: 800,
            height: 600,
            clear_colour: [0.2, 0.3, 0.3, 1.0],
            exit_key: KeyCode::Escape,
        }
    }
}

impl HostConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_clear_colour(mut self, clear_colour: [f64; 4]) -> Self {
        self.clear_colour = clear_colour;
        self
    }

    pub fn with_exit_key(mut self, exit_key: KeyCode) -> Self {
        self.exit_key = exit_key;
        self
    }

    /// Whether a key event should close the host. Only presses count.
    pub fn is_exit_key(&self, key: PhysicalKey, state: ElementState) -> bool {
        state == ElementState::Pressed && key == PhysicalKey::Code(self.exit_key)
    }
}

/// The primitives the host drives, in draw order.
#[derive(Debug, Default)]
pub struct Scene {
    primitives: Vec<Primitive>,
}

impl Scene {
    pub fn new(primitives: Vec<Primitive>) -> Self {
        Self { primitives }
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Load every primitive that has not been loaded yet. Stops at the first
    /// failure; primitives loaded before it stay loaded.
    pub fn load(&mut self, gpu: &mut dyn GpuBackend) -> Result<(), Error> {
        for primitive in self
            .primitives
            .iter_mut()
            .filter(|p| p.state() == LoadState::Unloaded)
        {
            primitive.load(gpu)?;
        }
        Ok(())
    }

    /// Update then draw each primitive, recording into a fresh frame.
    pub fn frame(&mut self, dt: Duration) -> Result<Frame, Error> {
        let mut frame = Frame::new();
        for primitive in &mut self.primitives {
            primitive.update(dt)?;
            primitive.draw(&mut frame, dt)?;
        }
        Ok(frame)
    }

    pub fn dispose(&mut self, gpu: &mut dyn GpuBackend) {
        for primitive in &mut self.primitives {
            primitive.dispose(gpu);
        }
    }
}

struct AppState {
    ctx: Context,
    scene: Scene,
    is_surface_configured: bool,
}

impl AppState {
    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
        }
    }

    fn render(&mut self, frame: &Frame) -> Result<(), wgpu::CurrentSurfaceTexture> {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(texture)
            | wgpu::CurrentSurfaceTexture::Suboptimal(texture) => texture,
            other => return Err(other),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.ctx.backend.prepare(frame);

        let mut encoder = self
            .ctx
            .backend
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass: wgpu::RenderPass<'_> =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                    multiview_mask: None,
                });

            self.ctx.backend.replay(frame, &mut render_pass);
        }

        self.ctx.backend.queue().submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App {
    config: HostConfig,
    async_runtime: tokio::runtime::Runtime,
    state: Option<AppState>,
    // Handed to the scene on the first resume; `take()`n after use.
    primitives: Option<Vec<Primitive>>,
    last_time: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: HostConfig, primitives: Vec<Primitive>) -> anyhow::Result<Self> {
        let async_runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .context("cannot start the async runtime")?;
        Ok(Self {
            config,
            async_runtime,
            state: None,
            primitives: Some(primitives),
            last_time: Instant::now(),
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("cannot create the window")?,
        );

        let ctx = self
            .async_runtime
            .block_on(Context::new(window.clone(), &self.config))
            .context("cannot create the main context")?;

        let mut state = AppState {
            ctx,
            scene: Scene::new(self.primitives.take().unwrap_or_default()),
            is_surface_configured: false,
        };
        let size = window.inner_size();
        state.resize(size.width, size.height);

        let loaded = state.scene.load(&mut state.ctx.backend);
        // Kept even on failure so that whatever did load is disposed on exit.
        self.state = Some(state);
        loaded.context("cannot load the scene")?;

        log::info!("scene loaded");
        self.last_time = Instant::now();
        window.request_redraw();
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key,
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if self.config.is_exit_key(physical_key, key_state) {
                    log::info!("exit key pressed");
                    event_loop.exit();
                }
            }
            WindowEvent::MouseWheel { delta, .. } => log::trace!("scroll {:?}", delta),
            WindowEvent::Ime(ime) => log::trace!("text input {:?}", ime),
            WindowEvent::RedrawRequested => {
                let dt: Duration = self.last_time.elapsed();
                self.last_time = Instant::now();

                let frame = match state.scene.frame(dt) {
                    Ok(frame) => frame,
                    Err(e) => {
                        self.fail(event_loop, e.into());
                        return;
                    }
                };

                match state.render(&frame) {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {:?}", e);
                    }
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &mut self.state {
            state.scene.dispose(&mut state.ctx.backend);
        }
    }
}

/// Open a window and draw `primitives` until the exit key is pressed or the
/// window is closed.
pub fn run(config: HostConfig, primitives: Vec<Primitive>) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, primitives)?;

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
