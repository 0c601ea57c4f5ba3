//! # Application State
//!
//! The winit side of the viewer. Graphics are built asynchronously after the
//! first `resumed`; once they arrive, and the surface has a size, they are
//! handed to an [`EngineState`] and the viewer starts redrawing every time
//! the event loop goes idle.

pub mod graphics_resources_builder;

use std::sync::Arc;

use graphics_resources_builder::{Graphics, GraphicsBuilder, MaybeGraphics};
use log::debug;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::engine_state::EngineState;

/// Drives the viewer through the winit application lifecycle.
pub struct ApplicationState {
    /// Graphics initialization progress
    pub graphics: MaybeGraphics,
    /// Set once the engine state exists
    pub state: Option<InitializedApplicationState>,
    /// Last size reported before the engine state existed
    pub web_window_size: Option<PhysicalSize<u32>>,
}

/// The running viewer.
pub struct InitializedApplicationState {
    /// Owns the GPU resources and draws the icon grid
    pub engine_state: EngineState,
    /// Window the surface presents to
    pub window: Arc<Window>,
    /// When the event loop last went idle
    pub last_wait_time: web_time::Instant,
}

/// The key of a press event, if `event` is one.
fn pressed_key(event: &WindowEvent) -> Option<KeyCode> {
    match event {
        WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    state: ElementState::Pressed,
                    physical_key: PhysicalKey::Code(key),
                    ..
                },
            ..
        } => Some(*key),
        _ => None,
    }
}

fn requests_exit(event: &WindowEvent) -> bool {
    matches!(event, WindowEvent::CloseRequested) || pressed_key(event) == Some(KeyCode::Escape)
}

impl ApplicationState {
    /// Creates the application with a graphics builder that reports back
    /// through `proxy`.
    pub fn new(proxy: EventLoopProxy<Graphics>) -> Self {
        Self {
            graphics: MaybeGraphics::Builder(GraphicsBuilder::new(proxy)),
            state: None,
            web_window_size: None,
        }
    }

    /// Configures the pending surface with its first real size and starts
    /// the viewer.
    fn configure_pending_surface(&mut self, size: PhysicalSize<u32>) {
        let MaybeGraphics::Graphics(gfx) = &mut self.graphics else {
            return;
        };
        let (Some(surface), Some(surface_config), Some(device)) =
            (&gfx.surface, &mut gfx.surface_config, &gfx.device)
        else {
            return;
        };

        surface_config.width = size.width.max(1);
        surface_config.height = size.height.max(1);
        surface.configure(device, surface_config);
        self.start_viewer();
    }

    /// Moves the finished graphics into a new [`EngineState`].
    fn start_viewer(&mut self) {
        if !matches!(self.graphics, MaybeGraphics::Graphics(_)) {
            return;
        }
        let MaybeGraphics::Graphics(gfx) = std::mem::replace(&mut self.graphics, MaybeGraphics::Moved)
        else {
            return;
        };

        let (Some(window), Some(surface), Some(surface_config), Some(device), Some(queue)) = (
            gfx.window,
            gfx.surface,
            gfx.surface_config,
            gfx.device,
            gfx.queue,
        ) else {
            log::error!("Graphics arrived incomplete, the viewer cannot start");
            return;
        };

        let engine_state = EngineState::new(
            surface,
            surface_config,
            device,
            queue,
            gfx.shader_file_string,
            &gfx.config,
        );
        debug!("Viewer started");

        self.state = Some(InitializedApplicationState {
            engine_state,
            window,
            last_wait_time: web_time::Instant::now(),
        });
    }
}

impl ApplicationHandler<Graphics> for ApplicationState {
    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if requests_exit(&event) {
            event_loop.exit();
            return;
        }

        let Some(state) = &mut self.state else {
            if let WindowEvent::Resized(size) = event {
                self.web_window_size = Some(size);
                self.configure_pending_surface(size);
            }
            return;
        };

        match event {
            WindowEvent::Resized(size) => state.engine_state.resize_surface(size),
            WindowEvent::RedrawRequested => state.engine_state.render(),
            _ => {
                if let Some(key) = pressed_key(&event) {
                    state.engine_state.handle_key(key);
                }
            }
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let MaybeGraphics::Builder(builder) = &mut self.graphics {
            builder.build_and_send(event_loop);
        }
    }

    /// Receives the built graphics. A web canvas may still be unsized, in
    /// which case the viewer starts on the first resize.
    fn user_event(&mut self, _event_loop: &ActiveEventLoop, graphics: Graphics) {
        let is_surface_configured = graphics.is_surface_configured;
        self.graphics = MaybeGraphics::Graphics(graphics);

        if is_surface_configured {
            self.start_viewer();
        } else if let Some(size) = self.web_window_size {
            self.configure_pending_surface(size);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let Some(state) = &mut self.state else {
            return;
        };

        let now = web_time::Instant::now();
        state
            .engine_state
            .set_frame_time(now.duration_since(state.last_wait_time));
        state.last_wait_time = now;
        state.window.request_redraw();
    }
}
