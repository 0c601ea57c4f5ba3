//! # Graphics Resources Builder
//!
//! Window, surface and device creation for the icon viewer. Creation is
//! asynchronous because adapters and devices are requested through futures;
//! natively those are driven with `pollster`, in the browser with
//! `wasm_bindgen_futures`.
//!
//! Once ready, a [`Graphics`] is sent back through the event loop proxy as a
//! user event.

use std::future::Future;
use std::sync::Arc;

#[cfg(target_family = "wasm")]
use wasm_bindgen::UnwrapThrowExt;

use wgpu::{
    Adapter, Device, Features, Instance, Queue, Surface, SurfaceConfiguration, TextureFormat,
};
use winit::{
    dpi::PhysicalSize,
    event_loop::{ActiveEventLoop, EventLoopProxy},
    window::{Window, WindowAttributes},
};

use crate::config::IconConfig;
#[cfg(target_family = "wasm")]
use crate::CANVAS_ID;

/// WGSL source of the icon pipeline.
const ICON_SHADER: &str = include_str!("../../assets/shaders/icon.wgsl");

/// Everything the viewer needs from the platform before it can draw.
#[allow(dead_code)]
#[derive(Default)]
pub struct Graphics {
    pub window: Option<Arc<Window>>,
    pub instance: Option<Instance>,
    pub surface: Option<Surface<'static>>,
    pub surface_config: Option<SurfaceConfiguration>,
    pub adapter: Option<Adapter>,
    pub device: Option<Device>,
    pub queue: Option<Queue>,
    /// WGSL source the icon pipeline is compiled from
    pub shader_file_string: String,
    /// Viewer settings loaded before the window was created
    pub config: IconConfig,
    /// `false` while a web canvas still waits for its first size
    pub is_surface_configured: bool,
}

cfg_if::cfg_if! {
    if #[cfg(target_family = "wasm")] {
        /// The browser build has no file system and always uses the defaults.
        fn load_config() -> IconConfig {
            IconConfig::default()
        }

        /// Wraps the page's canvas.
        fn window_attributes(config: &IconConfig) -> WindowAttributes {
            use web_sys::wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID))
                .unwrap_throw();
            Window::default_attributes()
                .with_title(config.window_title.clone())
                .with_canvas(Some(canvas.unchecked_into()))
        }
    } else {
        fn load_config() -> IconConfig {
            IconConfig::load_or_default(crate::config::CONFIG_PATH).unwrap_or_else(|err| {
                log::error!("Ignoring unreadable configuration: {err}");
                IconConfig::default()
            })
        }

        fn window_attributes(config: &IconConfig) -> WindowAttributes {
            Window::default_attributes().with_title(config.window_title.clone())
        }
    }
}

fn create_instance() -> Instance {
    let backends = if cfg!(target_family = "wasm") {
        wgpu::Backends::GL | wgpu::Backends::BROWSER_WEBGPU
    } else {
        wgpu::Backends::PRIMARY
    };

    Instance::new(&wgpu::InstanceDescriptor {
        backends,
        flags: wgpu::InstanceFlags::empty(),
        backend_options: wgpu::BackendOptions::from_env_or_default(),
    })
}

/// Icons need no optional features. WebGL2 limits apply in the browser.
async fn request_device(adapter: &Adapter) -> Result<(Device, Queue), wgpu::RequestDeviceError> {
    let required_limits = if cfg!(target_family = "wasm") {
        wgpu::Limits::downlevel_webgl2_defaults()
    } else {
        wgpu::Limits::default()
    };

    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Icon Device"),
            required_features: Features::empty(),
            required_limits,
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::Off,
        })
        .await
}

/// Prefers an sRGB format so atlas colours come out as authored.
fn preferred_format(formats: &[TextureFormat]) -> TextureFormat {
    formats
        .iter()
        .copied()
        .find(TextureFormat::is_srgb)
        .unwrap_or(formats[0])
}

fn surface_config_for(
    surface: &Surface,
    adapter: &Adapter,
    size: PhysicalSize<u32>,
) -> SurfaceConfiguration {
    let caps = surface.get_capabilities(adapter);

    SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: preferred_format(&caps.formats),
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: caps.present_modes[0],
        alpha_mode: caps.alpha_modes[0],
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    }
}

/// Creates the window synchronously and returns a future that finishes the
/// GPU setup.
///
/// # Panics
///
/// Panics when no window, surface, adapter or device can be created; the
/// viewer has nothing to fall back to.
fn create_graphics(event_loop: &ActiveEventLoop) -> impl Future<Output = Graphics> + 'static {
    let config = load_config();

    let window = Arc::new(
        event_loop
            .create_window(window_attributes(&config))
            .expect("Failed to create the viewer window"),
    );
    let instance = create_instance();
    let surface = instance
        .create_surface(window.clone())
        .expect("Failed to create a surface for the window");

    async move {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("No adapter can present to the window");

        let (device, queue) = request_device(&adapter)
            .await
            .expect("Failed to open the GPU device");
        log::info!("Rendering icons with {:?}", adapter.get_info().backend);

        let surface_config = surface_config_for(&surface, &adapter, window.inner_size());

        // A web canvas has no size until its first resize event.
        let is_surface_configured = cfg!(not(target_family = "wasm"));
        if is_surface_configured {
            surface.configure(&device, &surface_config);
        }

        Graphics {
            window: Some(window),
            instance: Some(instance),
            surface: Some(surface),
            surface_config: Some(surface_config),
            adapter: Some(adapter),
            device: Some(device),
            queue: Some(queue),
            shader_file_string: ICON_SHADER.to_string(),
            config,
            is_surface_configured,
        }
    }
}

/// Sends a finished [`Graphics`] back to the event loop, once.
pub struct GraphicsBuilder {
    event_loop_proxy: Option<EventLoopProxy<Graphics>>,
}

/// Where graphics initialization currently stands.
pub enum MaybeGraphics {
    /// Waiting for `resumed` to start the build
    Builder(GraphicsBuilder),
    /// Built, but the engine state does not own it yet
    Graphics(Graphics),
    /// Handed over to the engine state
    Moved,
}

impl GraphicsBuilder {
    /// Creates a builder that reports back through `event_loop_proxy`.
    pub fn new(event_loop_proxy: EventLoopProxy<Graphics>) -> Self {
        Self {
            event_loop_proxy: Some(event_loop_proxy),
        }
    }

    /// Starts building. Later calls do nothing.
    pub fn build_and_send(&mut self, event_loop: &ActiveEventLoop) {
        let Some(event_loop_proxy) = self.event_loop_proxy.take() else {
            return;
        };
        let graphics = create_graphics(event_loop);

        cfg_if::cfg_if! {
            if #[cfg(target_family = "wasm")] {
                wasm_bindgen_futures::spawn_local(async move {
                    send_graphics(&event_loop_proxy, graphics.await);
                });
            } else {
                send_graphics(&event_loop_proxy, pollster::block_on(graphics));
            }
        }
    }
}

fn send_graphics(event_loop_proxy: &EventLoopProxy<Graphics>, graphics: Graphics) {
    if event_loop_proxy.send_event(graphics).is_err() {
        log::error!("Event loop closed before graphics were ready");
    }
}
