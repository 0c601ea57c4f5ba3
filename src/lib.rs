#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Block Icons
//!
//! Renders blocks as small isometric icons, the way an inventory or hotbar
//! shows them, with WGPU.
//!
//! ## Key Modules
//!
//! * `application_state` - Window lifecycle and asynchronous graphics setup
//! * `core` - Shared-ownership containers for rendering systems
//! * `engine_state` - The drawer, the block table, the 1D terrain atlas and
//!   the WebGPU icon renderer
//!
//! ## Drawing icons
//!
//! The drawer only needs something implementing [`IconTarget`], so it can be
//! driven without a GPU:
//!
//! ```ignore
//! let registry = BlockRegistry::default();
//! let atlas = TerrainAtlas1D::new(256, 16, 4096)?;
//! let mut drawer = IsometricDrawer::new(4096);
//!
//! let mut batch = drawer.begin_batch(&mut target, &registry, &atlas);
//! batch.draw(BlockId(1), 32.0, 40.0, 40.0)?;
//! let stats = batch.end();
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! fn main() {
//!     block_icons::run();
//! }
//! ```
//!
//! For web applications `run_web` is exported to JavaScript.

use application_state::ApplicationState;
#[cfg(target_family = "wasm")]
use wasm_bindgen::prelude::wasm_bindgen;

use winit::event_loop::EventLoop;

#[cfg(not(target_family = "wasm"))]
use log::{error, info};

mod application_state;
mod config;
mod core;
mod engine_state;
mod error;

pub use config::{IconConfig, CONFIG_PATH};
pub use engine_state::{
    inventory::InventoryLayout,
    rendering::{
        atlas::{TerrainAtlas1D, TextureLoc, TextureRec, ATLAS2D_TILES_PER_ROW, UV2_SCALE},
        color::PackedColor,
        isometric::{
            BatchStats, IconBatch, IconTarget, IsoProjection, IsometricDrawer,
            MIN_STAGING_VERTICES, VERTICES_PER_QUAD,
        },
        quad_indices, screen_projection,
        texture::{build_strip, build_strips, procedural_atlas},
        DrawList, FrameRecorder, IconDraw, IconVertex, MAX_FRAME_TRANSFORMS,
    },
    voxels::block::{
        block_side::BlockSide, block_type::DrawType, BlockDefinition, BlockId, BlockRegistry,
        FaceTextures,
    },
    ViewerAction,
};
pub use error::{IconError, IconResult};

#[cfg(target_family = "wasm")]
const CANVAS_ID: &str = "wgpu-canvas";

/// Starts the native viewer. Logs go to stdout, filtered by `RUST_LOG`.
#[cfg(not(target_family = "wasm"))]
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");
    let event_loop = match EventLoop::with_user_event().build() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            error!("Could not create the event loop: {err}");
            return;
        }
    };

    let mut state = ApplicationState::new(event_loop.create_proxy());
    if let Err(err) = event_loop.run_app(&mut state) {
        error!("Event loop stopped with an error: {err}");
    }
}

/// Starts the viewer in the browser, drawing into the `wgpu-canvas` element.
#[cfg(target_family = "wasm")]
#[wasm_bindgen]
pub fn run_web() {
    use winit::platform::web::EventLoopExtWebSys;

    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    console_log::init_with_level(log::Level::Info).expect("Couldn't initialize logger");

    let event_loop = EventLoop::with_user_event()
        .build()
        .expect("Couldn't create the event loop");

    let state = ApplicationState::new(event_loop.create_proxy());
    event_loop.spawn_app(state);
}
