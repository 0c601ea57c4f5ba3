//! # Engine State Module
//!
//! Owns everything the icon viewer needs once graphics are up: the renderer,
//! the isometric drawer, the block table, the atlas layout and the inventory
//! grid.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container for the viewer
//! * `buffer_state` - Named GPU buffers with memory accounting
//! * `inventory` - Slot placement for the icon grid
//! * `rendering` - The drawer, the atlas and the WebGPU backend
//! * `voxels` - Block definitions

use image::RgbaImage;
use log::{error, info, warn};
use rendering::{
    atlas::TerrainAtlas1D,
    isometric::{BatchStats, IsometricDrawer},
    texture, IconRendererManager, ICON_VERTEX_BUFFER,
};
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};
use winit::keyboard::KeyCode;

use crate::{
    config::IconConfig,
    core::StSystem,
    error::IconResult,
};
use inventory::InventoryLayout;
use voxels::block::{BlockId, BlockRegistry};

pub mod buffer_state;
pub mod inventory;
pub mod rendering;
pub mod voxels;

/// Pixels the grid moves per arrow key press
const PAN_STEP: f32 = 16.0;
/// Pixels the icons grow or shrink per `+` / `-` press
const ICON_SIZE_STEP: f32 = 4.0;
/// Tile size of the fallback atlas used when the configured one is unusable
const FALLBACK_TILE_SIZE: u32 = 16;

/// Viewer commands bound to keys.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ViewerAction {
    /// Enlarge every icon by one size step, up to the maximum size
    GrowIcons,
    /// Shrink every icon by one size step, down to the minimum size
    ShrinkIcons,
    /// Move the grid by this many pixels
    Pan(f32, f32),
    /// Log buffer memory use and the last batch's counters
    LogBufferUsage,
}

impl ViewerAction {
    /// The action bound to `key`, if any.
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::Equal | KeyCode::NumpadAdd => Some(ViewerAction::GrowIcons),
            KeyCode::Minus | KeyCode::NumpadSubtract => Some(ViewerAction::ShrinkIcons),
            KeyCode::ArrowLeft => Some(ViewerAction::Pan(-PAN_STEP, 0.0)),
            KeyCode::ArrowRight => Some(ViewerAction::Pan(PAN_STEP, 0.0)),
            KeyCode::ArrowUp => Some(ViewerAction::Pan(0.0, -PAN_STEP)),
            KeyCode::ArrowDown => Some(ViewerAction::Pan(0.0, PAN_STEP)),
            KeyCode::F3 => Some(ViewerAction::LogBufferUsage),
            _ => None,
        }
    }

    /// Applies layout changes. Returns `false` for actions that do not touch
    /// the layout.
    pub fn apply_to_layout(self, layout: &mut InventoryLayout) -> bool {
        match self {
            ViewerAction::GrowIcons => layout.resize_icons(ICON_SIZE_STEP),
            ViewerAction::ShrinkIcons => layout.resize_icons(-ICON_SIZE_STEP),
            ViewerAction::Pan(dx, dy) => layout.translate(dx, dy),
            ViewerAction::LogBufferUsage => return false,
        }
        true
    }
}

/// The main state container for the icon viewer.
///
/// # Examples
///
/// ```ignore
/// let mut engine_state = EngineState::new(
///     surface,
///     surface_config,
///     device,
///     queue,
///     shader_string,
///     &config,
/// );
///
/// engine_state.handle_key(KeyCode::Equal);
/// engine_state.render();
/// ```
pub struct EngineState {
    /// Surface, pipeline and icon renderer
    pub render_manager: IconRendererManager,
    /// Emits icon quads in batches
    pub drawer: IsometricDrawer,
    /// Block definitions, indexed by id
    pub registry: BlockRegistry,
    /// How texture locations map onto atlas strips
    pub atlas: TerrainAtlas1D,
    /// Where each icon goes
    pub layout: InventoryLayout,
    /// Blocks shown in the grid, in slot order
    icons: Vec<BlockId>,
    /// Counters from the most recent frame
    last_stats: BatchStats,
    /// Time between the two most recent event loop wake-ups
    frame_time: web_time::Duration,
}

impl EngineState {
    /// Creates the viewer state and uploads the atlas strips.
    ///
    /// Unreadable block tables or atlases are logged and replaced with the
    /// built-in ones.
    ///
    /// # Arguments
    ///
    /// * `surface` - The rendering surface
    /// * `surface_config` - Configuration for the rendering surface
    /// * `device` - The GPU device
    /// * `queue` - The GPU command queue
    /// * `shader_string` - WGSL source of the icon shader
    /// * `config` - Viewer configuration
    pub fn new(
        surface: Surface<'static>,
        surface_config: SurfaceConfiguration,
        device: Device,
        queue: Queue,
        shader_string: String,
        config: &IconConfig,
    ) -> Self {
        let max_texture_height = config
            .max_texture_height
            .min(device.limits().max_texture_dimension_2d);

        let registry = config.load_registry().unwrap_or_else(|err| {
            error!("Falling back to the built-in block table: {err}");
            BlockRegistry::default()
        });

        let (atlas, strips) = config
            .load_atlas_image(&registry)
            .and_then(|image| split_atlas(&image, max_texture_height))
            .unwrap_or_else(|err| {
                error!("Falling back to a generated atlas: {err}");
                let image = texture::procedural_atlas(FALLBACK_TILE_SIZE, FALLBACK_TILE_SIZE);
                split_atlas(&image, max_texture_height)
                    .expect("Device cannot hold a single atlas tile")
            });

        let device = StSystem::new(Box::new(device));
        let queue = StSystem::new(Box::new(queue));

        let render_manager = IconRendererManager::new(
            surface,
            surface_config,
            device,
            queue,
            shader_string,
            &strips,
            config.frame_vertices,
        );

        let icons: Vec<BlockId> = registry
            .ids()
            .filter(|id| {
                registry
                    .get(*id)
                    .map(|block| block.draw.is_visible())
                    .unwrap_or(false)
            })
            .collect();

        let layout = InventoryLayout::new(
            config.columns,
            config.slot_size,
            config.icon_size,
            config.origin,
        );

        info!(
            "Showing {} block icons in {} rows",
            icons.len(),
            layout.rows_for(icons.len())
        );

        Self {
            render_manager,
            drawer: IsometricDrawer::new(config.staging_vertices),
            registry,
            atlas,
            layout,
            icons,
            last_stats: BatchStats::default(),
            frame_time: web_time::Duration::ZERO,
        }
    }

    /// Resizes the rendering surface when the window size changes
    pub fn resize_surface(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        self.render_manager.resize_surface(size);
    }

    /// Records the time since the previous event loop wake-up.
    pub fn set_frame_time(&mut self, frame_time: web_time::Duration) {
        self.frame_time = frame_time;
    }

    /// Reacts to a key press.
    pub fn handle_key(&mut self, key: KeyCode) {
        let Some(action) = ViewerAction::from_key(key) else {
            return;
        };

        if !action.apply_to_layout(&mut self.layout) {
            self.log_buffer_usage();
        }
    }

    /// Draws every icon of the grid and presents the frame.
    pub fn render(&mut self) {
        let renderer = self.render_manager.begin_frame();
        let mut batch = self.drawer.begin_batch(renderer, &self.registry, &self.atlas);

        for (slot, block) in self.icons.iter().enumerate() {
            let (x, y) = self.layout.slot_center(slot);
            if let Err(err) = batch.draw(*block, self.layout.icon_size, x, y) {
                warn!("Skipping icon in slot {slot}: {err}");
            }
        }

        self.last_stats = batch.end();
        self.render_manager.render();
    }

    fn log_buffer_usage(&self) {
        let buffer_state = self.render_manager.pipeline_manager.buffer_state.get();
        let total = buffer_state.total_usage();
        info!("Total allocated memory: {}", total.allocated);
        info!("Total used memory: {}", total.used);
        info!("Total buffer writes: {}", total.writes);
        if let Some(vertices) = buffer_state.usage(ICON_VERTEX_BUFFER) {
            info!(
                "Icon vertex buffer: {} of {} bytes",
                vertices.used, vertices.allocated
            );
        }
        info!("Last frame: {:?} in {:?}", self.last_stats, self.frame_time);
    }
}

/// Lays out `image` as 1D strips no taller than `max_texture_height` and cuts
/// the strips out.
fn split_atlas(
    image: &RgbaImage,
    max_texture_height: u32,
) -> IconResult<(TerrainAtlas1D, Vec<RgbaImage>)> {
    let atlas = TerrainAtlas1D::for_atlas_2d(image.width(), image.height(), max_texture_height)?;
    let strips = texture::build_strips(image, &atlas)?;
    Ok((atlas, strips))
}
