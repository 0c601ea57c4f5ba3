//! Viewer configuration.
//!
//! Read from `assets/icons.json` when the file exists; every missing field
//! falls back to its default.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    engine_state::{
        rendering::{atlas::ATLAS2D_TILES_PER_ROW, texture::procedural_atlas},
        voxels::block::BlockRegistry,
    },
    error::IconResult,
};

/// Where the viewer looks for its configuration.
pub const CONFIG_PATH: &str = "assets/icons.json";

/// Tile size of the generated placeholder atlas.
const PROCEDURAL_TILE_SIZE: u32 = 16;

/// Settings for the icon viewer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    /// Title of the viewer window
    pub window_title: String,
    /// Icon size passed to the drawer; icons are twice this wide
    pub icon_size: f32,
    /// Inventory slots per row
    pub columns: u32,
    /// Distance between slot centres in pixels
    pub slot_size: f32,
    /// Centre of the first slot in pixels
    pub origin: [f32; 2],
    /// Capacity of the drawer's staging buffer
    pub staging_vertices: usize,
    /// Capacity of the GPU vertex buffer for one frame
    pub frame_vertices: u32,
    /// Upper bound on the height of one 1D atlas strip
    pub max_texture_height: u32,
    /// 2D terrain atlas PNG; a placeholder is generated when absent
    pub atlas_path: Option<PathBuf>,
    /// Block table JSON; the built-in table is used when absent
    pub blocks_path: Option<PathBuf>,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            window_title: String::from("Block Icons"),
            icon_size: 24.0,
            columns: 9,
            slot_size: 64.0,
            origin: [48.0, 48.0],
            staging_vertices: 4096,
            frame_vertices: 65_536,
            max_texture_height: 4096,
            atlas_path: None,
            blocks_path: None,
        }
    }
}

impl IconConfig {
    /// Parses a configuration from JSON.
    pub fn from_json_str(json: &str) -> IconResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads the configuration at `path`, or the defaults if there is no
    /// such file.
    pub fn load_or_default(path: impl AsRef<Path>) -> IconResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let config = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// The block table named by `blocks_path`, or the built-in one.
    pub fn load_registry(&self) -> IconResult<BlockRegistry> {
        match &self.blocks_path {
            Some(path) => BlockRegistry::from_json_file(path),
            None => Ok(BlockRegistry::default()),
        }
    }

    /// The 2D terrain atlas named by `atlas_path`, or a generated one tall
    /// enough for every texture in `registry`.
    pub fn load_atlas_image(&self, registry: &BlockRegistry) -> IconResult<RgbaImage> {
        if let Some(path) = &self.atlas_path {
            let atlas = image::open(path)?.to_rgba8();
            info!(
                "Loaded {}x{} terrain atlas from {}",
                atlas.width(),
                atlas.height(),
                path.display()
            );
            return Ok(atlas);
        }

        let rows = registry
            .max_texture_loc()
            .map_or(1, |loc| loc as u32 / ATLAS2D_TILES_PER_ROW + 1);
        Ok(procedural_atlas(PROCEDURAL_TILE_SIZE, rows))
    }
}
