//! # Block Module
//!
//! Block property tables: for every block id, how it is drawn, its bounding
//! box, its tint and which atlas tile each face samples.
//!
//! The table is usually loaded from JSON. A built-in table covering the
//! classic block set is used when no file is configured.

use std::{fs, path::Path};

use cgmath::Vector3;
use log::info;
use serde::{Deserialize, Serialize};

use block_side::BlockSide;
use block_type::DrawType;

use crate::{
    engine_state::rendering::{atlas::TextureLoc, color::PackedColor},
    error::{IconError, IconResult},
};

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to identify blocks.
pub type BlockTypeSize = u16;

/// Identifier of a block, an index into the [`BlockRegistry`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub BlockTypeSize);

impl BlockId {
    /// The air block, present in every table.
    pub const AIR: BlockId = BlockId(0);
}

/// Per-face atlas locations, indexed by [`BlockSide`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TextureEntry", into = "[TextureLoc; 6]")]
pub struct FaceTextures(pub [TextureLoc; 6]);

impl FaceTextures {
    /// Uses the same tile on every face.
    pub fn all(loc: TextureLoc) -> Self {
        Self([loc; 6])
    }

    /// Uses `top` and `bottom` on the Y faces and `side` on the other four.
    pub fn top_side_bottom(top: TextureLoc, side: TextureLoc, bottom: TextureLoc) -> Self {
        Self([side, side, side, side, bottom, top])
    }

    /// Returns the tile for `side`.
    pub fn get(&self, side: BlockSide) -> TextureLoc {
        self.0[side.index()]
    }
}

impl From<FaceTextures> for [TextureLoc; 6] {
    fn from(textures: FaceTextures) -> Self {
        textures.0
    }
}

/// The shapes `textures` may take in a block table file.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextureEntry {
    All(TextureLoc),
    TopSideBottom {
        top: TextureLoc,
        side: TextureLoc,
        bottom: TextureLoc,
    },
    PerFace([TextureLoc; 6]),
}

impl From<TextureEntry> for FaceTextures {
    fn from(entry: TextureEntry) -> Self {
        match entry {
            TextureEntry::All(loc) => FaceTextures::all(loc),
            TextureEntry::TopSideBottom { top, side, bottom } => {
                FaceTextures::top_side_bottom(top, side, bottom)
            }
            TextureEntry::PerFace(locs) => FaceTextures(locs),
        }
    }
}

fn full_min() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}

fn full_max() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// Everything the icon drawer needs to know about one block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    /// Display name
    pub name: String,
    /// How the block is drawn
    #[serde(default)]
    pub draw: DrawType,
    /// Ignores face shading when set (lava, glowing blocks)
    #[serde(default)]
    pub full_bright: bool,
    /// Multiplies face colours by `fog_color` when set
    #[serde(default)]
    pub tinted: bool,
    /// Fog colour, also used as the tint colour
    #[serde(default)]
    pub fog_color: PackedColor,
    /// Minimum corner of the bounding box, in block units
    #[serde(default = "full_min")]
    pub min_bb: [f32; 3],
    /// Maximum corner of the bounding box, in block units
    #[serde(default = "full_max")]
    pub max_bb: [f32; 3],
    /// Atlas tile per face
    pub textures: FaceTextures,
}

impl BlockDefinition {
    /// A full opaque cube.
    pub fn cube(name: &str, textures: FaceTextures) -> Self {
        Self {
            name: name.to_string(),
            draw: DrawType::Opaque,
            full_bright: false,
            tinted: false,
            fog_color: PackedColor::WHITE,
            min_bb: full_min(),
            max_bb: full_max(),
            textures,
        }
    }

    /// A sprite block drawn with a single tile.
    pub fn sprite(name: &str, texture: TextureLoc) -> Self {
        Self {
            draw: DrawType::Sprite,
            ..Self::cube(name, FaceTextures::all(texture))
        }
    }

    /// Minimum corner of the bounding box.
    pub fn min_bb(&self) -> Vector3<f32> {
        self.min_bb.into()
    }

    /// Maximum corner of the bounding box.
    pub fn max_bb(&self) -> Vector3<f32> {
        self.max_bb.into()
    }

    fn with_draw(mut self, draw: DrawType) -> Self {
        self.draw = draw;
        self
    }

    fn with_bounds(mut self, min_bb: [f32; 3], max_bb: [f32; 3]) -> Self {
        self.min_bb = min_bb;
        self.max_bb = max_bb;
        self
    }

    fn with_fog(mut self, fog_color: PackedColor) -> Self {
        self.fog_color = fog_color;
        self
    }

    fn with_tint(self, fog_color: PackedColor) -> Self {
        Self {
            tinted: true,
            ..self.with_fog(fog_color)
        }
    }

    fn bright(mut self) -> Self {
        self.full_bright = true;
        self
    }
}

#[derive(Deserialize)]
struct BlockTableFile {
    blocks: Vec<BlockDefinition>,
}

/// Block property table, indexed by [`BlockId`].
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    definitions: Vec<BlockDefinition>,
}

impl BlockRegistry {
    /// Builds a registry from definitions. The first definition becomes id 0.
    pub fn new(definitions: Vec<BlockDefinition>) -> Self {
        Self { definitions }
    }

    /// Parses a block table of the form `{"blocks": [...]}`.
    pub fn from_json_str(json: &str) -> IconResult<Self> {
        let file: BlockTableFile = serde_json::from_str(json)?;
        Ok(Self::new(file.blocks))
    }

    /// Reads and parses a block table file.
    pub fn from_json_file(path: impl AsRef<Path>) -> IconResult<Self> {
        let path = path.as_ref();
        let registry = Self::from_json_str(&fs::read_to_string(path)?)?;
        info!(
            "Loaded {} block definitions from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Looks up a block definition.
    pub fn get(&self, id: BlockId) -> IconResult<&BlockDefinition> {
        self.definitions
            .get(id.0 as usize)
            .ok_or(IconError::UnknownBlock(id))
    }

    /// Atlas tile of one face of a block.
    pub fn texture_loc(&self, id: BlockId, side: BlockSide) -> IconResult<TextureLoc> {
        Ok(self.get(id)?.textures.get(side))
    }

    /// Number of registered blocks.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Iterates over every registered id in order.
    pub fn ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        (0..self.definitions.len()).map(|i| BlockId(i as BlockTypeSize))
    }

    /// Highest atlas tile referenced by any block, if any block exists.
    pub fn max_texture_loc(&self) -> Option<TextureLoc> {
        self.definitions
            .iter()
            .flat_map(|def| def.textures.0)
            .max()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        let water = PackedColor::new(5, 5, 51, 255);
        let leaves = PackedColor::new(120, 190, 90, 255);

        Self::new(vec![
            BlockDefinition::cube("Air", FaceTextures::all(0)).with_draw(DrawType::Gas),
            BlockDefinition::cube("Stone", FaceTextures::all(1)),
            BlockDefinition::cube("Grass", FaceTextures::top_side_bottom(0, 3, 2)),
            BlockDefinition::cube("Dirt", FaceTextures::all(2)),
            BlockDefinition::cube("Cobblestone", FaceTextures::all(16)),
            BlockDefinition::cube("Wood", FaceTextures::all(4)),
            BlockDefinition::sprite("Sapling", 15),
            BlockDefinition::cube("Water", FaceTextures::all(14))
                .with_draw(DrawType::Translucent)
                .with_fog(water),
            BlockDefinition::cube("Lava", FaceTextures::all(30)).bright(),
            BlockDefinition::cube("Sand", FaceTextures::all(18)),
            BlockDefinition::cube("Log", FaceTextures::top_side_bottom(21, 20, 21)),
            BlockDefinition::cube("Leaves", FaceTextures::all(22))
                .with_draw(DrawType::TransparentThick)
                .with_tint(leaves),
            BlockDefinition::cube("Glass", FaceTextures::all(49)).with_draw(DrawType::Transparent),
            BlockDefinition::cube("Slab", FaceTextures::top_side_bottom(6, 5, 6))
                .with_bounds([0.0, 0.0, 0.0], [1.0, 0.5, 1.0]),
            BlockDefinition::sprite("Dandelion", 13),
            BlockDefinition::sprite("Rose", 12),
            BlockDefinition::cube("Snow", FaceTextures::all(66))
                .with_draw(DrawType::Translucent)
                .with_bounds([0.0, 0.0, 0.0], [1.0, 0.125, 1.0]),
            BlockDefinition::cube("Iron", FaceTextures::top_side_bottom(24, 40, 56)),
        ])
    }
}
