//! # Block Type Module
//!
//! How a block is drawn. Icons only distinguish three cases: gas (nothing),
//! sprite (crossed quads) and everything else (a cuboid).

use serde::{Deserialize, Serialize};

/// Enumerates the ways a block can be drawn.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawType {
    /// Solid block that hides whatever is behind it.
    #[default]
    Opaque,
    /// Cut-out transparency, e.g. glass.
    Transparent,
    /// Cut-out transparency that still draws inner faces, e.g. leaves.
    TransparentThick,
    /// Blended transparency, e.g. water.
    Translucent,
    /// Not drawn at all, e.g. air.
    Gas,
    /// Drawn as two crossed quads, e.g. flowers and saplings.
    Sprite,
}

impl DrawType {
    /// Whether anything is drawn for this block.
    pub fn is_visible(self) -> bool {
        self != DrawType::Gas
    }

    /// Whether the block is drawn as a cuboid with textured faces.
    pub fn is_cuboid(self) -> bool {
        !matches!(self, DrawType::Gas | DrawType::Sprite)
    }
}
