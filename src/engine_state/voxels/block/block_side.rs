//! # Block Side Module
//!
//! The six faces of a block. The discriminants double as indices into a
//! block definition's texture table.

use serde::{Deserialize, Serialize};

/// One face of a voxel block, named by the axis it faces along.
///
/// The order is: [XMin, XMax, ZMin, ZMax, YMin, YMax]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, Serialize, Deserialize)]
pub enum BlockSide {
    /// Face pointing towards negative X
    XMin = 0,
    /// Face pointing towards positive X
    XMax = 1,
    /// Face pointing towards negative Z
    ZMin = 2,
    /// Face pointing towards positive Z
    ZMax = 3,
    /// The bottom face
    YMin = 4,
    /// The top face
    YMax = 5,
}

impl BlockSide {
    /// Returns all six faces in texture table order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::XMin,
            BlockSide::XMax,
            BlockSide::ZMin,
            BlockSide::ZMax,
            BlockSide::YMin,
            BlockSide::YMax,
        ]
    }

    /// Index of this face in a `[_; 6]` texture table.
    pub fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_table_order() {
        for (i, side) in BlockSide::all().into_iter().enumerate() {
            assert_eq!(side.index(), i);
        }
    }
}
