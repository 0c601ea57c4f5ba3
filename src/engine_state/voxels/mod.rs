//! # Voxels
//!
//! Block definitions: draw types, bounding boxes and per-face textures.

pub mod block;
