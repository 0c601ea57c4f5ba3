//! Error type shared by the icon drawer, block tables and configuration loading.

use thiserror::Error;

use crate::engine_state::voxels::block::BlockId;

/// Everything that can go wrong while loading icon resources or emitting icons.
#[derive(Error, Debug)]
pub enum IconError {
    /// The block id has no entry in the block registry.
    #[error("block {0:?} is not registered")]
    UnknownBlock(BlockId),

    /// Atlas dimensions that cannot be split into 1D strips.
    #[error("invalid atlas layout: {0}")]
    InvalidAtlasLayout(String),

    /// Malformed JSON in a configuration or block table file.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A configuration, block table or atlas file could not be read.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The atlas image could not be decoded.
    #[error("failed to load atlas image: {0}")]
    Image(#[from] image::ImageError),
}

/// Convenience alias used throughout the crate.
pub type IconResult<T> = Result<T, IconError>;
