//! 1D terrain atlas layout.
//!
//! The terrain image is a 2D grid with [`ATLAS2D_TILES_PER_ROW`] tiles per
//! row. GPUs limit texture height, so the tiles are copied into one or more
//! vertical strips ("1D atlases"), each one tile wide. A texture location then
//! resolves to a strip index plus a V range inside that strip.

use crate::error::{IconError, IconResult};

/// Index of a tile in the 2D terrain atlas, counted row by row.
pub type TextureLoc = u16;

/// Tiles per row of the 2D terrain atlas.
pub const ATLAS2D_TILES_PER_ROW: u32 = 16;

/// Pulls the far texture edge in slightly so nearest sampling never bleeds
/// into the neighbouring tile.
pub const UV2_SCALE: f32 = 15.99 / 16.0;

/// Rectangle in texture coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextureRec {
    /// Left U
    pub u1: f32,
    /// Top V
    pub v1: f32,
    /// Right U
    pub u2: f32,
    /// Bottom V
    pub v2: f32,
}

/// How the 2D atlas is split into 1D strips.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TerrainAtlas1D {
    tiles_per_atlas: u32,
    atlas_count: u32,
    tile_size: u32,
    inv_tile_size: f32,
}

impl TerrainAtlas1D {
    /// Computes the strip layout.
    ///
    /// # Arguments
    /// * `total_tiles` - Number of tiles in the 2D atlas
    /// * `tile_size` - Edge length of one tile in pixels
    /// * `max_texture_height` - Tallest texture the device accepts
    pub fn new(total_tiles: u32, tile_size: u32, max_texture_height: u32) -> IconResult<Self> {
        if total_tiles == 0 || tile_size == 0 {
            return Err(IconError::InvalidAtlasLayout(format!(
                "{total_tiles} tiles of {tile_size}px"
            )));
        }

        let tiles_per_atlas = (max_texture_height / tile_size).min(total_tiles);
        if tiles_per_atlas == 0 {
            return Err(IconError::InvalidAtlasLayout(format!(
                "a {tile_size}px tile does not fit in a {max_texture_height}px texture"
            )));
        }

        Ok(Self {
            tiles_per_atlas,
            atlas_count: total_tiles.div_ceil(tiles_per_atlas),
            tile_size,
            inv_tile_size: 1.0 / tiles_per_atlas as f32,
        })
    }

    /// Layout for a 2D atlas image of the given pixel dimensions.
    pub fn for_atlas_2d(width: u32, height: u32, max_texture_height: u32) -> IconResult<Self> {
        if width == 0 || width % ATLAS2D_TILES_PER_ROW != 0 {
            return Err(IconError::InvalidAtlasLayout(format!(
                "atlas width {width} is not a multiple of {ATLAS2D_TILES_PER_ROW}"
            )));
        }
        let tile_size = width / ATLAS2D_TILES_PER_ROW;
        let rows = height / tile_size;
        Self::new(rows * ATLAS2D_TILES_PER_ROW, tile_size, max_texture_height)
    }

    /// Number of tiles stacked in each strip.
    pub fn tiles_per_atlas(&self) -> u32 {
        self.tiles_per_atlas
    }

    /// Number of strips.
    pub fn atlas_count(&self) -> u32 {
        self.atlas_count
    }

    /// Edge length of a tile in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Height of one tile in strip texture coordinates.
    pub fn inv_tile_size(&self) -> f32 {
        self.inv_tile_size
    }

    /// Strip that holds `loc`.
    pub fn index(&self, loc: TextureLoc) -> usize {
        (loc as u32 / self.tiles_per_atlas) as usize
    }

    /// Row of `loc` inside its strip.
    pub fn row(&self, loc: TextureLoc) -> u32 {
        loc as u32 % self.tiles_per_atlas
    }

    /// Strip index and texture rectangle for `loc`.
    ///
    /// `u_count` repeats the tile horizontally; icons always pass 1.
    pub fn tex_rec(&self, loc: TextureLoc, u_count: u32) -> (usize, TextureRec) {
        let v1 = self.row(loc) as f32 * self.inv_tile_size;
        let rec = TextureRec {
            u1: 0.0,
            v1,
            u2: (u_count as f32 - 1.0) + UV2_SCALE,
            v2: v1 + UV2_SCALE * self.inv_tile_size,
        };
        (self.index(loc), rec)
    }

    /// 2D tile coordinates (column, row) held by a strip, top to bottom.
    pub fn strip_tiles(&self, atlas_index: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        let first = atlas_index * self.tiles_per_atlas;
        (first..first + self.tiles_per_atlas)
            .map(|loc| (loc % ATLAS2D_TILES_PER_ROW, loc / ATLAS2D_TILES_PER_ROW))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_atlas_fits_in_one_strip() {
        let atlas = TerrainAtlas1D::new(256, 16, 8192).unwrap();
        assert_eq!(atlas.tiles_per_atlas(), 256);
        assert_eq!(atlas.atlas_count(), 1);
        assert_eq!(atlas.index(255), 0);
    }

    #[test]
    fn tall_atlas_is_split_by_max_height() {
        let atlas = TerrainAtlas1D::new(256, 16, 1024).unwrap();
        assert_eq!(atlas.tiles_per_atlas(), 64);
        assert_eq!(atlas.atlas_count(), 4);
        assert_eq!(atlas.index(63), 0);
        assert_eq!(atlas.index(64), 1);
        assert_eq!(atlas.row(70), 6);
    }

    #[test]
    fn partial_last_strip_still_counts() {
        let atlas = TerrainAtlas1D::new(100, 16, 512).unwrap();
        assert_eq!(atlas.tiles_per_atlas(), 32);
        assert_eq!(atlas.atlas_count(), 4);
    }

    #[test]
    fn tex_rec_covers_one_row() {
        let atlas = TerrainAtlas1D::new(256, 16, 1024).unwrap();
        let (index, rec) = atlas.tex_rec(66, 1);
        assert_eq!(index, 1);
        assert_eq!(rec.u1, 0.0);
        assert_eq!(rec.u2, UV2_SCALE);
        assert!((rec.v1 - 2.0 / 64.0).abs() < 1e-6);
        assert!((rec.v2 - (2.0 + UV2_SCALE) / 64.0).abs() < 1e-6);
    }

    #[test]
    fn tile_larger_than_texture_is_rejected() {
        assert!(matches!(
            TerrainAtlas1D::new(256, 64, 32),
            Err(IconError::InvalidAtlasLayout(_))
        ));
    }

    #[test]
    fn layout_from_image_dimensions() {
        let atlas = TerrainAtlas1D::for_atlas_2d(256, 256, 4096).unwrap();
        assert_eq!(atlas.tile_size(), 16);
        assert_eq!(atlas.tiles_per_atlas(), 256);
        assert!(TerrainAtlas1D::for_atlas_2d(250, 256, 4096).is_err());
    }

    #[test]
    fn strip_tiles_walk_rows_of_the_2d_grid() {
        let atlas = TerrainAtlas1D::new(64, 16, 16 * 20).unwrap();
        let tiles: Vec<_> = atlas.strip_tiles(1).take(3).collect();
        assert_eq!(tiles, vec![(4, 1), (5, 1), (6, 1)]);
    }
}
