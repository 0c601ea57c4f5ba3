//! Texture handling for the icon pipeline.
//!
//! Cuts the 2D terrain image into 1D atlas strips and uploads them.

use image::{imageops, RgbaImage};
use log::info;
use wgpu::util::DeviceExt;

use super::atlas::{TerrainAtlas1D, ATLAS2D_TILES_PER_ROW};
use crate::error::{IconError, IconResult};

/// A GPU texture with its view and sampler.
pub struct Texture {
    /// The underlying WebGPU texture resource.
    #[allow(dead_code)]
    pub texture: wgpu::Texture,
    /// The texture view used for binding the texture to the pipeline.
    pub view: wgpu::TextureView,
    /// The sampler used for texture filtering and addressing.
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// Uploads an RGBA image as a nearest-sampled colour texture.
    pub fn from_rgba_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        label: &str,
    ) -> Self {
        let (width, height) = image.dimensions();
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            image.as_raw(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }
}

/// Copies the tiles of one 1D strip out of the 2D terrain image.
///
/// Tiles past the bottom of the image are left transparent.
pub fn build_strip(
    atlas_2d: &RgbaImage,
    layout: &TerrainAtlas1D,
    atlas_index: u32,
) -> IconResult<RgbaImage> {
    let tile = layout.tile_size();
    if atlas_2d.width() != tile * ATLAS2D_TILES_PER_ROW {
        return Err(IconError::InvalidAtlasLayout(format!(
            "image is {}px wide but the layout expects {}px",
            atlas_2d.width(),
            tile * ATLAS2D_TILES_PER_ROW
        )));
    }

    let mut strip = RgbaImage::new(tile, tile * layout.tiles_per_atlas());
    for (row, (tile_x, tile_y)) in layout.strip_tiles(atlas_index).enumerate() {
        if (tile_y + 1) * tile > atlas_2d.height() {
            break;
        }
        let source = imageops::crop_imm(atlas_2d, tile_x * tile, tile_y * tile, tile, tile);
        imageops::replace(&mut strip, &source.to_image(), 0, (row as u32 * tile) as i64);
    }

    Ok(strip)
}

/// Builds every strip of `layout` from the 2D terrain image.
pub fn build_strips(atlas_2d: &RgbaImage, layout: &TerrainAtlas1D) -> IconResult<Vec<RgbaImage>> {
    let strips = (0..layout.atlas_count())
        .map(|index| build_strip(atlas_2d, layout, index))
        .collect::<IconResult<Vec<_>>>()?;
    info!(
        "Split {}x{} terrain atlas into {} strips of {} tiles",
        atlas_2d.width(),
        atlas_2d.height(),
        strips.len(),
        layout.tiles_per_atlas()
    );
    Ok(strips)
}

/// Generates a placeholder terrain atlas: every tile gets a distinct flat
/// colour with a darker border so faces stay readable.
pub fn procedural_atlas(tile_size: u32, rows: u32) -> RgbaImage {
    RgbaImage::from_fn(
        tile_size * ATLAS2D_TILES_PER_ROW,
        tile_size * rows,
        |x, y| {
            let loc = (y / tile_size) * ATLAS2D_TILES_PER_ROW + x / tile_size;
            let hash = loc.wrapping_mul(2_654_435_761);
            let base = [
                64 + (hash & 0x7f) as u8,
                64 + ((hash >> 8) & 0x7f) as u8,
                64 + ((hash >> 16) & 0x7f) as u8,
            ];
            let (tx, ty) = (x % tile_size, y % tile_size);
            let border = tx == 0 || ty == 0 || tx == tile_size - 1 || ty == tile_size - 1;
            let shade = if border { 2 } else { 1 };
            image::Rgba([base[0] / shade, base[1] / shade, base[2] / shade, 255])
        },
    )
}
