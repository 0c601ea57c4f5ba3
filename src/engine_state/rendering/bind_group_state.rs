//! Manages WebGPU bind groups and their layouts.
//!
//! The icon pipeline uses two groups: the transform uniform at group 0, bound
//! with a dynamic offset per draw, and one texture + sampler group per 1D
//! atlas strip at group 1.

use std::collections::HashMap;

use image::RgbaImage;
use wgpu::{BindGroup, BindGroupLayout, Device, Queue};

use crate::engine_state::buffer_state::BufferState;

use super::texture::Texture;

/// Name of the transform bind group
pub const TRANSFORM_BIND_GROUP: &str = "transform_bind_group";
/// Name of the transform bind group layout
pub const TRANSFORM_BIND_GROUP_LAYOUT: &str = "transform_bind_group_layout";
/// Name of the atlas strip bind group layout
pub const ATLAS_BIND_GROUP_LAYOUT: &str = "atlas_bind_group_layout";

/// Name of the uniform buffer holding the frame's icon transforms
pub const TRANSFORM_BUFFER_NAME: &str = "icon_transform_buffer";
/// Bytes of one transform matrix, the window a dynamic offset selects
pub const TRANSFORM_BINDING_SIZE: u64 = 64;

/// Holds named bind groups and the per-strip atlas bind groups.
pub struct BindGroupState {
    /// Map of bind group names to their WebGPU bind group objects
    bind_groups: HashMap<&'static str, BindGroup>,
    /// Map of bind group layout names to their WebGPU bind group layout objects
    bind_group_layouts: HashMap<&'static str, BindGroupLayout>,
    /// One bind group per atlas strip, indexed by strip
    atlas_bind_groups: Vec<BindGroup>,
    /// Keeps the strip textures alive for as long as their bind groups
    _atlas_textures: Vec<Texture>,
}

impl BindGroupState {
    /// Creates the transform bind group and uploads every atlas strip.
    ///
    /// The transform buffer must already exist in `buffer_state`.
    pub fn new(
        device: &Device,
        queue: &Queue,
        buffer_state: &BufferState,
        strips: &[RgbaImage],
    ) -> Self {
        let mut bind_groups = HashMap::new();
        let mut bind_group_layouts = HashMap::new();

        let (transform_bind_group, transform_bind_group_layout) =
            Self::generate_transform_bindgroups(device, buffer_state);
        bind_groups.insert(TRANSFORM_BIND_GROUP, transform_bind_group);
        bind_group_layouts.insert(TRANSFORM_BIND_GROUP_LAYOUT, transform_bind_group_layout);

        let atlas_layout = Self::atlas_bind_group_layout(device);
        let atlas_textures: Vec<Texture> = strips
            .iter()
            .enumerate()
            .map(|(i, strip)| Texture::from_rgba_image(device, queue, strip, &format!("Atlas {i}")))
            .collect();
        let atlas_bind_groups = atlas_textures
            .iter()
            .enumerate()
            .map(|(i, texture)| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &atlas_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&texture.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&texture.sampler),
                        },
                    ],
                    label: Some(&format!("atlas_bind_group_{i}")),
                })
            })
            .collect();
        bind_group_layouts.insert(ATLAS_BIND_GROUP_LAYOUT, atlas_layout);

        Self {
            bind_groups,
            bind_group_layouts,
            atlas_bind_groups,
            _atlas_textures: atlas_textures,
        }
    }

    /// Retrieves a bind group by name.
    ///
    /// # Panics
    /// Panics if no bind group with the given name exists
    pub fn get_bind_group(&self, name: &'static str) -> &BindGroup {
        self.bind_groups.get(name).unwrap()
    }

    /// Retrieves a bind group layout by name.
    ///
    /// # Panics
    /// Panics if no bind group layout with the given name exists
    pub fn get_bind_group_layout(&self, name: &'static str) -> &BindGroupLayout {
        self.bind_group_layouts.get(name).unwrap()
    }

    /// The bind group for atlas strip `index`, if it exists.
    pub fn atlas_bind_group(&self, index: usize) -> Option<&BindGroup> {
        self.atlas_bind_groups.get(index)
    }

    /// Number of uploaded atlas strips.
    pub fn atlas_count(&self) -> usize {
        self.atlas_bind_groups.len()
    }

    fn generate_transform_bindgroups(
        device: &Device,
        buffer_state: &BufferState,
    ) -> (BindGroup, BindGroupLayout) {
        let transform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(TRANSFORM_BINDING_SIZE),
                    },
                    count: None,
                }],
                label: Some(TRANSFORM_BIND_GROUP_LAYOUT),
            });

        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &transform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer_state.get_binding(
                    TRANSFORM_BUFFER_NAME,
                    wgpu::BufferSize::new(TRANSFORM_BINDING_SIZE),
                ),
            }],
            label: Some(TRANSFORM_BIND_GROUP),
        });

        (transform_bind_group, transform_bind_group_layout)
    }

    fn atlas_bind_group_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    // This should match the filterable field of the texture entry above.
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some(ATLAS_BIND_GROUP_LAYOUT),
        })
    }
}
