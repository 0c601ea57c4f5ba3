//! WebGPU backend for the isometric icon drawer.
//!
//! Every flush from an [`IconBatch`](super::isometric::IconBatch) is appended
//! to a per-frame vertex buffer at a growing offset, together with the atlas
//! strip and the transform it was drawn with. Queue writes only take effect
//! at submit, so the ranges never overlap within a frame, and the transforms
//! are uploaded once per frame into separate uniform slots.
//! [`IconRenderer::render`] then replays the recorded draws in order, using
//! painter's order rather than depth.

use std::mem::size_of;

use cgmath::{Matrix4, SquareMatrix};
use image::RgbaImage;
use log::{debug, warn};
use wgpu::{Device, Queue, RenderPass, RenderPipeline, ShaderModule, TextureFormat};

use crate::{core::StSystem, engine_state::buffer_state::BufferState};

use super::{
    bind_group_state::{
        BindGroupState, ATLAS_BIND_GROUP_LAYOUT, TRANSFORM_BIND_GROUP,
        TRANSFORM_BIND_GROUP_LAYOUT, TRANSFORM_BINDING_SIZE, TRANSFORM_BUFFER_NAME,
    },
    isometric::{IconTarget, VERTICES_PER_QUAD},
    vertex::IconVertex,
};

/// Name of the per-frame icon vertex buffer
pub const ICON_VERTEX_BUFFER: &str = "icon_vertex_buffer";
/// Name of the shared quad index buffer
pub const ICON_INDEX_BUFFER: &str = "icon_index_buffer";

/// Indices per quad: two triangles.
const INDICES_PER_QUAD: u32 = 6;

/// Converts OpenGL clip-space depth (-1..1) to WebGPU's (0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Maps window pixels (origin top-left, Y down) to clip space.
pub fn screen_projection(width: f32, height: f32) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * cgmath::ortho(0.0, width, height, 0.0, -10_000.0, 10_000.0)
}

/// Index data for `quads` quads laid out as consecutive groups of four
/// vertices: `0, 1, 2, 2, 3, 0` offset by four per quad.
pub fn quad_indices(quads: u32) -> Vec<u32> {
    (0..quads)
        .flat_map(|quad| {
            let base = quad * VERTICES_PER_QUAD as u32;
            [base, base + 1, base + 2, base + 2, base + 3, base]
        })
        .collect()
}

/// Transforms a single frame can draw with.
pub const MAX_FRAME_TRANSFORMS: usize = 8;

/// One recorded draw: a run of vertices in the frame buffer, its strip and
/// the transform it was drawn under.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IconDraw {
    /// Strip the vertices sample from
    pub atlas: usize,
    /// Index into [`DrawList::transforms`]
    pub transform: usize,
    /// First vertex of the run in the frame buffer
    pub base_vertex: u32,
    /// Length of the run, a multiple of four
    pub vertex_count: u32,
}

/// Bookkeeping for the frame vertex buffer.
///
/// Consecutive runs on the same strip and transform are merged into one draw.
/// Each distinct transform takes one of [`MAX_FRAME_TRANSFORMS`] slots.
#[derive(Debug)]
pub struct DrawList {
    capacity: u32,
    next_vertex: u32,
    draws: Vec<IconDraw>,
    transforms: Vec<Matrix4<f32>>,
}

impl DrawList {
    /// A list covering `capacity` vertices, rounded down to whole quads.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity: capacity - capacity % VERTICES_PER_QUAD as u32,
            next_vertex: 0,
            draws: Vec::new(),
            transforms: Vec::new(),
        }
    }

    /// Forgets every draw and transform; the next draw starts at vertex 0.
    pub fn clear(&mut self) {
        self.next_vertex = 0;
        self.draws.clear();
        self.transforms.clear();
    }

    /// Reserves room for `count` vertices drawn with `atlas` under `transform`.
    ///
    /// Returns the first reserved vertex and how many vertices were accepted,
    /// which is `count` truncated to the whole quads that still fit. `None`
    /// when not even one quad fits, or when every transform slot is taken by
    /// another transform.
    pub fn record(
        &mut self,
        atlas: usize,
        transform: Matrix4<f32>,
        count: u32,
    ) -> Option<(u32, u32)> {
        let free = self.capacity - self.next_vertex;
        let quad = VERTICES_PER_QUAD as u32;
        let accepted = count.min(free) / quad * quad;
        if accepted == 0 {
            return None;
        }
        let transform = self.transform_slot(transform)?;

        let base = self.next_vertex;
        self.next_vertex += accepted;
        match self.draws.last_mut() {
            Some(last)
                if last.atlas == atlas
                    && last.transform == transform
                    && last.base_vertex + last.vertex_count == base =>
            {
                last.vertex_count += accepted;
            }
            _ => self.draws.push(IconDraw {
                atlas,
                transform,
                base_vertex: base,
                vertex_count: accepted,
            }),
        }

        Some((base, accepted))
    }

    fn transform_slot(&mut self, transform: Matrix4<f32>) -> Option<usize> {
        if let Some(slot) = self.transforms.iter().position(|t| *t == transform) {
            return Some(slot);
        }
        if self.transforms.len() == MAX_FRAME_TRANSFORMS {
            return None;
        }
        self.transforms.push(transform);
        Some(self.transforms.len() - 1)
    }

    /// The draws recorded this frame, in submission order.
    pub fn draws(&self) -> &[IconDraw] {
        &self.draws
    }

    /// The transforms the draws refer to, in slot order.
    pub fn transforms(&self) -> &[Matrix4<f32>] {
        &self.transforms
    }

    /// Vertices reserved so far.
    pub fn used_vertices(&self) -> u32 {
        self.next_vertex
    }
}

/// What the icon renderer remembers about a frame while batches run: the
/// transform stack, the bound strip and the draw list.
///
/// Every draw captures the transform active when it is recorded, so popping
/// after the last draw does not change how earlier quads are drawn.
#[derive(Debug)]
pub struct FrameRecorder {
    screen: Matrix4<f32>,
    /// Pushed transforms, each already combined with the ones beneath it
    transforms: Vec<Matrix4<f32>>,
    bound_atlas: Option<usize>,
    draw_list: DrawList,
    dropped_vertices: usize,
}

impl FrameRecorder {
    /// A recorder whose frame buffer holds `capacity` vertices.
    pub fn new(capacity: u32) -> Self {
        Self {
            screen: Matrix4::identity(),
            transforms: Vec::new(),
            bound_atlas: None,
            draw_list: DrawList::new(capacity),
            dropped_vertices: 0,
        }
    }

    /// Forgets the previous frame. `screen` sits beneath every pushed
    /// transform.
    pub fn begin_frame(&mut self, screen: Matrix4<f32>) {
        self.screen = screen;
        self.transforms.clear();
        self.bound_atlas = None;
        self.draw_list.clear();
        self.dropped_vertices = 0;
    }

    /// The screen projection combined with every pushed transform.
    pub fn active_transform(&self) -> Matrix4<f32> {
        self.transforms.last().copied().unwrap_or(self.screen)
    }

    /// Reserves frame buffer room for `count` vertices with the bound strip
    /// and the active transform. Vertices that do not fit are counted as
    /// dropped.
    pub fn reserve(&mut self, count: u32) -> Option<(u32, u32)> {
        let Some(atlas) = self.bound_atlas else {
            warn!("Icon quads drawn with no atlas bound");
            self.dropped_vertices += count as usize;
            return None;
        };

        let reserved = self
            .draw_list
            .record(atlas, self.active_transform(), count);
        let accepted = reserved.map_or(0, |(_, accepted)| accepted);
        self.dropped_vertices += (count - accepted) as usize;
        reserved
    }

    /// The frame's draw list.
    pub fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    /// Vertices that did not fit this frame.
    pub fn dropped_vertices(&self) -> usize {
        self.dropped_vertices
    }
}

impl IconTarget for FrameRecorder {
    fn push_transform(&mut self, transform: Matrix4<f32>) {
        let combined = self.active_transform() * transform;
        self.transforms.push(combined);
    }

    fn pop_transform(&mut self) {
        self.transforms.pop();
    }

    fn bind_atlas(&mut self, atlas_index: usize) {
        self.bound_atlas = Some(atlas_index);
    }

    fn draw_quads(&mut self, vertices: &[IconVertex]) {
        self.reserve(vertices.len() as u32);
    }
}

/// Draws icon quads with WebGPU.
pub struct IconRenderer {
    render_pipeline: RenderPipeline,
    buffer_state: StSystem<BufferState>,
    bind_group_state: BindGroupState,
    frame: FrameRecorder,
    /// Distance between transform slots in the uniform buffer
    transform_stride: wgpu::BufferAddress,
}

impl IconRenderer {
    /// Creates the icon pipeline, its buffers and one bind group per strip.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `queue` - The WebGPU queue used to upload the strips
    /// * `format` - Texture format of the render target
    /// * `buffer_state` - Registry the icon buffers are created in
    /// * `shader_source` - WGSL source of the icon shader
    /// * `strips` - The 1D atlas strips, in strip order
    /// * `frame_vertices` - Vertices the frame buffer can hold
    pub fn new(
        device: &Device,
        queue: &Queue,
        format: TextureFormat,
        buffer_state: StSystem<BufferState>,
        shader_source: &str,
        strips: &[RgbaImage],
        frame_vertices: u32,
    ) -> Self {
        let frame = FrameRecorder::new(frame_vertices.max(VERTICES_PER_QUAD as u32));
        let capacity = frame.draw_list.capacity;
        let quads = capacity / VERTICES_PER_QUAD as u32;

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let transform_stride = TRANSFORM_BINDING_SIZE.div_ceil(alignment) * alignment;

        {
            let mut buffers = buffer_state.get_mut();
            buffers.create_buffer(
                ICON_VERTEX_BUFFER,
                wgpu::BufferDescriptor {
                    label: Some(ICON_VERTEX_BUFFER),
                    size: size_of::<IconVertex>() as u64 * capacity as u64,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                },
            );
            buffers.create_buffer_init(
                ICON_INDEX_BUFFER,
                wgpu::util::BufferInitDescriptor {
                    label: Some(ICON_INDEX_BUFFER),
                    contents: bytemuck::cast_slice(&quad_indices(quads)),
                    usage: wgpu::BufferUsages::INDEX,
                },
            );
            buffers.create_buffer(
                TRANSFORM_BUFFER_NAME,
                wgpu::BufferDescriptor {
                    label: Some(TRANSFORM_BUFFER_NAME),
                    size: transform_stride * MAX_FRAME_TRANSFORMS as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                },
            );
        }

        let bind_group_state = BindGroupState::new(device, queue, &buffer_state.get(), strips);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Icon Shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });
        let render_pipeline =
            Self::create_render_pipeline(device, &shader, format, &bind_group_state);

        debug!(
            "Icon renderer ready: {} strips, {} frame vertices",
            bind_group_state.atlas_count(),
            capacity
        );

        Self {
            render_pipeline,
            buffer_state,
            bind_group_state,
            frame,
            transform_stride,
        }
    }

    fn create_render_pipeline(
        device: &Device,
        shader: &ShaderModule,
        format: TextureFormat,
        bind_group_state: &BindGroupState,
    ) -> RenderPipeline {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Icon Pipeline Layout"),
            bind_group_layouts: &[
                bind_group_state.get_bind_group_layout(TRANSFORM_BIND_GROUP_LAYOUT),
                bind_group_state.get_bind_group_layout(ATLAS_BIND_GROUP_LAYOUT),
            ],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Icon Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[IconVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Face winding flips between icon faces.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Starts a new frame of `width` x `height` pixels, discarding the
    /// previous frame's draws.
    pub fn begin_frame(&mut self, width: u32, height: u32) {
        self.frame
            .begin_frame(screen_projection(width.max(1) as f32, height.max(1) as f32));
    }

    /// The draws recorded since [`IconRenderer::begin_frame`].
    pub fn draws(&self) -> &[IconDraw] {
        self.frame.draw_list().draws()
    }

    /// Uploads the frame's transforms and records its draws into
    /// `render_pass`.
    pub fn render(&self, render_pass: &mut RenderPass<'_>) {
        if self.frame.dropped_vertices() > 0 {
            warn!(
                "Icon frame buffer full: dropped {} vertices",
                self.frame.dropped_vertices()
            );
        }
        let draw_list = self.frame.draw_list();
        if draw_list.draws().is_empty() {
            return;
        }

        let buffer_state = self.buffer_state.get();
        for (slot, transform) in draw_list.transforms().iter().enumerate() {
            let matrix: [[f32; 4]; 4] = (*transform).into();
            buffer_state.write_buffer(
                TRANSFORM_BUFFER_NAME,
                slot as wgpu::BufferAddress * self.transform_stride,
                bytemuck::cast_slice(&[matrix]),
            );
        }

        let stride = size_of::<IconVertex>() as wgpu::BufferAddress;
        let transform_bind_group = self.bind_group_state.get_bind_group(TRANSFORM_BIND_GROUP);

        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_index_buffer(
            buffer_state.get_buffer(ICON_INDEX_BUFFER).slice(..),
            wgpu::IndexFormat::Uint32,
        );

        for draw in draw_list.draws() {
            let Some(atlas) = self.bind_group_state.atlas_bind_group(draw.atlas) else {
                continue;
            };
            let transform_offset = draw.transform as wgpu::BufferAddress * self.transform_stride;
            render_pass.set_bind_group(
                0,
                transform_bind_group,
                &[transform_offset as wgpu::DynamicOffset],
            );
            render_pass.set_bind_group(1, atlas, &[]);

            let start = draw.base_vertex as wgpu::BufferAddress * stride;
            let end = start + draw.vertex_count as wgpu::BufferAddress * stride;
            render_pass.set_vertex_buffer(
                0,
                buffer_state.get_buffer(ICON_VERTEX_BUFFER).slice(start..end),
            );

            let quads = draw.vertex_count / VERTICES_PER_QUAD as u32;
            render_pass.draw_indexed(0..quads * INDICES_PER_QUAD, 0, 0..1);
        }
    }
}

impl IconTarget for IconRenderer {
    fn push_transform(&mut self, transform: Matrix4<f32>) {
        self.frame.push_transform(transform);
    }

    fn pop_transform(&mut self) {
        self.frame.pop_transform();
    }

    fn bind_atlas(&mut self, atlas_index: usize) {
        if atlas_index >= self.bind_group_state.atlas_count() {
            warn!("Icon atlas {atlas_index} was never uploaded");
        }
        self.frame.bind_atlas(atlas_index);
    }

    fn draw_quads(&mut self, vertices: &[IconVertex]) {
        let Some((base, accepted)) = self.frame.reserve(vertices.len() as u32) else {
            return;
        };

        let offset = base as wgpu::BufferAddress * size_of::<IconVertex>() as wgpu::BufferAddress;
        self.buffer_state.get().write_buffer(
            ICON_VERTEX_BUFFER,
            offset,
            bytemuck::cast_slice(&vertices[..accepted as usize]),
        );
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Vector4};

    use super::*;

    #[test]
    fn quad_indices_form_two_triangles_per_quad() {
        assert_eq!(quad_indices(2), vec![0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn screen_projection_maps_corners_to_clip_space() {
        let projection = screen_projection(800.0, 600.0);

        let top_left = projection * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((top_left.x + 1.0).abs() < 1e-6);
        assert!((top_left.y - 1.0).abs() < 1e-6);
        assert!((top_left.z - 0.5).abs() < 1e-6);

        let bottom_right = projection * Vector4::new(800.0, 600.0, 0.0, 1.0);
        assert!((bottom_right.x - 1.0).abs() < 1e-6);
        assert!((bottom_right.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn draw_list_appends_and_merges_runs() {
        let mut list = DrawList::new(64);
        let identity = Matrix4::identity();

        assert_eq!(list.record(0, identity, 16), Some((0, 16)));
        assert_eq!(list.record(0, identity, 8), Some((16, 8)));
        assert_eq!(list.record(1, identity, 4), Some((24, 4)));
        assert_eq!(list.record(0, identity, 4), Some((28, 4)));

        assert_eq!(
            list.draws(),
            &[
                IconDraw {
                    atlas: 0,
                    transform: 0,
                    base_vertex: 0,
                    vertex_count: 24
                },
                IconDraw {
                    atlas: 1,
                    transform: 0,
                    base_vertex: 24,
                    vertex_count: 4
                },
                IconDraw {
                    atlas: 0,
                    transform: 0,
                    base_vertex: 28,
                    vertex_count: 4
                },
            ]
        );
        assert_eq!(list.transforms().len(), 1);
    }

    #[test]
    fn draw_list_truncates_to_whole_quads_when_full() {
        let mut list = DrawList::new(22);
        let identity = Matrix4::identity();
        assert_eq!(list.record(0, identity, 12), Some((0, 12)));
        assert_eq!(list.record(0, identity, 12), Some((12, 8)));
        assert_eq!(list.record(0, identity, 4), None);
        assert_eq!(list.used_vertices(), 20);

        list.clear();
        assert_eq!(list.record(2, identity, 4), Some((0, 4)));
        assert_eq!(list.draws().len(), 1);
    }

    #[test]
    fn draw_list_splits_runs_on_transform_change() {
        let mut list = DrawList::new(64);
        let a = Matrix4::identity();
        let b = Matrix4::from_scale(2.0);

        list.record(0, a, 4);
        list.record(0, b, 4);
        list.record(0, a, 4);

        let slots: Vec<usize> = list.draws().iter().map(|draw| draw.transform).collect();
        assert_eq!(slots, vec![0, 1, 0]);
        assert_eq!(list.transforms(), &[a, b]);
    }

    #[test]
    fn draw_list_refuses_transforms_past_the_last_slot() {
        let mut list = DrawList::new(256);
        for i in 0..MAX_FRAME_TRANSFORMS {
            assert!(list.record(0, Matrix4::from_scale(i as f32 + 1.0), 4).is_some());
        }

        assert_eq!(list.record(0, Matrix4::from_scale(100.0), 4), None);
        assert!(list.record(0, Matrix4::from_scale(1.0), 4).is_some());
    }

    #[test]
    fn draws_keep_the_transform_they_were_recorded_under() {
        let screen = screen_projection(800.0, 600.0);
        let rotation = Matrix4::from_angle_y(Deg(45.0));
        let mut frame = FrameRecorder::new(64);
        frame.begin_frame(screen);

        frame.push_transform(rotation);
        frame.bind_atlas(0);
        assert_eq!(frame.reserve(12), Some((0, 12)));
        frame.pop_transform();

        assert_eq!(frame.active_transform(), screen);
        let draw = frame.draw_list().draws()[0];
        assert_eq!(frame.draw_list().transforms()[draw.transform], screen * rotation);
    }

    #[test]
    fn frame_recorder_counts_dropped_vertices() {
        let mut frame = FrameRecorder::new(8);
        frame.begin_frame(Matrix4::identity());

        assert_eq!(frame.reserve(4), None);
        frame.bind_atlas(0);
        assert_eq!(frame.reserve(12), Some((0, 8)));

        assert_eq!(frame.dropped_vertices(), 4 + 4);

        frame.begin_frame(Matrix4::identity());
        assert_eq!(frame.dropped_vertices(), 0);
        assert!(frame.draw_list().draws().is_empty());
    }
}
