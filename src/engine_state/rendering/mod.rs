//! Rendering system for block icons.
//!
//! This module contains the isometric icon drawer, the 1D terrain atlas it
//! samples from, and the WebGPU backend that turns its batches into draw
//! calls.

use image::RgbaImage;
use pipeline_manager::PipelineManager;
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};

use crate::core::StSystem;

use super::buffer_state::BufferState;

pub mod atlas;
mod bind_group_state;
pub mod color;
mod icon_renderer;
pub mod isometric;
mod pipeline_manager;
pub mod texture;
mod vertex;

// Re-export commonly used types
pub use icon_renderer::{
    quad_indices, screen_projection, DrawList, FrameRecorder, IconDraw, IconRenderer,
    ICON_VERTEX_BUFFER, MAX_FRAME_TRANSFORMS,
};
pub use vertex::IconVertex;

/// Owns the surface and the icon pipeline.
pub struct IconRendererManager {
    /// The WebGPU surface being rendered to
    pub surface: Surface<'static>,
    /// Configuration for the surface (size, format, etc.)
    pub surface_config: SurfaceConfiguration,
    /// The WebGPU device used for creating GPU resources
    pub device: StSystem<Device>,
    /// The WebGPU queue for submitting command buffers
    pub queue: StSystem<Queue>,
    /// Manages the rendering pipeline and shaders
    pub pipeline_manager: PipelineManager,
}

impl IconRendererManager {
    /// Creates the icon pipeline for `surface`.
    ///
    /// # Arguments
    /// * `surface` - The WebGPU surface to render to
    /// * `surface_config` - Configuration for the surface
    /// * `device` - The WebGPU device
    /// * `queue` - The WebGPU queue
    /// * `shader_string` - WGSL source code for the icon shader
    /// * `strips` - The 1D atlas strips to upload
    /// * `frame_vertices` - Icon vertices a single frame can hold
    pub fn new(
        surface: Surface<'static>,
        surface_config: SurfaceConfiguration,
        device: StSystem<Device>,
        queue: StSystem<Queue>,
        shader_string: String,
        strips: &[RgbaImage],
        frame_vertices: u32,
    ) -> Self {
        let buffer_state = StSystem::new(Box::new(BufferState::new(device.clone(), queue.clone())));

        let icon_renderer = IconRenderer::new(
            &device.get(),
            &queue.get(),
            surface_config.format,
            buffer_state.clone(),
            &shader_string,
            strips,
            frame_vertices,
        );
        let pipeline_manager = PipelineManager::new(buffer_state, icon_renderer);

        Self {
            surface,
            surface_config,
            device,
            queue,
            pipeline_manager,
        }
    }

    /// Handles window resize events.
    ///
    /// # Arguments
    /// * `size` - The new window size in physical pixels
    pub fn resize_surface(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        self.surface_config.width = size.width.max(1);
        self.surface_config.height = size.height.max(1);
        self.surface
            .configure(&self.device.get(), &self.surface_config);
    }

    /// Resets the icon renderer and returns it for this frame's batches.
    pub fn begin_frame(&mut self) -> &mut IconRenderer {
        self.pipeline_manager.begin_frame(&self.surface_config);
        &mut self.pipeline_manager.icon_renderer
    }

    /// Renders a new frame, reconfiguring the surface if it was lost.
    pub fn render(&mut self) {
        match self
            .pipeline_manager
            .render(&self.surface, self.device.clone(), self.queue.clone())
        {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface
                    .configure(&self.device.get(), &self.surface_config);
            }
            Err(_) => {}
        }
    }
}
