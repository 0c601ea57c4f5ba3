//! Owns the icon renderer and runs the per-frame render pass.
//!
//! A frame is split in two: [`PipelineManager::begin_frame`] resets the icon
//! renderer so batches can record into it, and [`PipelineManager::render`]
//! acquires the surface texture, replays the recorded draws and presents.

use log::{error, trace};
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};

use crate::{core::StSystem, engine_state::buffer_state::BufferState};

use super::icon_renderer::IconRenderer;

/// Background colour behind the icons.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.12,
    g: 0.12,
    b: 0.14,
    a: 1.0,
};

/// Coordinates the render pass for the icon pipeline.
pub struct PipelineManager {
    /// Shared state for buffer management
    pub buffer_state: StSystem<BufferState>,
    /// Draws the recorded icon quads
    pub icon_renderer: IconRenderer,
}

impl PipelineManager {
    /// Creates a new `PipelineManager` around an already built icon renderer.
    pub fn new(buffer_state: StSystem<BufferState>, icon_renderer: IconRenderer) -> Self {
        Self {
            buffer_state,
            icon_renderer,
        }
    }

    /// Resets the icon renderer for a frame of the configured surface size.
    pub fn begin_frame(&mut self, config: &SurfaceConfiguration) {
        self.icon_renderer.begin_frame(config.width, config.height);
    }

    /// Renders the recorded icons to the given surface.
    ///
    /// Surface errors are logged and returned so the caller can reconfigure
    /// on `Lost` or `Outdated`.
    pub fn render(
        &mut self,
        surface: &Surface,
        device: StSystem<Device>,
        queue: StSystem<Queue>,
    ) -> Result<(), wgpu::SurfaceError> {
        let frame = match surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err) => {
                error!("Error getting current frame: {:?}", err);
                return Err(err);
            }
        };

        let view = frame.texture.create_view(&Default::default());
        let mut encoder = device.get().create_command_encoder(&Default::default());
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Icon Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
            self.icon_renderer.render(&mut rpass);
        }

        queue.get().submit([encoder.finish()]);
        frame.present();

        let usage = self.buffer_state.get().total_usage();
        trace!(
            "Frame submitted: {} icon draws, {} of {} buffer bytes used, {} writes",
            self.icon_renderer.draws().len(),
            usage.used,
            usage.allocated,
            usage.writes
        );

        Ok(())
    }
}
