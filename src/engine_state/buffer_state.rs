//! # Buffer State Module
//!
//! A named registry of GPU buffers. The icon renderer keeps its vertex, index
//! and transform buffers here so that memory use can be inspected in one
//! place.

use std::collections::HashMap;

use wgpu::{util::DeviceExt, Buffer, Device, Queue};

use crate::core::{StResource, StSystem};

/// Allocation and write counters, for one buffer or summed over all of them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BufferUsage {
    /// Bytes allocated
    pub allocated: u64,
    /// Highest byte offset written so far
    pub used: u64,
    /// Number of writes, including the initial upload
    pub writes: u64,
}

/// Central registry for GPU buffers, keyed by static name.
///
/// # Examples
///
/// ```ignore
/// let mut buffer_state = BufferState::new(device, queue);
///
/// buffer_state.create_buffer(
///     ICON_VERTEX_BUFFER,
///     wgpu::BufferDescriptor {
///         label: Some(ICON_VERTEX_BUFFER),
///         size: 4096,
///         usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
///         mapped_at_creation: false,
///     },
/// );
///
/// buffer_state.write_buffer(ICON_VERTEX_BUFFER, 0, bytemuck::cast_slice(&vertices));
/// ```
pub struct BufferState {
    /// Reference to the GPU device
    pub device: StSystem<Device>,
    /// Reference to the GPU command queue
    pub queue: StSystem<Queue>,
    /// Map of buffer names to buffer objects
    pub buffers: HashMap<&'static str, Buffer>,
    /// Counters per buffer, updated through `&self` on every write
    usage: StResource<HashMap<&'static str, BufferUsage>>,
}

impl BufferState {
    /// Creates an empty registry.
    pub fn new(device: StSystem<Device>, queue: StSystem<Queue>) -> Self {
        Self {
            device,
            queue,
            buffers: HashMap::new(),
            usage: StResource::new(HashMap::new()),
        }
    }

    /// Creates an empty buffer with the specified descriptor.
    pub fn create_buffer(&mut self, name: &'static str, descriptor: wgpu::BufferDescriptor) {
        let buffer = self.device.get().create_buffer(&descriptor);
        self.register(
            name,
            buffer,
            BufferUsage {
                allocated: descriptor.size,
                ..BufferUsage::default()
            },
        );
    }

    /// Creates a buffer and uploads its contents.
    pub fn create_buffer_init(
        &mut self,
        name: &'static str,
        descriptor: wgpu::util::BufferInitDescriptor,
    ) {
        let size = descriptor.contents.len() as u64;
        let buffer = self.device.get().create_buffer_init(&descriptor);
        self.register(
            name,
            buffer,
            BufferUsage {
                allocated: size,
                used: size,
                writes: 1,
            },
        );
    }

    fn register(&mut self, name: &'static str, buffer: Buffer, usage: BufferUsage) {
        self.buffers.insert(name, buffer);
        self.usage.get_mut().insert(name, usage);
    }

    /// Queues a write of `data` at byte `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the buffer does not exist or if the write would exceed buffer bounds
    pub fn write_buffer(&self, name: &'static str, offset: wgpu::BufferAddress, data: &[u8]) {
        let buffer = self.get_buffer(name);
        let mut usage_map = self.usage.get_mut();
        let usage = usage_map.get_mut(name).unwrap();

        let end = offset + data.len() as u64;
        if end > usage.allocated {
            panic!(
                "Buffer write of {} bytes at {} out of bounds for buffer name '{}'",
                data.len(),
                offset,
                name
            );
        }

        self.queue.get().write_buffer(buffer, offset, data);
        usage.used = usage.used.max(end);
        usage.writes += 1;
    }

    /// Gets a reference to a buffer by name.
    ///
    /// # Panics
    ///
    /// Panics if the buffer does not exist
    pub fn get_buffer(&self, name: &'static str) -> &Buffer {
        self.buffers.get(name).unwrap()
    }

    /// Binds the first `size` bytes of a buffer, or all of it for `None`.
    ///
    /// Dynamic offsets move this window along the buffer at draw time.
    pub fn get_binding(
        &self,
        name: &'static str,
        size: Option<wgpu::BufferSize>,
    ) -> wgpu::BindingResource {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: self.get_buffer(name),
            offset: 0,
            size,
        })
    }

    /// Counters of a single buffer.
    pub fn usage(&self, name: &'static str) -> Option<BufferUsage> {
        self.usage.get().get(name).copied()
    }

    /// Counters summed over every buffer.
    pub fn total_usage(&self) -> BufferUsage {
        sum_usage(self.usage.get().values().copied())
    }
}

fn sum_usage(usages: impl Iterator<Item = BufferUsage>) -> BufferUsage {
    usages.fold(BufferUsage::default(), |total, usage| BufferUsage {
        allocated: total.allocated + usage.allocated,
        used: total.used + usage.used,
        writes: total.writes + usage.writes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_add_up_per_field() {
        let total = sum_usage(
            [
                BufferUsage {
                    allocated: 64,
                    used: 64,
                    writes: 1,
                },
                BufferUsage {
                    allocated: 1024,
                    used: 96,
                    writes: 7,
                },
            ]
            .into_iter(),
        );

        assert_eq!(
            total,
            BufferUsage {
                allocated: 1088,
                used: 160,
                writes: 8,
            }
        );
    }
}
