//! Vertex format for icon geometry.

use super::color::PackedColor;

/// A textured, coloured icon vertex.
///
/// # Memory Layout
/// - Position: [f32; 3] (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
/// - Colour: [u8; 4] (4 bytes)
///
/// Total size: 24 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct IconVertex {
    /// Position in isometric space
    pub position: [f32; 3],
    /// UV coordinates inside the bound 1D atlas
    pub tex_coords: [f32; 2],
    /// RGBA colour multiplied with the texture sample
    pub color: [u8; 4],
}

impl IconVertex {
    /// Creates a new vertex.
    pub fn new(x: f32, y: f32, z: f32, u: f32, v: f32, color: PackedColor) -> Self {
        Self {
            position: [x, y, z],
            tex_coords: [u, v],
            color: color.to_array(),
        }
    }

    /// Returns the vertex buffer layout description for the icon pipeline.
    ///
    /// # Shader Attributes
    /// - `location = 0`: position (vec3<f32>)
    /// - `location = 1`: tex_coords (vec2<f32>)
    /// - `location = 2`: color (vec4<f32>, normalised from u8)
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<IconVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Unorm8x4,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<IconVertex>(), 24);
        assert_eq!(IconVertex::desc().array_stride, 24);
    }
}
