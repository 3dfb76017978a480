//! CPU-side mesh geometry and vertex layouts.

use std::mem;

/// Anything that can describe its own vertex buffer layout.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// One indexed triangle list of a mesh.
#[derive(Clone, Debug, Default)]
pub struct Primitive {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl Primitive {
    pub fn new(vertices: Vec<ModelVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Axis-aligned unit quad in the XY plane, handy for tests and placeholders.
    pub fn quad() -> Self {
        let v = |x: f32, y: f32, u: f32, v: f32| ModelVertex {
            position: [x, y, 0.0],
            tex_coords: [u, v],
            normal: [0.0, 0.0, 1.0],
        };
        Self {
            vertices: vec![
                v(-0.5, -0.5, 0.0, 1.0),
                v(0.5, -0.5, 1.0, 1.0),
                v(0.5, 0.5, 1.0, 0.0),
                v(-0.5, 0.5, 0.0, 0.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    pub fn num_elements(&self) -> u32 {
        self.indices.len() as u32
    }
}
