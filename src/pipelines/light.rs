use wgpu::util::DeviceExt;

use crate::{config::LightingConfig, data_structures::material::hex_to_linear};

/// Ambient plus one directional light, as bound at group 1.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// rgb premultiplied by intensity
    pub ambient: [f32; 4],
    /// Unit vector pointing from the scene towards the light.
    pub direction: [f32; 4],
    /// rgb premultiplied by intensity
    pub color: [f32; 4],
}

impl LightUniform {
    pub fn from_config(config: &LightingConfig) -> Self {
        let premultiplied = |hex: u32, intensity: f32| {
            let [r, g, b] = hex_to_linear(hex);
            [r * intensity, g * intensity, b * intensity, 1.0]
        };
        let [x, y, z] = config.directional_position;
        let len = (x * x + y * y + z * z).sqrt();
        // A light sitting on the origin shines straight down.
        let direction = if len > f32::EPSILON {
            [x / len, y / len, z / len, 0.0]
        } else {
            [0.0, 1.0, 0.0, 0.0]
        };
        Self {
            ambient: premultiplied(config.ambient_color, config.ambient_intensity),
            direction,
            color: premultiplied(config.directional_color, config.directional_intensity),
        }
    }
}

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, uniform: LightUniform) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}
