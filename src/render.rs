//! Drawing of the avatar.
//!
//! Mesh nodes carry their GPU buffers in a cache built on first use by
//! [`Renderer::prepare`]. The cache remembers the material revision it was
//! built for, so swapping a material only rebuilds the material bind group and
//! leaves the geometry buffers alone.

use std::iter;

use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        instance::Instance,
        material::Material,
        scene_graph::{MeshNode, SceneNode},
        texture::Texture,
    },
    pipelines::basic::mk_basic_pipeline,
    resources::texture::{material_layout, mk_material_bind_group},
};

#[derive(Debug)]
struct PrimitiveBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    num_elements: u32,
}

/// GPU side of a [`MeshNode`].
#[derive(Debug)]
pub struct MeshGpu {
    primitives: Vec<PrimitiveBuffers>,
    instance: wgpu::Buffer,
    material: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    revision: u64,
}

#[derive(Debug)]
pub struct Renderer {
    pipeline: wgpu::RenderPipeline,
    material_layout: wgpu::BindGroupLayout,
    /// Bound in place of a texture for untextured materials.
    white: Texture,
}

impl Renderer {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        light_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let material_layout = material_layout(device);
        let pipeline = mk_basic_pipeline(
            device,
            color_format,
            camera_layout,
            light_layout,
            &material_layout,
        );
        Self {
            pipeline,
            material_layout,
            white: Texture::solid("white", [255; 4]),
        }
    }

    /// Uploads new meshes, refreshes bind groups of replaced materials and
    /// writes the current world transforms.
    pub fn prepare(&self, device: &wgpu::Device, queue: &wgpu::Queue, model: &mut SceneNode) {
        model.visit_meshes_world_mut(&Instance::new(), |world, mesh| {
            self.prepare_mesh(device, queue, world, mesh)
        });
    }

    fn prepare_mesh(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        world: &Instance,
        mesh: &mut MeshNode,
    ) {
        let raw = world.to_raw();
        let revision = mesh.revision();
        match mesh.gpu.take() {
            Some(mut gpu) => {
                queue.write_buffer(&gpu.instance, 0, bytemuck::cast_slice(&[raw]));
                if gpu.revision != revision {
                    queue.write_buffer(
                        &gpu.material,
                        0,
                        bytemuck::cast_slice(&[mesh.material().to_uniform()]),
                    );
                    gpu.bind_group =
                        self.material_bind_group(device, queue, mesh.material(), &gpu.material);
                    gpu.revision = revision;
                }
                mesh.gpu = Some(gpu);
            }
            None => {
                let primitives = mesh
                    .primitives
                    .iter()
                    .filter(|p| !p.indices.is_empty())
                    .map(|p| PrimitiveBuffers {
                        vertex: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some("Vertex Buffer"),
                            contents: bytemuck::cast_slice(&p.vertices),
                            usage: wgpu::BufferUsages::VERTEX,
                        }),
                        index: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some("Index Buffer"),
                            contents: bytemuck::cast_slice(&p.indices),
                            usage: wgpu::BufferUsages::INDEX,
                        }),
                        num_elements: p.num_elements(),
                    })
                    .collect();
                let instance = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Instance Buffer"),
                    contents: bytemuck::cast_slice(&[raw]),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                });
                let material = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Material Buffer"),
                    contents: bytemuck::cast_slice(&[mesh.material().to_uniform()]),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                let bind_group = self.material_bind_group(device, queue, mesh.material(), &material);
                mesh.gpu = Some(MeshGpu {
                    primitives,
                    instance,
                    material,
                    bind_group,
                    revision,
                });
            }
        }
    }

    fn material_bind_group(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material: &Material,
        uniform: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        let texture = material.texture.as_deref().unwrap_or(&self.white);
        mk_material_bind_group(
            device,
            &self.material_layout,
            uniform,
            texture.upload(device, queue),
            &material.name,
        )
    }

    /// Draws every prepared mesh of `model`.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        model: &SceneNode,
        camera: &wgpu::BindGroup,
        light: &wgpu::BindGroup,
    ) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, camera, &[]);
        pass.set_bind_group(1, light, &[]);
        model.visit_meshes(|_, mesh| {
            let Some(gpu) = &mesh.gpu else {
                return;
            };
            pass.set_bind_group(2, &gpu.bind_group, &[]);
            pass.set_vertex_buffer(1, gpu.instance.slice(..));
            for primitive in &gpu.primitives {
                pass.set_vertex_buffer(0, primitive.vertex.slice(..));
                pass.set_index_buffer(primitive.index.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..primitive.num_elements, 0, 0..1);
            }
        });
    }
}

/// Renders one frame: clear to the background colour, then the model if one
/// is loaded.
pub fn render_frame(ctx: &Context, model: Option<&mut SceneNode>) -> Result<(), wgpu::SurfaceError> {
    ctx.window.request_redraw();

    if !ctx.is_surface_configured() {
        return Ok(());
    }

    let output = ctx.surface.get_current_texture()?;
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let model = model.map(|model| {
        ctx.renderer.prepare(&ctx.device, &ctx.queue, model);
        &*model
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(ctx.clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &ctx.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
            multiview_mask: None,
        });

        if let Some(model) = model {
            ctx.renderer.draw(
                &mut render_pass,
                model,
                &ctx.camera.bind_group,
                &ctx.light.bind_group,
            );
        }
    }

    ctx.queue.submit(iter::once(encoder.finish()));
    output.present();
    Ok(())
}
