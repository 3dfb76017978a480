use std::{collections::HashMap, sync::Arc};

use anyhow::anyhow;

use crate::{
    data_structures::texture::{GpuTexture, Texture, TextureOptions},
    resources::{decode_data_uri, load_binary, relative_to},
};

/// Layout of bind group 2: material uniform, base colour texture, sampler.
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}

pub fn mk_material_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniform: &wgpu::Buffer,
    texture: &GpuTexture,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
        label: Some(label),
    })
}

fn sampling(sampler: &gltf::texture::Sampler) -> TextureOptions {
    use gltf::texture::{MagFilter, MinFilter};

    let mag_filter = match sampler.mag_filter() {
        Some(MagFilter::Nearest) => wgpu::FilterMode::Nearest,
        _ => wgpu::FilterMode::Linear,
    };
    let min_filter = match sampler.min_filter() {
        Some(MinFilter::Nearest | MinFilter::NearestMipmapNearest | MinFilter::NearestMipmapLinear) => {
            wgpu::FilterMode::Nearest
        }
        _ => wgpu::FilterMode::Linear,
    };
    TextureOptions {
        mag_filter,
        min_filter,
        // glTF UVs already have their origin in the top-left corner
        flip_y: false,
    }
}

/// Decodes the image behind a glTF texture. Images used by several
/// materials are decoded once and shared through `cache`.
pub(crate) async fn load_gltf_texture(
    file_name: &str,
    texture: &gltf::Texture<'_>,
    buffers: &[Vec<u8>],
    cache: &mut HashMap<usize, Arc<Texture>>,
) -> anyhow::Result<Arc<Texture>> {
    let image = texture.source();
    if let Some(texture) = cache.get(&image.index()) {
        return Ok(Arc::clone(texture));
    }

    let (bytes, mime) = match image.source() {
        gltf::image::Source::View { view, mime_type } => {
            let start = view.offset();
            let end = start + view.length();
            let bytes = buffers
                .get(view.buffer().index())
                .and_then(|buffer| buffer.get(start..end))
                .ok_or_else(|| anyhow!("{file_name}: image {} is out of bounds", image.index()))?;
            (bytes.to_vec(), Some(mime_type.to_string()))
        }
        gltf::image::Source::Uri { uri, mime_type } if uri.starts_with("data:") => {
            let (uri_mime, bytes) = decode_data_uri(uri)?;
            (bytes, uri_mime.or(mime_type.map(str::to_string)))
        }
        gltf::image::Source::Uri { uri, mime_type } => (
            load_binary(&relative_to(file_name, uri)).await?,
            mime_type.map(str::to_string),
        ),
    };

    let label = image
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{file_name}#image{}", image.index()));
    let format = mime.as_deref().and_then(|m| m.rsplit('/').next());
    let decoded = Arc::new(Texture::from_bytes(
        &bytes,
        &label,
        format,
        sampling(&texture.sampler()),
    )?);
    cache.insert(image.index(), Arc::clone(&decoded));
    Ok(decoded)
}
