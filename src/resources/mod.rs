//! Loading of the model asset.
//!
//! [`load_model_gltf`] reads a `.glb` or `.gltf` file, resolves its buffers
//! and base colour images and builds a CPU-side [`SceneNode`] tree. Nothing
//! here touches the GPU; meshes are uploaded by the renderer on first draw.

use std::{collections::HashMap, sync::Arc};

use anyhow::{Context as _, anyhow, bail};
use base64::Engine as _;
use futures::channel::mpsc::UnboundedSender;

use crate::data_structures::{
    instance::Instance,
    material::{Emissive, Material},
    model::{ModelVertex, Primitive},
    scene_graph::{MeshNode, SceneNode},
    texture::Texture,
};

pub mod texture;

/// Bytes read so far out of the expected total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    pub total: Option<u64>,
}

impl LoadProgress {
    /// Rounded percentage, `None` while the total size is unknown.
    pub fn percent(&self) -> Option<u8> {
        let total = self.total.filter(|t| *t > 0)?;
        let pct = (self.loaded as f64 / total as f64 * 100.0).round();
        Some(pct.clamp(0.0, 100.0) as u8)
    }
}

/// Sends `progress` if anyone is still listening.
fn report(progress: Option<&UnboundedSender<LoadProgress>>, update: LoadProgress) {
    if let Some(tx) = progress {
        // a dropped receiver only means nobody shows the numbers
        let _ = tx.unbounded_send(update);
    }
}

/// Decodes `data:[<mime>][;base64],<payload>` URIs as used for embedded
/// glTF buffers and images. Returns the mime type and the payload.
pub fn decode_data_uri(uri: &str) -> anyhow::Result<(Option<String>, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("not a data URI"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("data URI without payload"))?;
    let (mime, is_base64) = match meta.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (meta, false),
    };
    let mime = (!mime.is_empty()).then(|| mime.to_string());
    let data = if is_base64 {
        base64::engine::general_purpose::STANDARD.decode(payload)?
    } else {
        payload.as_bytes().to_vec()
    };
    Ok((mime, data))
}

/// Resolves `uri` relative to the file it was referenced from.
fn relative_to(base_file: &str, uri: &str) -> String {
    match base_file.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{uri}"),
        None => uri.to_string(),
    }
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow!("no window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow!("page has no origin"))?;
    let base = reqwest::Url::parse(&format!("{origin}/assets/"))?;
    Ok(base.join(file_name)?)
}

/// Native builds look next to the working directory first, then into
/// `./assets` and finally into the assets bundled at build time.
#[cfg(not(target_arch = "wasm32"))]
pub fn asset_path(file_name: &str) -> std::path::PathBuf {
    let direct = std::path::Path::new(file_name);
    if direct.exists() {
        return direct.to_path_buf();
    }
    let local = std::path::Path::new("./").join("assets").join(file_name);
    if local.exists() {
        return local;
    }
    // copy made by the build script
    std::path::Path::new(env!("FLOW_AVATAR_BUNDLED_ASSETS")).join(file_name)
}

/// Reads `reader` to the end, reporting every chunk.
#[cfg(not(target_arch = "wasm32"))]
pub async fn read_with_progress<R>(
    mut reader: R,
    total: Option<u64>,
    progress: Option<&UnboundedSender<LoadProgress>>,
) -> std::io::Result<Vec<u8>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    use tokio::io::AsyncReadExt;

    let mut data = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);
        report(
            progress,
            LoadProgress {
                loaded: data.len() as u64,
                total,
            },
        );
    }
    Ok(data)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    load_binary_with_progress(file_name, None).await
}

pub async fn load_binary_with_progress(
    file_name: &str,
    progress: Option<&UnboundedSender<LoadProgress>>,
) -> anyhow::Result<Vec<u8>> {
    if file_name.starts_with("data:") {
        return Ok(decode_data_uri(file_name)?.1);
    }

    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        let response = reqwest::get(url).await?;
        if !response.status().is_success() {
            bail!("{file_name}: HTTP status {}", response.status());
        }
        let total = response.content_length();
        let data = response.bytes().await?.to_vec();
        report(
            progress,
            LoadProgress {
                loaded: data.len() as u64,
                total: total.or(Some(data.len() as u64)),
            },
        );
        data
    };

    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = asset_path(file_name);
        let file = tokio::fs::File::open(&path)
            .await
            .with_context(|| format!("opening {}", path.display()))?;
        let total = file.metadata().await.ok().map(|m| m.len());
        read_with_progress(file, total, progress)
            .await
            .with_context(|| format!("reading {}", path.display()))?
    };

    Ok(data)
}

/// Loads a glTF model into a scene tree whose root is a grouping node.
///
/// Progress of the main file download is sent on `progress`; the stream ends
/// when the sender is dropped at the end of loading.
pub async fn load_model_gltf(
    file_name: &str,
    progress: Option<UnboundedSender<LoadProgress>>,
) -> anyhow::Result<SceneNode> {
    let bytes = load_binary_with_progress(file_name, progress.as_ref()).await?;
    drop(progress);
    parse_gltf(file_name, &bytes).await
}

/// Builds the scene tree from the raw contents of a `.glb`/`.gltf` file.
pub async fn parse_gltf(file_name: &str, bytes: &[u8]) -> anyhow::Result<SceneNode> {
    let gltf = gltf::Gltf::from_slice(bytes).with_context(|| format!("parsing {file_name}"))?;

    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or_else(|| anyhow!("{file_name}: missing binary chunk"))?,
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => decode_data_uri(uri)?.1,
            gltf::buffer::Source::Uri(uri) => load_binary(&relative_to(file_name, uri)).await?,
        };
        if data.len() < buffer.length() {
            bail!(
                "{file_name}: buffer {} holds {} bytes, expected {}",
                buffer.index(),
                data.len(),
                buffer.length()
            );
        }
        buffer_data.push(data);
    }

    let mut images: HashMap<usize, Arc<Texture>> = HashMap::new();
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let [r, g, b, _] = pbr.base_color_factor();
        let texture = match pbr.base_color_texture() {
            Some(info) => Some(
                texture::load_gltf_texture(file_name, &info.texture(), &buffer_data, &mut images)
                    .await?,
            ),
            None => None,
        };
        let emissive_color = material.emissive_factor();
        let emissive = emissive_color
            .iter()
            .any(|c| *c > 0.0)
            .then_some(Emissive {
                color: emissive_color,
                intensity: 1.0,
            });
        materials.push(Material {
            name: material.name().unwrap_or("gltf material").to_string(),
            base_color: [r, g, b],
            texture,
            roughness: pbr.roughness_factor(),
            metalness: pbr.metallic_factor(),
            emissive,
        });
    }

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| anyhow!("{file_name}: no scene"))?;
    let mut root = SceneNode::group(scene.name().unwrap_or("Scene"));
    for node in scene.nodes() {
        root.add_child(to_scene_node(&node, &buffer_data, &materials));
    }
    log::info!("{file_name}: {} meshes loaded", root.mesh_count());
    Ok(root)
}

fn to_scene_node(node: &gltf::Node, buffers: &[Vec<u8>], materials: &[Material]) -> SceneNode {
    let name = node
        .name()
        .or_else(|| node.mesh().and_then(|m| m.name()))
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));

    let mut scene_node = match node.mesh() {
        Some(mesh) => {
            let primitives = mesh
                .primitives()
                .filter_map(|p| read_primitive(&name, &p, buffers))
                .collect();
            // one material per mesh node: the first primitive decides
            let material = mesh
                .primitives()
                .find_map(|p| p.material().index())
                .and_then(|idx| materials.get(idx).cloned())
                .unwrap_or_default();
            SceneNode::with_mesh(name, MeshNode::new(primitives, material))
        }
        None => SceneNode::group(name),
    };

    let (translation, rotation, scale) = node.transform().decomposed();
    scene_node.local = Instance {
        position: translation.into(),
        rotation: rotation.into(),
        scale: scale.into(),
    };
    for child in node.children() {
        scene_node.add_child(to_scene_node(&child, buffers, materials));
    }
    scene_node
}

fn read_primitive(name: &str, primitive: &gltf::Primitive, buffers: &[Vec<u8>]) -> Option<Primitive> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        log::warn!("{name}: skipping {:?} primitive", primitive.mode());
        return None;
    }
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let mut vertices: Vec<ModelVertex> = reader
        .read_positions()?
        .map(|position| ModelVertex {
            position,
            normal: [0.0, 1.0, 0.0],
            ..Default::default()
        })
        .collect();
    if let Some(normals) = reader.read_normals() {
        vertices
            .iter_mut()
            .zip(normals)
            .for_each(|(v, normal)| v.normal = normal);
    }
    if let Some(tex_coords) = reader.read_tex_coords(0) {
        vertices
            .iter_mut()
            .zip(tex_coords.into_f32())
            .for_each(|(v, uv)| v.tex_coords = uv);
    }

    let indices = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertices.len() as u32).collect(),
    };
    Some(Primitive::new(vertices, indices))
}
