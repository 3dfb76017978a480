//! Material replacement on a loaded model.

use std::sync::Arc;

use crate::data_structures::{
    material::{Emissive, Material},
    scene_graph::SceneNode,
    texture::Texture,
};

/// Meshes whose name contains "eye" in any letter case glow.
pub fn is_eye(name: &str) -> bool {
    name.to_lowercase().contains("eye")
}

/// Gives every mesh a fresh skinned material bound to `texture`.
///
/// Returns the number of meshes touched; a model without meshes is fine.
pub fn apply_skin_material(model: &mut SceneNode, texture: &Arc<Texture>) -> usize {
    let mut count = 0;
    model.visit_meshes_mut(|name, mesh| {
        let mut material = Material::skinned(Arc::clone(texture));
        if is_eye(name) {
            material = material.with_emissive(Emissive::eye_glow());
        }
        mesh.set_material(material);
        count += 1;
    });
    log::info!("Skin applied to {count} meshes");
    count
}

/// Gives every mesh the flat grey fallback material, dropping any texture.
pub fn apply_fallback_material(model: &mut SceneNode) -> usize {
    let mut count = 0;
    model.visit_meshes_mut(|_, mesh| {
        mesh.set_material(Material::fallback());
        count += 1;
    });
    log::info!("Fallback material applied to {count} meshes");
    count
}

/// Whether at least one mesh currently shows a texture.
pub fn has_texture(model: &SceneNode) -> bool {
    let mut textured = false;
    model.visit_meshes(|_, mesh| textured |= mesh.material().is_textured());
    textured
}
