//! Scene graph of a loaded model.
//!
//! The graph is a plain tree of [`SceneNode`]s. A node is either a grouping
//! node that only carries a transform or a mesh node with geometry and one
//! [`Material`]. Traversals hand out the mesh payload with the node name so
//! callers never need to downcast.

use std::fmt;

use crate::{
    data_structures::{instance::Instance, material::Material, model::Primitive},
    render::MeshGpu,
};

#[derive(Debug)]
pub enum NodeKind {
    Group,
    Mesh(MeshNode),
}

#[derive(Debug)]
pub struct SceneNode {
    pub name: String,
    pub local: Instance,
    pub kind: NodeKind,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: Instance::new(),
            kind: NodeKind::Group,
            children: Vec::new(),
        }
    }

    pub fn with_mesh(name: impl Into<String>, mesh: MeshNode) -> Self {
        Self {
            name: name.into(),
            local: Instance::new(),
            kind: NodeKind::Mesh(mesh),
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: SceneNode) -> &mut Self {
        self.children.push(child);
        self
    }

    pub fn mesh(&self) -> Option<&MeshNode> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut MeshNode> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }

    /// Depth-first, parents before children.
    pub fn visit_meshes(&self, mut f: impl FnMut(&str, &MeshNode)) {
        self.walk(&mut f);
    }

    pub fn visit_meshes_mut(&mut self, mut f: impl FnMut(&str, &mut MeshNode)) {
        self.walk_mut(&mut f);
    }

    /// Like [`SceneNode::visit_meshes_mut`] but also hands out each mesh's
    /// world transform, with `root` as the transform of this node's parent.
    pub fn visit_meshes_world_mut(
        &mut self,
        root: &Instance,
        mut f: impl FnMut(&Instance, &mut MeshNode),
    ) {
        self.walk_world_mut(root, &mut f);
    }

    fn walk(&self, f: &mut dyn FnMut(&str, &MeshNode)) {
        if let NodeKind::Mesh(mesh) = &self.kind {
            f(&self.name, mesh);
        }
        for child in &self.children {
            child.walk(f);
        }
    }

    fn walk_mut(&mut self, f: &mut dyn FnMut(&str, &mut MeshNode)) {
        if let NodeKind::Mesh(mesh) = &mut self.kind {
            f(&self.name, mesh);
        }
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }

    fn walk_world_mut(&mut self, parent: &Instance, f: &mut dyn FnMut(&Instance, &mut MeshNode)) {
        let world = parent * &self.local;
        if let NodeKind::Mesh(mesh) = &mut self.kind {
            f(&world, mesh);
        }
        for child in &mut self.children {
            child.walk_world_mut(&world, f);
        }
    }

    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.visit_meshes(|_, _| count += 1);
        count
    }

    /// First node (depth-first) with exactly this name.
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(name))
    }
}

/// Geometry plus the single material it is drawn with.
///
/// The material is replaced through [`MeshNode::set_material`], which bumps a
/// revision counter so the renderer knows to rebuild its bind group.
#[derive(Debug)]
pub struct MeshNode {
    pub primitives: Vec<Primitive>,
    material: Material,
    revision: u64,
    pub(crate) gpu: Option<MeshGpu>,
}

impl MeshNode {
    pub fn new(primitives: Vec<Primitive>, material: Material) -> Self {
        Self {
            primitives,
            material,
            revision: 0,
            gpu: None,
        }
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Replaces the material and returns the previous one.
    pub fn set_material(&mut self, material: Material) -> Material {
        self.revision += 1;
        std::mem::replace(&mut self.material, material)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn vertex_count(&self) -> usize {
        self.primitives.iter().map(|p| p.vertices.len()).sum()
    }
}

/// Snapshot of one mesh's material state.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshReport {
    pub name: String,
    pub vertices: usize,
    pub material: String,
    pub texture: Option<String>,
    pub emissive: bool,
}

/// What [`inspect_model`] found, printable as a small table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelReport {
    pub meshes: Vec<MeshReport>,
}

impl ModelReport {
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn textured_count(&self) -> usize {
        self.meshes.iter().filter(|m| m.texture.is_some()).count()
    }
}

impl fmt::Display for ModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} meshes, {} textured",
            self.mesh_count(),
            self.textured_count()
        )?;
        for mesh in &self.meshes {
            write!(
                f,
                "  {} ({} vertices): {}",
                mesh.name, mesh.vertices, mesh.material
            )?;
            if let Some(texture) = &mesh.texture {
                write!(f, ", texture {texture}")?;
            }
            if mesh.emissive {
                write!(f, ", emissive")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub fn inspect_model(model: &SceneNode) -> ModelReport {
    let mut meshes = Vec::new();
    model.visit_meshes(|name, mesh| {
        let material = mesh.material();
        meshes.push(MeshReport {
            name: name.to_string(),
            vertices: mesh.vertex_count(),
            material: material.name.clone(),
            texture: material.texture.as_ref().map(|t| t.label().to_string()),
            emissive: material.emissive.is_some(),
        });
    });
    ModelReport { meshes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh(name: &str) -> SceneNode {
        SceneNode::with_mesh(name, MeshNode::new(vec![Primitive::quad()], Material::default()))
    }

    fn tree() -> SceneNode {
        let mut root = SceneNode::group("root");
        let mut head = mesh("Head");
        head.add_child(mesh("Eye"));
        root.add_child(head);
        root.add_child(SceneNode::group("empty"));
        root.add_child(mesh("Body"));
        root
    }

    #[test]
    fn visits_meshes_depth_first() {
        let mut names = Vec::new();
        tree().visit_meshes(|name, _| names.push(name.to_string()));
        assert_eq!(names, ["Head", "Eye", "Body"]);
    }

    #[test]
    fn set_material_bumps_revision() {
        let mut root = tree();
        let eye = root.find_mut("Eye").and_then(SceneNode::mesh_mut).unwrap();
        assert_eq!(eye.revision(), 0);
        let old = eye.set_material(Material::fallback());
        assert_eq!(old.name, "default");
        assert_eq!(eye.revision(), 1);
        assert!(root.find("empty").unwrap().mesh().is_none());
    }

    #[test]
    fn world_transforms_accumulate() {
        let mut root = tree();
        root.local = Instance::placed(1.0, -1.0, 0.0);
        let mut ys = Vec::new();
        root.visit_meshes_world_mut(&Instance::new(), |world, _| ys.push(world.position.y));
        assert_eq!(ys, [-1.0, -1.0, -1.0]);
    }

    #[test]
    fn report_lists_every_mesh() {
        let report = inspect_model(&tree());
        assert_eq!(report.mesh_count(), 3);
        assert_eq!(report.textured_count(), 0);
        let text = report.to_string();
        assert!(text.starts_with("3 meshes, 0 textured"));
        assert!(text.contains("Eye (4 vertices): default"));
    }
}
