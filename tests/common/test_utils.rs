#![allow(dead_code)]

use std::{collections::HashMap, io::Cursor, sync::Mutex};

use base64::Engine as _;
use flow_avatar::{
    data_structures::{
        material::Material,
        model::Primitive,
        scene_graph::{MeshNode, SceneNode},
    },
    skin::{Endpoints, HttpClient, HttpResponse, SkinError},
    status::{Status, StatusSink},
};
use image::{DynamicImage, ImageFormat, RgbaImage};

pub const SKIN_URL: &str = "http://textures.minecraft.net/texture/0123abcd";

/// In-memory HTTP client. Unknown URLs answer 404; every request is recorded.
#[derive(Default)]
pub struct FakeHttp {
    routes: HashMap<String, Result<HttpResponse, SkinError>>,
    requests: Mutex<Vec<String>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.routes
            .insert(url.into(), Ok(HttpResponse::new(status, body)));
        self
    }

    pub fn broken(mut self, url: impl Into<String>) -> Self {
        self.routes.insert(
            url.into(),
            Err(SkinError::Transport("connection reset".into())),
        );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn was_requested(&self, url: &str) -> bool {
        self.requests().iter().any(|r| r == url)
    }
}

impl HttpClient for FakeHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse, SkinError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.routes
            .get(url)
            .cloned()
            .unwrap_or_else(|| Ok(HttpResponse::new(404, Vec::new())))
    }
}

pub fn identity_url(handle: &str) -> String {
    Endpoints::default().identity_url(handle).unwrap()
}

pub fn profile_url(id: &str) -> String {
    Endpoints::default().profile_url(id).unwrap()
}

/// A 64x64 PNG with a recognisable gradient.
pub fn skin_png() -> Vec<u8> {
    png(64, 64)
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| image::Rgba([x as u8 * 4, y as u8 * 4, 128, 255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Base64 value of a `textures` property. `None` leaves out the SKIN slot.
pub fn textures_value(skin_url: Option<&str>) -> String {
    let mut textures = serde_json::Map::new();
    if let Some(url) = skin_url {
        textures.insert("SKIN".into(), serde_json::json!({ "url": url }));
    }
    textures.insert(
        "CAPE".into(),
        serde_json::json!({ "url": "http://textures.minecraft.net/texture/cape" }),
    );
    let manifest = serde_json::json!({
        "timestamp": 1700000000000u64,
        "profileId": "abc123",
        "profileName": "OrpoPro",
        "textures": textures,
    });
    base64::engine::general_purpose::STANDARD.encode(manifest.to_string())
}

pub fn identity_json(id: &str, name: &str) -> String {
    serde_json::json!({ "id": id, "name": name }).to_string()
}

pub fn profile_json(id: &str, name: &str, properties: &[(&str, &str)]) -> String {
    let properties: Vec<_> = properties
        .iter()
        .map(|(name, value)| serde_json::json!({ "name": name, "value": value }))
        .collect();
    serde_json::json!({ "id": id, "name": name, "properties": properties }).to_string()
}

/// Routes for a player whose profile points at [`SKIN_URL`].
pub fn known_player(handle: &str, id: &str) -> FakeHttp {
    FakeHttp::new()
        .route(identity_url(handle), 200, identity_json(id, handle))
        .route(
            profile_url(id),
            200,
            profile_json(id, handle, &[("textures", textures_value(Some(SKIN_URL)).as_str())]),
        )
        .route(SKIN_URL, 200, skin_png())
}

fn mesh(name: &str, material: Material) -> SceneNode {
    SceneNode::with_mesh(name, MeshNode::new(vec![Primitive::quad()], material))
}

/// Root group with a head (two eye children), a body and an empty group.
/// Every mesh starts out with a material named "original".
pub fn sample_model() -> SceneNode {
    let original = Material {
        name: "original".into(),
        ..Default::default()
    };
    let mut root = SceneNode::group("Scene");
    let mut head = mesh("Head", original.clone());
    head.add_child(mesh("Eye", original.clone()));
    head.add_child(mesh("left_EYE", original.clone()));
    root.add_child(head);
    root.add_child(SceneNode::group("Armature"));
    root.add_child(mesh("Body", original));
    root
}

/// Name and material of every mesh, depth-first.
pub fn materials(model: &SceneNode) -> Vec<(String, Material)> {
    let mut out = Vec::new();
    model.visit_meshes(|name, mesh| out.push((name.to_string(), mesh.material().clone())));
    out
}

/// Remembers every indicator change.
#[derive(Debug, Default)]
pub struct RecordingStatus {
    pub history: Vec<Status>,
}

impl RecordingStatus {
    pub fn last(&self) -> Option<&Status> {
        self.history.last()
    }
}

impl StatusSink for RecordingStatus {
    fn show(&mut self, text: &str) {
        self.history.push(Status::Message(text.to_string()));
    }

    fn error(&mut self, text: &str) {
        self.history.push(Status::Error(text.to_string()));
    }

    fn hide(&mut self) {
        self.history.push(Status::Hidden);
    }
}
