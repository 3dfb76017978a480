//! Viewer configuration.
//!
//! Every field has a default, so a config file only needs to mention what it
//! changes:
//!
//! ```toml
//! [skin]
//! username = "Notch"
//!
//! [model]
//! path = "steve.glb"
//! y_position = -0.5
//! ```

use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

use crate::skin::{http::Endpoints, pipeline::SkinSettings};

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub skin: SkinConfig,
    pub model: ModelConfig,
    pub camera: CameraConfig,
    pub lighting: LightingConfig,
    pub scene: SceneConfig,
    pub animation: AnimationConfig,
}

impl ViewerConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&s).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SkinConfig {
    pub username: String,
    pub endpoints: Endpoints,
    #[serde(flatten)]
    pub settings: SkinSettings,
}

impl Default for SkinConfig {
    fn default() -> Self {
        Self {
            username: "OrpoPro".to_string(),
            endpoints: Endpoints::default(),
            settings: SkinSettings::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Relative to the asset directory.
    pub path: String,
    pub scale: f32,
    pub y_position: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "minecraft-base-model.glb".to_string(),
            scale: 1.0,
            y_position: -1.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 1.8, -2.5],
            target: [0.0, 1.2, 0.0],
            fov: 60.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub directional_color: u32,
    pub directional_intensity: f32,
    /// The directional light shines from here towards the origin.
    pub directional_position: [f32; 3],
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_color: 0xffffff,
            ambient_intensity: 0.5,
            directional_color: 0xffffff,
            directional_intensity: 0.8,
            directional_position: [2.0, 5.0, -3.0],
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    pub background: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: 0x0a0a0a,
        }
    }
}

/// Idle "breathing" motion of the model.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnimationConfig {
    /// Phase advance per frame.
    pub speed: f32,
    /// Vertical amplitude.
    pub amount: f32,
    /// Yaw amplitude in radians.
    pub sway: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            speed: 0.001,
            amount: 0.02,
            sway: 0.01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.skin.username, "OrpoPro");
        assert_eq!(config.model.path, "minecraft-base-model.glb");
        assert_eq!(config.camera.fov, 60.0);
        assert_eq!(config.scene.background, 0x0a0a0a);
        assert!(!config.skin.settings.keep_last_good_on_failure);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [skin]
            username = "Notch"
            keep_last_good_on_failure = true

            [skin.endpoints]
            identity_base = "http://localhost:9000/names"

            [lighting]
            ambient_color = 0xff0000
            "#,
        )
        .unwrap();
        assert_eq!(config.skin.username, "Notch");
        assert!(config.skin.settings.keep_last_good_on_failure);
        assert_eq!(config.skin.endpoints.identity_base, "http://localhost:9000/names");
        assert_eq!(config.skin.endpoints.profile_base, Endpoints::default().profile_base);
        assert_eq!(config.lighting.ambient_color, 0xff0000);
        assert_eq!(config.lighting.ambient_intensity, 0.5);
        assert_eq!(config.model, ModelConfig::default());
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(ViewerConfig::from_toml_str("[model]\nscale = \"big\"").is_err());
    }
}
