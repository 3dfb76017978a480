//! Surface materials of mesh nodes.
//!
//! A [`Material`] is the unit that gets swapped when a skin is applied: mesh
//! nodes own exactly one and replace it wholesale.

use std::sync::Arc;

use crate::data_structures::texture::Texture;

pub const SKIN_ROUGHNESS: f32 = 0.8;
pub const SKIN_METALNESS: f32 = 0.2;
pub const FALLBACK_COLOR: u32 = 0x888888;
pub const EYE_GLOW_COLOR: u32 = 0x00ffff;
pub const EYE_GLOW_INTENSITY: f32 = 3.0;

/// Converts an sRGB hex colour like `0x888888` into linear RGB.
pub fn hex_to_linear(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0)]
}

/// Additive glow drawn on top of the lit surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Emissive {
    /// Linear RGB.
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Emissive {
    pub fn new(hex: u32, intensity: f32) -> Self {
        Self {
            color: hex_to_linear(hex),
            intensity,
        }
    }

    pub fn eye_glow() -> Self {
        Self::new(EYE_GLOW_COLOR, EYE_GLOW_INTENSITY)
    }
}

#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    /// Linear RGB, multiplied with the texture sample.
    pub base_color: [f32; 3],
    pub texture: Option<Arc<Texture>>,
    pub roughness: f32,
    pub metalness: f32,
    pub emissive: Option<Emissive>,
}

impl Material {
    /// Material showing a player skin. The base colour stays white so the
    /// texture is shown unaltered.
    pub fn skinned(texture: Arc<Texture>) -> Self {
        Self {
            name: "skin".to_string(),
            base_color: [1.0; 3],
            texture: Some(texture),
            roughness: SKIN_ROUGHNESS,
            metalness: SKIN_METALNESS,
            emissive: None,
        }
    }

    /// Flat neutral grey used whenever no skin could be loaded.
    pub fn fallback() -> Self {
        Self {
            name: "fallback".to_string(),
            base_color: hex_to_linear(FALLBACK_COLOR),
            texture: None,
            roughness: SKIN_ROUGHNESS,
            metalness: SKIN_METALNESS,
            emissive: None,
        }
    }

    pub fn with_emissive(mut self, emissive: Emissive) -> Self {
        self.emissive = Some(emissive);
        self
    }

    pub fn is_textured(&self) -> bool {
        self.texture.is_some()
    }

    pub fn to_uniform(&self) -> MaterialUniform {
        let [r, g, b] = self.base_color;
        let emissive = self
            .emissive
            .map(|e| {
                [
                    e.color[0] * e.intensity,
                    e.color[1] * e.intensity,
                    e.color[2] * e.intensity,
                    0.0,
                ]
            })
            .unwrap_or_default();
        MaterialUniform {
            base_color: [r, g, b, 1.0],
            emissive,
            params: [
                self.roughness,
                self.metalness,
                if self.is_textured() { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

impl Default for Material {
    /// The glTF default material: white, fully rough, non-metallic.
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_color: [1.0; 3],
            texture: None,
            roughness: 1.0,
            metalness: 0.0,
            emissive: None,
        }
    }
}

/// Material data as laid out in the shader's uniform buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    /// rgb premultiplied by intensity
    pub emissive: [f32; 4],
    /// roughness, metalness, has_texture, unused
    pub params: [f32; 4],
}
