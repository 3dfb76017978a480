//! Decoding of the texture manifest embedded in a profile.
//!
//! The `textures` property carries base64 encoded JSON of the shape
//! `{"textures": {"SKIN": {"url": "..."}, "CAPE": {...}}}`. Decoding is pure:
//! nothing here touches the network.

use std::collections::HashMap;

use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde::Deserialize;

use crate::skin::{error::SkinError, profile::ProfileRecord};

pub const TEXTURES_PROPERTY: &str = "textures";
pub const SKIN_SLOT: &str = "SKIN";

// The session service pads its payloads, hand-written fixtures often don't.
const MANIFEST_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct SlotMetadata {
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct TextureSlot {
    pub url: String,
    #[serde(default)]
    pub metadata: Option<SlotMetadata>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TextureManifest {
    #[serde(default)]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub profile_name: Option<String>,
    #[serde(default)]
    pub textures: HashMap<String, TextureSlot>,
}

impl TextureManifest {
    pub fn slot(&self, name: &str) -> Option<&TextureSlot> {
        self.textures.get(name)
    }

    /// `true` for skins made for the slim (3px arm) player model.
    pub fn is_slim(&self) -> bool {
        self.slot(SKIN_SLOT)
            .and_then(|slot| slot.metadata.as_ref())
            .and_then(|meta| meta.model.as_deref())
            == Some("slim")
    }
}

/// Decodes the first `textures` property of `record`.
pub fn decode_manifest(record: &ProfileRecord) -> Result<TextureManifest, SkinError> {
    let property = record
        .property(TEXTURES_PROPERTY)
        .ok_or(SkinError::MissingTextureProperty)?;
    let json = MANIFEST_BASE64
        .decode(property.value.trim())
        .map_err(|e| SkinError::MalformedManifest(e.to_string()))?;
    serde_json::from_slice(&json).map_err(|e| SkinError::MalformedManifest(e.to_string()))
}

/// Extracts the URL of the `SKIN` slot.
pub fn decode_skin_url(record: &ProfileRecord) -> Result<String, SkinError> {
    let manifest = decode_manifest(record)?;
    let url = manifest
        .slot(SKIN_SLOT)
        .map(|slot| slot.url.clone())
        .ok_or(SkinError::MissingSkinSlot)?;
    log::info!("Skin URL: {url}");
    Ok(url)
}
