//! Error taxonomy of the skin pipeline.
//!
//! Every stage returns a [`SkinError`] and hands it upwards unchanged. The
//! orchestrator in [`crate::skin::pipeline`] is the only place that turns an
//! error into the neutral fallback material.

use thiserror::Error;

/// Failure of one of the skin pipeline stages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkinError {
    /// The identity service does not know the handle.
    #[error("Player \"{0}\" not found")]
    IdentityNotFound(String),

    /// The profile service does not know the unique id.
    #[error("Profile data not found for {0}")]
    ProfileNotFound(String),

    /// The request could not be sent or its response could not be read.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The profile carries no `textures` property.
    #[error("No texture data found")]
    MissingTextureProperty,

    /// The `textures` property is not valid base64 encoded JSON.
    #[error("Malformed texture manifest: {0}")]
    MalformedManifest(String),

    /// The manifest decoded fine but has no `SKIN` slot.
    #[error("No skin texture found")]
    MissingSkinSlot,

    /// The skin image could not be fetched or decoded.
    #[error("Failed to load texture {url}: {cause}")]
    TextureLoad { url: String, cause: String },
}

impl SkinError {
    pub(crate) fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub(crate) fn texture_load(url: &str, cause: impl std::fmt::Display) -> Self {
        Self::TextureLoad {
            url: url.to_string(),
            cause: cause.to_string(),
        }
    }
}
