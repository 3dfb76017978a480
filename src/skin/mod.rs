//! Player skin resolution.
//!
//! A handle is turned into a texture in four network-facing stages, each in
//! its own module, and the result is applied to the model by [`apply`]:
//!
//! - [`identity`] handle -> unique id
//! - [`profile`] unique id -> profile record
//! - [`manifest`] profile record -> skin URL
//! - [`texture_loader`] skin URL -> texture
//!
//! [`pipeline::SkinPipeline`] strings them together and owns the fallback.

pub mod apply;
pub mod error;
pub mod http;
pub mod identity;
pub mod manifest;
pub mod pipeline;
pub mod probe;
pub mod profile;
pub mod texture_loader;

pub use apply::{apply_fallback_material, apply_skin_material};
pub use error::SkinError;
pub use http::{Endpoints, HttpClient, HttpResponse, ReqwestClient};
pub use identity::{UniqueId, resolve_identity};
pub use manifest::decode_skin_url;
pub use pipeline::{SkinOutcome, SkinPipeline, SkinSettings, SkinStage, StageError};
pub use probe::{ProbeReport, probe_handle};
pub use profile::{ProfileRecord, fetch_profile};
pub use texture_loader::load_skin_texture;
