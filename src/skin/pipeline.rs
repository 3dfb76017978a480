//! Skin pipeline orchestration.
//!
//! [`SkinPipeline::fetch_skin`] walks the stages handle -> id -> profile ->
//! manifest -> texture and stops at the first failure.
//! [`SkinPipeline::finish`] is the single place where failures are recovered
//! from: the model either receives the skin or the grey fallback, and the
//! status indicator is updated accordingly.
//!
//! The two halves are separate so the network part can run on whatever
//! executor the platform has while the model stays with its owner.

use std::{fmt, sync::Arc};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    data_structures::{scene_graph::SceneNode, texture::Texture},
    skin::{
        apply::{apply_fallback_material, apply_skin_material, has_texture},
        error::SkinError,
        http::{Endpoints, HttpClient},
        identity::resolve_identity,
        manifest::decode_skin_url,
        profile::fetch_profile,
        texture_loader::load_skin_texture,
    },
    status::StatusSink,
};

/// Where a pipeline run currently is, or where it ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkinStage {
    Idle,
    Resolving,
    FetchingProfile,
    Decoding,
    LoadingTexture,
    Applying,
    Done,
    Failed,
    FallbackApplied,
}

impl fmt::Display for SkinStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkinStage::Idle => "idle",
            SkinStage::Resolving => "resolving handle",
            SkinStage::FetchingProfile => "fetching profile",
            SkinStage::Decoding => "decoding manifest",
            SkinStage::LoadingTexture => "loading texture",
            SkinStage::Applying => "applying skin",
            SkinStage::Done => "done",
            SkinStage::Failed => "failed",
            SkinStage::FallbackApplied => "fallback applied",
        };
        f.write_str(s)
    }
}

/// A [`SkinError`] tagged with the stage that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{error}")]
pub struct StageError {
    pub stage: SkinStage,
    pub error: SkinError,
}

impl StageError {
    fn at(stage: SkinStage) -> impl FnOnce(SkinError) -> Self {
        move |error| Self { stage, error }
    }
}

/// Tunables of the recovery boundary.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SkinSettings {
    /// On failure keep a skin that an earlier run already applied instead of
    /// switching back to the grey fallback.
    pub keep_last_good_on_failure: bool,
}

/// How one pipeline run ended.
#[derive(Clone, Debug)]
pub struct SkinOutcome {
    /// `Done`, `FallbackApplied`, or `Failed` when an earlier skin was kept.
    pub stage: SkinStage,
    /// Meshes whose material was replaced.
    pub meshes: usize,
    pub texture: Option<Arc<Texture>>,
    pub failure: Option<StageError>,
}

impl SkinOutcome {
    pub fn is_success(&self) -> bool {
        self.stage == SkinStage::Done
    }

    pub fn error(&self) -> Option<&SkinError> {
        self.failure.as_ref().map(|f| &f.error)
    }

    pub fn failed_at(&self) -> Option<SkinStage> {
        self.failure.as_ref().map(|f| f.stage)
    }
}

#[derive(Clone, Debug)]
pub struct SkinPipeline<H> {
    http: H,
    endpoints: Endpoints,
    settings: SkinSettings,
}

impl<H: HttpClient> SkinPipeline<H> {
    pub fn new(http: H) -> Self {
        Self {
            http,
            endpoints: Endpoints::default(),
            settings: SkinSettings::default(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_settings(mut self, settings: SkinSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Resolves `handle` all the way to a decoded skin texture.
    pub async fn fetch_skin(
        &self,
        handle: &str,
        status: &mut impl StatusSink,
    ) -> Result<Arc<Texture>, StageError> {
        status.show(&format!("Loading skin for {handle}..."));

        log::debug!("{}: {handle}", SkinStage::Resolving);
        let id = resolve_identity(&self.http, &self.endpoints, handle)
            .await
            .map_err(StageError::at(SkinStage::Resolving))?;

        log::debug!("{}: {id}", SkinStage::FetchingProfile);
        let profile = fetch_profile(&self.http, &self.endpoints, &id)
            .await
            .map_err(StageError::at(SkinStage::FetchingProfile))?;

        log::debug!("{}: {} properties", SkinStage::Decoding, profile.properties.len());
        let url = decode_skin_url(&profile).map_err(StageError::at(SkinStage::Decoding))?;

        log::debug!("{}: {url}", SkinStage::LoadingTexture);
        load_skin_texture(&self.http, &url)
            .await
            .map_err(StageError::at(SkinStage::LoadingTexture))
    }

    /// Applies the result of [`SkinPipeline::fetch_skin`] to `model`.
    ///
    /// On failure every mesh gets the fallback material, regardless of what
    /// it showed before, unless [`SkinSettings::keep_last_good_on_failure`]
    /// is set and a skin is already in place.
    pub fn finish(
        &self,
        model: &mut SceneNode,
        result: Result<Arc<Texture>, StageError>,
        status: &mut impl StatusSink,
    ) -> SkinOutcome {
        match result {
            Ok(texture) => {
                log::debug!("{}", SkinStage::Applying);
                let meshes = apply_skin_material(model, &texture);
                status.hide();
                SkinOutcome {
                    stage: SkinStage::Done,
                    meshes,
                    texture: Some(texture),
                    failure: None,
                }
            }
            Err(failure) => {
                log::error!("Error loading skin ({}): {}", failure.stage, failure.error);
                status.error(&format!("Skin error: {}", failure.error));
                if self.settings.keep_last_good_on_failure && has_texture(model) {
                    log::info!("keeping the previously applied skin");
                    return SkinOutcome {
                        stage: SkinStage::Failed,
                        meshes: 0,
                        texture: None,
                        failure: Some(failure),
                    };
                }
                let meshes = apply_fallback_material(model);
                SkinOutcome {
                    stage: SkinStage::FallbackApplied,
                    meshes,
                    texture: None,
                    failure: Some(failure),
                }
            }
        }
    }

    /// Runs the whole pipeline against `model`. Never fails; see
    /// [`SkinOutcome`] for what happened.
    pub async fn apply_skin(
        &self,
        model: &mut SceneNode,
        handle: &str,
        status: &mut impl StatusSink,
    ) -> SkinOutcome {
        let result = self.fetch_skin(handle, status).await;
        self.finish(model, result, status)
    }

    /// Manual re-run, e.g. bound to a key in the viewer.
    pub async fn reload(
        &self,
        model: &mut SceneNode,
        handle: &str,
        status: &mut impl StatusSink,
    ) -> SkinOutcome {
        status.show("Reloading skin...");
        self.apply_skin(model, handle, status).await
    }
}
