//! Handle -> unique id resolution.

use std::fmt;

use serde::Deserialize;

use crate::skin::{
    error::SkinError,
    http::{Endpoints, HttpClient},
};

/// Opaque identifier returned by the identity service.
///
/// Only meaningful as the key of the profile lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UniqueId(String);

impl UniqueId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of a successful identity lookup.
#[derive(Clone, Debug, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
}

/// Looks up `handle` and returns the full identity record.
pub async fn lookup_identity<H: HttpClient>(
    http: &H,
    endpoints: &Endpoints,
    handle: &str,
) -> Result<Identity, SkinError> {
    if handle.trim().is_empty() {
        return Err(SkinError::IdentityNotFound(handle.to_string()));
    }
    let url = endpoints.identity_url(handle)?;
    let response = http.get(&url).await?;
    if !response.is_ok() {
        log::debug!("identity lookup for {handle} returned {}", response.status);
        return Err(SkinError::IdentityNotFound(handle.to_string()));
    }
    let identity: Identity =
        serde_json::from_slice(&response.body).map_err(SkinError::transport)?;
    log::info!("Found UUID: {} for {}", identity.id, identity.name);
    Ok(identity)
}

/// Resolves `handle` to the id used by [`crate::skin::profile::fetch_profile`].
pub async fn resolve_identity<H: HttpClient>(
    http: &H,
    endpoints: &Endpoints,
    handle: &str,
) -> Result<UniqueId, SkinError> {
    lookup_identity(http, endpoints, handle)
        .await
        .map(|identity| UniqueId(identity.id))
}
