//! HTTP transport used by the skin pipeline.
//!
//! The pipeline only ever issues plain `GET` requests, so the seam is a single
//! async method. [`ReqwestClient`] is the production implementation on both
//! native and wasm targets; tests plug in an in-memory client.

use std::future::Future;

use serde::Deserialize;

use crate::skin::error::SkinError;

pub const IDENTITY_BASE: &str = "https://api.mojang.com/users/profiles/minecraft";
pub const PROFILE_BASE: &str = "https://sessionserver.mojang.com/session/minecraft/profile";

/// Status code and body of a finished request.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Only `200 OK` carries a usable payload; every other status is a miss.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Read-only HTTP access.
///
/// Implementations must not retry: a failed attempt is reported to the caller
/// as [`SkinError::Transport`].
pub trait HttpClient {
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, SkinError>>;
}

impl<T: HttpClient + ?Sized> HttpClient for &T {
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, SkinError>> {
        (**self).get(url)
    }
}

/// Base URLs of the two lookup services.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub identity_base: String,
    pub profile_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            identity_base: IDENTITY_BASE.to_string(),
            profile_base: PROFILE_BASE.to_string(),
        }
    }
}

impl Endpoints {
    pub fn identity_url(&self, handle: &str) -> Result<String, SkinError> {
        join_segment(&self.identity_base, handle)
    }

    pub fn profile_url(&self, id: &str) -> Result<String, SkinError> {
        join_segment(&self.profile_base, id)
    }
}

/// Appends `segment` as a single, escaped path segment.
fn join_segment(base: &str, segment: &str) -> Result<String, SkinError> {
    let mut url = reqwest::Url::parse(base).map_err(SkinError::transport)?;
    url.path_segments_mut()
        .map_err(|_| SkinError::Transport(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .push(segment);
    Ok(url.to_string())
}

/// [`HttpClient`] backed by `reqwest`.
#[derive(Clone, Debug, Default)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, SkinError> {
        log::debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(SkinError::transport)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(SkinError::transport)?;
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_handle_as_last_segment() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.identity_url("OrpoPro").unwrap(),
            "https://api.mojang.com/users/profiles/minecraft/OrpoPro"
        );
        assert_eq!(
            endpoints.profile_url("abc123").unwrap(),
            "https://sessionserver.mojang.com/session/minecraft/profile/abc123"
        );
    }

    #[test]
    fn trailing_slash_in_base_is_not_doubled() {
        let endpoints = Endpoints {
            identity_base: "http://localhost:8080/names/".into(),
            ..Default::default()
        };
        assert_eq!(
            endpoints.identity_url("Steve").unwrap(),
            "http://localhost:8080/names/Steve"
        );
    }

    #[test]
    fn handle_is_escaped() {
        let endpoints = Endpoints::default();
        let url = endpoints.identity_url("a/b").unwrap();
        assert!(url.ends_with("/minecraft/a%2Fb"), "{url}");
    }

    #[test]
    fn invalid_base_is_a_transport_error() {
        let endpoints = Endpoints {
            identity_base: "not a url".into(),
            ..Default::default()
        };
        assert!(matches!(
            endpoints.identity_url("Steve"),
            Err(SkinError::Transport(_))
        ));
    }
}
