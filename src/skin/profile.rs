//! Unique id -> signed profile record.

use serde::Deserialize;

use crate::skin::{
    error::SkinError,
    http::{Endpoints, HttpClient},
    identity::UniqueId,
};

/// A single `{name, value}` entry of a profile.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ProfileProperty {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub signature: Option<String>,
}

/// Profile as returned by the session service. Properties keep the order in
/// which the service sent them.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ProfileRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: Vec<ProfileProperty>,
}

impl ProfileRecord {
    /// First property called `name`, if any.
    pub fn property(&self, name: &str) -> Option<&ProfileProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

pub async fn fetch_profile<H: HttpClient>(
    http: &H,
    endpoints: &Endpoints,
    id: &UniqueId,
) -> Result<ProfileRecord, SkinError> {
    let url = endpoints.profile_url(id.as_str())?;
    let response = http.get(&url).await?;
    if !response.is_ok() {
        log::debug!("profile lookup for {id} returned {}", response.status);
        return Err(SkinError::ProfileNotFound(id.to_string()));
    }
    let record: ProfileRecord =
        serde_json::from_slice(&response.body).map_err(SkinError::transport)?;
    log::info!("Profile data received for {}", record.name);
    Ok(record)
}
