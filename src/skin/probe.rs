//! Read-only diagnostics for a handle.

use std::fmt;

use crate::skin::{
    error::SkinError,
    http::{Endpoints, HttpClient},
    identity::{UniqueId, resolve_identity},
    manifest::{SKIN_SLOT, decode_manifest},
    profile::fetch_profile,
};

/// Everything the lookup services say about a handle, as far as it got.
#[derive(Clone, Debug, Default)]
pub struct ProbeReport {
    pub handle: String,
    pub id: Option<UniqueId>,
    pub name: Option<String>,
    pub properties: Vec<String>,
    pub skin_url: Option<String>,
    pub slim: bool,
    pub error: Option<SkinError>,
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "handle:     {}", self.handle)?;
        if let Some(id) = &self.id {
            writeln!(f, "id:         {id}")?;
        }
        if let Some(name) = &self.name {
            writeln!(f, "name:       {name}")?;
        }
        if !self.properties.is_empty() {
            writeln!(f, "properties: {}", self.properties.join(", "))?;
        }
        if let Some(url) = &self.skin_url {
            let model = if self.slim { "slim" } else { "classic" };
            writeln!(f, "skin:       {url} ({model})")?;
        }
        if let Some(err) = &self.error {
            writeln!(f, "error:      {err}")?;
        }
        Ok(())
    }
}

/// Resolves `handle` and decodes its manifest without downloading the skin
/// or touching a model.
pub async fn probe_handle<H: HttpClient>(
    http: &H,
    endpoints: &Endpoints,
    handle: &str,
) -> ProbeReport {
    let mut report = ProbeReport {
        handle: handle.to_string(),
        ..Default::default()
    };
    if let Err(err) = probe_into(http, endpoints, handle, &mut report).await {
        report.error = Some(err);
    }
    report
}

async fn probe_into<H: HttpClient>(
    http: &H,
    endpoints: &Endpoints,
    handle: &str,
    report: &mut ProbeReport,
) -> Result<(), SkinError> {
    let id = resolve_identity(http, endpoints, handle).await?;
    report.id = Some(id.clone());
    let profile = fetch_profile(http, endpoints, &id).await?;
    report.name = Some(profile.name.clone());
    report.properties = profile.properties.iter().map(|p| p.name.clone()).collect();
    let manifest = decode_manifest(&profile)?;
    report.slim = manifest.is_slim();
    let skin = manifest.slot(SKIN_SLOT).ok_or(SkinError::MissingSkinSlot)?;
    report.skin_url = Some(skin.url.clone());
    Ok(())
}
