//! Skin image download and decoding.

use std::sync::Arc;

use crate::{
    data_structures::texture::{Texture, TextureOptions},
    skin::{error::SkinError, http::HttpClient},
};

/// Fetches `url` and decodes it into a pixel-art texture.
///
/// Skins are tiny (64x64 or 64x32) atlases, so they are sampled with nearest
/// filtering and uploaded without flipping to line up with the model's UVs.
pub async fn load_skin_texture<H: HttpClient>(
    http: &H,
    url: &str,
) -> Result<Arc<Texture>, SkinError> {
    let response = http
        .get(url)
        .await
        .map_err(|err| SkinError::texture_load(url, err))?;
    if !response.is_ok() {
        return Err(SkinError::texture_load(
            url,
            format!("HTTP status {}", response.status),
        ));
    }
    let texture = Texture::from_bytes(&response.body, url, None, TextureOptions::pixel_art())
        .map_err(|err| SkinError::texture_load(url, err))?;
    let (width, height) = texture.dimensions();
    log::info!("Skin texture loaded ({width}x{height})");
    Ok(Arc::new(texture))
}
