//! Textures and texture creation utilities.
//!
//! A [`Texture`] keeps the decoded pixels together with the sampling options
//! it must be drawn with. The GPU side (texture, view and sampler) is created
//! on first use by the renderer and lives exactly as long as the `Texture`, so
//! replacing the last material that references a texture also frees its GPU
//! memory.

use std::sync::OnceLock;

use anyhow::*;
use image::{DynamicImage, ImageFormat, RgbaImage, load_from_memory_with_format};

/// How a texture is sampled and oriented when uploaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureOptions {
    pub mag_filter: wgpu::FilterMode,
    pub min_filter: wgpu::FilterMode,
    /// Upload the rows bottom-up instead of top-down.
    pub flip_y: bool,
}

impl TextureOptions {
    /// Hard pixel edges and the image's top-left origin mapped straight onto
    /// UV space. Required for player skins.
    pub const fn pixel_art() -> Self {
        Self {
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            flip_y: false,
        }
    }

    pub const fn smooth() -> Self {
        Self {
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            flip_y: false,
        }
    }

    fn sampler_descriptor<'a>(&self, label: &'a str) -> wgpu::SamplerDescriptor<'a> {
        wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: self.mag_filter,
            min_filter: self.min_filter,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        }
    }
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self::smooth()
    }
}

/// GPU resources of an uploaded [`Texture`].
#[derive(Debug)]
pub struct GpuTexture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Depth buffer attachment, recreated whenever the surface is resized.
#[derive(Debug)]
pub struct DepthTexture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// Decoded image plus sampling options, uploaded lazily.
#[derive(Debug)]
pub struct Texture {
    label: String,
    pixels: RgbaImage,
    options: TextureOptions,
    gpu: OnceLock<GpuTexture>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// `size` is [width, height] in pixels; zero sizes are clamped to one.
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> DepthTexture {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        DepthTexture { texture, view }
    }

    /// A single-colour texture. Materials without an image are drawn with a
    /// white one so the shader never has to branch on a missing binding.
    pub fn solid(label: &str, rgba: [u8; 4]) -> Self {
        let pixels = RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
        Self {
            label: label.to_string(),
            pixels,
            options: TextureOptions::pixel_art(),
            gpu: OnceLock::new(),
        }
    }

    /// Decode raw image file data (PNG, JPEG, ...).
    ///
    /// `format` is an optional extension hint like `"png"`; without it the
    /// format is guessed from the data.
    pub fn from_bytes(
        bytes: &[u8],
        label: &str,
        format: Option<&str>,
        options: TextureOptions,
    ) -> Result<Self> {
        let img = match format {
            None => image::load_from_memory(bytes)?,
            Some(fmt) => {
                let format = ImageFormat::from_extension(fmt)
                    .ok_or_else(|| anyhow!("unknown image format {fmt} for {label}"))?;
                load_from_memory_with_format(bytes, format)?
            }
        };
        Ok(Self::from_image(&img, label, options))
    }

    pub fn from_image(img: &DynamicImage, label: &str, options: TextureOptions) -> Self {
        Self {
            label: label.to_string(),
            pixels: img.to_rgba8(),
            options,
            gpu: OnceLock::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn options(&self) -> TextureOptions {
        self.options
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.get().is_some()
    }

    /// Returns the GPU resources, uploading the pixels on first call.
    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> &GpuTexture {
        self.gpu.get_or_init(|| self.create_gpu_texture(device, queue))
    }

    fn create_gpu_texture(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> GpuTexture {
        let rgba = if self.options.flip_y {
            image::imageops::flip_vertical(&self.pixels)
        } else {
            self.pixels.clone()
        };
        let dimensions = rgba.dimensions();
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&self.label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&self.options.sampler_descriptor(&self.label));
        log::debug!("uploaded {} ({}x{})", self.label, dimensions.0, dimensions.1);

        GpuTexture {
            texture,
            view,
            sampler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| image::Rgba([x as u8, y as u8, 0, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_with_and_without_format_hint() {
        let bytes = png(64, 32);
        let guessed = Texture::from_bytes(&bytes, "guessed", None, TextureOptions::default()).unwrap();
        let hinted = Texture::from_bytes(&bytes, "hinted", Some("png"), TextureOptions::default()).unwrap();
        assert_eq!(guessed.dimensions(), (64, 32));
        assert_eq!(guessed.pixels(), hinted.pixels());
        assert!(!guessed.is_uploaded());
    }

    #[test]
    fn keeps_top_left_origin() {
        let texture = Texture::from_bytes(&png(4, 4), "t", None, TextureOptions::pixel_art()).unwrap();
        assert_eq!(texture.pixels().get_pixel(3, 0).0, [3, 0, 0, 255]);
        assert_eq!(texture.pixels().get_pixel(0, 3).0, [0, 3, 0, 255]);
    }

    #[test]
    fn rejects_garbage_and_unknown_hints() {
        assert!(Texture::from_bytes(b"not an image", "t", None, TextureOptions::default()).is_err());
        assert!(Texture::from_bytes(&png(1, 1), "t", Some("nope"), TextureOptions::default()).is_err());
    }

    #[test]
    fn pixel_art_sampling() {
        let options = TextureOptions::pixel_art();
        assert_eq!(options.mag_filter, wgpu::FilterMode::Nearest);
        assert_eq!(options.min_filter, wgpu::FilterMode::Nearest);
        assert!(!options.flip_y);
        let desc = options.sampler_descriptor("skin");
        assert_eq!(desc.mag_filter, wgpu::FilterMode::Nearest);
        assert_eq!(desc.min_filter, wgpu::FilterMode::Nearest);
    }

    #[test]
    fn solid_texture_is_one_pixel() {
        let white = Texture::solid("white", [255; 4]);
        assert_eq!(white.dimensions(), (1, 1));
        assert_eq!(white.pixels().get_pixel(0, 0).0, [255; 4]);
    }
}
