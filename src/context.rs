use std::sync::Arc;

use anyhow::anyhow;
use winit::window::Window;

use crate::{
    camera::{self, CameraResources},
    config::ViewerConfig,
    data_structures::{
        material::hex_to_linear,
        texture::{DepthTexture, Texture},
    },
    pipelines::light::{LightResources, LightUniform},
    render::Renderer,
};

/// Window, GPU handles and the scene-wide resources of the viewer.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: DepthTexture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub light: LightResources,
    pub renderer: Renderer,
    pub clear_colour: wgpu::Color,
    is_surface_configured: bool,
}

impl Context {
    pub async fn new(window: Arc<Window>, viewer: &ViewerConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        log::info!("WGPU setup");
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                ..Default::default()
            })
            .await?;

        let mut config = surface
            .get_default_config(&adapter, width, height)
            .ok_or_else(|| anyhow!("surface is not supported by the adapter"))?;
        // The shader writes linear colours and relies on an sRGB target.
        let surface_caps = surface.get_capabilities(&adapter);
        if let Some(format) = surface_caps.formats.iter().copied().find(|f| f.is_srgb()) {
            config.format = format;
        }

        let (cam, projection) = camera::from_config(&viewer.camera, width, height);
        let camera = CameraResources::new(&device, cam, projection);
        let light = LightResources::new(&device, LightUniform::from_config(&viewer.lighting));
        let renderer = Renderer::new(
            &device,
            config.format,
            &camera.bind_group_layout,
            &light.bind_group_layout,
        );
        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            light,
            renderer,
            clear_colour: background_colour(viewer.scene.background),
            is_surface_configured: false,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn is_surface_configured(&self) -> bool {
        self.is_surface_configured
    }

    /// Reconfigures the surface and keeps the camera aspect in sync.
    /// Zero sizes (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.is_surface_configured = true;
        self.camera.resize(&self.queue, width, height);
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
    }
}

/// Clear colour for an sRGB hex value such as `0x0a0a0a`.
pub fn background_colour(hex: u32) -> wgpu::Color {
    let [r, g, b] = hex_to_linear(hex);
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}
