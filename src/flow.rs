//! Viewer application loop.
//!
//! The loop owns the GPU [`Context`], the model and the skin pipeline. Start-up
//! work is handed to [`Viewer::dispatch`], which blocks on the tokio runtime
//! natively. The skin fetch goes through [`Viewer::spawn`] and runs on a worker
//! thread, so the window keeps animating while the lookups are in flight. On
//! wasm both spawn onto the browser's executor. Either way the result comes
//! back as a [`ViewerEvent`] through the event loop proxy, so every mutation of
//! the model happens on the loop.
//!
//! # Lifecycle
//!
//! 1. Create the window and the context
//! 2. Load the model, reporting `Loading model... {pct}%`
//! 3. Show the model untextured and run the skin pipeline once
//! 4. Animate; `R` reloads the skin, `I` logs the model report

use std::{future::Future, sync::Arc};

use futures::StreamExt;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::Key,
    window::Window,
};

use crate::{
    animation::Breathing,
    config::ViewerConfig,
    context::Context,
    data_structures::{scene_graph::{SceneNode, inspect_model}, texture::Texture},
    render::render_frame,
    resources::load_model_gltf,
    skin::{
        http::ReqwestClient,
        pipeline::{SkinPipeline, StageError},
    },
    status::StatusSink,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(not(target_arch = "wasm32"))]
type PlatformStatus = crate::status::LogStatus;
#[cfg(target_arch = "wasm32")]
type PlatformStatus = crate::status::DomStatus;

/// Results of asynchronous work, delivered back to the event loop.
pub enum ViewerEvent {
    Initialized(Box<Context>),
    ContextFailed(anyhow::Error),
    ModelLoaded(anyhow::Result<SceneNode>),
    SkinFetched(Result<Arc<Texture>, StageError>),
}

impl std::fmt::Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::ContextFailed(e) => f.debug_tuple("ContextFailed").field(e).finish(),
            Self::ModelLoaded(r) => f
                .debug_tuple("ModelLoaded")
                .field(&r.as_ref().map(|m| m.mesh_count()))
                .finish(),
            Self::SkinFetched(r) => f
                .debug_tuple("SkinFetched")
                .field(&r.as_ref().map(|t| t.label().to_string()))
                .finish(),
        }
    }
}

pub struct Viewer {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ViewerEvent>,
    config: ViewerConfig,
    pipeline: SkinPipeline<ReqwestClient>,
    status: PlatformStatus,
    ctx: Option<Context>,
    model: Option<SceneNode>,
    breathing: Breathing,
    animating: bool,
}

impl Viewer {
    fn new(event_loop: &EventLoop<ViewerEvent>, config: ViewerConfig) -> anyhow::Result<Self> {
        let pipeline = SkinPipeline::new(ReqwestClient::default())
            .with_endpoints(config.skin.endpoints.clone())
            .with_settings(config.skin.settings.clone());
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            breathing: Breathing::new(&config.animation, &config.model),
            config,
            pipeline,
            status: PlatformStatus::default(),
            ctx: None,
            model: None,
            animating: false,
        })
    }

    /// Runs `fut` to completion on the platform executor and posts its result
    /// to the event loop.
    fn dispatch(&self, fut: impl Future<Output = ViewerEvent> + 'static) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let event = self.async_runtime.block_on(fut);
            if self.proxy.send_event(event).is_err() {
                log::warn!("event loop closed before the result could be delivered");
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = fut.await;
                if proxy.send_event(event).is_err() {
                    log::warn!("event loop closed before the result could be delivered");
                }
            });
        }
    }

    /// Like [`Viewer::dispatch`], but never blocks the loop. The future is
    /// built by `make` on the executor side.
    #[cfg(not(target_arch = "wasm32"))]
    fn spawn<F, Fut>(&self, make: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ViewerEvent>,
    {
        let proxy = self.proxy.clone();
        run_detached(self.async_runtime.handle().clone(), make, move |event| {
            if proxy.send_event(event).is_err() {
                log::warn!("event loop closed before the result could be delivered");
            }
        });
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn<F, Fut>(&self, make: F)
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = ViewerEvent> + 'static,
    {
        self.dispatch(async move { make().await });
    }

    fn load_model(&mut self) {
        let path = self.config.model.path.clone();
        self.status.show("Loading model... 0%");
        self.dispatch(async move {
            let (tx, rx) = futures::channel::mpsc::unbounded();
            let mut status = PlatformStatus::default();
            let show = rx.for_each(|progress: crate::resources::LoadProgress| {
                if let Some(pct) = progress.percent() {
                    status.show(&format!("Loading model... {pct}%"));
                }
                futures::future::ready(())
            });
            let (result, ()) = futures::future::join(load_model_gltf(&path, Some(tx)), show).await;
            ViewerEvent::ModelLoaded(result)
        });
    }

    /// Fetches the configured player's skin off the loop; the model is
    /// updated once [`ViewerEvent::SkinFetched`] arrives.
    fn start_skin(&mut self, reload: bool) {
        if self.model.is_none() {
            return;
        }
        if reload {
            self.status.show("Reloading skin...");
        }
        let username = self.config.skin.username.clone();
        let pipeline = self.pipeline.clone();
        self.spawn(move || async move {
            let mut status = PlatformStatus::default();
            ViewerEvent::SkinFetched(pipeline.fetch_skin(&username, &mut status).await)
        });
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match event.logical_key.as_ref() {
            Key::Character("r" | "R") => self.start_skin(true),
            Key::Character("i" | "I") => match &self.model {
                Some(model) => log::info!("{}", inspect_model(model)),
                None => log::info!("Model not loaded"),
            },
            _ => {}
        }
    }

    fn redraw(&mut self) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        if self.animating {
            if let Some(model) = self.model.as_mut() {
                model.local = self.breathing.step();
            }
        }
        match render_frame(ctx, self.model.as_mut()) {
            Ok(()) => {}
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = ctx.window().inner_size();
                ctx.resize(size.width, size.height);
            }
            Err(e) => log::error!("Unable to render {e}"),
        }
    }
}

impl ApplicationHandler<ViewerEvent> for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.is_some() {
            return;
        }
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("flow-avatar");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.get_element_by_id(CANVAS_ID))
                .map(|c| c.unchecked_into());
            window_attributes = window_attributes.with_canvas(canvas);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create the main window: {e}");
                event_loop.exit();
                return;
            }
        };

        let config = self.config.clone();
        self.dispatch(async move {
            match Context::new(window, &config).await {
                Ok(ctx) => ViewerEvent::Initialized(Box::new(ctx)),
                Err(e) => ViewerEvent::ContextFailed(e),
            }
        });
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Initialized(ctx) => {
                let mut ctx = *ctx;
                let size = ctx.window().inner_size();
                ctx.resize(size.width, size.height);
                ctx.window().request_redraw();
                self.ctx = Some(ctx);
                self.load_model();
            }
            ViewerEvent::ContextFailed(e) => {
                log::error!("App initialization failed. Cannot create the main context: {e:#}");
                event_loop.exit();
            }
            ViewerEvent::ModelLoaded(Ok(mut model)) => {
                model.local = self.breathing.rest();
                log::info!("Model loaded");
                self.model = Some(model);
                self.start_skin(false);
            }
            ViewerEvent::ModelLoaded(Err(e)) => {
                self.status.error(&format!("Error loading model: {e}"));
            }
            ViewerEvent::SkinFetched(result) => {
                if let Some(model) = self.model.as_mut() {
                    let outcome = self.pipeline.finish(model, result, &mut self.status);
                    log::info!("skin pipeline finished: {} ({} meshes)", outcome.stage, outcome.meshes);
                    self.animating = true;
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(ctx) = self.ctx.as_mut() {
                    ctx.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

/// Drives the future built by `make` to completion on a worker thread
/// entered into `runtime` and hands its output to `deliver` there.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn run_detached<T, F, Fut>(
    runtime: tokio::runtime::Handle,
    make: F,
    deliver: impl FnOnce(T) + Send + 'static,
) where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = T>,
{
    let spawned = std::thread::Builder::new()
        .name("flow-avatar-io".into())
        .spawn(move || deliver(runtime.block_on(make())));
    if let Err(e) = spawned {
        log::error!("cannot start the IO worker: {e}");
    }
}

/// Installs the platform logger. Safe to call more than once.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let env = env_logger::Env::default().default_filter_or("info");
        if let Err(e) = env_logger::Builder::from_env(env).try_init() {
            log::debug!("logger already initialised: {e}");
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        if console_log::init_with_level(log::Level::Info).is_err() {
            log::debug!("logger already initialised");
        }
    }
}

/// Opens the viewer window and runs until it is closed.
pub fn run_viewer(config: ViewerConfig) -> anyhow::Result<()> {
    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;
    let mut viewer = Viewer::new(&event_loop, config)?;
    event_loop.run_app(&mut viewer)?;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    init_logging();
    run_viewer(ViewerConfig::default()).map_err(|e| JsValue::from_str(&e.to_string()))
}
