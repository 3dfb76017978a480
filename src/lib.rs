//! flow-avatar
//!
//! A small native and WASM viewer that shows a Minecraft-style avatar model
//! wearing a player's skin. The skin is resolved through the public identity
//! and session services, decoded from the profile's texture manifest and
//! applied to every mesh of the model, falling back to a neutral grey
//! material when any step fails.
//!
//! High-level modules
//! - `skin`: the skin pipeline, from player handle to applied material
//! - `status`: the loading indicator the pipeline reports to
//! - `config`: viewer configuration, TOML-loadable, with sensible defaults
//! - `data_structures`: textures, materials, geometry and the scene graph
//! - `resources`: glTF model loading with progress reporting
//! - `camera`, `pipelines`, `render`, `context`: the wgpu side
//! - `animation`: the idle breathing motion
//! - `flow`: the winit application loop

pub mod animation;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod skin;
pub mod status;

pub use config::ViewerConfig;
pub use data_structures::scene_graph::{ModelReport, SceneNode, inspect_model};
pub use flow::{init_logging, run_viewer};
pub use skin::{SkinError, SkinOutcome, SkinPipeline};
