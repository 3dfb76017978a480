//! Viewer data structures.
//!
//! - `texture` decoded images and their lazily created GPU counterpart
//! - `material` the per-mesh surface description swapped by the skin pipeline
//! - `model` vertex layouts and CPU-side geometry
//! - `instance` node transforms
//! - `scene_graph` the model tree and its traversals

pub mod instance;
pub mod material;
pub mod model;
pub mod scene_graph;
pub mod texture;
