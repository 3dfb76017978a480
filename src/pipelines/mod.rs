//! Render pipelines and the uniforms they consume.
//!
//! - `basic` the lit, textured standard pipeline
//! - `light` ambient and directional light uniform

pub mod basic;
pub mod light;
