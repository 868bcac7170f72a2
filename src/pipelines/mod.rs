//! Render pipelines and the uniforms their shaders read.

pub mod basic;
pub mod light;
