//! park-scene
//!
//! An animated 3D park rendered with wgpu, natively and in the browser. The
//! scene starts out with procedurally placed content and grows while textures,
//! a typeface and a model stream in. Everything runs on one thread: asset
//! loads and frames interleave, they never run in parallel.
//!
//! High-level modules
//! - `data_structures`: scene graph, transforms, meshes, materials and the asset library
//! - `resources`: asynchronous asset loading and decoding
//! - `placement`: procedural placement of decor and animated sparkles
//! - `animation`: time driven rotation of the animated nodes
//! - `park`: the concrete park layout and the assets it loads
//! - `camera`: orbit camera, its controller and uniforms
//! - `viewport`: projection state, resize handling and the output surface contract
//! - `context`, `pipelines`, `render`: GPU state and drawing
//! - `flow`: the render loop state machine and the winit event loop
//!

pub mod animation;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod park;
pub mod pipelines;
pub mod placement;
pub mod render;
pub mod resources;
pub mod viewport;

pub use data_structures::scene_graph::{NodeId, Scene, SceneGraph};
pub use flow::run;
pub use park::ParkConfig;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    flow::run(ParkConfig::default()).map_err(|e| wasm_bindgen::JsValue::from_str(&e.to_string()))
}
