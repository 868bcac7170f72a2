//! Engine data structures: scene graph, transforms, geometry and textures.
//!
//! This module contains the core data types for scene representation:
//!
//! - `model` contains vertex layouts, CPU meshes, materials and the asset library
//! - `scene_graph` holds the node hierarchy, the animated node registry and [`Scene`](scene_graph::Scene)
//! - `shape` generates the procedural meshes used for decoration
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `transform` holds per-node transformation and GPU instance data

pub mod model;
pub mod scene_graph;
pub mod shape;
pub mod texture;
pub mod transform;
