//! Per-frame rotation of the animated nodes.
//!
//! Rotations are a pure function of elapsed time and registration index:
//! node `i` at time `t` faces `t * (1 + 0.1 * i)` radians around the vertical
//! axis (wrapped into `[0, 2π)`). Nothing accumulates between frames, so the
//! result does not depend on the frame rate and re-ticking the same time is a
//! no-op.

use std::f32::consts::TAU;

use cgmath::Rotation3;

use crate::data_structures::scene_graph::SceneGraph;

/// Rotation angle in radians of the animated node with `index` after `elapsed_seconds`.
pub fn rotation_angle(index: usize, elapsed_seconds: f32) -> f32 {
    (elapsed_seconds * (1.0 + 0.1 * index as f32)).rem_euclid(TAU)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AnimationScheduler;

impl AnimationScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Points every animated node of `graph` to its rotation at `elapsed_seconds`.
    pub fn tick(&self, graph: &mut SceneGraph, elapsed_seconds: f32) {
        graph.for_each_animated(|animated, node| {
            let angle = rotation_angle(animated.index(), elapsed_seconds);
            node.transform.rotation = cgmath::Quaternion::from_angle_y(cgmath::Rad(angle));
        });
    }
}
