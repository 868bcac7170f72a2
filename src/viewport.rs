//! Projection parameters and output-surface dimensions.
//!
//! The [`ViewportController`] is the only writer of [`ViewportState`]. It is
//! driven by window resize notifications, between frames, and forwards the new
//! dimensions to the output [`Surface`] so the next frame uses them.

use cgmath::{Deg, Matrix4, Rad, perspective};

use crate::{camera::OrbitCamera, data_structures::scene_graph::Scene};

/// Something that can show the scene: a window swapchain, or a recorder in tests.
pub trait Surface {
    fn resize(&mut self, width: u32, height: u32);
    fn draw(&mut self, scene: &Scene, camera: &OrbitCamera, viewport: &ViewportState) -> anyhow::Result<()>;
}

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::from_cols(
    cgmath::Vector4::new(1.0, 0.0, 0.0, 0.0),
    cgmath::Vector4::new(0.0, 1.0, 0.0, 0.0),
    cgmath::Vector4::new(0.0, 0.0, 0.5, 0.0),
    cgmath::Vector4::new(0.0, 0.0, 0.5, 1.0),
);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    width: u32,
    height: u32,
    aspect: f32,
}

impl ViewportState {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            fovy: fovy.into(),
            znear,
            zfar,
            width,
            height,
            aspect: aspect_of(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Always `width / height` of the last accepted size.
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::new(800, 600, Deg(45.0), 0.1, 1000.0)
    }
}

fn aspect_of(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

#[derive(Debug, Default)]
pub struct ViewportController {
    state: ViewportState,
}

impl ViewportController {
    pub fn new(state: ViewportState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    /**
     * Applies a resize notification: recomputes the aspect ratio and resizes
     * `surface` to match.
     *
     * A zero width or height (a minimised window) leaves everything untouched
     * since no aspect ratio exists for it. Returns whether the size was
     * accepted.
     */
    pub fn on_resize(&mut self, width: u32, height: u32, surface: &mut dyn Surface) -> bool {
        if width == 0 || height == 0 {
            log::debug!("Ignoring resize to {}x{}", width, height);
            return false;
        }
        self.state.width = width;
        self.state.height = height;
        self.state.aspect = aspect_of(width, height);
        surface.resize(width, height);
        true
    }
}
