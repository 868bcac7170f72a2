//! Orbit camera, its mouse controller and the GPU uniform it feeds.
//!
//! The camera circles a target point. Yaw turns it around the vertical axis,
//! pitch tilts it up and down and the radius is the distance to the target.
//! Dragging with the left mouse button orbits, the wheel zooms.

use std::f32::consts::FRAC_PI_2;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3};
use wgpu::util::DeviceExt;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use crate::viewport::ViewportState;

const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;
pub const MIN_RADIUS: f32 = 2.0;
pub const MAX_RADIUS: f32 = 120.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    pub target: Point3<f32>,
    radius: f32,
    yaw: Rad<f32>,
    pitch: Rad<f32>,
}

impl OrbitCamera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        target: V,
        radius: f32,
        yaw: Y,
        pitch: P,
    ) -> Self {
        let mut camera = Self {
            target: target.into(),
            radius,
            yaw: yaw.into(),
            pitch: pitch.into(),
        };
        camera.clamp();
        camera
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn yaw(&self) -> Rad<f32> {
        self.yaw
    }

    pub fn pitch(&self) -> Rad<f32> {
        self.pitch
    }

    pub fn rotate(&mut self, yaw: Rad<f32>, pitch: Rad<f32>) {
        self.yaw += yaw;
        self.pitch += pitch;
        self.clamp();
    }

    pub fn zoom(&mut self, delta: f32) {
        self.radius -= delta;
        self.clamp();
    }

    fn clamp(&mut self) {
        self.pitch = Rad(self.pitch.0.clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2));
        self.radius = self.radius.clamp(MIN_RADIUS, MAX_RADIUS);
    }

    pub fn eye(&self) -> Point3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let offset = Vector3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.radius;
        self.target + offset
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye(), self.target, Vector3::unit_y())
    }

    /// Unit vector from the eye towards the target.
    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.eye()).normalize()
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new((0.0, 4.0, 0.0), 45.0, cgmath::Deg(0.0), cgmath::Deg(25.0))
    }
}

/// Turns mouse input into camera movement, applied once per frame.
#[derive(Debug)]
pub struct OrbitController {
    sensitivity: f32,
    zoom_speed: f32,
    dragging: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
}

impl OrbitController {
    pub fn new(sensitivity: f32, zoom_speed: f32) -> Self {
        Self {
            sensitivity,
            zoom_speed,
            dragging: false,
            last_cursor: None,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Accumulates a drag of `dx`/`dy` pixels. Ignored unless a drag is in progress.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        if self.dragging {
            self.rotate_horizontal += dx as f32;
            self.rotate_vertical += dy as f32;
        }
    }

    pub fn handle_scroll(&mut self, delta: &MouseScrollDelta) {
        self.scroll += match delta {
            MouseScrollDelta::LineDelta(_, scroll) => *scroll,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32 / 20.0,
        };
    }

    /// Returns whether the event was consumed.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
                if !self.dragging {
                    self.last_cursor = None;
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(last) = self.last_cursor {
                    self.handle_mouse(position.x - last.x, position.y - last.y);
                }
                self.last_cursor = self.dragging.then_some(*position);
                self.dragging
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.handle_scroll(delta);
                true
            }
            _ => false,
        }
    }

    /// Applies and clears the input gathered since the last call.
    pub fn update(&mut self, camera: &mut OrbitCamera) {
        camera.rotate(
            Rad(-self.rotate_horizontal * self.sensitivity),
            Rad(self.rotate_vertical * self.sensitivity),
        );
        camera.zoom(self.scroll * self.zoom_speed);
        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;
        self.scroll = 0.0;
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(0.005, 2.0)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &OrbitCamera, viewport: &ViewportState) {
        self.view_position = camera.eye().to_homogeneous().into();
        self.view_proj = (viewport.calc_matrix() * camera.calc_matrix()).into();
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.view_proj.into()
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: &OrbitCamera, viewport: &ViewportState) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(camera, viewport);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, camera: &OrbitCamera, viewport: &ViewportState) {
        self.uniform.update_view_proj(camera, viewport);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
