use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    io::Cursor,
    rc::Rc,
};

use instant::Duration;
use park_scene::{
    camera::OrbitCamera,
    data_structures::scene_graph::Scene,
    flow::{Clock, FramePacer},
    resources::source::{AssetSource, FetchFuture},
    viewport::{Surface, ViewportState},
};

/// Serves assets from memory and remembers every requested path.
#[derive(Clone, Default)]
pub(crate) struct MemorySource {
    files: Rc<RefCell<HashMap<String, Vec<u8>>>>,
    fetched: Rc<RefCell<Vec<String>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.borrow_mut().insert(path.to_string(), bytes.into());
        self
    }

    /// Shared log of fetched paths, still readable after the source moved into a loader.
    pub fn fetched(&self) -> Rc<RefCell<Vec<String>>> {
        self.fetched.clone()
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, path: &str) -> FetchFuture {
        self.fetched.borrow_mut().push(path.to_string());
        let found = self.files.borrow().get(path).cloned();
        let path = path.to_string();
        Box::pin(async move { found.ok_or_else(|| anyhow::anyhow!("404 {}", path)) })
    }
}

/// A transport that never answers.
pub(crate) struct StalledSource;

impl AssetSource for StalledSource {
    fn fetch(&self, _path: &str) -> FetchFuture {
        Box::pin(futures::future::pending())
    }
}

/// Answers from `fast` but stalls every path listed in `stalled`.
pub(crate) struct PartlyStalledSource {
    pub fast: MemorySource,
    pub stalled: Vec<String>,
}

impl AssetSource for PartlyStalledSource {
    fn fetch(&self, path: &str) -> FetchFuture {
        if self.stalled.iter().any(|p| p == path) {
            StalledSource.fetch(path)
        } else {
            self.fast.fetch(path)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DrawRecord {
    pub nodes: usize,
    pub aspect: f32,
    pub width: u32,
    pub height: u32,
}

/// Output surface that records what it was asked to do.
#[derive(Default)]
pub(crate) struct RecordingSurface {
    pub resizes: Vec<(u32, u32)>,
    pub draws: Vec<DrawRecord>,
    pub fail_draws: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_draws: true,
            ..Default::default()
        }
    }
}

impl Surface for RecordingSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.resizes.push((width, height));
    }

    fn draw(&mut self, scene: &Scene, _camera: &OrbitCamera, viewport: &ViewportState) -> anyhow::Result<()> {
        self.draws.push(DrawRecord {
            nodes: scene.graph.len(),
            aspect: viewport.aspect(),
            width: viewport.width(),
            height: viewport.height(),
        });
        if self.fail_draws {
            anyhow::bail!("surface lost");
        }
        Ok(())
    }
}

/// Clock that only moves when told to.
#[derive(Clone, Default)]
pub(crate) struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_secs(&self, secs: f32) {
        self.now.set(Duration::from_secs_f32(secs));
    }

    pub fn advance_secs(&self, secs: f32) {
        self.now.set(self.now.get() + Duration::from_secs_f32(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[derive(Default)]
pub(crate) struct CountingPacer {
    pub requests: usize,
}

impl FramePacer for CountingPacer {
    fn request_frame(&mut self) {
        self.requests += 1;
    }
}

pub(crate) fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png)
        .expect("encoding a png in memory cannot fail");
    bytes.into_inner()
}

/// A unit quad with one material, in obj and mtl form.
pub(crate) const QUAD_OBJ: &str = "mtllib quad.mtl
o quad
v -0.5 0.0 -0.5
v 0.5 0.0 -0.5
v 0.5 0.0 0.5
v -0.5 0.0 0.5
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 1.0 0.0
usemtl painted
f 1/1/1 4/4/1 3/3/1 2/2/1
";

pub(crate) const QUAD_MTL: &str = "newmtl painted
Kd 0.8 0.2 0.1
d 1.0
map_Kd quad.png
";

pub(crate) fn quad_model_source() -> MemorySource {
    MemorySource::new()
        .with("models/quad.obj", QUAD_OBJ)
        .with("models/quad.mtl", QUAD_MTL)
        .with("models/quad.png", png_bytes(2, 2, [255, 255, 255, 255]))
}

/// Rotation about +Y encoded in a unit quaternion, in `[0, 2π)`.
pub(crate) fn yaw_of(rotation: cgmath::Quaternion<f32>) -> f32 {
    (2.0 * rotation.v.y.atan2(rotation.s)).rem_euclid(std::f32::consts::TAU)
}

pub(crate) fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {} but got {}",
        expected,
        actual
    );
}
