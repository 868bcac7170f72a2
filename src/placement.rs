//! Procedural placement of decorative scene content.
//!
//! Hand-placed decor (trees, benches, rainbows, clouds) is deterministic: the
//! same kind, position and parameters always produce the same nodes. Sparkles
//! are randomized: each one draws a palette entry and an integer position from
//! the placer's random source, which is injected so a fixed seed reproduces
//! the whole layout.

use std::{f32::consts::PI, ops::Range};

use cgmath::{Quaternion, Rad, Rotation, Rotation3, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use crate::data_structures::{
    model::{GeometryId, Library, Material, MaterialId},
    scene_graph::{AnimatedNode, InvalidParentError, Node, NodeId, Scene, UnknownNodeError},
    shape,
    transform::Transform,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error(transparent)]
    InvalidParent(#[from] InvalidParentError),
    #[error(transparent)]
    UnknownNode(#[from] UnknownNodeError),
    #[error("the sparkle palette is empty")]
    EmptyPalette,
    #[error("placement bounds {0:?} contain no integer position")]
    EmptyBounds(Bounds),
}

/// Half-open integer ranges sparkles are placed in. `y` is the vertical extent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub x: Range<i32>,
    pub y: Range<i32>,
    pub z: Range<i32>,
}

impl Bounds {
    pub fn new(x: Range<i32>, y: Range<i32>, z: Range<i32>) -> Self {
        Self { x, y, z }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    pub fn contains(&self, position: Vector3<f32>) -> bool {
        let inside = |range: &Range<i32>, v: f32| v >= range.start as f32 && v < range.end as f32;
        inside(&self.x, position.x) && inside(&self.y, position.y) && inside(&self.z, position.z)
    }
}

/// One geometry/material/scale triple sparkles are drawn from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SparkleStyle {
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub scale: f32,
}

/// Registers the default sparkle palette: small glossy polyhedra in candy colours.
pub fn sparkle_palette(library: &mut Library) -> Vec<SparkleStyle> {
    let shapes = [
        library.add_geometry(shape::tetrahedron(0.6)),
        library.add_geometry(shape::octahedron(0.5)),
        library.add_geometry(shape::icosahedron(0.45)),
    ];
    let colours: [(&str, [f32; 3]); 4] = [
        ("sparkle gold", [1.0, 0.84, 0.2]),
        ("sparkle pink", [1.0, 0.45, 0.75]),
        ("sparkle cyan", [0.3, 0.9, 1.0]),
        ("sparkle lilac", [0.7, 0.55, 1.0]),
    ];
    let materials: Vec<MaterialId> = colours
        .iter()
        .map(|(name, colour)| library.add_material(Material::lit(name, *colour)))
        .collect();

    let mut palette = Vec::with_capacity(shapes.len() * materials.len());
    for (i, &geometry) in shapes.iter().enumerate() {
        for (j, &material) in materials.iter().enumerate() {
            palette.push(SparkleStyle {
                geometry,
                material,
                scale: 0.8 + 0.2 * ((i + j) % 3) as f32,
            });
        }
    }
    palette
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecorKind {
    /// Sphere canopy on a short trunk.
    RoundTree,
    /// Cone canopy on a short trunk.
    ConeTree,
    Bench,
    /// Seven concentric half-ring bands, standing upright.
    Rainbow,
    /// A cluster of translucent puffs.
    Cloud,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecorParams {
    pub scale: f32,
    /// Rotation around the vertical axis.
    pub heading: Rad<f32>,
}

impl Default for DecorParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            heading: Rad(0.0),
        }
    }
}

impl DecorParams {
    pub fn scaled(scale: f32) -> Self {
        Self {
            scale,
            ..Default::default()
        }
    }

    pub fn facing<A: Into<Rad<f32>>>(mut self, heading: A) -> Self {
        self.heading = heading.into();
        self
    }
}

const RAINBOW: [[f32; 3]; 7] = [
    [0.93, 0.16, 0.16],
    [1.0, 0.55, 0.1],
    [1.0, 0.9, 0.15],
    [0.25, 0.8, 0.3],
    [0.2, 0.55, 0.95],
    [0.3, 0.25, 0.75],
    [0.6, 0.3, 0.85],
];

/// Shared geometries and materials of the hand-placed decor.
#[derive(Clone, Debug)]
pub struct DecorAssets {
    sphere: GeometryId,
    trunk: GeometryId,
    cone: GeometryId,
    plank: GeometryId,
    leg: GeometryId,
    bands: Vec<(GeometryId, MaterialId)>,
    leaves: MaterialId,
    needles: MaterialId,
    bark: MaterialId,
    wood: MaterialId,
    cloud: MaterialId,
}

impl DecorAssets {
    pub fn register(library: &mut Library) -> Self {
        let bands = RAINBOW
            .iter()
            .enumerate()
            .map(|(i, colour)| {
                let radius = 6.0 - 0.4 * i as f32;
                let geometry = library.add_geometry(shape::torus_arc(radius, 0.2, 8, 48, PI));
                let material = library.add_material(Material::lit(&format!("rainbow band {}", i), *colour));
                (geometry, material)
            })
            .collect();
        Self {
            sphere: library.add_geometry(shape::sphere(1.0, 24, 16)),
            trunk: library.add_geometry(shape::cylinder(0.25, 0.35, 2.0, 12)),
            cone: library.add_geometry(shape::cone(1.5, 3.5, 16)),
            plank: library.add_geometry(shape::cuboid(2.4, 0.12, 0.5)),
            leg: library.add_geometry(shape::cuboid(0.12, 0.6, 0.5)),
            bands,
            leaves: library.add_material(Material::lit("leaves", [0.3, 0.7, 0.25])),
            needles: library.add_material(Material::lit("needles", [0.12, 0.45, 0.22])),
            bark: library.add_material(Material::lit("bark", [0.45, 0.3, 0.18])),
            wood: library.add_material(Material::lit("wood", [0.65, 0.45, 0.25])),
            cloud: library.add_material(Material::lit("cloud", [1.0, 1.0, 1.0]).with_opacity(0.85)),
        }
    }

    /// Parts of a decor kind: name, geometry, material and its transform relative to the anchor.
    fn parts(&self, kind: DecorKind) -> Vec<(&'static str, GeometryId, MaterialId, Transform)> {
        match kind {
            DecorKind::RoundTree => vec![
                ("canopy", self.sphere, self.leaves, Transform::at(0.0, 3.0, 0.0).with_uniform_scale(1.5)),
                ("trunk", self.trunk, self.bark, Transform::at(0.0, 1.0, 0.0)),
            ],
            DecorKind::ConeTree => vec![
                ("canopy", self.cone, self.needles, Transform::at(0.0, 3.5, 0.0)),
                ("trunk", self.trunk, self.bark, Transform::at(0.0, 1.0, 0.0)),
            ],
            DecorKind::Bench => vec![
                ("seat", self.plank, self.wood, Transform::at(0.0, 0.6, 0.0)),
                (
                    "backrest",
                    self.plank,
                    self.wood,
                    Transform::at(0.0, 1.0, -0.3)
                        .with_rotation(Quaternion::from_angle_x(cgmath::Deg(80.0))),
                ),
                ("left leg", self.leg, self.bark, Transform::at(-1.05, 0.3, 0.0)),
                ("right leg", self.leg, self.bark, Transform::at(1.05, 0.3, 0.0)),
            ],
            DecorKind::Rainbow => self
                .bands
                .iter()
                .map(|&(geometry, material)| ("band", geometry, material, Transform::new()))
                .collect(),
            DecorKind::Cloud => vec![
                ("puff", self.sphere, self.cloud, Transform::new().with_scale(1.6, 1.1, 1.2)),
                ("puff", self.sphere, self.cloud, Transform::at(-1.4, -0.2, 0.1).with_uniform_scale(1.0)),
                ("puff", self.sphere, self.cloud, Transform::at(1.5, -0.1, -0.1).with_uniform_scale(1.1)),
                ("puff", self.sphere, self.cloud, Transform::at(0.4, 0.6, 0.3).with_uniform_scale(0.9)),
            ],
        }
    }
}

/**
 * Places decor and sparkles into a [`Scene`].
 *
 * The random source `R` is the only source of randomness, so a placer built
 * with [`ProceduralPlacer::seeded`] lays out the same sparkles on every run.
 */
#[derive(Debug)]
pub struct ProceduralPlacer<R: Rng> {
    rng: R,
    palette: Vec<SparkleStyle>,
    decor: DecorAssets,
}

impl<R: Rng> ProceduralPlacer<R> {
    pub fn new(rng: R, palette: Vec<SparkleStyle>, decor: DecorAssets) -> Self {
        Self { rng, palette, decor }
    }

    /// A placer using the default palette and decor, both registered into `library`.
    pub fn with_defaults(rng: R, library: &mut Library) -> Self {
        let palette = sparkle_palette(library);
        let decor = DecorAssets::register(library);
        Self::new(rng, palette, decor)
    }

    pub fn palette(&self) -> &[SparkleStyle] {
        &self.palette
    }

    /**
     * Instantiates every part of `kind` at `position`, directly below the root.
     *
     * Part offsets are scaled and turned with `params` so all parts of one
     * decor share the same anchor. Returns the new nodes in part order.
     */
    pub fn place_fixed(
        &self,
        scene: &mut Scene,
        kind: DecorKind,
        position: Vector3<f32>,
        params: DecorParams,
    ) -> Result<Vec<NodeId>, PlacementError> {
        let heading = Quaternion::from_angle_y(params.heading);
        let mut placed = Vec::new();
        for (name, geometry, material, local) in self.decor.parts(kind) {
            let transform = Transform {
                position: position + heading.rotate_vector(local.position * params.scale),
                rotation: heading * local.rotation,
                scale: local.scale * params.scale,
            };
            let node = Node::new(name, geometry, material, transform);
            placed.push(scene.graph.insert(node, None)?);
        }
        Ok(placed)
    }

    /**
     * Draws `count` sparkles within `bounds` and registers each as animated.
     *
     * Per sparkle the draws happen in a fixed order (palette entry, then x, y
     * and z), so the sequence of nodes only depends on the random source.
     */
    pub fn place_random(
        &mut self,
        scene: &mut Scene,
        count: usize,
        bounds: &Bounds,
    ) -> Result<Vec<AnimatedNode>, PlacementError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if self.palette.is_empty() {
            return Err(PlacementError::EmptyPalette);
        }
        if bounds.is_empty() {
            return Err(PlacementError::EmptyBounds(bounds.clone()));
        }

        let mut animated = Vec::with_capacity(count);
        for _ in 0..count {
            let style = self.palette[self.rng.gen_range(0..self.palette.len())];
            let x = self.rng.gen_range(bounds.x.clone());
            let y = self.rng.gen_range(bounds.y.clone());
            let z = self.rng.gen_range(bounds.z.clone());
            let transform = Transform::at(x as f32, y as f32, z as f32).with_uniform_scale(style.scale);
            let id = scene
                .graph
                .insert(Node::new("sparkle", style.geometry, style.material, transform), None)?;
            animated.push(scene.graph.register_animated(id)?);
        }
        log::debug!("Placed {} sparkles", count);
        Ok(animated)
    }
}

impl ProceduralPlacer<ChaCha8Rng> {
    /// Default placer whose sparkles are reproducible from `seed`.
    pub fn seeded(seed: u64, library: &mut Library) -> Self {
        Self::with_defaults(ChaCha8Rng::seed_from_u64(seed), library)
    }

    /// Default placer with a fresh layout on every run.
    pub fn from_entropy(library: &mut Library) -> Self {
        Self::with_defaults(ChaCha8Rng::from_entropy(), library)
    }
}
