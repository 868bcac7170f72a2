//! The park: what gets placed at startup and which assets stream in later.
//!
//! [`populate`] builds everything that needs no external data (ground, trees,
//! bench, rainbow, clouds and the random sparkles). [`requests`] describes the
//! assets that arrive asynchronously and how each one extends the scene once
//! decoded. A failed load only logs, the park stays usable without it.

use cgmath::{Deg, Quaternion, Rotation3, Vector3};
use rand::Rng;

use crate::{
    data_structures::{
        model::{Library, Material, MaterialId},
        scene_graph::{AnimatedNode, Node, NodeId, Scene},
        shape,
        transform::Transform,
    },
    placement::{Bounds, DecorKind, DecorParams, PlacementError, ProceduralPlacer},
    resources::{
        LoadRequest,
        font::Typeface,
        model::{ModelAsset, ModelMaterial},
    },
};

pub const GROUND_SIZE: f32 = 60.0;
pub const SKY_RADIUS: f32 = 400.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ParkConfig {
    /// Sparkle layout seed. `None` picks a fresh layout on every run.
    pub seed: Option<u64>,
    pub sparkle_count: usize,
    pub sparkle_bounds: Bounds,
    pub greeting: String,
    pub ground_texture: String,
    pub sky_texture: String,
    pub typeface: String,
    pub model_geometry: String,
    pub model_material: String,
    /// Background colour behind the sky dome, linear RGB.
    pub clear_colour: [f64; 3],
}

impl Default for ParkConfig {
    fn default() -> Self {
        Self {
            seed: None,
            sparkle_count: 50,
            sparkle_bounds: Bounds::new(-18..18, 2..21, -18..18),
            greeting: "Welcome to the park".to_string(),
            ground_texture: "textures/grass.png".to_string(),
            sky_texture: "textures/sky.png".to_string(),
            typeface: "fonts/DejaVuSans.ttf".to_string(),
            model_geometry: "models/signpost.obj".to_string(),
            model_material: "models/signpost.mtl".to_string(),
            clear_colour: [0.53, 0.78, 0.95],
        }
    }
}

/// Handles to the parts of a populated park that later loads refer to.
#[derive(Clone, Debug)]
pub struct ParkLayout {
    pub ground: NodeId,
    pub ground_material: MaterialId,
    pub sparkles: Vec<AnimatedNode>,
}

/// Hand-placed decor: kind, anchor and parameters.
fn decor() -> Vec<(DecorKind, Vector3<f32>, DecorParams)> {
    vec![
        (DecorKind::RoundTree, Vector3::new(-12.0, 0.0, -8.0), DecorParams::default()),
        (DecorKind::RoundTree, Vector3::new(-15.0, 0.0, 4.0), DecorParams::scaled(1.3)),
        (DecorKind::RoundTree, Vector3::new(13.0, 0.0, 9.0), DecorParams::scaled(0.9)),
        (DecorKind::ConeTree, Vector3::new(10.0, 0.0, -12.0), DecorParams::default()),
        (DecorKind::ConeTree, Vector3::new(15.0, 0.0, -4.0), DecorParams::scaled(1.4)),
        (DecorKind::ConeTree, Vector3::new(-6.0, 0.0, 14.0), DecorParams::scaled(1.1)),
        (DecorKind::Bench, Vector3::new(0.0, 0.0, 6.0), DecorParams::default().facing(Deg(180.0))),
        (DecorKind::Bench, Vector3::new(-8.0, 0.0, 0.0), DecorParams::default().facing(Deg(90.0))),
        (DecorKind::Rainbow, Vector3::new(0.0, 0.0, -20.0), DecorParams::scaled(2.0)),
        (DecorKind::Cloud, Vector3::new(-14.0, 24.0, -16.0), DecorParams::scaled(1.5)),
        (DecorKind::Cloud, Vector3::new(12.0, 27.0, -10.0), DecorParams::scaled(2.0)),
        (DecorKind::Cloud, Vector3::new(2.0, 25.0, 16.0), DecorParams::scaled(1.2)),
    ]
}

/// Inserts the ground, the decor and `config.sparkle_count` animated sparkles.
pub fn populate<R: Rng>(
    scene: &mut Scene,
    placer: &mut ProceduralPlacer<R>,
    config: &ParkConfig,
) -> Result<ParkLayout, PlacementError> {
    let ground_geometry = scene
        .library
        .add_geometry(shape::plane(GROUND_SIZE, GROUND_SIZE, GROUND_SIZE / 5.0));
    let ground_material = scene
        .library
        .add_material(Material::lit("ground", [0.35, 0.6, 0.3]));
    let ground = scene.graph.insert(
        Node::new("ground", ground_geometry, ground_material, Transform::new()),
        None,
    )?;

    for (kind, position, params) in decor() {
        placer.place_fixed(scene, kind, position, params)?;
    }
    let sparkles = placer.place_random(scene, config.sparkle_count, &config.sparkle_bounds)?;

    log::info!(
        "Park populated with {} nodes ({} animated)",
        scene.graph.len(),
        scene.graph.animated_len()
    );
    Ok(ParkLayout {
        ground,
        ground_material,
        sparkles,
    })
}

/// The asynchronous part of the park, one request per external asset.
pub fn requests(config: &ParkConfig, layout: &ParkLayout) -> Vec<LoadRequest> {
    let ground_material = layout.ground_material;
    let greeting = config.greeting.clone();
    vec![
        LoadRequest::texture(&config.ground_texture, move |scene, result| match result {
            Ok(img) => {
                let texture = scene.library.add_texture(img);
                if let Some(material) = scene.library.material_mut(ground_material) {
                    material.texture = Some(texture);
                    material.color = [1.0, 1.0, 1.0, 1.0];
                }
            }
            Err(e) => log::warn!("Ground stays untextured: {}", e),
        }),
        LoadRequest::texture(&config.sky_texture, |scene, result| match result {
            Ok(img) => {
                let texture = scene.library.add_texture(img);
                let material = scene
                    .library
                    .add_material(Material::unlit("sky", [1.0, 1.0, 1.0]).with_texture(texture));
                let geometry = scene.library.add_geometry(shape::sphere(1.0, 32, 24));
                // Mirroring one axis turns the sphere inside out so its inner faces are drawn
                let transform = Transform::new().with_scale(-SKY_RADIUS, SKY_RADIUS, SKY_RADIUS);
                if let Err(e) = scene.graph.insert(Node::new("sky", geometry, material, transform), None) {
                    log::error!("Could not add the sky: {}", e);
                }
            }
            Err(e) => log::warn!("Sky stays plain: {}", e),
        }),
        LoadRequest::typeface(&config.typeface, move |scene, result| match result {
            Ok(typeface) => {
                if let Err(e) = add_greeting(scene, &typeface, &greeting) {
                    log::error!("Could not add the greeting: {}", e);
                }
            }
            Err(e) => log::warn!("No greeting without a typeface: {}", e),
        }),
        LoadRequest::model(&config.model_geometry, &config.model_material, |scene, result| {
            match result {
                Ok(model) => {
                    let transform = Transform::at(6.0, 0.0, 2.0)
                        .with_rotation(Quaternion::from_angle_y(Deg(-30.0)));
                    if let Err(e) = add_model(scene, model, "signpost", transform) {
                        log::error!("Could not add the model: {}", e);
                    }
                }
                Err(e) => log::warn!("Model skipped: {}", e),
            }
        }),
    ]
}

const GREETING_HEIGHT: f32 = 2.5;

fn add_greeting(scene: &mut Scene, typeface: &Typeface, text: &str) -> anyhow::Result<NodeId> {
    let img = typeface.rasterize(text, 96.0, [255, 255, 255]);
    let width = GREETING_HEIGHT * img.width() as f32 / img.height() as f32;
    let texture = scene.library.add_texture(img);
    let material = scene.library.add_material(
        Material::unlit("greeting", [1.0, 0.95, 0.6])
            .with_texture(texture)
            .transparent(),
    );
    let geometry = scene
        .library
        .add_geometry(shape::upright_plane(width, GREETING_HEIGHT));
    let node = Node::new("greeting", geometry, material, Transform::at(0.0, 9.0, -10.0));
    Ok(scene.graph.insert(node, None)?)
}

/**
 * Adds a decoded model as a group node with one child per mesh.
 *
 * Meshes without a (valid) material share a plain white one.
 */
pub fn add_model(
    scene: &mut Scene,
    model: ModelAsset,
    name: &str,
    transform: Transform,
) -> anyhow::Result<NodeId> {
    let materials: Vec<MaterialId> = model
        .materials
        .into_iter()
        .map(|m| register_material(&mut scene.library, m))
        .collect();
    let mut fallback = None;

    let group = scene.graph.insert(Node::group(name, transform), None)?;
    for mesh in model.meshes {
        let material = match mesh.material.and_then(|idx| materials.get(idx)) {
            Some(&material) => material,
            None => *fallback.get_or_insert_with(|| {
                scene
                    .library
                    .add_material(Material::lit("default", [1.0, 1.0, 1.0]))
            }),
        };
        let geometry = scene.library.add_geometry(mesh.mesh);
        scene.graph.insert(
            Node::new(&mesh.name, geometry, material, Transform::new()),
            Some(group),
        )?;
    }
    Ok(group)
}

fn register_material(library: &mut Library, m: ModelMaterial) -> MaterialId {
    let mut material = Material::lit(&m.name, m.color).with_opacity(m.opacity);
    if let Some(img) = m.texture {
        material = material.with_texture(library.add_texture(img));
    }
    library.add_material(material)
}
