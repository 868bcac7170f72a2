use std::{cell::RefCell, collections::HashMap, rc::Rc};

use park_scene::{
    data_structures::{scene_graph::Scene, transform::Transform},
    park::add_model,
    resources::{LoadFailure, LoadRequest, ResourceLoader},
};

mod common;
use common::test_utils::{
    MemorySource, PartlyStalledSource, StalledSource, png_bytes, quad_model_source,
};

type Outcomes = Rc<RefCell<Vec<Result<String, LoadFailure>>>>;

fn texture_request(path: &str, outcomes: &Outcomes) -> LoadRequest {
    let outcomes = outcomes.clone();
    LoadRequest::texture(path, move |scene, result| {
        let outcome = result.map(|img| {
            scene.library.add_texture(img.clone());
            format!("{}x{}", img.width(), img.height())
        });
        outcomes.borrow_mut().push(outcome);
    })
}

#[test]
fn unreachable_texture_reports_failure_within_one_pump() {
    let mut scene = Scene::new();
    let outcomes = Outcomes::default();
    let mut loader = ResourceLoader::new(MemorySource::new());
    let nodes_before = scene.graph.len();

    loader.load(texture_request("textures/missing.png", &outcomes));
    assert_eq!(loader.pending(), 1);
    let fired = loader.pump(&mut scene);

    assert_eq!(fired, 1);
    assert_eq!(loader.pending(), 0);
    assert_eq!(outcomes.borrow().len(), 1);
    assert!(matches!(
        &outcomes.borrow()[0],
        Err(LoadFailure::Unreachable { path, .. }) if path == "textures/missing.png"
    ));
    assert_eq!(scene.graph.len(), nodes_before);
    assert_eq!(scene.library.texture_count(), 0);
}

#[test]
fn continuation_fires_exactly_once() {
    let mut scene = Scene::new();
    let outcomes = Outcomes::default();
    let source = MemorySource::new().with("textures/red.png", png_bytes(3, 2, [255, 0, 0, 255]));
    let mut loader = ResourceLoader::new(source);

    loader.load(texture_request("textures/red.png", &outcomes));
    loader.pump(&mut scene);
    loader.pump(&mut scene);
    loader.pump(&mut scene);

    assert_eq!(*outcomes.borrow(), vec![Ok("3x2".to_string())]);
    assert_eq!(scene.library.texture_count(), 1);
}

#[test]
fn load_returns_before_anything_is_delivered() {
    let mut scene = Scene::new();
    let outcomes = Outcomes::default();
    let source = MemorySource::new().with("a.png", png_bytes(1, 1, [0, 0, 0, 255]));
    let mut loader = ResourceLoader::new(source);

    loader.load(texture_request("a.png", &outcomes));
    assert!(outcomes.borrow().is_empty());

    loader.pump(&mut scene);
    assert_eq!(outcomes.borrow().len(), 1);
}

#[test]
fn malformed_bytes_are_reported_as_such() {
    let mut scene = Scene::new();
    let outcomes = Outcomes::default();
    let source = MemorySource::new().with("textures/garbage.png", b"definitely not a png".to_vec());
    let mut loader = ResourceLoader::new(source);

    loader.load(texture_request("textures/garbage.png", &outcomes));
    loader.pump(&mut scene);

    assert!(matches!(&outcomes.borrow()[0], Err(LoadFailure::Malformed { .. })));
}

#[test]
fn stalled_load_never_fires_and_blocks_nothing() {
    let mut scene = Scene::new();
    let outcomes = Outcomes::default();
    let source = PartlyStalledSource {
        fast: MemorySource::new().with("fast.png", png_bytes(1, 1, [0, 255, 0, 255])),
        stalled: vec!["slow.png".to_string()],
    };
    let mut loader = ResourceLoader::new(source);

    loader.load(texture_request("slow.png", &outcomes));
    loader.load(texture_request("fast.png", &outcomes));
    for _ in 0..10 {
        loader.pump(&mut scene);
    }

    assert_eq!(*outcomes.borrow(), vec![Ok("1x1".to_string())]);
    assert_eq!(loader.pending(), 1);
}

#[test]
fn fully_stalled_transport_delivers_nothing() {
    let mut scene = Scene::new();
    let outcomes = Outcomes::default();
    let mut loader = ResourceLoader::new(StalledSource);

    loader.load(texture_request("a.png", &outcomes));
    loader.load(texture_request("b.png", &outcomes));

    assert_eq!(loader.pump(&mut scene), 0);
    assert!(outcomes.borrow().is_empty());
    assert_eq!(loader.pending(), 2);
}

#[test]
fn independent_loads_report_independently() {
    let mut scene = Scene::new();
    let outcomes = Outcomes::default();
    let source = MemorySource::new().with("ok.png", png_bytes(4, 4, [1, 2, 3, 255]));
    let mut loader = ResourceLoader::new(source);

    loader.load_all([
        texture_request("missing.png", &outcomes),
        texture_request("ok.png", &outcomes),
    ]);
    assert_eq!(loader.pump(&mut scene), 2);

    let outcomes = outcomes.borrow();
    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert_eq!(outcomes.iter().filter(|o| o.is_err()).count(), 1);
}

#[test]
fn model_loads_material_before_geometry() {
    let source = quad_model_source();
    let fetched = source.fetched();
    let mut scene = Scene::new();
    let mut loader = ResourceLoader::new(source);
    let delivered = Rc::new(RefCell::new(None));

    let sink = delivered.clone();
    loader.load(LoadRequest::model("models/quad.obj", "models/quad.mtl", move |scene, result| {
        let model = result.expect("the quad model decodes");
        *sink.borrow_mut() = Some((model.meshes.len(), model.materials.len()));
        add_model(scene, model, "quad", Transform::new()).expect("root always accepts children");
    }));
    loader.pump(&mut scene);

    assert_eq!(*delivered.borrow(), Some((1, 1)));
    assert_eq!(
        *fetched.borrow(),
        vec!["models/quad.mtl", "models/quad.png", "models/quad.obj"]
    );
    // group + one mesh node
    assert_eq!(scene.graph.len(), 2);
    let group = scene.graph.children(scene.graph.root())[0];
    let mesh_node = scene.graph.children(group)[0];
    let material = scene
        .library
        .material(scene.graph.node(mesh_node).unwrap().material.unwrap())
        .unwrap();
    assert!(material.texture.is_some());
    assert_eq!(material.name, "painted");
}

#[test]
fn failed_material_stage_skips_geometry() {
    let source = MemorySource::new().with("models/quad.obj", common::test_utils::QUAD_OBJ);
    let fetched = source.fetched();
    let mut scene = Scene::new();
    let mut loader = ResourceLoader::new(source);
    let failures = Rc::new(RefCell::new(Vec::new()));

    let sink = failures.clone();
    loader.load(LoadRequest::model("models/quad.obj", "models/quad.mtl", move |_, result| {
        sink.borrow_mut().push(result.err());
    }));
    loader.pump(&mut scene);

    assert_eq!(failures.borrow().len(), 1);
    assert!(matches!(
        &failures.borrow()[0],
        Some(LoadFailure::Unreachable { path, .. }) if path == "models/quad.mtl"
    ));
    assert_eq!(*fetched.borrow(), vec!["models/quad.mtl"]);
    assert!(scene.graph.is_empty());
}

#[test]
fn missing_diffuse_texture_degrades_to_flat_colour() {
    let source = MemorySource::new()
        .with("models/quad.obj", common::test_utils::QUAD_OBJ)
        .with("models/quad.mtl", common::test_utils::QUAD_MTL);
    let mut scene = Scene::new();
    let mut loader = ResourceLoader::new(source);
    let colours = Rc::new(RefCell::new(Vec::new()));

    let sink = colours.clone();
    loader.load(LoadRequest::model("models/quad.obj", "models/quad.mtl", move |_, result| {
        let model = result.expect("a missing texture does not fail the model");
        for m in model.materials {
            sink.borrow_mut().push((m.color, m.texture.is_some()));
        }
    }));
    loader.pump(&mut scene);

    assert_eq!(*colours.borrow(), vec![([0.8, 0.2, 0.1], false)]);
}

#[test]
fn broken_geometry_is_malformed() {
    let source = quad_model_source().with("models/quad.obj", "mtllib quad.mtl\no empty\n");
    let mut scene = Scene::new();
    let mut loader = ResourceLoader::new(source);
    let failures = Rc::new(RefCell::new(Vec::new()));

    let sink = failures.clone();
    loader.load(LoadRequest::model("models/quad.obj", "models/quad.mtl", move |_, result| {
        sink.borrow_mut().push(result.err());
    }));
    loader.pump(&mut scene);

    assert!(matches!(&failures.borrow()[0], Some(LoadFailure::Malformed { .. })));
}

#[test]
fn typeface_rasterizes_text() {
    let font = include_bytes!("../assets/fonts/DejaVuSans.ttf");
    let source = MemorySource::new()
        .with("fonts/sans.ttf", font.to_vec())
        .with("fonts/broken.ttf", b"nope".to_vec());
    let mut scene = Scene::new();
    let mut loader = ResourceLoader::new(source);
    let results = Rc::new(RefCell::new(HashMap::new()));

    for path in ["fonts/sans.ttf", "fonts/broken.ttf"] {
        let sink = results.clone();
        loader.load(LoadRequest::typeface(path, move |_, result| {
            let measured = result.map(|typeface| {
                let img = typeface.rasterize("Hello park", 32.0, [255, 255, 255]);
                let inked = img.pixels().filter(|p| p.0[3] > 0).count();
                (img.width(), img.height(), inked)
            });
            sink.borrow_mut().insert(path, measured);
        }));
    }
    loader.pump(&mut scene);

    let results = results.borrow();
    assert_eq!(results.len(), 2);
    let (width, height, inked) = results["fonts/sans.ttf"].clone().expect("DejaVu Sans parses");
    assert!(width > height, "{}x{} is not a line of text", width, height);
    assert!(inked > 0);
    assert!(matches!(&results["fonts/broken.ttf"], Err(LoadFailure::Malformed { .. })));
}
