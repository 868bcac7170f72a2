use park_scene::{
    camera::OrbitCamera,
    data_structures::{
        scene_graph::{Node, Scene},
        transform::Transform,
    },
    flow::{LoopState, RenderLoop, RenderLoopError},
    viewport::ViewportState,
};

mod common;
use common::test_utils::{CountingPacer, ManualClock, RecordingSurface, assert_close, yaw_of};

fn spinning_scene(count: usize) -> Scene {
    let mut scene = Scene::new();
    for i in 0..count {
        let id = scene
            .graph
            .insert(Node::group(&format!("spin{}", i), Transform::new()), None)
            .unwrap();
        scene.graph.register_animated(id).unwrap();
    }
    scene
}

#[test]
fn idle_loop_refuses_to_draw() {
    let mut render_loop = RenderLoop::new(ManualClock::new());
    let mut scene = spinning_scene(1);
    let mut surface = RecordingSurface::new();
    let mut pacer = CountingPacer::default();

    let result = render_loop.frame(
        &mut scene,
        &OrbitCamera::default(),
        &ViewportState::default(),
        &mut surface,
        &mut pacer,
    );

    let err = result.unwrap_err();
    assert_eq!(err.downcast_ref::<RenderLoopError>(), Some(&RenderLoopError::NotStarted));
    assert!(surface.draws.is_empty());
    assert_eq!(pacer.requests, 0);
    assert_eq!(render_loop.state(), LoopState::Idle);
}

#[test]
fn start_schedules_the_first_frame_once() {
    let clock = ManualClock::new();
    clock.set_secs(3.0);
    let mut render_loop = RenderLoop::new(clock);
    let mut pacer = CountingPacer::default();

    assert!(render_loop.start(&mut pacer));
    assert!(!render_loop.start(&mut pacer));

    assert_eq!(pacer.requests, 1);
    assert!(render_loop.is_running());
}

#[test]
fn frames_animate_with_time_since_start() {
    let clock = ManualClock::new();
    clock.set_secs(10.0);
    let mut render_loop = RenderLoop::new(clock.clone());
    let mut scene = spinning_scene(3);
    let mut surface = RecordingSurface::new();
    let mut pacer = CountingPacer::default();
    let camera = OrbitCamera::default();
    let viewport = ViewportState::default();

    render_loop.start(&mut pacer);
    clock.advance_secs(1.0);
    let elapsed = render_loop
        .frame(&mut scene, &camera, &viewport, &mut surface, &mut pacer)
        .unwrap();

    assert_close(elapsed, 1.0);
    let rotations: Vec<f32> = scene
        .graph
        .animated()
        .map(|a| yaw_of(scene.graph.node(a.node).unwrap().transform.rotation))
        .collect();
    assert_close(rotations[0], 1.0);
    assert_close(rotations[1], 1.1);
    assert_close(rotations[2], 1.2);
}

#[test]
fn every_frame_draws_once_and_reschedules_once() {
    let clock = ManualClock::new();
    let mut render_loop = RenderLoop::new(clock.clone());
    let mut scene = spinning_scene(2);
    let mut surface = RecordingSurface::new();
    let mut pacer = CountingPacer::default();
    let camera = OrbitCamera::default();
    let viewport = ViewportState::default();

    render_loop.start(&mut pacer);
    for _ in 0..5 {
        clock.advance_secs(1.0 / 60.0);
        render_loop
            .frame(&mut scene, &camera, &viewport, &mut surface, &mut pacer)
            .unwrap();
    }

    assert_eq!(surface.draws.len(), 5);
    assert_eq!(pacer.requests, 6);
    assert_eq!(render_loop.frames(), 5);
}

#[test]
fn failed_draw_still_reschedules() {
    let clock = ManualClock::new();
    let mut render_loop = RenderLoop::new(clock.clone());
    let mut scene = spinning_scene(1);
    let mut surface = RecordingSurface::failing();
    let mut pacer = CountingPacer::default();
    let camera = OrbitCamera::default();
    let viewport = ViewportState::default();

    render_loop.start(&mut pacer);
    clock.advance_secs(0.5);
    let result = render_loop.frame(&mut scene, &camera, &viewport, &mut surface, &mut pacer);

    assert!(result.is_err());
    assert_eq!(pacer.requests, 2);
    assert!(render_loop.is_running());
    let node = scene.graph.animated().next().unwrap().node;
    assert_close(yaw_of(scene.graph.node(node).unwrap().transform.rotation), 0.5);
}

#[test]
fn frames_see_the_latest_viewport_and_scene() {
    let clock = ManualClock::new();
    let mut render_loop = RenderLoop::new(clock.clone());
    let mut scene = spinning_scene(1);
    let mut surface = RecordingSurface::new();
    let mut pacer = CountingPacer::default();
    let camera = OrbitCamera::default();
    let mut viewport = park_scene::viewport::ViewportController::default();

    render_loop.start(&mut pacer);
    render_loop
        .frame(&mut scene, &camera, viewport.state(), &mut surface, &mut pacer)
        .unwrap();

    // A resize and an insertion between two frames
    viewport.on_resize(400, 200, &mut surface);
    scene
        .graph
        .insert(Node::group("late", Transform::new()), None)
        .unwrap();
    render_loop
        .frame(&mut scene, &camera, viewport.state(), &mut surface, &mut pacer)
        .unwrap();

    assert_eq!(surface.draws[0].nodes, 1);
    assert_eq!(surface.draws[1].nodes, 2);
    assert_close(surface.draws[1].aspect, 2.0);
    assert_eq!((surface.draws[1].width, surface.draws[1].height), (400, 200));
}
