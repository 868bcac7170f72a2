use cgmath::{Deg, Rad};
use park_scene::viewport::{ViewportController, ViewportState};

mod common;
use common::test_utils::{RecordingSurface, assert_close};

fn controller_at(width: u32, height: u32) -> ViewportController {
    ViewportController::new(ViewportState::new(width, height, Deg(45.0), 0.1, 1000.0))
}

#[test]
fn halving_keeps_the_aspect_ratio() {
    let mut surface = RecordingSurface::new();
    let mut viewport = controller_at(800, 600);
    assert_close(viewport.state().aspect(), 4.0 / 3.0);

    assert!(viewport.on_resize(400, 300, &mut surface));

    assert_close(viewport.state().aspect(), 4.0 / 3.0);
    assert_eq!((viewport.state().width(), viewport.state().height()), (400, 300));
    assert_eq!(surface.resizes, vec![(400, 300)]);
}

#[test]
fn new_proportions_change_the_aspect_ratio() {
    let mut surface = RecordingSurface::new();
    let mut viewport = controller_at(800, 600);

    viewport.on_resize(400, 200, &mut surface);

    assert_close(viewport.state().aspect(), 2.0);
}

#[test]
fn resizing_twice_to_the_same_size_is_idempotent() {
    let mut surface = RecordingSurface::new();
    let mut viewport = controller_at(800, 600);

    viewport.on_resize(1280, 720, &mut surface);
    let first = *viewport.state();
    viewport.on_resize(1280, 720, &mut surface);

    assert_eq!(*viewport.state(), first);
    assert_eq!(surface.resizes, vec![(1280, 720), (1280, 720)]);
}

#[test]
fn projection_parameters_survive_resizes() {
    let mut surface = RecordingSurface::new();
    let mut viewport = controller_at(800, 600);

    viewport.on_resize(333, 777, &mut surface);

    let state = viewport.state();
    assert_eq!(state.fovy, Rad::from(Deg(45.0)));
    assert_close(state.znear, 0.1);
    assert_close(state.zfar, 1000.0);
    assert_close(state.aspect(), 333.0 / 777.0);
}

#[test]
fn zero_sized_resizes_are_ignored() {
    let mut surface = RecordingSurface::new();
    let mut viewport = controller_at(800, 600);
    let before = *viewport.state();

    assert!(!viewport.on_resize(0, 600, &mut surface));
    assert!(!viewport.on_resize(800, 0, &mut surface));

    assert_eq!(*viewport.state(), before);
    assert!(surface.resizes.is_empty());
}
