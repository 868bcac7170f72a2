use park_scene::data_structures::{
    scene_graph::{InvalidParentError, Node, SceneGraph, UnknownNodeError},
    transform::Transform,
};

mod common;
use common::test_utils::assert_close;

fn foreign_id() -> park_scene::NodeId {
    let mut other = SceneGraph::new();
    let mut last = other.root();
    for i in 0..10 {
        last = other
            .insert(Node::group(&format!("n{}", i), Transform::new()), None)
            .unwrap();
    }
    last
}

#[test]
fn insert_defaults_to_root() {
    let mut graph = SceneGraph::new();
    let a = graph.insert(Node::group("a", Transform::new()), None).unwrap();
    let b = graph.insert(Node::group("b", Transform::new()), None).unwrap();

    assert_eq!(graph.len(), 2);
    assert_eq!(graph.parent(a), Some(graph.root()));
    assert_eq!(graph.children(graph.root()), &[a, b]);
    assert_eq!(graph.node(b).unwrap().name, "b");
}

#[test]
fn insert_under_missing_parent_changes_nothing() {
    let mut graph = SceneGraph::new();
    graph.insert(Node::group("a", Transform::new()), None).unwrap();
    let missing = foreign_id();

    let result = graph.insert(Node::group("orphan", Transform::new()), Some(missing));

    assert_eq!(result, Err(InvalidParentError(missing)));
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.children(graph.root()).len(), 1);
    assert!(graph.world_transforms().iter().all(|(id, _)| graph.node(*id).unwrap().name == "a"));
}

#[test]
fn nested_nodes_compose_transforms() {
    let mut graph = SceneGraph::new();
    let parent = graph
        .insert(Node::group("parent", Transform::at(1.0, 2.0, 3.0).with_uniform_scale(2.0)), None)
        .unwrap();
    let child = graph
        .insert(Node::group("child", Transform::at(1.0, 0.0, 0.0)), Some(parent))
        .unwrap();

    let world = graph.world_transforms();
    assert_eq!(world.len(), 2);
    assert_eq!(world[0].0, parent);
    assert_eq!(world[1].0, child);
    let child_world = world[1].1;
    assert_close(child_world.position.x, 3.0);
    assert_close(child_world.position.y, 2.0);
    assert_close(child_world.position.z, 3.0);
    assert_close(child_world.scale.x, 2.0);
}

#[test]
fn world_transforms_are_depth_first_in_insertion_order() {
    let mut graph = SceneGraph::new();
    let a = graph.insert(Node::group("a", Transform::new()), None).unwrap();
    let b = graph.insert(Node::group("b", Transform::new()), None).unwrap();
    let a1 = graph.insert(Node::group("a1", Transform::new()), Some(a)).unwrap();
    let b1 = graph.insert(Node::group("b1", Transform::new()), Some(b)).unwrap();
    let a2 = graph.insert(Node::group("a2", Transform::new()), Some(a)).unwrap();

    let order: Vec<_> = graph.world_transforms().into_iter().map(|(id, _)| id).collect();
    assert_eq!(order, vec![a, a1, a2, b, b1]);
}

#[test]
fn animated_registration_assigns_sequential_indices() {
    let mut graph = SceneGraph::new();
    let ids: Vec<_> = (0..3)
        .map(|i| graph.insert(Node::group(&format!("s{}", i), Transform::new()), None).unwrap())
        .collect();

    let registered: Vec<_> = ids.iter().map(|&id| graph.register_animated(id).unwrap()).collect();

    let indices: Vec<_> = registered.iter().map(|a| a.index()).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_close(registered[2].coefficient(), 1.2);
    assert_eq!(graph.animated_len(), 3);
}

#[test]
fn handles_from_another_graph_are_rejected() {
    let mut other = SceneGraph::new();
    let stranger = other.insert(Node::group("stranger", Transform::new()), None).unwrap();
    let mut graph = SceneGraph::new();
    for name in ["a", "b", "c"] {
        graph.insert(Node::group(name, Transform::new()), None).unwrap();
    }

    let result = graph.insert(Node::group("orphan", Transform::new()), Some(stranger));

    assert_eq!(result, Err(InvalidParentError(stranger)));
    assert_eq!(graph.len(), 3);
    assert!(!graph.contains(stranger));
    assert!(!graph.contains(other.root()));
    assert!(graph.node(stranger).is_none());
    assert!(graph.children(stranger).is_empty());
    assert_eq!(graph.register_animated(stranger), Err(UnknownNodeError(stranger)));
    assert_eq!(graph.animated_len(), 0);
}

#[test]
fn registering_unknown_nodes_fails() {
    let mut graph = SceneGraph::new();
    let missing = foreign_id();

    assert_eq!(graph.register_animated(missing), Err(UnknownNodeError(missing)));
    assert_eq!(graph.register_animated(graph.root()), Err(UnknownNodeError(graph.root())));
    assert_eq!(graph.animated_len(), 0);
}

#[test]
fn animated_traversal_is_restartable() {
    let mut graph = SceneGraph::new();
    for i in 0..4 {
        let id = graph.insert(Node::group(&format!("s{}", i), Transform::new()), None).unwrap();
        graph.register_animated(id).unwrap();
    }

    let first: Vec<_> = graph.animated().map(|a| a.node).collect();
    let second: Vec<_> = graph.animated().map(|a| a.node).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);

    let mut visited = Vec::new();
    graph.for_each_animated(|animated, node| visited.push((animated.index(), node.name.clone())));
    assert_eq!(
        visited,
        vec![
            (0, "s0".to_string()),
            (1, "s1".to_string()),
            (2, "s2".to_string()),
            (3, "s3".to_string())
        ]
    );
}
