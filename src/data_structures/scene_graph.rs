//! Scene graph and hierarchical scene organization.
//!
//! The [`SceneGraph`] is an arena of nodes rooted at a single root node. Every
//! node has a local [`Transform`] that is composed with its parents' transforms
//! when the scene is drawn. Nodes are only ever added; the graph has no removal
//! operation, so a long running session grows monotonically.
//!
//! A subset of nodes is registered as *animated*. Each registration receives
//! the next sequential index, which never changes afterwards and drives the
//! per-node angular velocity used by [`crate::animation::AnimationScheduler`].

use std::sync::atomic::{AtomicU64, Ordering};

use cgmath::Matrix4;
use thiserror::Error;

use crate::data_structures::{
    model::{GeometryId, Library, MaterialId},
    transform::Transform,
};

/// Handle of a node inside one [`SceneGraph`].
///
/// Handles carry the tag of the graph that issued them, so a handle from one
/// graph is never mistaken for a node of another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    graph: u64,
    index: usize,
}

static NEXT_GRAPH: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("parent node {0:?} is not part of the scene graph")]
pub struct InvalidParentError(pub NodeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("node {0:?} is not part of the scene graph")]
pub struct UnknownNodeError(pub NodeId);

/// A renderable object, or a pure grouping node when it has no geometry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub name: String,
    pub geometry: Option<GeometryId>,
    pub material: Option<MaterialId>,
    pub transform: Transform,
}

impl Node {
    pub fn new(name: &str, geometry: GeometryId, material: MaterialId, transform: Transform) -> Self {
        Self {
            name: name.to_string(),
            geometry: Some(geometry),
            material: Some(material),
            transform,
        }
    }

    pub fn group(name: &str, transform: Transform) -> Self {
        Self {
            name: name.to_string(),
            transform,
            ..Default::default()
        }
    }

    /// Only nodes with both a geometry and a material produce draw calls.
    pub fn is_drawable(&self) -> bool {
        self.geometry.is_some() && self.material.is_some()
    }
}

/// A node registered for per-frame rotation.
///
/// `index` is the registration order (0-based) and is immutable once assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimatedNode {
    pub node: NodeId,
    index: usize,
}

impl AnimatedNode {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Angular velocity multiplier in radians per second.
    pub fn coefficient(&self) -> f32 {
        1.0 + 0.1 * self.index as f32
    }
}

#[derive(Debug)]
struct Slot {
    node: Node,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
pub struct SceneGraph {
    tag: u64,
    slots: Vec<Slot>,
    animated: Vec<AnimatedNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        let root = Slot {
            node: Node::group("root", Transform::default()),
            parent: None,
            children: Vec::new(),
        };
        Self {
            tag: NEXT_GRAPH.fetch_add(1, Ordering::Relaxed),
            slots: vec![root],
            animated: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.id(0)
    }

    fn id(&self, index: usize) -> NodeId {
        NodeId {
            graph: self.tag,
            index,
        }
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        if id.graph != self.tag {
            return None;
        }
        self.slots.get(id.index)
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        if id.graph != self.tag {
            return None;
        }
        self.slots.get_mut(id.index)
    }

    /// Number of inserted nodes, not counting the root.
    pub fn len(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    /**
     * Adds `node` as a child of `parent`, or of the root when `parent` is `None`.
     *
     * Fails without touching the graph when `parent` does not belong to it.
     */
    pub fn insert(&mut self, node: Node, parent: Option<NodeId>) -> Result<NodeId, InvalidParentError> {
        let parent = parent.unwrap_or(self.root());
        if !self.contains(parent) {
            return Err(InvalidParentError(parent));
        }
        let id = self.id(self.slots.len());
        self.slots.push(Slot {
            node,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.slots[parent.index].children.push(id);
        Ok(id)
    }

    /// Registers an existing node for animation with the next sequential index.
    pub fn register_animated(&mut self, id: NodeId) -> Result<AnimatedNode, UnknownNodeError> {
        if !self.contains(id) || id == self.root() {
            return Err(UnknownNodeError(id));
        }
        let animated = AnimatedNode {
            node: id,
            index: self.animated.len(),
        };
        self.animated.push(animated);
        Ok(animated)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slot(id).map(|slot| &slot.node)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slot_mut(id).map(|slot| &mut slot.node)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|slot| slot.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id)
            .map(|slot| slot.children.as_slice())
            .unwrap_or(&[])
    }

    /// Animated entries in registration order. Calling it again restarts the traversal.
    pub fn animated(&self) -> impl Iterator<Item = &AnimatedNode> + '_ {
        self.animated.iter()
    }

    pub fn animated_len(&self) -> usize {
        self.animated.len()
    }

    /// Visits every animated entry in registration order with mutable access to its node.
    pub fn for_each_animated(&mut self, mut visitor: impl FnMut(&AnimatedNode, &mut Node)) {
        let slots = &mut self.slots;
        for animated in self.animated.iter() {
            visitor(animated, &mut slots[animated.node.index].node);
        }
    }

    /**
     * World transforms of all nodes (root excluded), depth-first in insertion order.
     *
     * Each world transform is the parent's world transform times the node's local one.
     */
    pub fn world_transforms(&self) -> Vec<(NodeId, Transform)> {
        self.walk(self.slots[0].node.transform, |parent, local| parent * local)
    }

    /// Like [`world_transforms`](Self::world_transforms) but composed as matrices, exact under any nesting.
    pub fn world_matrices(&self) -> Vec<(NodeId, Matrix4<f32>)> {
        self.walk(self.slots[0].node.transform.to_matrix(), |parent, local| {
            *parent * local.to_matrix()
        })
    }

    fn walk<T: Copy>(&self, root: T, compose: impl Fn(&T, &Transform) -> T) -> Vec<(NodeId, T)> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<(NodeId, T)> = self.slots[0]
            .children
            .iter()
            .rev()
            .map(|&child| (child, root))
            .collect();
        while let Some((id, parent_world)) = stack.pop() {
            let slot = &self.slots[id.index];
            let world = compose(&parent_world, &slot.node.transform);
            out.push((id, world));
            stack.extend(slot.children.iter().rev().map(|&child| (child, world)));
        }
        out
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a frame draws: the node hierarchy plus the assets nodes reference.
///
/// This is the single mutable value handed to placement, load continuations,
/// animation and drawing.
#[derive(Debug, Default)]
pub struct Scene {
    pub graph: SceneGraph,
    pub library: Library,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }
}
