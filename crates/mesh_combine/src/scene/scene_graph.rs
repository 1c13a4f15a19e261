//! Scene graph trait and implementation
//!
//! The combiner never owns a scene. It reads one through [`SceneView`], a
//! read-only tree view any host graph can implement. [`SceneGraph`] is the
//! in-memory implementation used by the application and the tests; it also
//! carries the cleanup operations the caller runs after combining.

use std::sync::Arc;

use crate::assets::ObjError;
use crate::foundation::collections::{new_key_type, SlotMap};
use crate::foundation::math::{Mat4, Transform, Vec3};
use crate::render::{MaterialId, Mesh};

new_key_type! {
    /// Handle to a node in a [`SceneGraph`]
    pub struct NodeId;
}

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, `None` for no points
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::new(*first, *first);
        for point in rest {
            bounds.min = bounds.min.inf(point);
            bounds.max = bounds.max.sup(point);
        }
        Some(bounds)
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }
}

/// Mesh plus the materials bound to its submesh slots
#[derive(Debug, Clone)]
pub struct MeshRenderer {
    /// Shared mesh data; `None` models a renderer whose mesh went missing
    pub mesh: Option<Arc<Mesh>>,

    /// Material per slot; slot `m` draws submesh `min(m, submesh_count - 1)`
    pub materials: Vec<MaterialId>,

    /// Disabled renderers are not combined
    pub enabled: bool,
}

impl MeshRenderer {
    /// Enabled renderer drawing `mesh` with `materials`
    pub fn new(mesh: Arc<Mesh>, materials: Vec<MaterialId>) -> Self {
        Self {
            mesh: Some(mesh),
            materials,
            enabled: true,
        }
    }

    /// Builder pattern: Set enabled state
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A named node with a local transform and an optional renderer
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Node name; exclusion and cleanup policies match against it
    pub name: String,

    /// Transform relative to the parent node
    pub transform: Transform,

    /// Renderer attached to this node
    pub renderer: Option<MeshRenderer>,

    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    /// Parent node, `None` for roots
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Scene errors
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// Node handle does not belong to the graph (or was removed)
    #[error("Unknown scene node: {0:?}")]
    UnknownNode(NodeId),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Scene description could not be parsed or written
    #[error("Scene description error: {0}")]
    Description(String),

    /// Referenced mesh file failed to load
    #[error("Mesh load error: {0}")]
    Mesh(#[from] ObjError),
}

/// Read-only tree view the instance collector walks
pub trait SceneView {
    /// Node handle
    type Node: Copy;

    /// Children of `node` in traversal order
    fn children(&self, node: Self::Node) -> &[Self::Node];

    /// Name the exclusion policy is applied to
    fn name(&self, node: Self::Node) -> &str;

    /// Transform from `node`'s space into its parent's space
    fn local_transform(&self, node: Self::Node) -> Mat4;

    /// Renderer attached to `node`, if any
    fn renderer(&self, node: Self::Node) -> Option<&MeshRenderer>;
}

/// Slot-map backed scene tree
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    /// Create a new empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level node
    pub fn add_root(&mut self, name: impl Into<String>, transform: Transform) -> NodeId {
        let id = self.nodes.insert(SceneNode {
            name: name.into(),
            transform,
            renderer: None,
            parent: None,
            children: Vec::new(),
        });
        self.roots.push(id);
        id
    }

    /// Add a node as the last child of `parent`
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
    ) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::UnknownNode(parent));
        }

        let id = self.nodes.insert(SceneNode {
            name: name.into(),
            transform,
            renderer: None,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    /// Replace the renderer of `node`, returning the previous one
    pub fn set_renderer(
        &mut self,
        node: NodeId,
        renderer: impl Into<Option<MeshRenderer>>,
    ) -> Result<Option<MeshRenderer>, SceneError> {
        let entry = self.nodes.get_mut(node).ok_or(SceneError::UnknownNode(node))?;
        Ok(std::mem::replace(&mut entry.renderer, renderer.into()))
    }

    /// Get a node by ID
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Whether `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Top-level nodes in insertion order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Get the total number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Local-to-world matrix of a node
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(id)?;
        let mut matrix = node.transform.to_matrix();
        while let Some(parent) = node.parent {
            node = self.nodes.get(parent)?;
            matrix = node.transform.to_matrix() * matrix;
        }
        Some(matrix)
    }

    /// `root` and all its descendants in depth-first pre-order
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// First node named `name` under `root`, in pre-order
    pub fn find_by_name(&self, root: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&id| self.nodes[id].name == name)
    }

    /// Remove a node and everything below it, returning the number removed
    pub fn remove_subtree(&mut self, id: NodeId) -> usize {
        let Some(node) = self.nodes.get(id) else {
            return 0;
        };

        match node.parent {
            Some(parent) => {
                if let Some(parent_node) = self.nodes.get_mut(parent) {
                    parent_node.children.retain(|&child| child != id);
                }
            }
            None => self.roots.retain(|&root| root != id),
        }

        let doomed = self.descendants(id);
        for node in &doomed {
            self.nodes.remove(*node);
        }
        doomed.len()
    }

    /// Drop the renderer of every node under `root` whose name fails `keep`
    ///
    /// Returns the number of renderers removed. Nodes themselves stay; pair
    /// with [`SceneGraph::remove_empty_nodes`] to prune what is left.
    pub fn strip_renderers(&mut self, root: NodeId, keep: impl Fn(NodeId, &str) -> bool) -> usize {
        let mut stripped = 0;
        for id in self.descendants(root) {
            let node = &mut self.nodes[id];
            if node.renderer.is_some() && !keep(id, &node.name) {
                node.renderer = None;
                stripped += 1;
            }
        }
        stripped
    }

    /// Remove childless, renderer-less nodes under `root` until none are left
    ///
    /// Nodes whose name satisfies `keep` and `root` itself always survive.
    /// Each pass visits children before parents, and passes repeat until one
    /// removes nothing. Returns the total number of nodes removed.
    pub fn remove_empty_nodes(&mut self, root: NodeId, keep: impl Fn(&str) -> bool) -> usize {
        let mut total = 0;
        let mut pass = 0;
        loop {
            let removed = self.remove_empty_pass(root, &keep);
            pass += 1;
            log::debug!("Empty node cleanup pass {} removed {} node(s)", pass, removed);
            if removed == 0 {
                break;
            }
            total += removed;
        }
        total
    }

    fn remove_empty_pass(&mut self, root: NodeId, keep: &impl Fn(&str) -> bool) -> usize {
        let mut removed = 0;
        for id in self.descendants(root).into_iter().rev() {
            if id == root {
                continue;
            }
            let empty = self.nodes.get(id).is_some_and(|node| {
                node.children.is_empty() && node.renderer.is_none() && !keep(&node.name)
            });
            if empty {
                removed += self.remove_subtree(id);
            }
        }
        removed
    }
}

impl SceneView for SceneGraph {
    type Node = NodeId;

    fn children(&self, node: NodeId) -> &[NodeId] {
        match self.nodes.get(node) {
            Some(entry) => entry.children.as_slice(),
            None => &[],
        }
    }

    fn name(&self, node: NodeId) -> &str {
        self.nodes.get(node).map_or("", |entry| entry.name.as_str())
    }

    fn local_transform(&self, node: NodeId) -> Mat4 {
        self.nodes
            .get(node)
            .map_or_else(Mat4::identity, |entry| entry.transform.to_matrix())
    }

    fn renderer(&self, node: NodeId) -> Option<&MeshRenderer> {
        self.nodes.get(node)?.renderer.as_ref()
    }
}
