//! Data-driven scene descriptions
//!
//! A scene file is RON: a tree of named nodes with a TRS transform, an
//! optional mesh source and the material names bound to its slots.
//!
//! ```text
//! (
//!     root: (
//!         name: "Village",
//!         children: [
//!             (name: "Hut", position: (2.0, 0.0, 0.0), mesh: Some(Cube), materials: ["Thatch"]),
//!             (name: "Hut Collider", mesh: Some(Cube), materials: ["Debug"]),
//!         ],
//!     ),
//! )
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::scene_graph::{MeshRenderer, NodeId, SceneError, SceneGraph};
use crate::assets::ObjLoader;
use crate::foundation::math::{Transform, Vec3};
use crate::render::{MaterialRegistry, Mesh};

// ---------- Data form ----------

/// Where a node's mesh comes from
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeshSource {
    /// Unit cube
    Cube,
    /// Unit quad facing +Y
    Quad,
    /// Flat grid of unit cells
    Grid {
        /// Cells along X
        columns: u32,
        /// Cells along Z
        rows: u32,
    },
    /// OBJ file, relative to the scene file's directory
    Obj(String),
}

/// One node of a scene description
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeDescription {
    /// Node name
    pub name: String,

    /// Position relative to the parent
    #[serde(default)]
    pub position: [f32; 3],

    /// Euler rotation in radians (roll, pitch, yaw)
    #[serde(default)]
    pub rotation: [f32; 3],

    /// Scale factors
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],

    /// Mesh drawn by this node
    #[serde(default)]
    pub mesh: Option<MeshSource>,

    /// Material names, one per slot
    #[serde(default)]
    pub materials: Vec<String>,

    /// Whether the renderer starts enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Child nodes in order
    #[serde(default)]
    pub children: Vec<NodeDescription>,
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_enabled() -> bool {
    true
}

impl NodeDescription {
    /// Node with identity transform and nothing attached
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: default_scale(),
            mesh: None,
            materials: Vec::new(),
            enabled: true,
            children: Vec::new(),
        }
    }

    fn transform(&self) -> Transform {
        Transform::from_euler(
            Vec3::from(self.position),
            Vec3::from(self.rotation),
            Vec3::from(self.scale),
        )
    }
}

/// A whole scene file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Root node
    pub root: NodeDescription,
}

impl SceneDescription {
    /// Parse RON text
    pub fn from_ron_str(text: &str) -> Result<Self, SceneError> {
        ron::from_str(text).map_err(|e| SceneError::Description(e.to_string()))
    }

    /// Render as pretty RON
    pub fn to_ron_string(&self) -> Result<String, SceneError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SceneError::Description(e.to_string()))
    }

    /// Load a `.ron` scene file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Write a `.ron` scene file, replacing any existing one
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SceneError> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    /// Instantiate the description as a new root of `graph`
    ///
    /// Material names resolve through `registry` (unknown names are
    /// registered) and meshes through `library`, with OBJ paths taken
    /// relative to `base_dir`. A node without a mesh gets no renderer.
    pub fn build(
        &self,
        graph: &mut SceneGraph,
        registry: &mut MaterialRegistry,
        library: &mut MeshLibrary,
        base_dir: &Path,
    ) -> Result<NodeId, SceneError> {
        let root = graph.add_root(self.root.name.clone(), self.root.transform());
        attach_renderer(graph, root, &self.root, registry, library, base_dir)?;

        let mut stack: Vec<(NodeId, &NodeDescription)> = vec![(root, &self.root)];
        while let Some((parent, description)) = stack.pop() {
            for child in &description.children {
                let id = graph.add_child(parent, child.name.clone(), child.transform())?;
                attach_renderer(graph, id, child, registry, library, base_dir)?;
                stack.push((id, child));
            }
        }

        log::debug!("Built scene {:?} with {} node(s)", self.root.name, graph.descendants(root).len());
        Ok(root)
    }

    /// Describe the subtree under `root`
    ///
    /// Meshes are written as the source `library` knows them by; a renderer
    /// whose mesh the library cannot name is dropped with a warning.
    pub fn capture(
        graph: &SceneGraph,
        root: NodeId,
        registry: &MaterialRegistry,
        library: &MeshLibrary,
    ) -> Result<Self, SceneError> {
        Ok(Self {
            root: capture_node(graph, root, registry, library)?,
        })
    }
}

fn attach_renderer(
    graph: &mut SceneGraph,
    node: NodeId,
    description: &NodeDescription,
    registry: &mut MaterialRegistry,
    library: &mut MeshLibrary,
    base_dir: &Path,
) -> Result<(), SceneError> {
    let Some(source) = &description.mesh else {
        return Ok(());
    };
    let mesh = library.resolve(source, base_dir)?;
    let materials = description
        .materials
        .iter()
        .map(|name| registry.get_or_register(name))
        .collect();
    graph.set_renderer(node, MeshRenderer::new(mesh, materials).with_enabled(description.enabled))?;
    Ok(())
}

fn capture_node(
    graph: &SceneGraph,
    id: NodeId,
    registry: &MaterialRegistry,
    library: &MeshLibrary,
) -> Result<NodeDescription, SceneError> {
    let node = graph.node(id).ok_or(SceneError::UnknownNode(id))?;
    let euler = node.transform.euler_angles();

    let mut description = NodeDescription::new(node.name.clone());
    description.position = node.transform.position.into();
    description.rotation = euler.into();
    description.scale = node.transform.scale.into();

    if let Some(renderer) = &node.renderer {
        match renderer.mesh.as_ref().and_then(|mesh| library.source_of(mesh)) {
            Some(source) => {
                description.mesh = Some(source.clone());
                description.materials = renderer
                    .materials
                    .iter()
                    .map(|&material| {
                        registry
                            .name_of(material)
                            .map_or_else(|| format!("material-{}", material.0), str::to_string)
                    })
                    .collect();
                description.enabled = renderer.enabled;
            }
            None => log::warn!("Node {:?} has a mesh with no known source, dropping its renderer", node.name),
        }
    }

    for &child in node.children() {
        description.children.push(capture_node(graph, child, registry, library)?);
    }
    Ok(description)
}

// ---------- Mesh cache ----------

/// Shared meshes keyed by their source
///
/// Nodes naming the same source share one `Arc<Mesh>`.
#[derive(Debug, Default)]
pub struct MeshLibrary {
    meshes: HashMap<MeshSource, Arc<Mesh>>,
}

impl MeshLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Mesh for `source`, building or loading it on first use
    pub fn resolve(&mut self, source: &MeshSource, base_dir: &Path) -> Result<Arc<Mesh>, SceneError> {
        if let Some(mesh) = self.meshes.get(source) {
            return Ok(Arc::clone(mesh));
        }

        let mesh = Arc::new(match source {
            MeshSource::Cube => Mesh::cube(),
            MeshSource::Quad => Mesh::quad(),
            MeshSource::Grid { columns, rows } => Mesh::grid(*columns, *rows),
            MeshSource::Obj(path) => ObjLoader::load_obj(base_dir.join(path))?,
        });
        self.meshes.insert(source.clone(), Arc::clone(&mesh));
        Ok(mesh)
    }

    /// Register an existing mesh under `source`, replacing any previous one
    pub fn insert(&mut self, source: MeshSource, mesh: Arc<Mesh>) {
        self.meshes.insert(source, mesh);
    }

    /// Source a shared mesh was registered or resolved under
    pub fn source_of(&self, mesh: &Arc<Mesh>) -> Option<&MeshSource> {
        self.meshes
            .iter()
            .find(|(_, known)| Arc::ptr_eq(known, mesh))
            .map(|(source, _)| source)
    }

    /// Number of cached meshes
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const VILLAGE: &str = r#"
(
    root: (
        name: "Village",
        position: (10.0, 0.0, 0.0),
        children: [
            (name: "Hut", position: (2.0, 0.0, 0.0), mesh: Some(Cube), materials: ["Thatch", "Wood"]),
            (name: "Field", mesh: Some(Grid(columns: 2, rows: 2)), materials: ["Wheat"], enabled: false),
            (
                name: "Props",
                scale: (2.0, 2.0, 2.0),
                children: [(name: "Crate", mesh: Some(Cube), materials: ["Wood"])],
            ),
        ],
    ),
)
"#;

    fn build_village() -> (SceneGraph, NodeId, MaterialRegistry, MeshLibrary) {
        let description = SceneDescription::from_ron_str(VILLAGE).expect("parse");
        let mut graph = SceneGraph::new();
        let mut registry = MaterialRegistry::new();
        let mut library = MeshLibrary::new();
        let root = description
            .build(&mut graph, &mut registry, &mut library, Path::new("."))
            .expect("build");
        (graph, root, registry, library)
    }

    #[test]
    fn test_build_resolves_meshes_and_materials() {
        let (graph, root, registry, library) = build_village();
        assert_eq!(graph.node_count(), 5);
        assert_eq!(registry.len(), 3);
        assert_eq!(library.len(), 2);

        let hut = graph.find_by_name(root, "Hut").expect("hut");
        let crate_node = graph.find_by_name(root, "Crate").expect("crate");
        let hut_mesh = graph.node(hut).and_then(|n| n.renderer.as_ref()).and_then(|r| r.mesh.clone());
        let crate_mesh = graph.node(crate_node).and_then(|n| n.renderer.as_ref()).and_then(|r| r.mesh.clone());
        assert!(Arc::ptr_eq(&hut_mesh.expect("mesh"), &crate_mesh.expect("mesh")));

        let field = graph.find_by_name(root, "Field").expect("field");
        assert!(!graph.node(field).and_then(|n| n.renderer.as_ref()).expect("renderer").enabled);

        let world = graph.world_matrix(crate_node).expect("crate");
        assert_relative_eq!(world[(0, 0)], 2.0, epsilon = 1e-6);
        assert_relative_eq!(world[(0, 3)], 10.0, epsilon = 1e-6);
    }

    #[test]
    fn test_capture_round_trip() {
        let (graph, root, registry, library) = build_village();
        let captured = SceneDescription::capture(&graph, root, &registry, &library).expect("capture");
        let original = SceneDescription::from_ron_str(VILLAGE).expect("parse");
        assert_eq!(captured, original);

        let text = captured.to_ron_string().expect("serialize");
        assert_eq!(SceneDescription::from_ron_str(&text).expect("reparse"), original);
    }

    #[test]
    fn test_unknown_mesh_is_dropped_on_capture() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root("Root", Transform::identity());
        graph
            .set_renderer(root, MeshRenderer::new(Arc::new(Mesh::cube()), vec![]))
            .expect("root exists");

        let captured = SceneDescription::capture(&graph, root, &MaterialRegistry::new(), &MeshLibrary::new())
            .expect("capture");
        assert_eq!(captured.root.mesh, None);
    }

    #[test]
    fn test_missing_obj_is_an_error() {
        let mut library = MeshLibrary::new();
        let result = library.resolve(&MeshSource::Obj("does/not/exist.obj".to_string()), Path::new("."));
        assert!(matches!(result, Err(SceneError::Mesh(_))));
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(matches!(
            SceneDescription::from_ron_str("(root: (name: 3))"),
            Err(SceneError::Description(_))
        ));
    }
}
