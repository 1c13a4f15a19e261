//! Instance collector
//!
//! Walks a scene subtree and turns every eligible (renderer, material slot)
//! pair into a [`MeshInstance`] expressed in the root's local space, grouped by
//! material. Nothing in the scene is modified.

use std::sync::Arc;

use super::instance::{MaterialGroups, MeshInstance};
use crate::config::CombineConfig;
use crate::foundation::math::Mat4;
use crate::scene::SceneView;

/// Decides which nodes stay out of the combination
///
/// Implementations must be pure: the collector may ask about the same name
/// more than once.
pub trait ExclusionPolicy {
    /// Whether a node with this name is excluded
    fn excludes(&self, name: &str) -> bool;
}

impl<F> ExclusionPolicy for F
where
    F: Fn(&str) -> bool,
{
    fn excludes(&self, name: &str) -> bool {
        self(name)
    }
}

/// Excludes nodes whose name contains any of a list of substrings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamePatternExclusion {
    patterns: Vec<String>,
}

impl NamePatternExclusion {
    /// Exclude names containing any of `patterns`; empty patterns are ignored
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|pattern: &String| !pattern.is_empty())
                .collect(),
        }
    }

    /// Patterns from a combine configuration
    pub fn from_config(config: &CombineConfig) -> Self {
        Self::new(config.exclusion_patterns.iter().cloned())
    }

    /// Policy that excludes nothing
    pub fn none() -> Self {
        Self::default()
    }

    /// Active patterns
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl ExclusionPolicy for NamePatternExclusion {
    fn excludes(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| name.contains(pattern.as_str()))
    }
}

/// Gather the instances under `root`, grouped by material
///
/// Nodes are visited depth-first in pre-order, children in order. Each
/// instance's transform maps the node's space into `root`'s space. A node is
/// skipped, without affecting its descendants, when its own name is excluded,
/// it has no renderer, the renderer is disabled, or the mesh is missing or
/// has no submeshes. Material slot `m` contributes submesh
/// `min(m, submesh_count - 1)`.
pub fn collect<S, P>(scene: &S, root: S::Node, exclusion: &P) -> MaterialGroups
where
    S: SceneView,
    P: ExclusionPolicy + ?Sized,
{
    let mut groups = MaterialGroups::new();
    let mut stack: Vec<(S::Node, Mat4)> = vec![(root, Mat4::identity())];
    let mut visited = 0usize;
    let mut excluded = 0usize;

    while let Some((node, to_root)) = stack.pop() {
        visited += 1;
        for &child in scene.children(node).iter().rev() {
            stack.push((child, to_root * scene.local_transform(child)));
        }

        let name = scene.name(node);
        if exclusion.excludes(name) {
            log::trace!("Excluded {:?} from combination", name);
            excluded += 1;
            continue;
        }

        let Some(renderer) = scene.renderer(node) else {
            continue;
        };
        if !renderer.enabled {
            continue;
        }
        let Some(mesh) = renderer.mesh.as_ref() else {
            continue;
        };
        let submesh_count = mesh.submesh_count();
        if submesh_count == 0 {
            continue;
        }

        for (slot, &material) in renderer.materials.iter().enumerate() {
            let submesh_index = slot.min(submesh_count - 1);
            groups.push(material, MeshInstance::new(Arc::clone(mesh), to_root, submesh_index));
        }
    }

    log::debug!(
        "Collected {} instance(s) in {} material group(s) from {} node(s), {} excluded",
        groups.value_count(),
        groups.len(),
        visited,
        excluded
    );
    groups
}
