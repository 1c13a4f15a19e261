//! Combine every material group under a scene node
//!
//! Ties the collector and the combiner together. One group failing never
//! stops the others; failures are returned next to the finished meshes with
//! the material they belong to.

use super::collector::{collect, ExclusionPolicy, NamePatternExclusion};
use super::combined_mesh::CombinedMesh;
use super::combiner::{CombineOptions, MeshCombiner};
use super::error::MaterialGroupError;
use super::instance::MaterialGroups;
use crate::config::CombineConfig;
use crate::render::MaterialId;
use crate::scene::SceneView;

/// Outcome of combining all material groups of one request
#[derive(Debug, Clone, Default)]
pub struct CombineReport {
    /// One mesh per successfully combined group, in group order
    pub meshes: Vec<(MaterialId, CombinedMesh)>,

    /// Groups whose combination failed, in group order
    pub failures: Vec<MaterialGroupError>,
}

impl CombineReport {
    /// Whether every group combined
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether nothing was combined or attempted
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty() && self.failures.is_empty()
    }

    /// Combined mesh of `material`, if its group succeeded
    pub fn mesh_for(&self, material: MaterialId) -> Option<&CombinedMesh> {
        self.meshes
            .iter()
            .find(|(id, _)| *id == material)
            .map(|(_, mesh)| mesh)
    }

    /// Triangles drawn across all combined meshes
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|(_, mesh)| mesh.triangle_count()).sum()
    }
}

/// Combine each group independently
pub fn combine_groups(groups: &MaterialGroups, options: CombineOptions) -> CombineReport {
    let combiner = MeshCombiner::new(options);
    let mut report = CombineReport::default();

    for (material, instances) in groups.iter() {
        match combiner.combine(instances) {
            Ok(mesh) => {
                log::info!(
                    "Material {:?}: {} instance(s) -> {} vertices, {} triangles",
                    material,
                    instances.len(),
                    mesh.vertex_count(),
                    mesh.triangle_count()
                );
                report.meshes.push((material, mesh));
            }
            Err(error) => {
                let failure = MaterialGroupError { material, error };
                log::error!("{}", failure);
                report.failures.push(failure);
            }
        }
    }

    report
}

/// Collect and combine everything under `root` with a configuration
pub fn combine_children<S: SceneView>(scene: &S, root: S::Node, config: &CombineConfig) -> CombineReport {
    let exclusion = NamePatternExclusion::from_config(config);
    combine_children_with(scene, root, &exclusion, config.combine_options())
}

/// Collect and combine everything under `root` with an explicit policy
///
/// An empty collection yields an empty report without invoking the combiner.
pub fn combine_children_with<S, P>(
    scene: &S,
    root: S::Node,
    exclusion: &P,
    options: CombineOptions,
) -> CombineReport
where
    S: SceneView,
    P: ExclusionPolicy + ?Sized,
{
    let groups = collect(scene, root, exclusion);
    if groups.is_empty() {
        log::info!("Nothing to combine");
        return CombineReport::default();
    }
    combine_groups(&groups, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::{CombineError, InvalidInstanceReason, MeshInstance};
    use crate::foundation::math::Mat4;
    use crate::render::Mesh;
    use std::sync::Arc;

    #[test]
    fn test_failing_group_does_not_stop_others() {
        let cube = Arc::new(Mesh::cube());
        let mut groups = MaterialGroups::new();
        groups.push(MaterialId(7), MeshInstance::new(cube.clone(), Mat4::identity(), 4));
        groups.push(MaterialId(3), MeshInstance::new(cube, Mat4::identity(), 0));

        let report = combine_groups(&groups, CombineOptions::default());
        assert!(!report.is_complete());
        assert_eq!(report.meshes.len(), 1);
        assert!(report.mesh_for(MaterialId(3)).is_some());
        assert!(report.mesh_for(MaterialId(7)).is_none());
        assert_eq!(
            report.failures,
            vec![MaterialGroupError {
                material: MaterialId(7),
                error: CombineError::InvalidInstance {
                    index: 0,
                    reason: InvalidInstanceReason::SubmeshOutOfRange { submesh: 4, count: 1 },
                },
            }]
        );
        assert_eq!(report.triangle_count(), 12);
    }

    #[test]
    fn test_empty_groups_give_empty_report() {
        let report = combine_groups(&MaterialGroups::new(), CombineOptions::default());
        assert!(report.is_empty());
        assert!(report.is_complete());
    }
}
