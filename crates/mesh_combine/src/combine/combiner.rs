//! Mesh combiner
//!
//! Merges the instances of one material group into a single [`CombinedMesh`].
//! Each instance contributes the vertices its submesh actually references,
//! transformed into the target space, and exactly one index range.
//! Coincident vertices of different instances are never merged, so output
//! submesh `i` maps back to input instance `i` without any bookkeeping.

use std::collections::HashMap;

use super::combined_mesh::{CombinedMesh, SubMeshRange, Topology};
use super::error::{CombineError, CombineResult, CombineWarning, InvalidInstanceReason};
use super::instance::MeshInstance;
use super::strip::triangles_to_strip;
use crate::config::DEFAULT_SINGULAR_EPSILON;
use crate::foundation::math::{transform_position, NormalMatrix};
use crate::render::Mesh;

/// Knobs for one combine request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombineOptions {
    /// Re-encode each range as a triangle strip when that is not larger
    pub prefer_triangle_strips: bool,

    /// Ratio of `|det|` to the product of the column lengths at or below
    /// which an instance transform counts as singular
    pub singular_epsilon: f32,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            prefer_triangle_strips: true,
            singular_epsilon: DEFAULT_SINGULAR_EPSILON,
        }
    }
}

/// Stateless combiner configured once per request
#[derive(Debug, Clone, Default)]
pub struct MeshCombiner {
    options: CombineOptions,
}

impl MeshCombiner {
    /// Create a combiner
    pub fn new(options: CombineOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    pub fn options(&self) -> &CombineOptions {
        &self.options
    }

    /// Combine `instances` into one mesh with one submesh range per instance
    ///
    /// Every instance is validated before any geometry is produced, so a
    /// failure never yields a partial mesh. Singular transforms are not
    /// errors; they are recorded in [`CombinedMesh::warnings`].
    pub fn combine(&self, instances: &[MeshInstance]) -> CombineResult<CombinedMesh> {
        if instances.is_empty() {
            return Err(CombineError::EmptyInput);
        }

        let mut meshes = Vec::with_capacity(instances.len());
        for (index, instance) in instances.iter().enumerate() {
            let (mesh, submesh) = validate(instance)
                .map_err(|reason| CombineError::InvalidInstance { index, reason })?;
            meshes.push((mesh, submesh));
        }

        let index_total: usize = meshes.iter().map(|(_, submesh)| submesh.len()).sum();
        let mut combined = CombinedMesh {
            indices: Vec::with_capacity(index_total),
            submeshes: Vec::with_capacity(instances.len()),
            ..CombinedMesh::default()
        };

        for (position, (instance, (mesh, submesh))) in instances.iter().zip(meshes).enumerate() {
            let normal_matrix = NormalMatrix::from_affine(&instance.transform, self.options.singular_epsilon);
            if let NormalMatrix::Singular { determinant, .. } = normal_matrix {
                let warning = CombineWarning::TransformSingularity {
                    instance: position,
                    determinant,
                };
                log::warn!("{}", warning);
                combined.warnings.push(warning);
            }

            let start = combined.indices.len();
            let mut remap: HashMap<u32, u32> = HashMap::new();
            for &source in submesh {
                let target = match remap.get(&source) {
                    Some(&target) => target,
                    None => {
                        let target = u32::try_from(combined.vertices.len()).map_err(|_| {
                            CombineError::VertexLimitExceeded {
                                count: combined.vertices.len() + 1,
                            }
                        })?;
                        let vertex = source as usize;
                        combined
                            .vertices
                            .push(transform_position(&instance.transform, &mesh.positions[vertex]));
                        combined
                            .normals
                            .push(normal_matrix.transform(&mesh.normals[vertex]));
                        remap.insert(source, target);
                        target
                    }
                };
                combined.indices.push(target);
            }

            combined.submeshes.push(SubMeshRange {
                start,
                count: submesh.len(),
                topology: Topology::TriangleList,
            });
        }

        if self.options.prefer_triangle_strips {
            encode_strips(&mut combined);
        }

        log::debug!(
            "Combined {} instance(s) into {} vertices and {} indices",
            instances.len(),
            combined.vertex_count(),
            combined.index_count()
        );
        Ok(combined)
    }
}

/// Combine `instances` with default options and the given strip preference
pub fn combine(instances: &[MeshInstance], use_triangle_strips: bool) -> CombineResult<CombinedMesh> {
    MeshCombiner::new(CombineOptions {
        prefer_triangle_strips: use_triangle_strips,
        ..CombineOptions::default()
    })
    .combine(instances)
}

fn validate(instance: &MeshInstance) -> Result<(&Mesh, &[u32]), InvalidInstanceReason> {
    let mesh = instance
        .mesh
        .as_deref()
        .ok_or(InvalidInstanceReason::MissingMesh)?;

    let submesh = mesh
        .submesh(instance.submesh_index)
        .ok_or(InvalidInstanceReason::SubmeshOutOfRange {
            submesh: instance.submesh_index,
            count: mesh.submesh_count(),
        })?;

    if mesh.normals.len() != mesh.positions.len() {
        return Err(InvalidInstanceReason::NormalCountMismatch {
            positions: mesh.positions.len(),
            normals: mesh.normals.len(),
        });
    }

    if submesh.len() % 3 != 0 {
        return Err(InvalidInstanceReason::NotTriangleList { len: submesh.len() });
    }

    let vertex_count = mesh.vertex_count();
    if let Some(&index) = submesh.iter().find(|&&index| index as usize >= vertex_count) {
        return Err(InvalidInstanceReason::IndexOutOfRange { index, vertex_count });
    }

    Ok((mesh, submesh))
}

/// Replace each list range by its strip form where that is not larger,
/// then lay the ranges out contiguously again
fn encode_strips(combined: &mut CombinedMesh) {
    let mut indices = Vec::with_capacity(combined.indices.len());
    let mut stripped = 0;

    for range in &mut combined.submeshes {
        let list = &combined.indices[range.range()];
        let start = indices.len();
        match triangles_to_strip(list) {
            Some(strip) if strip.len() <= list.len() => {
                indices.extend_from_slice(&strip);
                range.topology = Topology::TriangleStrip;
                stripped += 1;
            }
            _ => indices.extend_from_slice(list),
        }
        range.start = start;
        range.count = indices.len() - start;
    }

    log::debug!(
        "Strip pass: {} of {} range(s) stripped, {} -> {} indices",
        stripped,
        combined.submeshes.len(),
        combined.indices.len(),
        indices.len()
    );
    combined.indices = indices;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4, Transform, Vec3};
    use crate::combine::strip::canonical_triangle;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    const EPSILON: f32 = 1e-5;

    fn list_only() -> MeshCombiner {
        MeshCombiner::new(CombineOptions {
            prefer_triangle_strips: false,
            ..CombineOptions::default()
        })
    }

    fn two_submesh_mesh() -> Arc<Mesh> {
        // Submesh 1 only touches vertices 3..6
        let mut mesh = Mesh::from_triangles(
            "pair",
            &[
                [Vec3::zeros(), Vec3::x(), Vec3::y()],
                [Vec3::z(), Vec3::z() + Vec3::x(), Vec3::z() + Vec3::y()],
            ],
        );
        mesh.submeshes = vec![vec![0, 1, 2], vec![5, 3, 4]];
        Arc::new(mesh)
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert_eq!(combine(&[], true), Err(CombineError::EmptyInput));
    }

    #[test]
    fn test_identity_reproduces_source() {
        let cube = Arc::new(Mesh::cube());
        let combined = list_only()
            .combine(&[MeshInstance::new(cube.clone(), Mat4::identity(), 0)])
            .expect("combine");

        assert_eq!(combined.vertex_count(), cube.vertex_count());
        assert_eq!(combined.indices, cube.submeshes[0]);
        for (out, source) in combined.vertices.iter().zip(&cube.positions) {
            assert_relative_eq!(*out, *source, epsilon = EPSILON);
        }
        for (out, source) in combined.normals.iter().zip(&cube.normals) {
            assert_relative_eq!(*out, *source, epsilon = EPSILON);
        }
        assert!(combined.warnings.is_empty());
    }

    #[test]
    fn test_ranges_follow_input_order() {
        let cube = Arc::new(Mesh::cube());
        let grid = Arc::new(Mesh::grid(2, 2));
        let instances = [
            MeshInstance::new(grid.clone(), Mat4::identity(), 0),
            MeshInstance::new(cube.clone(), Mat4::new_translation(&Vec3::new(5.0, 0.0, 0.0)), 0),
            MeshInstance::new(grid, Mat4::identity(), 0),
        ];
        let combined = list_only().combine(&instances).expect("combine");

        assert_eq!(combined.submesh_count(), 3);
        let counts: Vec<usize> = combined.submeshes.iter().map(|range| range.count).collect();
        assert_eq!(counts, vec![24, 36, 24]);
        assert_eq!(combined.index_count(), instances.iter().map(MeshInstance::index_count).sum());
        assert_eq!(combined.vertex_count(), 9 + 24 + 9);

        // Second range is offset past the first instance's vertices
        let second = combined.submesh_indices(1).expect("range");
        assert_eq!(second.iter().min(), Some(&9));
        assert!(combined.indices.iter().all(|&index| (index as usize) < combined.vertex_count()));
    }

    #[test]
    fn test_only_referenced_vertices_are_copied() {
        let mesh = two_submesh_mesh();
        let combined = list_only()
            .combine(&[MeshInstance::new(mesh.clone(), Mat4::identity(), 1)])
            .expect("combine");

        assert_eq!(combined.vertex_count(), 3);
        // First-use order: 5, 3, 4
        assert_eq!(combined.indices, vec![0, 1, 2]);
        assert_relative_eq!(combined.vertices[0], mesh.positions[5]);
        assert_relative_eq!(combined.vertices[1], mesh.positions[3]);
    }

    #[test]
    fn test_positions_and_normals_are_transformed() {
        let quad = Arc::new(Mesh::quad());
        let transform = Transform::from_position(Vec3::new(0.0, 3.0, 0.0))
            .with_rotation_axis_angle(Vec3::x(), std::f32::consts::FRAC_PI_2)
            .to_matrix();
        let combined = list_only()
            .combine(&[MeshInstance::new(quad, transform, 0)])
            .expect("combine");

        for normal in &combined.normals {
            assert_relative_eq!(*normal, Vec3::z(), epsilon = EPSILON);
        }
        for vertex in &combined.vertices {
            assert!(vertex.y >= 2.5 - EPSILON && vertex.y <= 3.5 + EPSILON);
            assert_relative_eq!(vertex.z, 0.0, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_non_uniform_scale_uses_inverse_transpose() {
        // Slanted face: normal (1, 1, 0) / sqrt 2
        let mesh = Arc::new(Mesh::from_triangles(
            "slope",
            &[[Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 1.0)]],
        ));
        let stretch = Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 1.0, 1.0));
        let combined = list_only()
            .combine(&[MeshInstance::new(mesh, stretch, 0)])
            .expect("combine");

        let a = combined.vertices[0];
        let b = combined.vertices[1];
        let c = combined.vertices[2];
        let face = (b - a).cross(&(c - a)).normalize();
        assert_relative_eq!(combined.normals[0], face, epsilon = EPSILON);
        assert_relative_eq!(combined.normals[0].norm(), 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_small_non_uniform_scale_stays_invertible() {
        let mesh = Arc::new(Mesh::from_triangles(
            "slope",
            &[[Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 1.0)]],
        ));
        let millimetres = Mat4::new_nonuniform_scaling(&Vec3::new(0.004, 0.001, 0.001));
        let combined = list_only()
            .combine(&[MeshInstance::new(mesh, millimetres, 0)])
            .expect("combine");

        assert!(combined.warnings.is_empty());
        let a = combined.vertices[0];
        let b = combined.vertices[1];
        let c = combined.vertices[2];
        let face = (b - a).cross(&(c - a)).normalize();
        assert_relative_eq!(combined.normals[0], face, epsilon = EPSILON);
    }

    #[test]
    fn test_singular_transform_warns_and_continues() {
        let cube = Arc::new(Mesh::cube());
        let flatten = Mat4::new_nonuniform_scaling(&Vec3::new(1.0, 0.0, 1.0));
        let combined = list_only()
            .combine(&[
                MeshInstance::new(cube.clone(), Mat4::identity(), 0),
                MeshInstance::new(cube, flatten, 0),
            ])
            .expect("singular transforms are not fatal");

        assert_eq!(combined.submesh_count(), 2);
        assert!(matches!(
            combined.warnings.as_slice(),
            [CombineWarning::TransformSingularity { instance: 1, .. }]
        ));
        assert!(combined.vertices[24..].iter().all(|v| v.y.abs() < EPSILON));
        // Normals stay unit length or collapse to zero
        for normal in &combined.normals[24..] {
            let length = normal.norm();
            assert!(length < EPSILON || (length - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_invalid_instances_report_position() {
        let cube = Arc::new(Mesh::cube());
        let missing = MeshInstance {
            mesh: None,
            transform: Mat4::identity(),
            submesh_index: 0,
        };
        let result = combine(&[MeshInstance::new(cube.clone(), Mat4::identity(), 0), missing], true);
        assert_eq!(
            result,
            Err(CombineError::InvalidInstance {
                index: 1,
                reason: InvalidInstanceReason::MissingMesh,
            })
        );

        let result = combine(&[MeshInstance::new(cube, Mat4::identity(), 3)], true);
        assert_eq!(
            result,
            Err(CombineError::InvalidInstance {
                index: 0,
                reason: InvalidInstanceReason::SubmeshOutOfRange { submesh: 3, count: 1 },
            })
        );
    }

    #[test]
    fn test_malformed_mesh_data() {
        let mut broken = Mesh::cube();
        broken.submeshes[0].push(99);
        broken.submeshes[0].extend_from_slice(&[0, 1]);
        let result = combine(&[MeshInstance::new(Arc::new(broken), Mat4::identity(), 0)], false);
        assert!(matches!(
            result,
            Err(CombineError::InvalidInstance {
                reason: InvalidInstanceReason::IndexOutOfRange { index: 99, vertex_count: 24 },
                ..
            })
        ));

        let mut ragged = Mesh::cube();
        ragged.submeshes[0].pop();
        let result = combine(&[MeshInstance::new(Arc::new(ragged), Mat4::identity(), 0)], false);
        assert!(matches!(
            result,
            Err(CombineError::InvalidInstance {
                reason: InvalidInstanceReason::NotTriangleList { len: 35 },
                ..
            })
        ));

        let mut unpaired = Mesh::cube();
        unpaired.normals.pop();
        let result = combine(&[MeshInstance::new(Arc::new(unpaired), Mat4::identity(), 0)], false);
        assert!(matches!(
            result,
            Err(CombineError::InvalidInstance {
                reason: InvalidInstanceReason::NormalCountMismatch { positions: 24, normals: 23 },
                ..
            })
        ));
    }

    #[test]
    fn test_strips_render_same_triangles() {
        let grid = Arc::new(Mesh::grid(4, 3));
        let cube = Arc::new(Mesh::cube());
        let instances = [
            MeshInstance::new(grid, Mat4::identity(), 0),
            MeshInstance::new(cube, Mat4::new_translation(&Vec3::new(0.0, 2.0, 0.0)), 0),
        ];

        let list = combine(&instances, false).expect("list");
        let strip = combine(&instances, true).expect("strip");

        assert_eq!(strip.vertices, list.vertices);
        assert_eq!(strip.submesh_count(), list.submesh_count());
        assert!(strip.index_count() <= list.index_count());
        assert_eq!(strip.submeshes[0].topology, Topology::TriangleStrip);

        for index in 0..list.submesh_count() {
            let canonical = |mesh: &CombinedMesh| {
                let mut triangles: Vec<[u32; 3]> = mesh
                    .submesh_triangles(index)
                    .expect("range")
                    .into_iter()
                    .map(canonical_triangle)
                    .collect();
                triangles.sort_unstable();
                triangles
            };
            assert_eq!(canonical(&strip), canonical(&list));
        }

        // Ranges stay contiguous after re-encoding
        let mut next = 0;
        for range in &strip.submeshes {
            assert_eq!(range.start, next);
            next = range.end();
        }
        assert_eq!(next, strip.index_count());
    }

    #[test]
    fn test_strip_not_used_when_larger() {
        // Three disjoint triangles need bridges, a strip would be longer
        let soup = Arc::new(Mesh::from_triangles(
            "soup",
            &[
                [Vec3::zeros(), Vec3::x(), Vec3::y()],
                [Vec3::z(), Vec3::z() + Vec3::x(), Vec3::z() + Vec3::y()],
                [Vec3::x() * 3.0, Vec3::x() * 4.0, Vec3::x() * 3.0 + Vec3::y()],
            ],
        ));
        let combined = combine(&[MeshInstance::new(soup, Mat4::identity(), 0)], true).expect("combine");
        assert_eq!(combined.submeshes[0].topology, Topology::TriangleList);
        assert_eq!(combined.index_count(), 9);
    }
}
