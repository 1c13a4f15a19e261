//! End-to-end combine scenarios over an in-memory scene

use std::sync::Arc;

use approx::assert_relative_eq;
use mesh_combine::combine::strip::canonical_triangle;
use mesh_combine::foundation::logging;
use mesh_combine::prelude::*;

/// Loose triangles stepping along +X, no shared vertices
fn strip_of_triangles(name: &str, count: usize) -> Mesh {
    let triangles: Vec<[Vec3; 3]> = (0..count)
        .map(|i| {
            let x = i as f32;
            [Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 0.0, 0.0), Vec3::new(x, 1.0, 0.0)]
        })
        .collect();
    Mesh::from_triangles(name, &triangles)
}

struct Village {
    scene: SceneGraph,
    root: NodeId,
    stone: MaterialId,
    wood: MaterialId,
}

/// Two stone sources (10 and 15 triangles) and one wooden one (5 triangles)
fn village() -> Village {
    let mut registry = MaterialRegistry::new();
    let stone = registry.get_or_register("Stone");
    let wood = registry.get_or_register("Wood");

    let mut scene = SceneGraph::new();
    let root = scene.add_root("Village", Transform::from_position(Vec3::new(50.0, 0.0, 0.0)));
    let sources = [
        ("Wall", 10, stone, Vec3::new(1.0, 0.0, 0.0)),
        ("Tower", 15, stone, Vec3::new(0.0, 4.0, 0.0)),
        ("Fence", 5, wood, Vec3::new(0.0, 0.0, -3.0)),
    ];
    for (name, triangles, material, position) in sources {
        let node = scene
            .add_child(root, name, Transform::from_position(position))
            .expect("root exists");
        scene
            .set_renderer(node, MeshRenderer::new(Arc::new(strip_of_triangles(name, triangles)), vec![material]))
            .expect("node exists");
    }

    Village { scene, root, stone, wood }
}

fn sorted_canonical(triangles: Vec<[u32; 3]>) -> Vec<[u32; 3]> {
    let mut triangles: Vec<[u32; 3]> = triangles.into_iter().map(canonical_triangle).collect();
    triangles.sort_unstable();
    triangles
}

#[test]
fn test_three_children_two_materials() {
    logging::init_for_tests();
    let village = village();

    let report = combine_children(&village.scene, village.root, &CombineConfig::default());
    assert!(report.is_complete());
    assert_eq!(report.meshes.len(), 2);
    assert_eq!(report.meshes[0].0, village.stone);
    assert_eq!(report.meshes[1].0, village.wood);

    let stone = report.mesh_for(village.stone).expect("stone mesh");
    assert_eq!(stone.submesh_count(), 2);
    assert_eq!(stone.triangle_count(), 25);
    assert_eq!(stone.vertex_count(), 75);
    assert_eq!(stone.submesh_triangles(0).map(|t| t.len()), Some(10));
    assert_eq!(stone.submesh_triangles(1).map(|t| t.len()), Some(15));

    let wood = report.mesh_for(village.wood).expect("wood mesh");
    assert_eq!(wood.submesh_count(), 1);
    assert_eq!(wood.triangle_count(), 5);
    assert_eq!(wood.vertex_count(), 15);

    // Positions land in the root's space, not world space
    assert_relative_eq!(stone.vertices[0], Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    assert_relative_eq!(wood.vertices[0], Vec3::new(0.0, 0.0, -3.0), epsilon = 1e-5);
}

#[test]
fn test_index_totals_match_instances() {
    let village = village();
    let groups = collect(&village.scene, village.root, &NamePatternExclusion::none());

    for (_, instances) in groups.iter() {
        let mesh = combine(instances, false).expect("combine");
        assert_eq!(mesh.submesh_count(), instances.len());
        let range_total: usize = mesh.submeshes.iter().map(|range| range.count).sum();
        let instance_total: usize = instances.iter().map(MeshInstance::index_count).sum();
        assert_eq!(range_total, instance_total);
        assert_eq!(mesh.vertices.len(), mesh.normals.len());
    }
}

#[test]
fn test_extra_material_slots_clamp() {
    let mut mesh = Mesh::cube();
    mesh.push_submesh(vec![0, 1, 2]);
    let mesh = Arc::new(mesh);

    let mut scene = SceneGraph::new();
    let root = scene.add_root("Root", Transform::identity());
    let statue = scene.add_child(root, "Statue", Transform::identity()).expect("root exists");
    let (marble, gold, moss) = (MaterialId(0), MaterialId(1), MaterialId(2));
    scene
        .set_renderer(statue, MeshRenderer::new(mesh, vec![marble, gold, moss]))
        .expect("node exists");

    let report = combine_children_with(&scene, root, &NamePatternExclusion::none(), CombineOptions::default());
    assert!(report.is_complete());
    // Slot 2 reuses submesh 1, the single extra triangle
    assert_eq!(report.mesh_for(moss).map(CombinedMesh::triangle_count), Some(1));
    assert_eq!(report.mesh_for(gold).map(CombinedMesh::triangle_count), Some(1));
    assert_eq!(report.mesh_for(marble).map(CombinedMesh::triangle_count), Some(12));
}

#[test]
fn test_everything_excluded_yields_nothing() {
    let village = village();
    let everything = |_: &str| true;

    let groups = collect(&village.scene, village.root, &everything);
    assert!(groups.is_empty());

    let report = combine_children_with(&village.scene, village.root, &everything, CombineOptions::default());
    assert!(report.is_empty());
}

#[test]
fn test_collection_is_repeatable() {
    let village = village();
    let policy = NamePatternExclusion::from_config(&CombineConfig::default());
    let first = collect(&village.scene, village.root, &policy);
    let second = collect(&village.scene, village.root, &policy);

    assert_eq!(first.keys().collect::<Vec<_>>(), second.keys().collect::<Vec<_>>());
    for ((_, a), (_, b)) in first.iter().zip(second.iter()) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert_eq!(x.submesh_index, y.submesh_index);
            assert_eq!(x.transform, y.transform);
            let (Some(xm), Some(ym)) = (&x.mesh, &y.mesh) else {
                panic!("collected instances always carry a mesh");
            };
            assert!(Arc::ptr_eq(xm, ym));
        }
    }
}

#[test]
fn test_exclusion_holds_at_any_depth() {
    let mut scene = SceneGraph::new();
    let root = scene.add_root("Castle", Transform::identity());
    let material = MaterialId(0);
    let mut excluded_meshes = Vec::new();

    // Alternate excluded and included nodes down a deep chain
    let mut parent = root;
    for depth in 0..12 {
        let excluded = depth % 3 == 1;
        let name = if excluded {
            format!("Level {depth} Collider")
        } else {
            format!("Level {depth}")
        };
        let node = scene
            .add_child(parent, name, Transform::from_position(Vec3::new(0.0, 1.0, 0.0)))
            .expect("parent exists");
        let mesh = Arc::new(Mesh::cube());
        if excluded {
            excluded_meshes.push(Arc::clone(&mesh));
        }
        scene
            .set_renderer(node, MeshRenderer::new(mesh, vec![material]))
            .expect("node exists");
        parent = node;
    }

    let groups = collect(&scene, root, &NamePatternExclusion::new(["Collider"]));
    let instances = groups.get(&material).expect("included nodes");
    assert_eq!(instances.len(), 8);
    for instance in instances {
        let mesh = instance.mesh.as_ref().expect("mesh");
        assert!(excluded_meshes.iter().all(|excluded| !Arc::ptr_eq(excluded, mesh)));
    }

    // Deepest node sits 12 units above the root
    let deepest = instances.last().expect("deepest instance");
    assert_relative_eq!(deepest.transform[(1, 3)], 12.0, epsilon = 1e-5);
}

#[test]
fn test_identity_round_trip() {
    let grid = Arc::new(Mesh::grid(3, 3));
    let mesh = combine(&[MeshInstance::new(Arc::clone(&grid), Mat4::identity(), 0)], false).expect("combine");

    for (combined, source) in mesh.vertices.iter().zip(&grid.positions) {
        assert_relative_eq!(*combined, *source, epsilon = 1e-6);
    }
    for (combined, source) in mesh.normals.iter().zip(&grid.normals) {
        assert_relative_eq!(*combined, *source, epsilon = 1e-6);
    }
}

#[test]
fn test_strips_match_lists_across_instances() {
    let grid = Arc::new(Mesh::grid(6, 2));
    let cube = Arc::new(Mesh::cube());
    let instances: Vec<MeshInstance> = (0..4)
        .map(|i| {
            let offset = Mat4::new_translation(&Vec3::new(i as f32 * 7.0, 0.0, 0.0));
            let mesh = if i % 2 == 0 { &grid } else { &cube };
            MeshInstance::new(Arc::clone(mesh), offset, 0)
        })
        .collect();

    let list = combine(&instances, false).expect("list");
    let strip = combine(&instances, true).expect("strip");

    assert!(strip.index_count() < list.index_count());
    assert_eq!(sorted_canonical(strip.triangles()), sorted_canonical(list.triangles()));
    for index in 0..list.submesh_count() {
        assert_eq!(
            sorted_canonical(strip.submesh_triangles(index).expect("range")),
            sorted_canonical(list.submesh_triangles(index).expect("range")),
        );
    }
}

#[test]
fn test_obj_export_round_trip() {
    let village = village();
    let report = combine_children(&village.scene, village.root, &CombineConfig::default());
    let stone = report.mesh_for(village.stone).expect("stone mesh");

    let dir = std::env::temp_dir().join(format!("mesh_combine_obj_{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("Village-mesh-1.obj");
    mesh_combine::assets::write_obj(stone, "Village-mesh-1", Some("Stone"), &path).expect("write");

    let loaded = ObjLoader::load_obj(&path).expect("load");
    assert_eq!(loaded.submesh_count(), stone.submesh_count());
    assert_eq!(loaded.triangle_count(), stone.triangle_count());

    let exported: Vec<Vec3> = stone
        .triangles()
        .into_iter()
        .flatten()
        .map(|index| stone.vertices[index as usize])
        .collect();
    let imported: Vec<Vec3> = loaded
        .submeshes
        .iter()
        .flatten()
        .map(|&index| loaded.positions[index as usize])
        .collect();
    assert_eq!(exported.len(), imported.len());
    for (a, b) in exported.iter().zip(&imported) {
        assert_relative_eq!(*a, *b, epsilon = 1e-5);
    }
}
