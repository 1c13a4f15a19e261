//! Combine-children pipeline
//!
//! Runs the combiner over a scene root, hangs one combined node per material
//! under the root, removes the renderers the combined meshes replace, prunes
//! the nodes left empty and writes everything to the output directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use mesh_combine::assets::write_obj;
use mesh_combine::combine::{combine_children, CombineReport, ExclusionPolicy, NamePatternExclusion};
use mesh_combine::config::CombineConfig;
use mesh_combine::foundation::math::Transform;
use mesh_combine::render::{MaterialId, MaterialRegistry};
use mesh_combine::scene::{MeshLibrary, MeshRenderer, MeshSource, NodeId, SceneDescription, SceneGraph};

/// What one pipeline run produced
#[derive(Debug)]
pub struct PipelineOutput {
    /// Per-material results, including failed groups
    pub report: CombineReport,
    /// Nodes created for the combined meshes, in group order
    pub combined_nodes: Vec<NodeId>,
    /// Exported OBJ files, in group order
    pub mesh_files: Vec<PathBuf>,
    /// Cleaned scene description
    pub scene_file: PathBuf,
    /// Renderers removed from source nodes
    pub renderers_stripped: usize,
    /// Nodes pruned after stripping
    pub nodes_removed: usize,
}

/// Combine the children of `root` and rewrite the scene around the result
pub fn run(
    scene: &mut SceneGraph,
    root: NodeId,
    registry: &MaterialRegistry,
    library: &mut MeshLibrary,
    config: &CombineConfig,
    out_dir: &Path,
) -> Result<PipelineOutput> {
    let root_name = scene
        .node(root)
        .map(|node| node.name.clone())
        .context("scene root is missing")?;

    let report = combine_children(&*scene, root, config);
    for (material, mesh) in &report.meshes {
        for warning in &mesh.warnings {
            log::warn!("{} ({})", warning, material_name(registry, *material));
        }
    }

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let mut combined_nodes = Vec::with_capacity(report.meshes.len());
    let mut mesh_files = Vec::with_capacity(report.meshes.len());
    for (n, (material, combined)) in report.meshes.iter().enumerate() {
        let mesh_name = format!("{}-mesh-{}", root_name, n + 1);
        let file_name = format!("{mesh_name}.obj");
        let path = out_dir.join(&file_name);
        write_obj(combined, &mesh_name, Some(&material_name(registry, *material)), &path)
            .with_context(|| format!("writing {}", path.display()))?;

        let mesh = Arc::new(combined.to_mesh(mesh_name));
        library.insert(MeshSource::Obj(file_name), Arc::clone(&mesh));

        let node = scene.add_child(root, config.combined_node_name.clone(), Transform::identity())?;
        let slots = vec![*material; mesh.submesh_count()];
        scene.set_renderer(node, MeshRenderer::new(mesh, slots))?;

        combined_nodes.push(node);
        mesh_files.push(path);
    }

    let (renderers_stripped, nodes_removed) = clean_up(scene, root, &report, config, &combined_nodes);

    let scene_file = out_dir.join(format!("{root_name}.scene.ron"));
    SceneDescription::capture(scene, root, registry, library)?
        .save_to_file(&scene_file)
        .with_context(|| format!("writing {}", scene_file.display()))?;
    log::info!("Wrote {}", scene_file.display());

    Ok(PipelineOutput {
        report,
        combined_nodes,
        mesh_files,
        scene_file,
        renderers_stripped,
        nodes_removed,
    })
}

/// Strip replaced renderers, then prune empty nodes until none are left
///
/// Renderers survive on combined nodes and on nodes matched by the exclusion
/// patterns. Renderers that never took part (disabled or meshless) and those
/// drawing a material whose group failed are left in place as well.
fn clean_up(
    scene: &mut SceneGraph,
    root: NodeId,
    report: &CombineReport,
    config: &CombineConfig,
    combined_nodes: &[NodeId],
) -> (usize, usize) {
    let keep_patterns = NamePatternExclusion::from_config(config);
    let failed: HashSet<MaterialId> = report.failures.iter().map(|failure| failure.material).collect();

    let mut keep: HashSet<NodeId> = combined_nodes.iter().copied().collect();
    for id in scene.descendants(root) {
        let Some(renderer) = scene.node(id).and_then(|node| node.renderer.as_ref()) else {
            continue;
        };
        let not_combined = !renderer.enabled || renderer.mesh.is_none();
        if not_combined || renderer.materials.iter().any(|material| failed.contains(material)) {
            keep.insert(id);
        }
    }

    let stripped = scene.strip_renderers(root, |id, name| {
        keep.contains(&id) || name == config.combined_node_name || keep_patterns.excludes(name)
    });
    let removed = scene.remove_empty_nodes(root, |name| {
        name == config.combined_node_name || keep_patterns.excludes(name)
    });

    log::info!("Cleanup stripped {} renderer(s) and removed {} node(s)", stripped, removed);
    (stripped, removed)
}

fn material_name(registry: &MaterialRegistry, material: MaterialId) -> String {
    registry
        .name_of(material)
        .map_or_else(|| format!("material-{}", material.0), str::to_string)
}
