//! Combine children command line tool
//!
//! Loads a RON scene (or builds the demo courtyard), merges the meshes under
//! its root into one mesh per material and writes the combined meshes and the
//! cleaned scene to the output directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use mesh_combine::config::{CombineConfig, Config};
use mesh_combine::foundation::logging;
use mesh_combine::render::MaterialRegistry;
use mesh_combine::scene::{MeshLibrary, SceneDescription, SceneGraph};

mod demo_scene;
mod pipeline;

use demo_scene::{demo_scene, DEFAULT_SEED};

fn main() -> Result<()> {
    let matches = Command::new("combine_children")
        .about("Merges the meshes under a scene root into one mesh per material")
        .arg(
            Arg::new("scene")
                .value_name("SCENE")
                .help("Scene description (.ron); the demo scene is used when omitted"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Combine settings (.toml or .ron)"),
        )
        .arg(
            Arg::new("out")
                .short('o')
                .long("out")
                .value_name("DIR")
                .help("Output directory, overrides the configured one"),
        )
        .arg(
            Arg::new("no-strips")
                .long("no-strips")
                .help("Keep triangle lists instead of re-encoding strips")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .help("Seed for the demo scene")
                .value_parser(clap::value_parser!(u64))
                .default_value("7"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log debug output")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    logging::init(matches.get_flag("verbose"));

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => CombineConfig::load_from_file(path).with_context(|| format!("loading config {path}"))?,
        None => CombineConfig::default(),
    };
    if matches.get_flag("no-strips") {
        config.prefer_triangle_strips = false;
    }
    let out_dir = matches
        .get_one::<String>("out")
        .map_or_else(|| PathBuf::from(&config.output_dir), PathBuf::from);

    let (description, base_dir) = match matches.get_one::<String>("scene") {
        Some(path) => {
            let path = Path::new(path);
            let description = SceneDescription::load_from_file(path)
                .with_context(|| format!("loading scene {}", path.display()))?;
            let base_dir = path.parent().map_or_else(PathBuf::new, Path::to_path_buf);
            (description, base_dir)
        }
        None => {
            let seed = matches.get_one::<u64>("seed").copied().unwrap_or(DEFAULT_SEED);
            log::info!("No scene given, using the demo courtyard (seed {})", seed);
            (demo_scene(seed), PathBuf::new())
        }
    };

    let mut scene = SceneGraph::new();
    let mut registry = MaterialRegistry::new();
    let mut library = MeshLibrary::new();
    let root = description
        .build(&mut scene, &mut registry, &mut library, &base_dir)
        .context("building scene")?;
    log::info!(
        "Loaded {:?}: {} node(s), {} material(s)",
        description.root.name,
        scene.node_count(),
        registry.len()
    );

    let output = pipeline::run(&mut scene, root, &registry, &mut library, &config, &out_dir)?;

    for path in &output.mesh_files {
        log::debug!("Exported {}", path.display());
    }
    log::info!(
        "Combined into {} node(s), {} triangles; {} failed group(s)",
        output.combined_nodes.len(),
        output.report.triangle_count(),
        output.report.failures.len()
    );
    log::info!(
        "Removed {} renderer(s) and {} empty node(s); scene written to {}",
        output.renderers_stripped,
        output.nodes_removed,
        output.scene_file.display()
    );
    Ok(())
}
