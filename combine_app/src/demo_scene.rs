//! Built-in demo scene
//!
//! A courtyard scattered with crates and barrels, plus the kinds of nodes the
//! default exclusion patterns leave alone: colliders and an indoors group.

use std::f32::consts::TAU;

use mesh_combine::scene::{MeshSource, NodeDescription, SceneDescription};
use rand::prelude::*;

/// Seed used when none is given on the command line
pub const DEFAULT_SEED: u64 = 7;

const CRATES: usize = 24;
const BARRELS: usize = 12;
const COURTYARD_HALF_SIZE: f32 = 20.0;

/// Build the demo courtyard; the same seed always yields the same scene
pub fn demo_scene(seed: u64) -> SceneDescription {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut root = NodeDescription::new("Courtyard");

    let mut floor = NodeDescription::new("Floor");
    floor.position = [-COURTYARD_HALF_SIZE, 0.0, -COURTYARD_HALF_SIZE];
    floor.mesh = Some(MeshSource::Grid { columns: 40, rows: 40 });
    floor.materials = vec!["Cobblestone".to_string()];
    root.children.push(floor);

    let mut props = NodeDescription::new("Props");
    for i in 0..CRATES {
        let mut node = scattered(&mut rng, format!("Crate {i}"));
        node.mesh = Some(MeshSource::Cube);
        // Every third crate has a metal lid in its second slot
        node.materials = if i % 3 == 0 {
            vec!["Wood".to_string(), "Iron".to_string()]
        } else {
            vec!["Wood".to_string()]
        };

        let mut collider = NodeDescription::new(format!("Crate {i} Collider"));
        collider.mesh = Some(MeshSource::Cube);
        collider.materials = vec!["Debug".to_string()];
        node.children.push(collider);

        props.children.push(node);
    }

    let mut barrels = NodeDescription::new("Barrels");
    for i in 0..BARRELS {
        let mut node = scattered(&mut rng, format!("Barrel {i}"));
        node.mesh = Some(MeshSource::Cube);
        node.scale = [0.6, 1.2, 0.6];
        node.materials = vec!["Iron".to_string()];
        barrels.children.push(node);
    }
    props.children.push(barrels);
    root.children.push(props);

    let mut indoors = NodeDescription::new("Indoors");
    let mut rug = NodeDescription::new("Rug");
    rug.mesh = Some(MeshSource::Quad);
    rug.scale = [3.0, 1.0, 2.0];
    rug.materials = vec!["Cloth".to_string()];
    indoors.children.push(rug);
    root.children.push(indoors);

    // A switched-off lamp stays out of the combination
    let mut lamp = scattered(&mut rng, "Lamp".to_string());
    lamp.mesh = Some(MeshSource::Cube);
    lamp.materials = vec!["Glass".to_string()];
    lamp.enabled = false;
    root.children.push(lamp);

    SceneDescription { root }
}

fn scattered(rng: &mut StdRng, name: String) -> NodeDescription {
    let mut node = NodeDescription::new(name);
    node.position = [
        rng.gen_range(-COURTYARD_HALF_SIZE..COURTYARD_HALF_SIZE),
        0.5,
        rng.gen_range(-COURTYARD_HALF_SIZE..COURTYARD_HALF_SIZE),
    ];
    node.rotation = [0.0, rng.gen_range(0.0..TAU), 0.0];
    node
}
