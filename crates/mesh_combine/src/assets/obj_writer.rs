//! OBJ export of combined meshes

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use super::obj_loader::ObjError;
use crate::combine::CombinedMesh;

/// Render `mesh` as Wavefront OBJ text
///
/// Each submesh range becomes one `g` group, empty ranges included; strip
/// ranges are written as their decoded triangles. `material` is emitted as `usemtl` when given.
pub fn to_obj_string(mesh: &CombinedMesh, name: &str, material: Option<&str>) -> String {
    let mut out = String::with_capacity(mesh.vertex_count() * 64 + mesh.index_count() * 8);

    // Writing into a String cannot fail
    let _ = writeln!(out, "# {} vertices, {} triangles", mesh.vertex_count(), mesh.triangle_count());
    let _ = writeln!(out, "o {name}");
    for v in &mesh.vertices {
        let _ = writeln!(out, "v {} {} {}", v.x, v.y, v.z);
    }
    for n in &mesh.normals {
        let _ = writeln!(out, "vn {} {} {}", n.x, n.y, n.z);
    }

    for index in 0..mesh.submesh_count() {
        let _ = writeln!(out, "g {name}-{index}");
        if let Some(material) = material {
            let _ = writeln!(out, "usemtl {material}");
        }
        for [a, b, c] in mesh.submesh_triangles(index).unwrap_or_default() {
            let (a, b, c) = (a + 1, b + 1, c + 1);
            let _ = writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}");
        }
    }

    out
}

/// Write `mesh` to `path` as OBJ, replacing any existing file
pub fn write_obj<P: AsRef<Path>>(
    mesh: &CombinedMesh,
    name: &str,
    material: Option<&str>,
    path: P,
) -> Result<(), ObjError> {
    let path = path.as_ref();
    fs::write(path, to_obj_string(mesh, name, material))?;
    log::info!("Wrote {} ({} triangles)", path.display(), mesh.triangle_count());
    Ok(())
}
