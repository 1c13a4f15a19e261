//! OBJ file loader for source meshes

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::foundation::math::Vec3;
use crate::render::Mesh;

/// OBJ import and export errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A line could not be parsed
    #[error("Parse error on line {line}: {message}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },
    /// The file parsed but does not describe a usable mesh
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Wavefront OBJ reader
///
/// Every face corner becomes its own vertex and polygons are fan-triangulated.
/// Each `g` statement starts a new submesh, kept even when it has no faces so
/// exported ranges survive a reload. A `usemtl` after faces also starts one.
/// Corners without a normal reference get the flat normal of their face.
/// Texture coordinates are ignored.
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file and return a mesh named after the file stem
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, ObjError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map_or_else(|| "obj".to_string(), |stem| stem.to_string_lossy().into_owned());
        let file = File::open(path)?;
        let mesh = Self::parse(BufReader::new(file), name)?;
        log::debug!(
            "Loaded {} ({} vertices, {} submeshes)",
            path.display(),
            mesh.vertex_count(),
            mesh.submesh_count()
        );
        Ok(mesh)
    }

    /// Parse OBJ text from any buffered reader
    pub fn parse<R: BufRead>(reader: R, name: impl Into<String>) -> Result<Mesh, ObjError> {
        let mut positions: Vec<Vec3> = Vec::new();
        let mut normals: Vec<Vec3> = Vec::new();
        let mut mesh = Mesh::new(name, Vec::new(), Vec::new(), Vec::new());
        let mut current: Vec<u32> = Vec::new();
        // Whether `current` was opened by a `g` statement
        let mut named_group = false;

        for (number, line) in reader.lines().enumerate() {
            let line_number = number + 1;
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts[0] {
                "v" => positions.push(parse_vec3(&parts, line_number, "vertex")?),
                "vn" => normals.push(parse_vec3(&parts, line_number, "normal")?),
                "g" => {
                    if named_group || !current.is_empty() {
                        mesh.push_submesh(std::mem::take(&mut current));
                    }
                    named_group = true;
                }
                "usemtl" => {
                    if !current.is_empty() {
                        mesh.push_submesh(std::mem::take(&mut current));
                        named_group = false;
                    }
                }
                "f" => {
                    if parts.len() < 4 {
                        return Err(parse_error(line_number, "face needs at least three corners"));
                    }

                    let mut corners = Vec::with_capacity(parts.len() - 1);
                    for corner in &parts[1..] {
                        corners.push(parse_corner(corner, positions.len(), normals.len(), line_number)?);
                    }

                    let face_normal = flat_normal(
                        &positions[corners[0].0],
                        &positions[corners[1].0],
                        &positions[corners[2].0],
                    );

                    let base = mesh.positions.len() as u32;
                    for &(position, normal) in &corners {
                        mesh.positions.push(positions[position]);
                        mesh.normals.push(normal.map_or(face_normal, |n| normals[n]));
                    }

                    // Fan triangulation
                    for i in 1..(corners.len() as u32 - 1) {
                        current.extend_from_slice(&[base, base + i, base + i + 1]);
                    }
                }
                _ => {
                    // Ignore other commands
                }
            }
        }

        if named_group || !current.is_empty() {
            mesh.push_submesh(current);
        }

        if mesh.positions.is_empty() {
            return Err(ObjError::InvalidFormat("No faces found in OBJ data".to_string()));
        }

        Ok(mesh)
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> ObjError {
    ObjError::ParseError {
        line,
        message: message.into(),
    }
}

fn parse_vec3(parts: &[&str], line: usize, what: &str) -> Result<Vec3, ObjError> {
    if parts.len() < 4 {
        return Err(parse_error(line, format!("{what} needs three components")));
    }
    let mut components = [0.0f32; 3];
    for (component, text) in components.iter_mut().zip(&parts[1..4]) {
        *component = text
            .parse()
            .map_err(|_| parse_error(line, format!("invalid {what} component {text:?}")))?;
    }
    Ok(Vec3::new(components[0], components[1], components[2]))
}

/// Resolve a 1-based or negative (relative) OBJ reference
fn resolve_index(text: &str, count: usize, line: usize) -> Result<usize, ObjError> {
    let value: i64 = text
        .parse()
        .map_err(|_| parse_error(line, format!("invalid index {text:?}")))?;
    let resolved = match value {
        0 => None,
        v if v > 0 => usize::try_from(v - 1).ok(),
        v => usize::try_from(count as i64 + v).ok(),
    };
    resolved
        .filter(|&index| index < count)
        .ok_or_else(|| ObjError::InvalidFormat(format!("line {line}: index {value} out of bounds")))
}

/// `v`, `v/vt`, `v//vn` or `v/vt/vn`
fn parse_corner(
    corner: &str,
    position_count: usize,
    normal_count: usize,
    line: usize,
) -> Result<(usize, Option<usize>), ObjError> {
    let mut fields = corner.split('/');
    let position = resolve_index(fields.next().unwrap_or_default(), position_count, line)?;
    let normal = match fields.nth(1) {
        Some(text) if !text.is_empty() => Some(resolve_index(text, normal_count, line)?),
        _ => None,
    };
    Ok((position, normal))
}

fn flat_normal(a: &Vec3, b: &Vec3, c: &Vec3) -> Vec3 {
    let normal = (b - a).cross(&(c - a));
    let length = normal.norm();
    if length > f32::EPSILON {
        normal / length
    } else {
        Vec3::y()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    const QUAD_WITH_GROUPS: &str = "\
# two submeshes
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
usemtl Front
f 1//1 2//1 3//1 4//1
usemtl Back
f 3 2 1
";

    #[test]
    fn test_parse_fans_and_splits_submeshes() {
        let mesh = ObjLoader::parse(Cursor::new(QUAD_WITH_GROUPS), "quad").expect("parse");
        assert_eq!(mesh.name, "quad");
        assert_eq!(mesh.submesh_count(), 2);
        assert_eq!(mesh.submesh(0), Some(&[0, 1, 2, 0, 2, 3][..]));
        assert_eq!(mesh.submesh(1), Some(&[4, 5, 6][..]));
        assert_eq!(mesh.vertex_count(), 7);
    }

    #[test]
    fn test_missing_normals_use_face_normal() {
        let mesh = ObjLoader::parse(Cursor::new(QUAD_WITH_GROUPS), "quad").expect("parse");
        assert_relative_eq!(mesh.normals[0], Vec3::z());
        assert_relative_eq!(mesh.normals[4], -Vec3::z(), epsilon = 1e-6);
    }

    #[test]
    fn test_negative_indices() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = ObjLoader::parse(Cursor::new(text), "tri").expect("parse");
        assert_relative_eq!(mesh.positions[2], Vec3::y());
    }

    #[test]
    fn test_empty_groups_are_kept() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
g first
usemtl Stone
f 1 2 3
g second
usemtl Stone
g third
usemtl Stone
f 3 2 1
";
        let mesh = ObjLoader::parse(Cursor::new(text), "groups").expect("parse");
        assert_eq!(mesh.submesh_count(), 3);
        assert_eq!(mesh.submesh(1), Some(&[][..]));
        assert_eq!(mesh.submesh(2), Some(&[3, 4, 5][..]));
    }

    #[test]
    fn test_errors() {
        let bad_number = ObjLoader::parse(Cursor::new("v 0 zero 0\n"), "bad");
        assert!(matches!(bad_number, Err(ObjError::ParseError { line: 1, .. })));

        let out_of_bounds = ObjLoader::parse(Cursor::new("v 0 0 0\nf 1 2 3\n"), "bad");
        assert!(matches!(out_of_bounds, Err(ObjError::InvalidFormat(_))));

        let empty = ObjLoader::parse(Cursor::new("# nothing\n"), "empty");
        assert!(matches!(empty, Err(ObjError::InvalidFormat(_))));
    }
}
