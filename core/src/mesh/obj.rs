//! Line-oriented OBJ subset parser.
//!
//! Recognized tags: `mtllib`, `v`, `vt`, `vn`, and triangle `f` records
//! of the form `f i/j/k i/j/k i/j/k` with 1-based indices. Anything else
//! is ignored. A face record that does not resolve to exactly nine
//! indices is reported through the log and skipped; the mesh loads with
//! whatever geometry parsed cleanly.

use std::path::Path;

use crate::error::AssetError;
use crate::math::{Vec2, Vec3};

use super::CpuMesh;

/// Load and parse an OBJ file from disk.
pub fn load_obj(path: &Path) -> Result<CpuMesh, AssetError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AssetError::io(path.display().to_string(), &e))?;
    Ok(parse_obj(&text, &path.display().to_string()))
}

/// Parse OBJ text. `source` names the input in diagnostics.
pub fn parse_obj(text: &str, source: &str) -> CpuMesh {
    let mut mesh = CpuMesh::default();

    let mut positions: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<Vec2> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut faces: Vec<[[u32; 3]; 3]> = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        let Some(tag) = tokens.next() else {
            continue;
        };
        match tag {
            "mtllib" => {
                mesh.material_lib = tokens.next().map(str::to_owned);
            }
            "v" => {
                if let Some(v) = parse_vec3(&mut tokens) {
                    positions.push(v);
                } else {
                    log::warn!("{source}:{}: malformed vertex line", line_no + 1);
                }
            }
            "vt" => {
                if let Some(uv) = parse_vec2(&mut tokens) {
                    // The image origin is top-left, OBJ's is bottom-left.
                    uvs.push(Vec2::new(uv.x, 1.0 - uv.y));
                } else {
                    log::warn!("{source}:{}: malformed texture coordinate line", line_no + 1);
                }
            }
            "vn" => {
                if let Some(n) = parse_vec3(&mut tokens) {
                    normals.push(n);
                } else {
                    log::warn!("{source}:{}: malformed normal line", line_no + 1);
                }
            }
            "f" => match parse_face(&mut tokens) {
                Some(face) => faces.push(face),
                None => {
                    log::warn!(
                        "{source}:{}: face record does not parse into 9 indices, skipping",
                        line_no + 1
                    );
                    mesh.skipped_faces += 1;
                }
            },
            _ => {}
        }
    }

    // De-index: emit flat per-vertex arrays in face order. Indices are
    // 1-based in the file.
    for face in &faces {
        let mut resolved = true;
        for corner in face {
            let [vi, ti, ni] = *corner;
            if vi == 0
                || ti == 0
                || ni == 0
                || vi as usize > positions.len()
                || ti as usize > uvs.len()
                || ni as usize > normals.len()
            {
                resolved = false;
                break;
            }
        }
        if !resolved {
            log::warn!("{source}: face references out-of-range indices, skipping");
            mesh.skipped_faces += 1;
            continue;
        }
        for corner in face {
            let [vi, ti, ni] = *corner;
            let p = positions[vi as usize - 1];
            let uv = uvs[ti as usize - 1];
            let n = normals[ni as usize - 1];
            mesh.positions.extend_from_slice(&[p.x, p.y, p.z]);
            mesh.uvs.extend_from_slice(&[uv.x, uv.y]);
            mesh.normals.extend_from_slice(&[n.x, n.y, n.z]);
        }
    }

    if mesh.skipped_faces > 0 {
        log::warn!(
            "{source}: loaded with {} skipped face(s), geometry is partial",
            mesh.skipped_faces
        );
    }

    mesh
}

fn parse_vec3<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Option<Vec3> {
    let x = tokens.next()?.parse().ok()?;
    let y = tokens.next()?.parse().ok()?;
    let z = tokens.next()?.parse().ok()?;
    Some(Vec3::new(x, y, z))
}

fn parse_vec2<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Option<Vec2> {
    let x = tokens.next()?.parse().ok()?;
    let y = tokens.next()?.parse().ok()?;
    Some(Vec2::new(x, y))
}

/// Parse three `v/vt/vn` corners into nine indices.
fn parse_face<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Option<[[u32; 3]; 3]> {
    let mut face = [[0u32; 3]; 3];
    for corner in &mut face {
        let triple = tokens.next()?;
        let mut parts = triple.split('/');
        for index in corner.iter_mut() {
            *index = parts.next()?.parse().ok()?;
        }
        if parts.next().is_some() {
            return None;
        }
    }
    // A fourth corner would make this a quad, which the parser does not
    // accept.
    if tokens.next().is_some() {
        return None;
    }
    Some(face)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const TRIANGLE: &str = "\
mtllib box.mtl
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
vn 0.0 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/2 3/3/3
";

    #[test]
    fn face_roundtrip_emits_vertices_in_order() {
        let mesh = parse_obj(TRIANGLE, "triangle.obj");
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.skipped_faces, 0);
        // 1-based indices resolve to vertex 1, 2, 3 in order.
        assert_eq!(&mesh.positions[0..3], &[0.0, 0.0, 0.0]);
        assert_eq!(&mesh.positions[3..6], &[1.0, 0.0, 0.0]);
        assert_eq!(&mesh.positions[6..9], &[0.0, 1.0, 0.0]);
        assert_eq!(mesh.material_lib.as_deref(), Some("box.mtl"));
    }

    #[test]
    fn uv_v_coordinate_is_flipped() {
        let mesh = parse_obj(
            "v 0 0 0\nv 0 0 0\nv 0 0 0\nvt 0.2 0.3\nvt 0 0\nvt 0 0\nvn 0 0 1\nvn 0 0 1\nvn 0 0 1\nf 1/1/1 2/2/2 3/3/3\n",
            "flip.obj",
        );
        assert!((mesh.uvs[0] - 0.2).abs() < 1e-6);
        assert!((mesh.uvs[1] - 0.7).abs() < 1e-6);
    }

    #[rstest]
    #[case::too_few_corners("f 1/1/1 2/2/2\n")]
    #[case::quad("f 1/1/1 2/2/2 3/3/3 1/1/1\n")]
    #[case::missing_component("f 1/1 2/2/2 3/3/3\n")]
    #[case::extra_component("f 1/1/1/1 2/2/2 3/3/3\n")]
    #[case::not_a_number("f a/1/1 2/2/2 3/3/3\n")]
    fn malformed_face_is_skipped_not_fatal(#[case] face_line: &str) {
        let mut text = String::from(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nvn 0 0 1\nvn 0 0 1\nvn 0 0 1\n",
        );
        text.push_str(face_line);
        text.push_str("f 1/1/1 2/2/2 3/3/3\n");

        let mesh = parse_obj(&text, "bad.obj");
        // The good face still loads; the bad one is counted.
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.skipped_faces, 1);
    }

    #[test]
    fn out_of_range_index_is_skipped() {
        let mesh = parse_obj(
            "v 0 0 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 1/1/1\n",
            "range.obj",
        );
        assert!(mesh.is_empty());
        assert_eq!(mesh.skipped_faces, 1);
    }

    #[test]
    fn unknown_tags_are_ignored() {
        let mesh = parse_obj("o box\ns off\nusemtl m\n", "tags.obj");
        assert!(mesh.is_empty());
        assert_eq!(mesh.skipped_faces, 0);
    }
}
