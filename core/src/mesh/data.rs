//! De-indexed triangle mesh data.

/// A triangle mesh expanded into flat per-vertex arrays.
///
/// The loader de-indexes the source geometry: every three consecutive
/// positions form one triangle, in face order. Positions and UVs are kept
/// in separate arrays because they are uploaded as separate GPU buffers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuMesh {
    /// Flat `x y z` positions, three floats per vertex.
    pub positions: Vec<f32>,
    /// Flat `u v` coordinates, two floats per vertex. The `v` axis is
    /// already flipped (`v' = 1 - v`) at parse time.
    pub uvs: Vec<f32>,
    /// Flat `x y z` normals, three floats per vertex.
    pub normals: Vec<f32>,
    /// Material library referenced by an `mtllib` line, if any.
    pub material_lib: Option<String>,
    /// Number of face records skipped because they could not be parsed.
    pub skipped_faces: usize,
}

impl CpuMesh {
    /// Number of vertices (three per triangle).
    pub fn vertex_count(&self) -> u32 {
        (self.positions.len() / 3) as u32
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> u32 {
        self.vertex_count() / 3
    }

    /// True when no face produced any geometry.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_count_counts_triples() {
        let mesh = CpuMesh {
            positions: vec![0.0; 9],
            ..CpuMesh::default()
        };
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(!mesh.is_empty());
    }
}
