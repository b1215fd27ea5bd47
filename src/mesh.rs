use std::ops::Range;

/// Floats per interleaved vertex: `position.xyz`, `normal.xyz`, `uv`.
pub const FLOATS_PER_VERTEX: usize = 8;

/// Byte stride of one interleaved vertex.
pub const VERTEX_STRIDE: u64 = (FLOATS_PER_VERTEX * std::mem::size_of::<f32>()) as u64;

/// Logical sub-object stored in the shared vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshPart {
    Bottle,
    Plane,
}

/// Static scene geometry: one triangle list holding every sub-object.
///
/// The buffer is never indexed; each group of three vertices is an
/// independent triangle, so shared edges repeat their vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    vertices: Vec<f32>,
    bottle: Range<u32>,
    plane: Range<u32>,
}

impl MeshData {
    /// Concatenates the bottle and the ground plane into a single buffer,
    /// recording the vertex range each one occupies.
    pub fn lotion_scene() -> Self {
        let mut vertices = Vec::with_capacity(BOTTLE_VERTICES.len() + PLANE_VERTICES.len());
        vertices.extend_from_slice(BOTTLE_VERTICES);
        let bottle = 0..vertex_count(&vertices);
        vertices.extend_from_slice(PLANE_VERTICES);
        let plane = bottle.end..vertex_count(&vertices);
        Self {
            vertices,
            bottle,
            plane,
        }
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> u32 {
        vertex_count(&self.vertices)
    }

    /// Vertex range to hand to a non-indexed draw for `part`.
    pub fn range(&self, part: MeshPart) -> Range<u32> {
        match part {
            MeshPart::Bottle => self.bottle.clone(),
            MeshPart::Plane => self.plane.clone(),
        }
    }
}

fn vertex_count(vertices: &[f32]) -> u32 {
    (vertices.len() / FLOATS_PER_VERTEX) as u32
}

/// Lotion bottle: a triangular prism body with a faceted cylindrical cap.
#[rustfmt::skip]
pub const BOTTLE_VERTICES: &[f32] = &[
    // position           normal             uv
    // prism body
    0.35, 1.0, -0.2, -1.0, 0.0, 0.0, 1.0, 0.0,
    0.45, 0.2, -0.25, -1.0, 0.0, 0.0, 1.0, 1.0,
    0.45, 0.2, -0.15, -1.0, 0.0, 0.0, 0.0, 1.0,
    0.75, 0.2, -0.25, 1.0, 0.0, 0.0, 1.0, 0.0,
    0.85, 1.0, -0.2, 1.0, 0.0, 0.0, 1.0, 1.0,
    0.75, 0.2, -0.15, 1.0, 0.0, 0.0, 0.0, 1.0,
    0.85, 1.0, -0.2, 0.0, 0.0, -1.0, 1.0, 0.0,
    0.35, 1.0, -0.2, 0.0, 0.0, -1.0, 1.0, 1.0,
    0.75, 0.2, -0.25, 0.0, 0.0, -1.0, 0.0, 1.0,
    0.35, 1.0, -0.2, 0.0, 0.0, -1.0, 1.0, 0.0,
    0.45, 0.2, -0.25, 0.0, 0.0, -1.0, 1.0, 1.0,
    0.75, 0.2, -0.25, 0.0, 0.0, -1.0, 0.0, 1.0,
    0.85, 1.0, -0.2, 0.0, 0.0, 1.0, 1.0, 0.0,
    0.35, 1.0, -0.2, 0.0, 0.0, 1.0, 1.0, 1.0,
    0.45, 0.2, -0.15, 0.0, 0.0, 1.0, 0.0, 1.0,
    0.85, 1.0, -0.2, 0.0, 0.0, 1.0, 1.0, 0.0,
    0.45, 0.2, -0.15, 0.0, 0.0, 1.0, 1.0, 1.0,
    0.75, 0.2, -0.15, 0.0, 0.0, 1.0, 0.0, 1.0,
    0.75, 0.2, -0.25, -1.0, 0.0, 0.0, 1.0, 0.0,
    0.45, 0.2, -0.25, -1.0, 0.0, 0.0, 1.0, 1.0,
    0.45, 0.2, -0.15, -1.0, 0.0, 0.0, 0.0, 1.0,
    0.75, 0.2, -0.25, 1.0, 0.0, 0.0, 1.0, 0.0,
    0.45, 0.2, -0.15, 1.0, 0.0, 0.0, 1.0, 1.0,
    0.75, 0.2, -0.15, 1.0, 0.0, 0.0, 0.0, 1.0,
    // cap, bottom disc
    0.6, 0.01, -0.2, -1.0, 0.0, 0.0, 1.0, 0.0,
    0.45, 0.01, -0.25, -1.0, 0.0, 0.0, 1.0, 1.0,
    0.43, 0.01, -0.2, -1.0, 0.0, 0.0, 0.0, 1.0,
    0.6, 0.01, -0.2, 1.0, 0.0, 0.0, 1.0, 0.0,
    0.6, 0.01, -0.26, 1.0, 0.0, 0.0, 1.0, 1.0,
    0.45, 0.01, -0.25, 1.0, 0.0, 0.0, 0.0, 1.0,
    0.6, 0.01, -0.2, 0.0, 0.0, -1.0, 1.0, 0.0,
    0.75, 0.01, -0.25, 0.0, 0.0, -1.0, 1.0, 1.0,
    0.6, 0.01, -0.26, 0.0, 0.0, -1.0, 0.0, 1.0,
    0.6, 0.01, -0.2, 0.0, 0.0, 1.0, 1.0, 0.0,
    0.77, 0.01, -0.2, 0.0, 0.0, 1.0, 1.0, 1.0,
    0.75, 0.01, -0.25, 0.0, 0.0, 1.0, 0.0, 1.0,
    0.6, 0.01, -0.2, 0.0, -1.0, 0.0, 1.0, 0.0,
    0.75, 0.01, -0.15, 0.0, -1.0, 0.0, 1.0, 1.0,
    0.77, 0.01, -0.2, 0.0, -1.0, 0.0, 0.0, 1.0,
    0.6, 0.01, -0.2, 0.0, 1.0, 0.0, 1.0, 0.0,
    0.6, 0.01, -0.14, 0.0, 1.0, 0.0, 1.0, 1.0,
    0.75, 0.01, -0.15, 0.0, 1.0, 0.0, 0.0, 1.0,
    0.6, 0.01, -0.2, 1.0, 0.0, 0.0, 1.0, 0.0,
    0.45, 0.01, -0.15, 1.0, 0.0, 0.0, 1.0, 1.0,
    0.6, 0.01, -0.14, 1.0, 0.0, 0.0, 1.0, 0.0,
    0.6, 0.01, -0.2, -1.0, 0.0, 0.0, 1.0, 0.0,
    0.43, 0.01, -0.2, -1.0, 0.0, 0.0, 1.0, 1.0,
    0.45, 0.01, -0.15, -1.0, 0.0, 0.0, 0.0, 1.0,
    // cap, side walls
    0.6, 0.01, -0.14, 0.0, 0.0, -1.0, 1.0, 0.0,
    0.6, 0.2, -0.14, 0.0, 0.0, -1.0, 1.0, 1.0,
    0.45, 0.01, -0.15, 0.0, 0.0, -1.0, 0.0, 1.0,
    0.6, 0.2, -0.14, 0.0, 0.0, -1.0, 1.0, 0.0,
    0.45, 0.2, -0.15, 0.0, 0.0, -1.0, 1.0, 1.0,
    0.45, 0.01, -0.15, 0.0, 0.0, -1.0, 0.0, 1.0,
    0.75, 0.01, -0.15, 0.0, 0.0, 1.0, 1.0, 0.0,
    0.75, 0.2, -0.15, 0.0, 0.0, 1.0, 1.0, 1.0,
    0.6, 0.01, -0.14, 0.0, 0.0, 1.0, 0.0, 1.0,
    0.75, 0.2, -0.15, 0.0, 0.0, 1.0, 1.0, 0.0,
    0.6, 0.2, -0.14, 0.0, 0.0, 1.0, 1.0, 1.0,
    0.6, 0.01, -0.14, 0.0, 0.0, 1.0, 0.0, 1.0,
    0.45, 0.01, -0.15, -1.0, 0.0, 0.0, 1.0, 0.0,
    0.45, 0.2, -0.15, -1.0, 0.0, 0.0, 1.0, 1.0,
    0.43, 0.01, -0.2, -1.0, 0.0, 0.0, 0.0, 1.0,
    0.45, 0.2, -0.15, -1.0, 0.0, 0.0, 1.0, 0.0,
    0.43, 0.2, -0.2, -1.0, 0.0, 0.0, 1.0, 1.0,
    0.43, 0.01, -0.2, -1.0, 0.0, 0.0, 0.0, 1.0,
    0.77, 0.01, -0.2, 1.0, 0.0, 0.0, 1.0, 0.0,
    0.77, 0.2, -0.2, 1.0, 0.0, 0.0, 1.0, 1.0,
    0.75, 0.01, -0.15, 1.0, 0.0, 0.0, 0.0, 1.0,
    0.77, 0.2, -0.2, 1.0, 0.0, 0.0, 1.0, 0.0,
    0.75, 0.2, -0.15, 1.0, 0.0, 0.0, 1.0, 1.0,
    0.75, 0.01, -0.15, 1.0, 0.0, 0.0, 0.0, 1.0,
    0.75, 0.01, -0.25, 0.0, -1.0, 0.0, 1.0, 0.0,
    0.75, 0.2, -0.25, 0.0, -1.0, 0.0, 1.0, 1.0,
    0.6, 0.01, -0.26, 0.0, -1.0, 0.0, 0.0, 1.0,
    0.75, 0.2, -0.25, 0.0, -1.0, 0.0, 1.0, 0.0,
    0.6, 0.2, -0.26, 0.0, -1.0, 0.0, 1.0, 1.0,
    0.6, 0.01, -0.26, 0.0, -1.0, 0.0, 0.0, 1.0,
    0.6, 0.01, -0.26, 0.0, 1.0, 0.0, 1.0, 0.0,
    0.6, 0.2, -0.26, 0.0, 1.0, 0.0, 1.0, 1.0,
    0.45, 0.01, -0.25, 0.0, 1.0, 0.0, 0.0, 1.0,
    0.6, 0.2, -0.26, 0.0, 1.0, 0.0, 1.0, 0.0,
    0.45, 0.2, -0.25, 0.0, 1.0, 0.0, 1.0, 1.0,
    0.45, 0.01, -0.25, 0.0, 1.0, 0.0, 0.0, 1.0,
    0.45, 0.01, -0.25, -1.0, 0.0, 0.0, 1.0, 0.0,
    0.45, 0.2, -0.25, -1.0, 0.0, 0.0, 1.0, 1.0,
    0.43, 0.01, -0.2, -1.0, 0.0, 0.0, 0.0, 1.0,
    0.45, 0.2, -0.25, -1.0, 0.0, 0.0, 1.0, 0.0,
    0.43, 0.2, -0.2, -1.0, 0.0, 0.0, 1.0, 1.0,
    0.43, 0.01, -0.2, -1.0, 0.0, 0.0, 0.0, 1.0,
    0.77, 0.01, -0.2, 1.0, 0.0, 0.0, 1.0, 0.0,
    0.77, 0.2, -0.2, 1.0, 0.0, 0.0, 1.0, 1.0,
    0.75, 0.01, -0.25, 1.0, 0.0, 0.0, 0.0, 1.0,
    0.77, 0.2, -0.2, 1.0, 0.0, 0.0, 1.0, 0.0,
    0.75, 0.2, -0.25, 1.0, 0.0, 0.0, 1.0, 1.0,
    0.75, 0.01, -0.25, 1.0, 0.0, 0.0, 0.0, 1.0,
    // cap, top disc
    0.6, 0.2, -0.2, 0.0, 0.0, -1.0, 1.0, 0.0,
    0.45, 0.2, -0.25, 0.0, 0.0, -1.0, 1.0, 1.0,
    0.43, 0.2, -0.2, 0.0, 0.0, -1.0, 0.0, 1.0,
    0.6, 0.2, -0.2, 0.0, 0.0, 1.0, 1.0, 0.0,
    0.6, 0.2, -0.26, 0.0, 0.0, 1.0, 1.0, 1.0,
    0.45, 0.2, -0.25, 0.0, 0.0, 1.0, 0.0, 1.0,
    0.6, 0.2, -0.2, -1.0, 0.0, 0.0, 1.0, 0.0,
    0.75, 0.2, -0.25, -1.0, 0.0, 0.0, 1.0, 1.0,
    0.6, 0.2, -0.26, -1.0, 0.0, 0.0, 0.0, 1.0,
    0.6, 0.2, -0.2, 1.0, 0.0, 0.0, 1.0, 0.0,
    0.77, 0.2, -0.2, 1.0, 0.0, 0.0, 1.0, 1.0,
    0.75, 0.2, -0.25, 1.0, 0.0, 0.0, 0.0, 1.0,
    0.6, 0.2, -0.2, 0.0, -1.0, 0.0, 1.0, 0.0,
    0.75, 0.2, -0.15, 0.0, -1.0, 0.0, 1.0, 1.0,
    0.77, 0.2, -0.2, 0.0, -1.0, 0.0, 0.0, 1.0,
    0.6, 0.2, -0.2, 0.0, 1.0, 0.0, 1.0, 0.0,
    0.6, 0.2, -0.14, 0.0, 1.0, 0.0, 1.0, 1.0,
    0.75, 0.2, -0.15, 0.0, 1.0, 0.0, 0.0, 1.0,
    0.6, 0.2, -0.2, 0.0, 0.0, 1.0, 1.0, 0.0,
    0.45, 0.2, -0.15, 0.0, 0.0, 1.0, 1.0, 1.0,
    0.6, 0.2, -0.14, 0.0, 0.0, 1.0, 0.0, 1.0,
    0.6, 0.2, -0.2, 0.0, 0.0, -1.0, 1.0, 0.0,
    0.43, 0.2, -0.2, 0.0, 0.0, -1.0, 1.0, 1.0,
    0.45, 0.2, -0.15, 0.0, 0.0, -1.0, 0.0, 1.0,
];

/// Ground plane: two triangles spanning [-2, 2] on the XZ plane.
#[rustfmt::skip]
pub const PLANE_VERTICES: &[f32] = &[
    -2.0, 0.0, 2.0, 0.0, 0.0, -1.0, 1.0, 0.0,
    -2.0, 0.0, -2.0, 0.0, 0.0, -1.0, 1.0, 1.0,
    2.0, 0.0, -2.0, 0.0, 0.0, -1.0, 0.0, 1.0,
    -2.0, 0.0, 2.0, 0.0, 0.0, 1.0, 1.0, 0.0,
    2.0, 0.0, -2.0, 0.0, 0.0, 1.0, 1.0, 1.0,
    2.0, 0.0, 2.0, 0.0, 0.0, 1.0, 0.0, 1.0,
];

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;

    #[test]
    fn buffers_hold_whole_vertices_and_triangles() {
        assert_eq!(BOTTLE_VERTICES.len() % FLOATS_PER_VERTEX, 0);
        assert_eq!(PLANE_VERTICES.len() % FLOATS_PER_VERTEX, 0);
        let mesh = MeshData::lotion_scene();
        assert_eq!(mesh.vertex_count(), 126);
        assert_eq!(mesh.vertex_count() % 3, 0);
    }

    #[test]
    fn ranges_cover_the_buffer_without_overlap() {
        let mesh = MeshData::lotion_scene();
        let bottle = mesh.range(MeshPart::Bottle);
        let plane = mesh.range(MeshPart::Plane);
        assert_eq!(bottle, 0..120);
        assert_eq!(plane, 120..126);
        assert_eq!(bottle.end, plane.start);
        assert_eq!(plane.end, mesh.vertex_count());
    }

    #[test]
    fn normals_are_unit_length_and_uvs_nominal() {
        let mesh = MeshData::lotion_scene();
        for chunk in mesh.vertices().chunks_exact(FLOATS_PER_VERTEX) {
            let normal = Vec3::from_slice(&chunk[3..6]);
            assert!((normal.length() - 1.0).abs() < 1e-5);
            let uv = Vec2::from_slice(&chunk[6..8]);
            assert!(uv.cmpge(Vec2::ZERO).all() && uv.cmple(Vec2::ONE).all());
        }
    }

    #[test]
    fn plane_lies_flat_on_the_ground() {
        let mesh = MeshData::lotion_scene();
        let start = mesh.range(MeshPart::Plane).start as usize * FLOATS_PER_VERTEX;
        for chunk in mesh.vertices()[start..].chunks_exact(FLOATS_PER_VERTEX) {
            assert_eq!(chunk[1], 0.0);
            assert_eq!(chunk[0].abs(), 2.0);
            assert_eq!(chunk[2].abs(), 2.0);
        }
    }
}
