/// CPU-side mesh data in the flat layout vertex buffers are uploaded from
use crate::error::{PipelineError, Result};
use crate::math::Vec3;

/// Indexed triangle mesh with per-vertex attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// 3 floats per vertex
    pub positions: Vec<f32>,
    /// 3 floats per vertex
    pub normals: Vec<f32>,
    /// 2 floats per vertex
    pub tex_coords: Vec<f32>,
    /// 3 indices per triangle
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices * 3),
            normals: Vec::with_capacity(vertices * 3),
            tex_coords: Vec::with_capacity(vertices * 2),
            indices: Vec::with_capacity(indices),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append a vertex and return its index
    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: [f32; 2]) -> u32 {
        let index = self.vertex_count() as u32;
        self.positions.extend_from_slice(position.as_slice());
        self.normals.extend_from_slice(normal.as_slice());
        self.tex_coords.extend_from_slice(&uv);
        index
    }

    /// Append an unshared triangle with a flat normal
    pub fn push_flat_triangle(&mut self, corners: [Vec3; 3], normal: Vec3) {
        let uvs = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        for (corner, uv) in corners.iter().zip(uvs) {
            let i = self.push_vertex(*corner, normal, uv);
            self.indices.push(i);
        }
    }

    pub fn position(&self, vertex: usize) -> Vec3 {
        Vec3::from_column_slice(&self.positions[vertex * 3..vertex * 3 + 3])
    }

    pub fn normal(&self, vertex: usize) -> Vec3 {
        Vec3::from_column_slice(&self.normals[vertex * 3..vertex * 3 + 3])
    }

    pub fn tex_coord(&self, vertex: usize) -> [f32; 2] {
        [self.tex_coords[vertex * 2], self.tex_coords[vertex * 2 + 1]]
    }

    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
    }

    /// Verify attribute lengths agree and every index is in range.
    ///
    /// Backends call this before upload so a bad asset fails setup instead
    /// of faulting mid-frame.
    pub fn check(&self) -> Result<()> {
        if self.positions.len() % 3 != 0 {
            return Err(PipelineError::ResourceUnavailable(format!(
                "position buffer length {} is not a multiple of 3",
                self.positions.len()
            )));
        }
        let vertices = self.vertex_count();
        if self.normals.len() != vertices * 3 {
            return Err(PipelineError::ResourceUnavailable(format!(
                "{} normals for {} vertices",
                self.normals.len() / 3,
                vertices
            )));
        }
        if self.tex_coords.len() != vertices * 2 {
            return Err(PipelineError::ResourceUnavailable(format!(
                "{} texture coordinates for {} vertices",
                self.tex_coords.len() / 2,
                vertices
            )));
        }
        if self.indices.len() % 3 != 0 {
            return Err(PipelineError::ResourceUnavailable(format!(
                "index count {} is not a whole number of triangles",
                self.indices.len()
            )));
        }
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= vertices) {
            return Err(PipelineError::ResourceUnavailable(format!(
                "index {} out of range for {} vertices",
                bad, vertices
            )));
        }
        Ok(())
    }

    /// Axis-aligned cube centred on the origin, four vertices per face so
    /// every face carries its own normal and a full 0..1 texture square.
    /// Triangles wind counter-clockwise seen from outside.
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        // (normal, u, v) with u x v == normal
        let faces = [
            (Vec3::x(), -Vec3::z(), Vec3::y()),
            (-Vec3::x(), Vec3::z(), Vec3::y()),
            (Vec3::y(), Vec3::x(), -Vec3::z()),
            (-Vec3::y(), Vec3::x(), Vec3::z()),
            (Vec3::z(), Vec3::x(), Vec3::y()),
            (-Vec3::z(), -Vec3::x(), Vec3::y()),
        ];

        let mut mesh = Self::with_capacity(24, 36);
        for (normal, u, v) in faces {
            let corners = [
                (-u - v, [0.0, 0.0]),
                (u - v, [1.0, 0.0]),
                (u + v, [1.0, 1.0]),
                (-u + v, [0.0, 1.0]),
            ];
            let base = mesh.vertex_count() as u32;
            for (offset, uv) in corners {
                mesh.push_vertex((normal + offset) * half, normal, uv);
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }
}
