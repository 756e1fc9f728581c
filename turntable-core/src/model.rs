/// Loader for assimp-style JSON model files
///
/// Only the parts the renderer consumes are typed; the rest of the document
/// is accepted and ignored. Each entry of `meshes` becomes one `MeshData`,
/// in file order, so its position is the index the material table sees.
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::mesh::MeshData;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelFile {
    #[serde(default)]
    pub rootnode: Option<ModelNode>,
    #[serde(default)]
    pub meshes: Vec<ModelMesh>,
    #[serde(default)]
    pub materials: Vec<ModelMaterial>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub transformation: Vec<f32>,
    #[serde(default)]
    pub meshes: Vec<usize>,
    #[serde(default)]
    pub children: Vec<ModelNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelMesh {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub materialindex: usize,
    pub vertices: Vec<f32>,
    #[serde(default)]
    pub normals: Vec<f32>,
    /// One array per UV channel; only the first is used
    #[serde(default)]
    pub texturecoords: Vec<Vec<f32>>,
    pub faces: Vec<Vec<u32>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelMaterial {
    #[serde(default)]
    pub properties: Vec<serde_json::Value>,
}

impl ModelMesh {
    /// Flatten into buffer layout. Missing normals or UVs are zero-filled,
    /// faces with more than three corners are fanned into triangles and
    /// degenerate faces (points, lines) are dropped.
    pub fn to_mesh_data(&self) -> MeshData {
        let vertex_count = self.vertices.len() / 3;
        let mut mesh = MeshData::with_capacity(vertex_count, self.faces.len() * 3);

        mesh.positions.extend_from_slice(&self.vertices[..vertex_count * 3]);

        if self.normals.len() >= vertex_count * 3 {
            mesh.normals.extend_from_slice(&self.normals[..vertex_count * 3]);
        } else {
            mesh.normals.resize(vertex_count * 3, 0.0);
        }

        match self.texturecoords.first() {
            Some(uvs) if uvs.len() >= vertex_count * 2 => {
                mesh.tex_coords.extend_from_slice(&uvs[..vertex_count * 2]);
            }
            _ => mesh.tex_coords.resize(vertex_count * 2, 0.0),
        }

        for face in &self.faces {
            if face.len() < 3 {
                continue;
            }
            for i in 1..face.len() - 1 {
                mesh.indices
                    .extend_from_slice(&[face[0], face[i], face[i + 1]]);
            }
        }
        mesh
    }
}

impl ModelFile {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| PipelineError::ResourceUnavailable(format!("model file: {}", e)))
    }
}

/// Parse a model file into one `MeshData` per mesh entry
pub fn parse_model(text: &str) -> Result<Vec<MeshData>> {
    let model = ModelFile::from_json(text)?;
    let meshes: Vec<MeshData> = model.meshes.iter().map(ModelMesh::to_mesh_data).collect();
    log::info!(
        "loaded model: {} meshes, {} triangles",
        meshes.len(),
        meshes.iter().map(MeshData::triangle_count).sum::<usize>()
    );
    Ok(meshes)
}
