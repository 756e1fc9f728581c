/// The seam between the frame updater and a concrete graphics API
use crate::config::PipelineState;
use crate::error::Result;
use crate::lighting::Lighting;
use crate::material::{Material, Rgba};
use crate::mesh::MeshData;

/// Vertex + fragment source handed to [`RenderBackend::build_program`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSources<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
}

/// The three transform uniforms pushed every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixUniform {
    World,
    View,
    Projection,
}

impl MatrixUniform {
    /// Uniform name in the bundled shaders
    pub fn name(&self) -> &'static str {
        match self {
            MatrixUniform::World => "mWorld",
            MatrixUniform::View => "mView",
            MatrixUniform::Projection => "mProj",
        }
    }
}

/// A graphics backend the frame updater can drive.
///
/// Handles are opaque to the updater. Backends are expected to resolve
/// attribute and uniform locations once in `build_program` and keep them in
/// the `Program` handle, so `draw` only binds buffers.
pub trait RenderBackend {
    type Program;
    type Mesh;
    type Texture;

    /// True once the underlying context is gone and nothing can be drawn.
    fn is_context_lost(&self) -> bool;

    /// Compile and link a program. Fails with `CompileFailure` or
    /// `LinkFailure` carrying the backend's diagnostic text.
    fn build_program(&mut self, sources: &ShaderSources<'_>) -> Result<Self::Program>;

    /// Depth test, culling, winding and clear color.
    fn configure(&mut self, state: &PipelineState, clear_color: Rgba);

    fn set_viewport(&mut self, width: u32, height: u32);

    fn upload_mesh(&mut self, mesh: &MeshData) -> Result<Self::Mesh>;

    fn load_texture(&mut self, name: &str) -> Result<Self::Texture>;

    fn use_program(&mut self, program: &Self::Program);

    /// `value` is column-major.
    fn set_matrix(&mut self, program: &Self::Program, uniform: MatrixUniform, value: &[f32; 16]);

    fn set_lighting(&mut self, program: &Self::Program, lighting: &Lighting);

    /// Clear color and depth.
    fn clear(&mut self);

    /// Issue one indexed draw for `mesh` with a flat color or texture.
    fn draw(
        &mut self,
        program: &Self::Program,
        mesh: &Self::Mesh,
        material: &Material,
        texture: Option<&Self::Texture>,
    ) -> Result<()>;
}
