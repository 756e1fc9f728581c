/// Turntable Core Library - frame transform pipeline
///
/// Matrix utilities, camera, animation clock and the frame updater that
/// drives any [`RenderBackend`], plus the mesh, model and scene config types
/// they work on.

pub mod backend;
pub mod camera;
pub mod clock;
pub mod config;
pub mod error;
pub mod frame;
pub mod lighting;
pub mod material;
pub mod math;
pub mod mesh;
pub mod model;
pub mod shaders;
pub mod stl;

// Re-export commonly used types
pub use backend::{MatrixUniform, RenderBackend, ShaderSources};
pub use camera::Camera;
pub use clock::AnimationState;
pub use config::SceneConfig;
pub use error::{PipelineError, Result};
pub use frame::{FrameOutcome, FrameState, FrameUpdater};
pub use lighting::Lighting;
pub use material::{Material, MaterialTable, Rgba};
pub use math::{Mat4, Vec3};
pub use mesh::MeshData;
