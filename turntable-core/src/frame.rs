/// Frame updater: the per-tick state machine that drives a backend
///
/// ```text
/// Uninitialized --initialize--> Ready --tick--> Rendering --tick--> Rendering
///                                 \                 |
///                                  `---- stop / context lost ----> Stopped
/// ```
use crate::backend::{MatrixUniform, RenderBackend, ShaderSources};
use crate::camera::Camera;
use crate::clock::AnimationState;
use crate::config::{AnimationConfig, SceneConfig};
use crate::error::{PipelineError, Result};
use crate::material::Material;
use crate::math::{self, Mat4, Vec3};
use crate::mesh::MeshData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Uninitialized,
    Ready,
    Rendering,
    Stopped,
}

impl FrameState {
    pub fn name(&self) -> &'static str {
        match self {
            FrameState::Uninitialized => "uninitialized",
            FrameState::Ready => "ready",
            FrameState::Rendering => "rendering",
            FrameState::Stopped => "stopped",
        }
    }
}

/// What a single tick ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Every renderable was drawn
    Drawn { objects: usize },
    /// Something failed mid-frame; the rest of the frame was dropped
    Skipped,
    /// The loop is over and the host should stop scheduling ticks
    Stopped,
}

/// World matrix for a given angle: rotate about the configured axis, then
/// translate by the configured offset.
pub fn world_matrix(angle: f32, animation: &AnimationConfig) -> Mat4 {
    let base = match animation.translation {
        Some(offset) => math::translate(&math::identity(), &Vec3::from(offset)),
        None => math::identity(),
    };
    math::rotate_around_axis(&base, angle, &Vec3::from(animation.axis))
}

struct Renderable<M> {
    mesh: M,
    material: Material,
    /// Index into `FrameUpdater::textures`
    texture: Option<usize>,
}

/// Resources created by a successful `initialize`
struct Resources<B: RenderBackend> {
    camera: Camera,
    program: B::Program,
    renderables: Vec<Renderable<B::Mesh>>,
    textures: Vec<(String, B::Texture)>,
}

pub struct FrameUpdater<B: RenderBackend> {
    config: SceneConfig,
    state: FrameState,
    animation: AnimationState,
    world: Mat4,
    viewport: (u32, u32),
    frame_index: u64,
    resources: Option<Resources<B>>,
}

impl<B: RenderBackend> FrameUpdater<B> {
    /// Validate the scene config. Nothing touches the backend yet.
    pub fn new(config: SceneConfig) -> Result<Self> {
        config.validate()?;
        let animation = AnimationState::new(config.animation.period_seconds)?;
        Ok(Self {
            config,
            state: FrameState::Uninitialized,
            animation,
            world: math::identity(),
            viewport: (0, 0),
            frame_index: 0,
            resources: None,
        })
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.resources.as_ref().map(|r| &r.camera)
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    pub fn world(&self) -> &Mat4 {
        &self.world
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Number of ticks that reached the draw stage, drawn or skipped
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Set up camera, program, pipeline state and GPU meshes.
    ///
    /// `meshes[i]` gets the material the table maps to index `i`. On error
    /// the updater stays `Uninitialized` and the failure is logged.
    pub fn initialize(
        &mut self,
        backend: &mut B,
        shaders: &ShaderSources<'_>,
        meshes: &[MeshData],
        viewport: (u32, u32),
    ) -> Result<()> {
        if self.state != FrameState::Uninitialized {
            return Err(PipelineError::InvalidState {
                expected: FrameState::Uninitialized.name(),
                found: self.state.name(),
            });
        }

        match self.build_resources(backend, shaders, meshes, viewport) {
            Ok(resources) => {
                log::info!(
                    "frame updater ready: {} renderables, {} textures, viewport {}x{}",
                    resources.renderables.len(),
                    resources.textures.len(),
                    viewport.0,
                    viewport.1
                );
                self.resources = Some(resources);
                self.viewport = viewport;
                self.state = FrameState::Ready;
                Ok(())
            }
            Err(e) => {
                log::error!("setup failed, render loop will not start: {}", e);
                Err(e)
            }
        }
    }

    fn build_resources(
        &self,
        backend: &mut B,
        shaders: &ShaderSources<'_>,
        meshes: &[MeshData],
        (width, height): (u32, u32),
    ) -> Result<Resources<B>> {
        if backend.is_context_lost() {
            return Err(PipelineError::ResourceUnavailable(
                "graphics context is lost".to_string(),
            ));
        }

        let camera = Camera::from_viewport(&self.config.camera, width, height)?;
        let program = backend.build_program(shaders)?;

        backend.configure(&self.config.pipeline, self.config.clear_color);
        backend.set_viewport(width, height);

        let mut textures: Vec<(String, B::Texture)> = Vec::new();
        let mut renderables = Vec::with_capacity(meshes.len());
        for (index, data) in meshes.iter().enumerate() {
            let material = self.config.materials.lookup(index).clone();
            let mesh = backend.upload_mesh(data)?;

            let texture = match &material.texture {
                Some(name) => match textures.iter().position(|(n, _)| n == name) {
                    Some(slot) => Some(slot),
                    None => {
                        let texture = backend.load_texture(name)?;
                        textures.push((name.clone(), texture));
                        Some(textures.len() - 1)
                    }
                },
                None => None,
            };

            log::debug!(
                "mesh {}: {} triangles, texture {:?}",
                index,
                data.triangle_count(),
                material.texture
            );
            renderables.push(Renderable {
                mesh,
                material,
                texture,
            });
        }

        Ok(Resources {
            camera,
            program,
            renderables,
            textures,
        })
    }

    /// Render one frame for host time `now_seconds`.
    ///
    /// A failed draw drops the rest of this frame and is logged; the next
    /// tick starts over. A lost context moves the updater to `Stopped`, and
    /// so does a fatal error out of a draw call, which is returned.
    pub fn tick(&mut self, backend: &mut B, now_seconds: f64) -> Result<FrameOutcome> {
        match self.state {
            FrameState::Stopped => return Ok(FrameOutcome::Stopped),
            FrameState::Uninitialized => {
                return Err(PipelineError::InvalidState {
                    expected: FrameState::Ready.name(),
                    found: self.state.name(),
                })
            }
            FrameState::Ready | FrameState::Rendering => {}
        }

        if backend.is_context_lost() {
            log::warn!("graphics context lost, stopping render loop");
            self.state = FrameState::Stopped;
            return Ok(FrameOutcome::Stopped);
        }

        let Some(resources) = self.resources.as_ref() else {
            return Err(PipelineError::InvalidState {
                expected: FrameState::Ready.name(),
                found: FrameState::Uninitialized.name(),
            });
        };

        let frame = self.frame_index;
        self.frame_index += 1;

        self.animation = match self.animation.advance(now_seconds) {
            Ok(next) => next,
            Err(e) => {
                log::warn!("frame {} dropped: {}", frame, e);
                return Ok(FrameOutcome::Skipped);
            }
        };

        if self.state == FrameState::Ready {
            log::debug!("first frame, entering render loop");
            self.state = FrameState::Rendering;
        }

        self.world = world_matrix(self.animation.angle(), &self.config.animation);

        let program = &resources.program;
        backend.use_program(program);
        backend.set_matrix(program, MatrixUniform::World, &math::to_column_major(&self.world));
        backend.set_matrix(
            program,
            MatrixUniform::View,
            &math::to_column_major(resources.camera.view()),
        );
        backend.set_matrix(
            program,
            MatrixUniform::Projection,
            &math::to_column_major(resources.camera.projection()),
        );
        backend.set_lighting(program, &self.config.lighting);
        backend.clear();

        for renderable in &resources.renderables {
            let texture = renderable.texture.map(|slot| &resources.textures[slot].1);
            if let Err(e) = backend.draw(program, &renderable.mesh, &renderable.material, texture) {
                if e.is_fatal() {
                    log::error!("frame {}: {}, stopping render loop", frame, e);
                    self.state = FrameState::Stopped;
                    return Err(e);
                }
                log::warn!("frame {} dropped: {}", frame, e);
                return Ok(FrameOutcome::Skipped);
            }
        }

        Ok(FrameOutcome::Drawn {
            objects: resources.renderables.len(),
        })
    }

    /// Viewport size notification. When the size differs from the last one
    /// seen, recompute the projection and resize the backend viewport.
    pub fn resize(&mut self, backend: &mut B, width: u32, height: u32) -> Result<bool> {
        if (width, height) == self.viewport {
            return Ok(false);
        }

        if let Some(resources) = self.resources.as_mut() {
            resources.camera.resize(width, height)?;
            backend.set_viewport(width, height);
        }
        self.viewport = (width, height);
        Ok(true)
    }

    /// External cancellation. Resources stay with the backend.
    pub fn stop(&mut self) {
        if self.state != FrameState::Stopped {
            log::info!("render loop stopped after {} frames", self.frame_index);
            self.state = FrameState::Stopped;
        }
    }
}
