/// Camera setup: cached view and projection matrices
use crate::config::CameraConfig;
use crate::error::{PipelineError, Result};
use crate::math::{self, Mat4, Vec3};

/// Camera configuration plus the matrices derived from it.
///
/// The view matrix is computed once in [`Camera::new`] and never changes.
/// The projection matrix is only recomputed when the aspect ratio changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    aspect: f32,
    view: Mat4,
    projection: Mat4,
}

impl Camera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Result<Self> {
        let eye = Vec3::from(config.eye);
        let center = Vec3::from(config.center);
        let up = Vec3::from(config.up);
        let fov_y = config.fov_degrees.to_radians();

        let view = math::look_at(&eye, &center, &up)?;
        let projection = math::perspective(fov_y, aspect, config.near, config.far)?;

        Ok(Self {
            eye,
            center,
            up,
            fov_y,
            near: config.near,
            far: config.far,
            aspect,
            view,
            projection,
        })
    }

    /// Create a camera whose aspect ratio matches a viewport in pixels
    pub fn from_viewport(config: &CameraConfig, width: u32, height: u32) -> Result<Self> {
        Self::new(config, aspect_ratio(width, height)?)
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Recompute the projection for a new aspect ratio.
    ///
    /// On error the previous projection stays in place.
    pub fn set_aspect(&mut self, aspect: f32) -> Result<()> {
        self.projection = math::perspective(self.fov_y, aspect, self.near, self.far)?;
        self.aspect = aspect;
        Ok(())
    }

    /// React to a viewport size change. Returns whether the projection changed.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool> {
        let aspect = aspect_ratio(width, height)?;
        if aspect == self.aspect {
            return Ok(false);
        }
        self.set_aspect(aspect)?;
        log::debug!(
            "projection recomputed for {}x{} (aspect {:.3})",
            width,
            height,
            aspect
        );
        Ok(true)
    }
}

fn aspect_ratio(width: u32, height: u32) -> Result<f32> {
    if width == 0 || height == 0 {
        return Err(PipelineError::config(format!(
            "viewport {}x{} has no area",
            width, height
        )));
    }
    Ok(width as f32 / height as f32)
}
