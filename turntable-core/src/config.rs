/// Scene configuration, loadable from JSON
///
/// Every field has a default, so a config file only needs to mention what
/// it changes. The defaults reproduce the spinning car scene.
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::error::{PipelineError, Result};
use crate::lighting::Lighting;
use crate::material::{MaterialTable, Rgba};
use crate::math::{self, Vec3, EPSILON};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub center: [f32; 3],
    pub up: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [0.0, 0.0, -8.0],
            center: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Seconds per full revolution; negative reverses the direction
    pub period_seconds: f64,
    /// Rotation axis in model space, need not be normalized
    pub axis: [f32; 3],
    /// Applied after the rotation
    pub translation: Option<[f32; 3]>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            period_seconds: 6.0,
            axis: [0.0, 1.0, 0.0],
            translation: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winding {
    CounterClockwise,
    Clockwise,
}

/// Fixed-function state applied once at setup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineState {
    pub depth_test: bool,
    pub cull_back_faces: bool,
    pub front_face: Winding,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            depth_test: true,
            cull_back_faces: true,
            front_face: Winding::CounterClockwise,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub animation: AnimationConfig,
    pub lighting: Lighting,
    pub materials: MaterialTable,
    pub clear_color: Rgba,
    pub pipeline: PipelineState,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            animation: AnimationConfig::default(),
            lighting: Lighting::default(),
            materials: MaterialTable::default(),
            clear_color: Rgba::new(0.75, 0.85, 0.8, 1.0),
            pipeline: PipelineState::default(),
        }
    }
}

impl SceneConfig {
    /// Parse and validate a JSON scene description
    pub fn from_json(text: &str) -> Result<Self> {
        let config: SceneConfig = serde_json::from_str(text)
            .map_err(|e| PipelineError::config(format!("scene config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything that would otherwise only fail once the loop runs.
    pub fn validate(&self) -> Result<()> {
        clock::validate_period(self.animation.period_seconds)?;

        let axis = Vec3::from(self.animation.axis);
        if !math::all_finite(&axis) || axis.norm() < EPSILON {
            return Err(PipelineError::config("rotation axis must be a non-zero vector"));
        }
        if let Some(offset) = self.animation.translation {
            if !math::all_finite(&Vec3::from(offset)) {
                return Err(PipelineError::config("translation must be finite"));
            }
        }

        let sun = Vec3::from(self.lighting.sun_direction);
        if !math::all_finite(&sun) || sun.norm() < EPSILON {
            return Err(PipelineError::config("sun direction must be a non-zero vector"));
        }

        let cam = &self.camera;
        math::look_at(
            &Vec3::from(cam.eye),
            &Vec3::from(cam.center),
            &Vec3::from(cam.up),
        )?;
        // Aspect comes from the viewport later; any positive value checks the rest
        math::perspective(cam.fov_degrees.to_radians(), 1.0, cam.near, cam.far)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            SceneConfig::from_json(r#"{ "animation": { "period_seconds": 2.5 } }"#).unwrap();
        assert_eq!(config.animation.period_seconds, 2.5);
        assert_eq!(config.animation.axis, [0.0, 1.0, 0.0]);
        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(config.pipeline.front_face, Winding::CounterClockwise);
    }

    #[test]
    fn test_zero_period_is_rejected() {
        let err =
            SceneConfig::from_json(r#"{ "animation": { "period_seconds": 0 } }"#).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_zero_axis_is_rejected() {
        let mut config = SceneConfig::default();
        config.animation.axis = [0.0, 0.0, 0.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_sun_direction_is_rejected() {
        let err = SceneConfig::from_json(r#"{ "lighting": { "sun_direction": [0, 0, 0] } }"#)
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfiguration(_)));

        let mut config = SceneConfig::default();
        config.lighting.sun_direction = [f32::NAN, 1.0, 0.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_near_coincident_planes_are_accepted() {
        let config =
            SceneConfig::from_json(r#"{ "camera": { "near": 1.0, "far": 1.0000001 } }"#).unwrap();
        assert_eq!(config.camera.near, 1.0);
    }

    #[test]
    fn test_bad_frustum_is_rejected() {
        let mut config = SceneConfig::default();
        config.camera.near = 10.0;
        config.camera.far = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_a_config_error() {
        assert!(matches!(
            SceneConfig::from_json("{ camera: "),
            Err(PipelineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_winding_names() {
        let state: PipelineState =
            serde_json::from_str(r#"{ "front_face": "clockwise", "depth_test": false }"#).unwrap();
        assert_eq!(state.front_face, Winding::Clockwise);
        assert!(!state.depth_test);
        assert!(state.cull_back_faces);
    }
}
