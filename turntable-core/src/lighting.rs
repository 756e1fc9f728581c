/// Ambient + directional (Lambertian) lighting parameters
use serde::{Deserialize, Serialize};

use crate::math::{Vec3, EPSILON};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lighting {
    pub ambient: [f32; 3],
    /// Direction pointing towards the light; normalized on use
    pub sun_direction: [f32; 3],
    pub sun_intensity: [f32; 3],
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: [0.2, 0.2, 0.2],
            sun_direction: [3.0, 4.0, -2.0],
            sun_intensity: [0.9, 0.9, 0.9],
        }
    }
}

impl Lighting {
    /// Unit vector towards the light, or zero when the direction is degenerate
    pub fn sun_unit(&self) -> Vec3 {
        let dir = Vec3::from(self.sun_direction);
        let len = dir.norm();
        if len < EPSILON || !len.is_finite() {
            Vec3::zeros()
        } else {
            dir / len
        }
    }

    /// Per-channel light arriving at a surface with the given world normal
    pub fn intensity(&self, normal: &Vec3) -> Vec3 {
        let n = normal.try_normalize(EPSILON).unwrap_or_else(Vec3::zeros);
        let diffuse = n.dot(&self.sun_unit()).max(0.0);
        Vec3::from(self.ambient) + Vec3::from(self.sun_intensity) * diffuse
    }

    /// Mean of the three channels of [`Lighting::intensity`]
    pub fn brightness(&self, normal: &Vec3) -> f32 {
        let i = self.intensity(normal);
        (i.x + i.y + i.z) / 3.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_the_sun_is_brightest() {
        let lighting = Lighting::default();
        let toward = lighting.sun_unit();
        let lit = lighting.brightness(&toward);
        assert!((lit - 1.1).abs() < 1e-5);
        assert!(lighting.brightness(&Vec3::new(1.0, 0.0, 0.0)) < lit);
    }

    #[test]
    fn test_back_faces_get_ambient_only() {
        let lighting = Lighting::default();
        let away = -lighting.sun_unit();
        assert!((lighting.brightness(&away) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_unnormalized_normal_is_normalized() {
        let lighting = Lighting::default();
        let n = Vec3::new(0.0, 10.0, 0.0);
        assert!((lighting.brightness(&n) - lighting.brightness(&Vec3::y())).abs() < 1e-6);
    }

    #[test]
    fn test_zero_sun_direction_is_ambient() {
        let lighting = Lighting {
            sun_direction: [0.0, 0.0, 0.0],
            ..Lighting::default()
        };
        assert!((lighting.brightness(&Vec3::y()) - 0.2).abs() < 1e-6);
    }
}
