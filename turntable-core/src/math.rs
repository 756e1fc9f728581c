/// 4x4 matrix utilities for the view/projection/world pipeline
///
/// Every function here is pure. Matrices follow the OpenGL conventions:
/// column vectors, column-major storage, right-handed eye space looking
/// down -Z, clip-space depth in [-1, 1].
use nalgebra::{Matrix4, Point3, Unit, Vector3};

use crate::error::{PipelineError, Result};

pub type Vec3 = Vector3<f32>;
pub type Mat4 = Matrix4<f32>;

/// Below this length a vector is treated as zero.
pub const EPSILON: f32 = 1e-6;

pub fn identity() -> Mat4 {
    Mat4::identity()
}

/// Build a view matrix for a camera at `eye` looking at `center`.
///
/// Fails when the camera has no viewing direction (`eye == center`), when
/// `up` is zero or parallel to that direction, or when any input is not
/// finite. Never returns a matrix containing NaN.
pub fn look_at(eye: &Vec3, center: &Vec3, up: &Vec3) -> Result<Mat4> {
    if !all_finite(eye) || !all_finite(center) || !all_finite(up) {
        return Err(PipelineError::config("look_at inputs must be finite"));
    }

    let forward = center - eye;
    let distance = forward.norm();
    if distance < EPSILON {
        return Err(PipelineError::config("camera eye and center coincide"));
    }

    let up_len = up.norm();
    if up_len < EPSILON {
        return Err(PipelineError::config("camera up vector is zero"));
    }

    // Both unit length, so the cross norm is the sine of the angle between them
    let side = (forward / distance).cross(&(up / up_len));
    if side.norm() < EPSILON {
        return Err(PipelineError::config(
            "camera up vector is parallel to the viewing direction",
        ));
    }

    Ok(Mat4::look_at_rh(
        &Point3::from(*eye),
        &Point3::from(*center),
        up,
    ))
}

/// Build a perspective projection matrix.
///
/// `fov_y` is the vertical field of view in radians and must lie in (0, π).
/// Requires `0 < near < far` and `aspect > 0`.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Result<Mat4> {
    if !(fov_y.is_finite() && aspect.is_finite() && near.is_finite() && far.is_finite()) {
        return Err(PipelineError::config("projection parameters must be finite"));
    }
    if fov_y <= 0.0 || fov_y >= std::f32::consts::PI {
        return Err(PipelineError::config(format!(
            "field of view {} is outside (0, pi)",
            fov_y
        )));
    }
    if aspect <= 0.0 {
        return Err(PipelineError::config(format!(
            "aspect ratio {} must be positive",
            aspect
        )));
    }
    if near <= 0.0 {
        return Err(PipelineError::config(format!(
            "near plane {} must be positive",
            near
        )));
    }
    if far <= near {
        return Err(PipelineError::config(format!(
            "far plane {} must lie beyond near plane {}",
            far, near
        )));
    }

    // OpenGL clip space; built directly so nearly coincident planes or a
    // sliver aspect give an error instead of tripping nalgebra's asserts
    let f = 1.0 / (fov_y / 2.0).tan();
    let depth = near - far;
    #[rustfmt::skip]
    let m = Mat4::new(
        f / aspect, 0.0, 0.0, 0.0,
        0.0, f, 0.0, 0.0,
        0.0, 0.0, (far + near) / depth, 2.0 * far * near / depth,
        0.0, 0.0, -1.0, 0.0,
    );
    if m.iter().any(|v| !v.is_finite()) {
        return Err(PipelineError::config(format!(
            "frustum (aspect {}, near {}, far {}) is numerically degenerate",
            aspect, near, far
        )));
    }
    Ok(m)
}

/// Post-multiply a right-handed rotation about `axis` onto `base`.
///
/// The axis does not need to be normalized. A zero-length axis has no
/// direction to rotate about, so `base` is returned unchanged.
pub fn rotate_around_axis(base: &Mat4, angle: f32, axis: &Vec3) -> Mat4 {
    match Unit::try_new(*axis, EPSILON) {
        Some(axis) => base * Mat4::from_axis_angle(&axis, angle),
        None => *base,
    }
}

/// Post-multiply a translation by `offset` onto `base`.
pub fn translate(base: &Mat4, offset: &Vec3) -> Mat4 {
    base * Mat4::new_translation(offset)
}

/// Standard matrix product `a * b`. Applied to a column vector, `b` acts first.
pub fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
    a * b
}

/// Flatten a matrix into the column-major layout uniform uploads expect.
pub fn to_column_major(m: &Mat4) -> [f32; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(m.as_slice());
    out
}

pub(crate) fn all_finite(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn max_abs_diff(a: &Mat4, b: &Mat4) -> f32 {
        (a - b).iter().fold(0.0f32, |acc, v| acc.max(v.abs()))
    }

    #[test]
    fn test_identity_is_neutral() {
        let m = translate(&identity(), &Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(multiply(&identity(), &m), m);
        assert_eq!(multiply(&m, &identity()), m);
    }

    #[test]
    fn test_perspective_maps_near_and_far_planes() {
        let cases = [
            (FRAC_PI_4, 800.0 / 600.0, 0.1, 1000.0),
            (1.0, 1.0, 1.0, 10.0),
            (2.5, 0.5, 0.01, 0.02),
        ];
        for (fov, aspect, near, far) in cases {
            let proj = perspective(fov, aspect, near, far).unwrap();
            let at_near = proj.transform_point(&Point3::new(0.0, 0.0, -near));
            let at_far = proj.transform_point(&Point3::new(0.0, 0.0, -far));
            assert!((at_near.z + 1.0).abs() < 1e-4, "near -> {}", at_near.z);
            assert!((at_far.z - 1.0).abs() < 1e-4, "far -> {}", at_far.z);
        }
    }

    #[test]
    fn test_perspective_rejects_invalid_frustum() {
        assert!(perspective(FRAC_PI_4, 1.0, 0.0, 10.0).is_err());
        assert!(perspective(FRAC_PI_4, 1.0, -1.0, 10.0).is_err());
        assert!(perspective(FRAC_PI_4, 1.0, 5.0, 5.0).is_err());
        assert!(perspective(FRAC_PI_4, 1.0, 5.0, 1.0).is_err());
        assert!(perspective(FRAC_PI_4, 0.0, 0.1, 10.0).is_err());
        assert!(perspective(FRAC_PI_4, -1.5, 0.1, 10.0).is_err());
        assert!(perspective(0.0, 1.0, 0.1, 10.0).is_err());
        assert!(perspective(PI, 1.0, 0.1, 10.0).is_err());
        assert!(perspective(f32::NAN, 1.0, 0.1, 10.0).is_err());
    }

    #[test]
    fn test_perspective_with_close_planes_does_not_panic() {
        // Planes a few ulps apart are valid and must not hit nalgebra's asserts
        let m = perspective(0.8, 1.0, 1e-8, 5e-8).unwrap();
        assert!(m.iter().all(|v| v.is_finite()));
        let m = perspective(0.8, 1.0, 1.0, 1.000_000_1).unwrap();
        assert!(m.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_perspective_with_tiny_aspect() {
        let m = perspective(FRAC_PI_4, 1e-8, 0.1, 100.0).unwrap();
        assert!(m.iter().all(|v| v.is_finite()));
        assert!(matches!(
            perspective(FRAC_PI_4, 1e-45, 0.1, 100.0),
            Err(PipelineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_perspective_matches_nalgebra_for_ordinary_frustum() {
        let ours = perspective(FRAC_PI_4, 1.5, 0.1, 1000.0).unwrap();
        let theirs = Mat4::new_perspective(1.5, FRAC_PI_4, 0.1, 1000.0);
        assert!(max_abs_diff(&ours, &theirs) < 1e-4);
    }

    #[test]
    fn test_look_at_degenerate_eye_is_rejected() {
        let eye = Vec3::new(1.0, 2.0, 3.0);
        let result = look_at(&eye, &eye, &Vec3::y());
        assert!(matches!(
            result,
            Err(PipelineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_look_at_parallel_up_is_rejected() {
        let eye = Vec3::new(0.0, 5.0, 0.0);
        let center = Vec3::zeros();
        assert!(look_at(&eye, &center, &Vec3::y()).is_err());
        assert!(look_at(&eye, &center, &Vec3::new(0.0, -3.0, 0.0)).is_err());
        assert!(look_at(&eye, &center, &Vec3::zeros()).is_err());
    }

    #[test]
    fn test_look_at_moves_center_onto_negative_z() {
        let eye = Vec3::new(0.0, 0.0, -8.0);
        let view = look_at(&eye, &Vec3::zeros(), &Vec3::y()).unwrap();
        assert!(view.iter().all(|v| v.is_finite()));

        let center = view.transform_point(&Point3::origin());
        assert!(center.x.abs() < 1e-5);
        assert!(center.y.abs() < 1e-5);
        assert!((center.z + 8.0).abs() < 1e-5);

        // View matrix is the inverse of the camera placement
        let at_eye = view.transform_point(&Point3::from(eye));
        assert!(at_eye.coords.norm() < 1e-5);
    }

    #[test]
    fn test_rotation_composed_with_inverse_is_identity() {
        let axes = [
            Vec3::x(),
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-0.2, 7.0, 0.01),
        ];
        for axis in axes {
            for step in -16..=16 {
                let angle = step as f32 * 0.37;
                let forward = rotate_around_axis(&identity(), angle, &axis);
                let back = rotate_around_axis(&identity(), -angle, &axis);
                let product = multiply(&forward, &back);
                assert!(
                    max_abs_diff(&product, &identity()) < 1e-5,
                    "axis {:?} angle {}",
                    axis,
                    angle
                );
            }
        }
    }

    #[test]
    fn test_rotation_is_right_handed() {
        // A quarter turn about +Z takes +X to +Y
        let r = rotate_around_axis(&identity(), FRAC_PI_2, &Vec3::new(0.0, 0.0, 2.0));
        let p = r.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!(p.x.abs() < 1e-6);
        assert!((p.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_about_zero_axis_keeps_base() {
        let base = translate(&identity(), &Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(rotate_around_axis(&base, 1.0, &Vec3::zeros()), base);
    }

    #[test]
    fn test_multiply_order_matters() {
        let t = translate(&identity(), &Vec3::new(2.0, 0.0, 0.0));
        let r = rotate_around_axis(&identity(), FRAC_PI_2, &Vec3::z());

        // Rotate first, then translate
        let p = multiply(&t, &r).transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((p.x - 2.0).abs() < 1e-6 && (p.y - 1.0).abs() < 1e-6);

        // Translate first, then rotate
        let q = multiply(&r, &t).transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!(q.x.abs() < 1e-6 && (q.y - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_column_major_layout() {
        let m = translate(&identity(), &Vec3::new(4.0, 5.0, 6.0));
        let flat = to_column_major(&m);
        assert_eq!(&flat[12..15], &[4.0, 5.0, 6.0]);
        assert_eq!(flat[15], 1.0);
        assert_eq!(flat[3], 0.0);
    }
}
