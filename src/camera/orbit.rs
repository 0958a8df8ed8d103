//! Perspective camera used by the rig editor
//!
//! The camera keeps an orthonormal basis plus an eye/target pair. `forward`
//! is the camera-space +Z axis: it points from the target back toward the
//! eye, so the camera looks along `-forward`.

use macroquad::math::{Mat4, Quat, Vec3};
use crate::config::CameraConfig;

/// Closest the eye may get to its target
const MIN_DISTANCE: f32 = 0.01;

/// Camera capability consumed by the rig controls
pub trait Camera {
    fn view_matrix(&self) -> Mat4;
    fn proj_matrix(&self) -> Mat4;
    /// Eye position in world space
    fn pos(&self) -> Vec3;
    /// Camera-space +Z in world space (target -> eye)
    fn forward(&self) -> Vec3;
    fn right(&self) -> Vec3;
    fn up(&self) -> Vec3;

    /// Turn in place about `axis` (first-person look)
    fn rotate(&mut self, axis: Vec3, angle: f32);
    /// Swing the eye around the target about `axis`
    fn orbit_target(&mut self, axis: Vec3, angle: f32);
    /// Move along `direction`. `relative` moves eye and target together,
    /// otherwise only the eye moves and the view re-aims at the target.
    fn offset(&mut self, direction: Vec3, amount: f32, relative: bool);
    /// Change the eye-target distance
    fn offset_dist(&mut self, amount: f32);
    /// Spin about the view axis
    fn roll(&mut self, angle: f32, clockwise: bool);
}

#[derive(Clone, Debug)]
pub struct OrbitCamera {
    eye: Vec3,
    target: Vec3,
    distance: f32,

    // Orthonormal basis
    forward: Vec3,
    right: Vec3,
    up: Vec3,

    /// Vertical field of view in radians
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl OrbitCamera {
    pub fn new(eye: Vec3, target: Vec3, up: Vec3, fov_y: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        let mut cam = Self {
            eye,
            target,
            distance: 0.0,
            forward: Vec3::Z,
            right: Vec3::X,
            up,
            fov_y,
            aspect,
            z_near,
            z_far,
        };
        cam.aim_at_target(up);
        cam
    }

    /// Build from config with the given viewport aspect ratio
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self::new(
            Vec3::from(config.eye),
            Vec3::from(config.target),
            Vec3::from(config.up),
            config.fov_degrees.to_radians(),
            aspect,
            config.z_near,
            config.z_far,
        )
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Recompute the basis so the eye looks at the target, keeping `up_hint`
    /// as close to up as possible
    fn aim_at_target(&mut self, up_hint: Vec3) {
        let to_eye = self.eye - self.target;
        self.distance = to_eye.length().max(MIN_DISTANCE);
        self.forward = to_eye.try_normalize().unwrap_or(self.forward);

        let mut right = up_hint.cross(self.forward);
        if right.length_squared() < 1e-8 {
            // Up hint parallel to the view axis, borrow the old right vector
            right = self.right - self.forward * self.right.dot(self.forward);
        }
        self.right = right.normalize();
        self.up = self.forward.cross(self.right);
    }

    /// Rotate the basis vectors, re-orthonormalizing against drift
    fn rotate_basis(&mut self, rotation: Quat) {
        self.forward = (rotation * self.forward).normalize();
        let up = rotation * self.up;
        self.right = up.cross(self.forward).normalize();
        self.up = self.forward.cross(self.right);
    }
}

impl Camera for OrbitCamera {
    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.eye - self.forward, self.up)
    }

    fn proj_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.z_near, self.z_far)
    }

    fn pos(&self) -> Vec3 {
        self.eye
    }

    fn forward(&self) -> Vec3 {
        self.forward
    }

    fn right(&self) -> Vec3 {
        self.right
    }

    fn up(&self) -> Vec3 {
        self.up
    }

    fn rotate(&mut self, axis: Vec3, angle: f32) {
        let Some(axis) = axis.try_normalize() else { return };
        self.rotate_basis(Quat::from_axis_angle(axis, angle));
        self.target = self.eye - self.forward * self.distance;
    }

    fn orbit_target(&mut self, axis: Vec3, angle: f32) {
        let Some(axis) = axis.try_normalize() else { return };
        self.rotate_basis(Quat::from_axis_angle(axis, angle));
        self.eye = self.target + self.forward * self.distance;
    }

    fn offset(&mut self, direction: Vec3, amount: f32, relative: bool) {
        let Some(direction) = direction.try_normalize() else { return };
        let delta = direction * amount;
        self.eye += delta;
        if relative {
            self.target += delta;
        } else {
            let up = self.up;
            self.aim_at_target(up);
        }
    }

    fn offset_dist(&mut self, amount: f32) {
        self.distance = (self.distance + amount).max(MIN_DISTANCE);
        self.eye = self.target + self.forward * self.distance;
    }

    fn roll(&mut self, angle: f32, clockwise: bool) {
        let signed = if clockwise { -angle } else { angle };
        self.rotate_basis(Quat::from_axis_angle(self.forward, signed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroquad::math::Vec4;

    fn default_camera() -> OrbitCamera {
        OrbitCamera::from_config(&CameraConfig::default(), 4.0 / 3.0)
    }

    fn assert_vec_near(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "expected {:?}, got {:?}", b, a);
    }

    #[test]
    fn test_default_basis() {
        let cam = default_camera();
        // Eye at z=-6 looking at the origin: forward points back toward -Z
        assert_vec_near(cam.forward(), Vec3::new(0.0, 0.0, -1.0));
        assert_vec_near(cam.up(), Vec3::Y);
        assert_vec_near(cam.right(), Vec3::new(-1.0, 0.0, 0.0));
        assert!((cam.distance() - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_view_matrix_maps_target_down_negative_z() {
        let cam = default_camera();
        let target_view = cam.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(target_view.x.abs() < 1e-5);
        assert!(target_view.y.abs() < 1e-5);
        assert!((target_view.z + 6.0).abs() < 1e-5, "z={}", target_view.z);
    }

    #[test]
    fn test_orbit_keeps_distance_and_target() {
        let mut cam = default_camera();
        cam.orbit_target(Vec3::Y, std::f32::consts::FRAC_PI_2);
        assert_vec_near(cam.target(), Vec3::ZERO);
        assert!((cam.pos().length() - 6.0).abs() < 1e-4);
        // Quarter turn about +Y takes the eye from -Z to -X
        assert_vec_near(cam.pos(), Vec3::new(-6.0, 0.0, 0.0));
    }

    #[test]
    fn test_rotate_keeps_eye() {
        let mut cam = default_camera();
        cam.rotate(Vec3::Y, 0.3);
        assert_vec_near(cam.pos(), Vec3::new(0.0, 0.0, -6.0));
        assert!(((cam.pos() - cam.target()).length() - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_offset_relative_moves_both() {
        let mut cam = default_camera();
        cam.offset(-cam.forward(), 0.5, true);
        assert_vec_near(cam.pos(), Vec3::new(0.0, 0.0, -5.5));
        assert_vec_near(cam.target(), Vec3::new(0.0, 0.0, 0.5));
    }

    #[test]
    fn test_offset_dist_clamps() {
        let mut cam = default_camera();
        cam.offset_dist(1.0);
        assert_vec_near(cam.pos(), Vec3::new(0.0, 0.0, -7.0));
        cam.offset_dist(-100.0);
        assert!((cam.distance() - MIN_DISTANCE).abs() < 1e-6);
    }

    #[test]
    fn test_roll_changes_up_only() {
        let mut cam = default_camera();
        let forward = cam.forward();
        cam.roll(std::f32::consts::FRAC_PI_2, false);
        assert_vec_near(cam.forward(), forward);
        assert!(cam.up().dot(Vec3::Y).abs() < 1e-4);
        assert!((cam.up().dot(cam.right())).abs() < 1e-5);
    }

    #[test]
    fn test_zero_axis_is_ignored() {
        let mut cam = default_camera();
        cam.rotate(Vec3::ZERO, 1.0);
        cam.orbit_target(Vec3::ZERO, 1.0);
        assert_vec_near(cam.pos(), Vec3::new(0.0, 0.0, -6.0));
        assert_vec_near(cam.forward(), Vec3::new(0.0, 0.0, -1.0));
    }
}
