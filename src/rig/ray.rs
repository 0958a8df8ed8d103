//! Ray casting utilities for bone picking
//!
//! Screen coordinates are unprojected through the camera's inverse view and
//! projection matrices, then tested against each bone's cylindrical body in
//! a bone-local frame where the bone runs along +Z from the origin.

use macroquad::math::{Vec2, Vec3, Vec4};
use crate::camera::Camera;

/// Smallest ray parameter counted as "in front of" the ray origin
pub const PICK_EPSILON: f32 = 0.0001;

/// Screen region covered by the 3D view, in pixels from the top-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The 3D view for a window whose bottom `panel_height` pixels hold the timeline
    pub fn above_panel(window_width: f32, window_height: f32, panel_height: f32) -> Self {
        Self::new(window_width, (window_height - panel_height).max(0.0))
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x <= self.width && point.y <= self.height
    }
}

/// A 3D ray with origin and direction
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3, // Normalized
}

impl Ray {
    /// Create a new ray, normalizing the direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get point at distance t along ray
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Cast a ray from the camera eye through a screen point.
///
/// Returns None when the viewport is empty or the matrices can't be inverted
/// into a finite point.
pub fn screen_to_ray(screen: Vec2, viewport: &Viewport, camera: &dyn Camera) -> Option<Ray> {
    if viewport.width <= 0.0 || viewport.height <= 0.0 {
        return None;
    }

    // Near plane point in normalized device coordinates
    let ndc = Vec4::new(
        2.0 * screen.x / viewport.width - 1.0,
        1.0 - 2.0 * screen.y / viewport.height,
        -1.0,
        1.0,
    );

    let world = camera.view_matrix().inverse() * (camera.proj_matrix().inverse() * ndc);
    if world.w.abs() < f32::EPSILON {
        return None;
    }
    let point = world.truncate() / world.w;

    let direction = (point - camera.pos()).try_normalize()?;
    Some(Ray::new(camera.pos(), direction))
}

/// Project a world point to screen pixels (inverse of `screen_to_ray`).
/// None for points at or behind the eye.
pub fn world_to_screen(point: Vec3, viewport: &Viewport, camera: &dyn Camera) -> Option<Vec2> {
    let clip = camera.proj_matrix() * (camera.view_matrix() * point.extend(1.0));
    if clip.w < f32::EPSILON {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some(Vec2::new(
        (ndc.x + 1.0) / 2.0 * viewport.width,
        (ndc.y - 1.0) / -2.0 * viewport.height,
    ))
}

/// Orthonormal frame with the bone axis as local +Z and the bone start as origin
#[derive(Debug, Clone, Copy)]
pub struct BoneFrame {
    pub origin: Vec3,
    pub x_axis: Vec3,
    pub y_axis: Vec3,
    pub z_axis: Vec3,
    pub length: f32,
}

impl BoneFrame {
    /// Build the frame for a bone running from `position` to `endpoint`.
    /// Returns None for zero-length bones.
    pub fn new(position: Vec3, endpoint: Vec3) -> Option<Self> {
        let axis = endpoint - position;
        let length = axis.length();
        if length < PICK_EPSILON {
            return None;
        }
        let z_axis = axis / length;

        // Any reference works as long as it isn't parallel to the bone
        let mut x_axis = z_axis.cross(Vec3::Y);
        if x_axis.length_squared() < 1e-8 {
            x_axis = z_axis.cross(Vec3::X);
        }
        let x_axis = x_axis.normalize();
        let y_axis = z_axis.cross(x_axis);

        Some(Self { origin: position, x_axis, y_axis, z_axis, length })
    }

    pub fn to_local_point(&self, point: Vec3) -> Vec3 {
        self.to_local_dir(point - self.origin)
    }

    pub fn to_local_dir(&self, dir: Vec3) -> Vec3 {
        Vec3::new(dir.dot(self.x_axis), dir.dot(self.y_axis), dir.dot(self.z_axis))
    }

    pub fn to_local_ray(&self, ray: &Ray) -> Ray {
        Ray::new(self.to_local_point(ray.origin), self.to_local_dir(ray.direction))
    }
}

/// Intersect a bone-local ray with a cylinder of `radius` around local +Z,
/// capped to z in [0, length].
///
/// Returns the ray parameter of the nearest hit in front of the origin, or
/// None if the ray runs parallel to the axis, misses, or only meets the
/// infinite cylinder outside the bone segment.
pub fn ray_cylinder_intersection(local_ray: &Ray, length: f32, radius: f32) -> Option<f32> {
    let o = local_ray.origin;
    let d = local_ray.direction;

    // |o.xy + t * d.xy|^2 = r^2
    let a = d.x * d.x + d.y * d.y;
    let b = 2.0 * (o.x * d.x + o.y * d.y);
    let c = o.x * o.x + o.y * o.y - radius * radius;

    if a.abs() < f32::EPSILON {
        return None; // Parallel to the bone axis
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();

    let far = (-b + root) / (2.0 * a);
    if far <= PICK_EPSILON {
        return None; // Cylinder entirely behind the ray
    }

    let within_segment = |t: f32| {
        let z = local_ray.at(t).z;
        (0.0..=length).contains(&z)
    };

    let near = (-b - root) / (2.0 * a);
    if near > PICK_EPSILON && within_segment(near) {
        return Some(near);
    }
    if within_segment(far) {
        return Some(far);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::OrbitCamera;
    use crate::config::CameraConfig;

    fn viewport() -> Viewport {
        Viewport::new(800.0, 600.0)
    }

    fn camera() -> OrbitCamera {
        OrbitCamera::from_config(&CameraConfig::default(), viewport().aspect())
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
        let p = ray.at(5.0);
        assert!((p - Vec3::new(5.0, 0.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_viewport_above_panel() {
        let vp = Viewport::above_panel(800.0, 800.0, 200.0);
        assert_eq!(vp.height, 600.0);
        assert!(vp.contains(Vec2::new(400.0, 599.0)));
        assert!(!vp.contains(Vec2::new(400.0, 650.0)));
        assert!(!vp.contains(Vec2::new(-1.0, 10.0)));
    }

    #[test]
    fn test_screen_to_ray_center() {
        let cam = camera();
        let ray = screen_to_ray(Vec2::new(400.0, 300.0), &viewport(), &cam).unwrap();
        // Center ray goes straight down the view direction
        let dot = ray.direction.dot(-cam.forward());
        assert!(dot > 0.9999, "center ray should follow the view, got dot={}", dot);
        assert!((ray.origin - cam.pos()).length() < 1e-5);
    }

    #[test]
    fn test_screen_to_ray_roundtrip() {
        let cam = camera();
        let world_point = Vec3::new(0.7, -0.4, 1.5);

        let screen = world_to_screen(world_point, &viewport(), &cam).unwrap();
        let ray = screen_to_ray(screen, &viewport(), &cam).unwrap();

        // Closest approach of the ray to the original point
        let t = (world_point - ray.origin).dot(ray.direction);
        let distance = (ray.at(t) - world_point).length();
        assert!(distance < 1e-3, "ray should pass through the point, missed by {}", distance);
    }

    #[test]
    fn test_point_behind_eye_has_no_screen_position() {
        let cam = camera();
        assert!(world_to_screen(Vec3::new(0.0, 0.0, -10.0), &viewport(), &cam).is_none());
    }

    #[test]
    fn test_empty_viewport_has_no_ray() {
        let cam = camera();
        assert!(screen_to_ray(Vec2::ZERO, &Viewport::new(0.0, 0.0), &cam).is_none());
    }

    #[test]
    fn test_bone_frame_is_orthonormal() {
        for endpoint in [Vec3::X, Vec3::Y, -Vec3::Y, Vec3::new(1.0, 2.0, -3.0)] {
            let frame = BoneFrame::new(Vec3::ONE, Vec3::ONE + endpoint).unwrap();
            assert!((frame.x_axis.length() - 1.0).abs() < 1e-5);
            assert!((frame.y_axis.length() - 1.0).abs() < 1e-5);
            assert!(frame.x_axis.dot(frame.y_axis).abs() < 1e-5);
            assert!(frame.x_axis.dot(frame.z_axis).abs() < 1e-5);
            assert!(frame.y_axis.dot(frame.z_axis).abs() < 1e-5);

            let tip = frame.to_local_point(Vec3::ONE + endpoint);
            assert!((tip - Vec3::new(0.0, 0.0, endpoint.length())).length() < 1e-5);
        }
    }

    #[test]
    fn test_zero_length_bone_has_no_frame() {
        assert!(BoneFrame::new(Vec3::ONE, Vec3::ONE).is_none());
    }

    #[test]
    fn test_cylinder_hit_from_outside() {
        // Bone along +X from the origin, ray dropping onto its middle from z=-5
        let frame = BoneFrame::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)).unwrap();
        let ray = Ray::new(Vec3::new(1.0, 0.0, -5.0), Vec3::Z);
        let t = ray_cylinder_intersection(&frame.to_local_ray(&ray), frame.length, 0.5).unwrap();
        assert!((t - 4.5).abs() < 1e-4, "t={}", t);
    }

    #[test]
    fn test_cylinder_hit_from_inside() {
        let frame = BoneFrame::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)).unwrap();
        let ray = Ray::new(Vec3::new(1.0, 0.0, 0.0), Vec3::Z);
        let t = ray_cylinder_intersection(&frame.to_local_ray(&ray), frame.length, 0.5).unwrap();
        assert!((t - 0.5).abs() < 1e-4, "t={}", t);
    }

    #[test]
    fn test_cylinder_miss_beyond_segment() {
        let frame = BoneFrame::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)).unwrap();
        let ray = Ray::new(Vec3::new(3.0, 0.0, -5.0), Vec3::Z);
        assert!(ray_cylinder_intersection(&frame.to_local_ray(&ray), frame.length, 0.5).is_none());
        let ray = Ray::new(Vec3::new(-0.5, 0.0, -5.0), Vec3::Z);
        assert!(ray_cylinder_intersection(&frame.to_local_ray(&ray), frame.length, 0.5).is_none());
    }

    #[test]
    fn test_cylinder_miss_sideways() {
        let frame = BoneFrame::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)).unwrap();
        let ray = Ray::new(Vec3::new(1.0, 2.0, -5.0), Vec3::Z);
        assert!(ray_cylinder_intersection(&frame.to_local_ray(&ray), frame.length, 0.5).is_none());
    }

    #[test]
    fn test_cylinder_behind_ray() {
        let frame = BoneFrame::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)).unwrap();
        let ray = Ray::new(Vec3::new(1.0, 0.0, 5.0), Vec3::Z);
        assert!(ray_cylinder_intersection(&frame.to_local_ray(&ray), frame.length, 0.5).is_none());
    }

    #[test]
    fn test_cylinder_parallel_ray() {
        let frame = BoneFrame::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)).unwrap();
        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
        assert!(ray_cylinder_intersection(&frame.to_local_ray(&ray), frame.length, 0.5).is_none());
    }

    #[test]
    fn test_cylinder_slanted_hit() {
        // Ray crossing the cylinder at 45 degrees: entry where |y| = r
        let frame = BoneFrame::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0)).unwrap();
        let dir = Vec3::new(0.0, 1.0, 1.0).normalize();
        let ray = Ray::new(Vec3::new(0.0, -2.0, 0.0), dir);
        let t = ray_cylinder_intersection(&frame.to_local_ray(&ray), frame.length, 1.0).unwrap();
        // y goes from -2 to -1 after travelling sqrt(2)
        assert!((t - 2f32.sqrt()).abs() < 1e-4, "t={}", t);
    }

    #[test]
    fn test_cylinder_far_root_inside_segment() {
        // Enters the side below the bone start (z=-1), leaves it at z=1
        let frame = BoneFrame::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0)).unwrap();
        let dir = Vec3::new(0.0, 1.0, 1.0).normalize();
        let ray = Ray::new(Vec3::new(0.0, -3.0, -3.0), dir);
        let t = ray_cylinder_intersection(&frame.to_local_ray(&ray), frame.length, 1.0).unwrap();
        assert!((t - 4.0 * 2f32.sqrt()).abs() < 1e-4, "t={}", t);
        assert!((ray.at(t) - Vec3::new(0.0, 1.0, 1.0)).length() < 1e-4);
    }
}
