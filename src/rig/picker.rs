//! Bone picking
//!
//! Casts the pointer ray against every bone's cylinder and highlights the
//! closest hit. Ties go to the lowest bone index.

use macroquad::math::Vec2;
use super::ray::{ray_cylinder_intersection, screen_to_ray, BoneFrame, Ray, Viewport};
use super::Skeleton;
use crate::camera::Camera;

/// The bone a ray hit and how far along the ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneHit {
    pub index: usize,
    pub distance: f32,
}

/// Find the bone whose body the ray enters first
pub fn nearest_bone(ray: &Ray, skeleton: &Skeleton) -> Option<BoneHit> {
    let mut nearest: Option<BoneHit> = None;

    for (index, bone) in skeleton.iter().enumerate() {
        let Some(frame) = BoneFrame::new(bone.position(), bone.endpoint()) else {
            continue;
        };
        let local_ray = frame.to_local_ray(ray);
        let Some(distance) = ray_cylinder_intersection(&local_ray, frame.length, bone.radius) else {
            continue;
        };
        // Strict comparison keeps the earlier bone on ties
        if nearest.map_or(true, |hit| distance < hit.distance) {
            nearest = Some(BoneHit { index, distance });
        }
    }

    nearest
}

/// Pick under the pointer and move the highlight to the hit bone (or clear it)
pub fn pick_bone(
    camera: &dyn Camera,
    viewport: &Viewport,
    pointer: Vec2,
    skeleton: &mut Skeleton,
) -> Option<BoneHit> {
    let hit = screen_to_ray(pointer, viewport, camera).and_then(|ray| nearest_bone(&ray, skeleton));
    skeleton.set_highlighted(hit.map(|h| h.index));
    hit
}
