//! Bone rotation drag
//!
//! While a bone is selected, each pointer move is turned into a rotation
//! about the camera's view axis. The swept angle is measured around a fixed
//! screen-space pivot captured when the drag started.

use macroquad::math::{Quat, Vec2, Vec3};
use super::Skeleton;
use crate::camera::Camera;

/// Tracks a bone rotation drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneEditor {
    /// Bone being rotated
    pub bone: usize,
    /// Screen position the drag angle is measured around
    pub pivot: Vec2,
}

impl BoneEditor {
    pub fn new(bone: usize, pivot: Vec2) -> Self {
        Self { bone, pivot }
    }

    /// Rotate the bone by the angle the pointer swept from `previous` to
    /// `current`. Returns the swept angle, or None if nothing was applied.
    pub fn drag(&self, skeleton: &mut Skeleton, camera: &dyn Camera, previous: Vec2, current: Vec2) -> Option<f32> {
        let angle = drag_angle(self.pivot, previous, current)?;
        let rotation = skeleton.bone(self.bone)?.rotation();
        let increment = drag_increment(rotation, camera.forward(), angle)?;
        rotate_bone(skeleton, self.bone, increment).then_some(angle)
    }
}

/// Signed screen angle swept from `previous` to `current` around `pivot`.
/// None when either point sits on the pivot.
pub fn drag_angle(pivot: Vec2, previous: Vec2, current: Vec2) -> Option<f32> {
    let prev = (previous - pivot).try_normalize()?;
    let curr = (current - pivot).try_normalize()?;
    Some(curr.y.atan2(curr.x) - prev.y.atan2(prev.x))
}

/// Rotation of `-angle` about the view axis, expressed in the bone's frame
pub fn drag_increment(bone_rotation: Quat, view_axis: Vec3, angle: f32) -> Option<Quat> {
    let axis = (bone_rotation.inverse() * view_axis).try_normalize()?;
    Some(Quat::from_axis_angle(axis, -angle))
}

/// Compose `increment` onto a bone and re-pose it and every descendant.
///
/// Only this bone's local rotation changes; descendants keep theirs and
/// follow through their parent's new world rotation.
pub fn rotate_bone(skeleton: &mut Skeleton, index: usize, increment: Quat) -> bool {
    let Some(bone) = skeleton.bone_mut(index) else { return false };

    bone.rotation = (bone.rotation * increment).normalize();
    bone.local_rotation = (bone.local_rotation * increment).normalize();
    bone.endpoint = bone.position + bone.rotation * (bone.rest_endpoint - bone.rest_position);

    skeleton.propagate_from(index);
    true
}
