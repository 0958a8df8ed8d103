//! Camera drag and key policy
//!
//! Maps pointer-drag deltas and button state to orbit/zoom commands, and
//! camera key commands to translate/roll commands.

use macroquad::math::Vec2;
use super::Camera;
use crate::config::RigConfig;

/// Which buttons were held during a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DragButtons {
    pub primary: bool,
    pub secondary: bool,
}

impl DragButtons {
    pub const PRIMARY: Self = Self { primary: true, secondary: false };
    pub const SECONDARY: Self = Self { primary: false, secondary: true };
}

/// Discrete camera moves bound to keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraMove {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
    RollLeft,
    RollRight,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub rotation_speed: f32,
    pub zoom_speed: f32,
    pub roll_speed: f32,
    /// Primary drag turns the camera in place instead of orbiting
    pub first_person: bool,
}

impl CameraRig {
    pub fn new(config: &RigConfig) -> Self {
        Self {
            rotation_speed: config.rotation_speed,
            zoom_speed: config.zoom_speed,
            roll_speed: config.roll_speed,
            first_person: false,
        }
    }

    /// Apply a drag of `delta` screen pixels. Returns false when the drag
    /// was a no-op (no movement, or an unbound button combination).
    pub fn drag(&self, camera: &mut dyn Camera, delta: Vec2, buttons: DragButtons) -> bool {
        if delta == Vec2::ZERO {
            return false;
        }

        let mouse_dir = (camera.right() * -delta.x + camera.up() * delta.y).normalize_or_zero();

        match (buttons.primary, buttons.secondary) {
            (true, false) => {
                let Some(axis) = camera.forward().cross(mouse_dir).try_normalize() else {
                    return false;
                };
                if self.first_person {
                    camera.rotate(axis, self.rotation_speed);
                } else {
                    camera.orbit_target(axis, self.rotation_speed);
                }
                true
            }
            (false, true) => {
                if mouse_dir.y == 0.0 {
                    return false;
                }
                camera.offset_dist(mouse_dir.y.signum() * self.zoom_speed);
                true
            }
            _ => false,
        }
    }

    /// Apply a key-bound camera move
    pub fn apply(&self, camera: &mut dyn Camera, movement: CameraMove) {
        let step = self.zoom_speed;
        match movement {
            CameraMove::Forward => camera.offset(-camera.forward(), step, true),
            CameraMove::Backward => camera.offset(camera.forward(), step, true),
            CameraMove::Left => camera.offset(-camera.right(), step, true),
            CameraMove::Right => camera.offset(camera.right(), step, true),
            CameraMove::Up => camera.offset(camera.up(), step, true),
            CameraMove::Down => camera.offset(-camera.up(), step, true),
            CameraMove::RollLeft => camera.roll(self.roll_speed, false),
            CameraMove::RollRight => camera.roll(self.roll_speed, true),
        }
    }
}
