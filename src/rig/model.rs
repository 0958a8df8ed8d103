//! Rig data owned by the scene: the skeleton and its keyframes

use macroquad::math::Quat;
use super::Skeleton;

/// Timestamped snapshot of every bone's local rotation
#[derive(Debug, Clone, PartialEq)]
pub struct KeyFrame {
    pub time: f32,
    pub rotations: Vec<Quat>,
}

impl KeyFrame {
    /// Capture the skeleton's current local rotations at `time`
    pub fn capture(time: f32, skeleton: &Skeleton) -> Self {
        Self {
            time,
            rotations: skeleton.local_rotations(),
        }
    }
}

/// A loaded scene's skeleton plus the keyframes recorded against it
#[derive(Debug, Clone, Default)]
pub struct Rig {
    pub name: String,
    pub skeleton: Skeleton,
    key_frames: Vec<KeyFrame>,
}

impl Rig {
    pub fn new(name: &str, skeleton: Skeleton) -> Self {
        Self {
            name: name.to_string(),
            skeleton,
            key_frames: Vec::new(),
        }
    }

    /// Keyframes in the order they were recorded
    pub fn key_frames(&self) -> &[KeyFrame] {
        &self.key_frames
    }

    pub fn key_frame_count(&self) -> usize {
        self.key_frames.len()
    }

    /// Latest keyframe time, or 0 with fewer than two keyframes
    pub fn max_time(&self) -> f32 {
        if self.key_frames.len() < 2 {
            return 0.0;
        }
        self.key_frames
            .iter()
            .map(|kf| kf.time)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Most recent keyframe at or before `time`, by time
    pub fn key_frame_at(&self, time: f32) -> Option<&KeyFrame> {
        self.key_frames
            .iter()
            .filter(|kf| kf.time <= time)
            .max_by(|a, b| a.time.total_cmp(&b.time))
    }

    pub(crate) fn push_key_frame(&mut self, key_frame: KeyFrame) -> usize {
        self.key_frames.push(key_frame);
        self.key_frames.len() - 1
    }

    pub(crate) fn set_key_frame_time(&mut self, index: usize, time: f32) -> bool {
        match self.key_frames.get_mut(index) {
            Some(kf) => {
                kf.time = time;
                true
            }
            None => false,
        }
    }
}
