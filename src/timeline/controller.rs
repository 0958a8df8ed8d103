//! Edit/playback state machine
//!
//! In edit mode the user poses the rig and captures keyframes at the
//! scrubbed time. Playback runs the clock once from 0 to the latest
//! keyframe and drops back to edit.

use crate::rig::{KeyFrame, Rig};
use super::TimelineView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Edit,
    Playback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineController {
    mode: Mode,
    /// Playback clock, only meaningful in playback
    time: f32,
    /// Keyframes can only be retimed inside [0, track_length)
    pub track_length: f32,
}

impl TimelineController {
    pub fn new(track_length: f32) -> Self {
        Self {
            mode: Mode::Edit,
            time: 0.0,
            track_length,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Latest keyframe time, or 0 with fewer than two keyframes
    pub fn max_time(&self, rig: &Rig) -> f32 {
        rig.max_time()
    }

    /// Capture the current pose at the scrubbed time. The very first capture
    /// away from time 0 also pins the current pose at 0, so playback always
    /// has somewhere to start.
    pub fn add_key_frame(&mut self, rig: &mut Rig, view: &mut dyn TimelineView) -> bool {
        if self.mode != Mode::Edit {
            return false;
        }

        let time = view.playhead_time();
        if rig.key_frame_count() == 0 && time != 0.0 {
            let index = rig.push_key_frame(KeyFrame::capture(0.0, &rig.skeleton));
            view.key_frame_added(0.0, index);
        }

        let index = rig.push_key_frame(KeyFrame::capture(time, &rig.skeleton));
        view.key_frame_added(time, index);
        log::debug!("keyframe {} captured at {:.2}s", index, time);
        true
    }

    /// Toggle between edit and playback. Entering playback needs at least
    /// two keyframes and puts the rig back in rest pose.
    pub fn start_playback(&mut self, rig: &mut Rig, view: &mut dyn TimelineView) -> bool {
        match self.mode {
            Mode::Edit => {
                if rig.key_frame_count() < 2 {
                    log::debug!("playback needs two keyframes, have {}", rig.key_frame_count());
                    return false;
                }
                rig.skeleton.reset_to_rest();
                self.set_mode(Mode::Playback, view);
            }
            Mode::Playback => self.set_mode(Mode::Edit, view),
        }
        true
    }

    /// Advance the playback clock. Reaching the latest keyframe ends playback.
    pub fn increment_time(&mut self, dt: f32, rig: &Rig, view: &mut dyn TimelineView) {
        if self.mode != Mode::Playback || !dt.is_finite() {
            return;
        }
        self.time += dt;
        if self.time >= rig.max_time() {
            self.set_mode(Mode::Edit, view);
        }
    }

    /// Move keyframe `index` to `time`. The first keyframe stays pinned.
    pub fn retime_key_frame(&mut self, index: usize, time: f32, rig: &mut Rig, view: &mut dyn TimelineView) -> bool {
        if self.mode != Mode::Edit || index == 0 || !(0.0..self.track_length).contains(&time) {
            return false;
        }
        if !rig.set_key_frame_time(index, time) {
            return false;
        }
        view.key_frame_retimed(index, time);
        true
    }

    /// Back to edit at time 0 with an empty track, for a freshly loaded rig
    pub fn reset(&mut self, view: &mut dyn TimelineView) {
        view.key_frames_cleared();
        self.set_mode(Mode::Edit, view);
    }

    pub fn mode_string(&self, rig: &Rig) -> String {
        match self.mode {
            Mode::Edit => format!("edit: {} keyframes", rig.key_frame_count()),
            Mode::Playback => format!("playback: {:.2} / {:.2}", self.time, rig.max_time()),
        }
    }

    fn set_mode(&mut self, mode: Mode, view: &mut dyn TimelineView) {
        self.mode = mode;
        self.time = 0.0;
        view.mode_changed(mode, self.time);
        log::debug!("timeline mode: {:?}", mode);
    }
}
