//! Timeline display model
//!
//! The controller reports every keyframe and mode change through
//! [`TimelineView`]. [`TimelineState`] is the concrete model a host draws:
//! a playhead the user scrubs in pixels and one marker per keyframe.

use super::Mode;

/// Listener for timeline changes. The controller is the only writer.
pub trait TimelineView {
    /// Where the user has scrubbed to, in seconds
    fn playhead_time(&self) -> f32;
    fn key_frame_added(&mut self, time: f32, index: usize);
    /// Drop every keyframe marker. The playhead stays where it is.
    fn key_frames_cleared(&mut self);
    fn key_frame_retimed(&mut self, index: usize, time: f32);
    fn mode_changed(&mut self, mode: Mode, time: f32);
}

/// A keyframe as drawn on the track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub index: usize,
    pub time: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineState {
    playhead: f32,
    markers: Vec<Marker>,
    mode: Mode,
    /// Playback clock as of the last mode change
    mode_time: f32,
    pub px_per_second: f32,
    pub track_length: f32,
}

impl TimelineState {
    pub fn new(px_per_second: f32, track_length: f32) -> Self {
        Self {
            playhead: 0.0,
            markers: Vec::new(),
            mode: Mode::Edit,
            mode_time: 0.0,
            px_per_second,
            track_length,
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn mode_time(&self) -> f32 {
        self.mode_time
    }

    /// Move the playhead by a pointer delta. Moves that would leave the
    /// track, or that happen during playback, are rejected.
    pub fn scrub(&mut self, delta_px: f32) -> bool {
        if self.mode != Mode::Edit || self.px_per_second <= 0.0 {
            return false;
        }
        let time = self.playhead + delta_px / self.px_per_second;
        if !(0.0..self.track_length).contains(&time) {
            return false;
        }
        self.playhead = time;
        true
    }

    /// Track x offset of a time, in pixels
    pub fn time_to_px(&self, time: f32) -> f32 {
        time * self.px_per_second
    }

    pub fn px_to_time(&self, x: f32) -> f32 {
        if self.px_per_second <= 0.0 {
            return 0.0;
        }
        x / self.px_per_second
    }

    /// Marker within `tolerance` pixels of track offset `x`, closest first
    pub fn marker_at(&self, x: f32, tolerance: f32) -> Option<Marker> {
        self.markers
            .iter()
            .map(|m| (*m, (self.time_to_px(m.time) - x).abs()))
            .filter(|(_, d)| *d <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(m, _)| m)
    }
}

impl TimelineView for TimelineState {
    fn playhead_time(&self) -> f32 {
        self.playhead
    }

    fn key_frame_added(&mut self, time: f32, index: usize) {
        self.markers.push(Marker { index, time });
    }

    fn key_frames_cleared(&mut self) {
        self.markers.clear();
    }

    fn key_frame_retimed(&mut self, index: usize, time: f32) {
        if let Some(marker) = self.markers.iter_mut().find(|m| m.index == index) {
            marker.time = time;
        }
    }

    fn mode_changed(&mut self, mode: Mode, time: f32) {
        self.mode = mode;
        self.mode_time = time;
    }
}
