//! Keyframe timeline: the edit/playback controller and its display model

mod controller;
mod view;

pub use controller::*;
pub use view::*;
