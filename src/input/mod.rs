//! Input handling for the rig editor
//!
//! Raw pointer and key events go into [`InputController`], which dispatches
//! them to the camera controls, bone picking and rotation, and the timeline.
//! Key presses are looked up in a [`KeyBindings`] table of [`Command`]s.

mod actions;
mod controller;

pub use actions::*;
pub use controller::*;
