//! Mannequin: skeletal rig posing and keyframe timeline
//!
//! Pick bones of a hierarchical skeleton with the mouse, rotate them about
//! the view axis, and capture poses as keyframes on a simple timeline:
//! - Orbit / first-person camera driven by mouse drags and keys
//! - Ray vs. cylinder bone picking
//! - Rotations propagate through every descendant
//! - Edit / playback timeline with scrubbing and retiming
//!
//! The host owns the camera, rig, timeline display and scene loader, and
//! feeds raw events into [`input::InputController`].

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod camera;
pub mod rig;
pub mod timeline;
pub mod input;

pub use config::RigConfig;
