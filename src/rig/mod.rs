//! Skeletal rig: bone arena, keyframes, picking and rotation editing

mod skeleton;
mod model;
pub mod ray;
pub mod picker;
pub mod editor;
pub mod file;

pub use skeleton::*;
pub use model::*;
pub use ray::{Ray, Viewport};
pub use picker::{pick_bone, BoneHit};
pub use editor::BoneEditor;
pub use file::{RonSceneLoader, SceneError, SceneFile, SceneLoader};
