//! Viewport camera and the drag/key policy that steers it

mod orbit;
mod rig;

pub use orbit::*;
pub use rig::*;
