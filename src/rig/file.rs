//! Scene loading and saving
//!
//! Skeleton scenes are RON files listing bones in rest pose:
//!
//! ```text
//! (
//!   name: "two_bones",
//!   bones: [
//!     (name: "root", parent: None, position: (0.0, -3.0, 0.0), endpoint: (0.0, -1.5, 0.0), radius: 0.2),
//!     (name: "child", parent: Some(0), position: (0.0, -1.5, 0.0), endpoint: (0.0, 1.5, 0.0), radius: 0.2),
//!   ],
//! )
//! ```
//!
//! Files are validated before any skeleton is built so a bad file can never
//! replace a working rig.

use std::fs;
use std::path::{Path, PathBuf};
use macroquad::math::Vec3;
use serde::{Deserialize, Serialize};
use super::{Bone, Rig, Skeleton, SkeletonError};

/// Validation limits to keep hostile files from exhausting memory
pub mod limits {
    /// Maximum number of bones in one scene
    pub const MAX_BONES: usize = 1024;
    /// Maximum length of scene and bone names
    pub const MAX_NAME_LEN: usize = 256;
    /// Maximum absolute coordinate value
    pub const MAX_COORD: f32 = 1_000_000.0;
}

/// Error type for scene loading
#[derive(Debug)]
pub enum SceneError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
    ValidationError(String),
    SkeletonError(SkeletonError),
}

impl From<std::io::Error> for SceneError {
    fn from(e: std::io::Error) -> Self {
        SceneError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for SceneError {
    fn from(e: ron::error::SpannedError) -> Self {
        SceneError::ParseError(e)
    }
}

impl From<ron::Error> for SceneError {
    fn from(e: ron::Error) -> Self {
        SceneError::SerializeError(e)
    }
}

impl From<SkeletonError> for SceneError {
    fn from(e: SkeletonError) -> Self {
        SceneError::SkeletonError(e)
    }
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::IoError(e) => write!(f, "IO error: {}", e),
            SceneError::ParseError(e) => write!(f, "Parse error: {}", e),
            SceneError::SerializeError(e) => write!(f, "Serialize error: {}", e),
            SceneError::ValidationError(e) => write!(f, "Validation error: {}", e),
            SceneError::SkeletonError(e) => write!(f, "Skeleton error: {}", e),
        }
    }
}

impl std::error::Error for SceneError {}

// ============================================================================
// File records
// ============================================================================

/// One bone as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent: Option<usize>,
    pub position: [f32; 3],
    pub endpoint: [f32; 3],
    pub radius: f32,
}

/// A whole scene file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub name: String,
    pub bones: Vec<BoneRecord>,
}

impl SceneFile {
    /// Snapshot a rig's rest pose (keyframes are not stored)
    pub fn from_rig(rig: &Rig) -> Self {
        Self {
            name: rig.name.clone(),
            bones: rig
                .skeleton
                .iter()
                .map(|bone| BoneRecord {
                    name: bone.name.clone(),
                    parent: bone.parent(),
                    position: bone.rest_position().to_array(),
                    endpoint: bone.rest_endpoint().to_array(),
                    radius: bone.radius,
                })
                .collect(),
        }
    }

    /// Build a rig in rest pose with no keyframes
    pub fn into_rig(self) -> Result<Rig, SceneError> {
        validate_scene(&self)?;
        let bones = self
            .bones
            .into_iter()
            .map(|record| {
                let bone = Bone::new(
                    Vec3::from_array(record.position),
                    Vec3::from_array(record.endpoint),
                    record.radius,
                )
                .named(&record.name);
                match record.parent {
                    Some(parent) => bone.with_parent(parent),
                    None => bone,
                }
            })
            .collect();
        let skeleton = Skeleton::new(bones)?;
        Ok(Rig::new(&self.name, skeleton))
    }
}

// ============================================================================
// Validation
// ============================================================================

fn is_valid_float(f: f32) -> bool {
    f.is_finite() && f.abs() <= limits::MAX_COORD
}

fn validate_point(p: &[f32; 3], context: &str) -> Result<(), String> {
    if !p.iter().all(|&c| is_valid_float(c)) {
        return Err(format!("{}: invalid coordinates ({}, {}, {})", context, p[0], p[1], p[2]));
    }
    Ok(())
}

fn validate_bone(bone: &BoneRecord, index: usize, total: usize) -> Result<(), String> {
    let context = format!("bone[{}]", index);

    if bone.name.len() > limits::MAX_NAME_LEN {
        return Err(format!("{}: name too long ({} > {})",
            context, bone.name.len(), limits::MAX_NAME_LEN));
    }
    validate_point(&bone.position, &format!("{} position", context))?;
    validate_point(&bone.endpoint, &format!("{} endpoint", context))?;

    if !(bone.radius.is_finite() && bone.radius > 0.0) {
        return Err(format!("{}: radius must be positive ({})", context, bone.radius));
    }

    if let Some(parent) = bone.parent {
        if parent >= total {
            return Err(format!("{}: invalid parent {} (only {} bones)", context, parent, total));
        }
        if parent == index {
            return Err(format!("{}: bone is its own parent", context));
        }
    }
    Ok(())
}

/// Check a scene against the limits. Cycles are caught when the skeleton is built.
pub fn validate_scene(scene: &SceneFile) -> Result<(), SceneError> {
    if scene.name.len() > limits::MAX_NAME_LEN {
        return Err(SceneError::ValidationError(format!(
            "scene name too long ({} > {})", scene.name.len(), limits::MAX_NAME_LEN)));
    }
    if scene.bones.len() > limits::MAX_BONES {
        return Err(SceneError::ValidationError(format!(
            "too many bones ({} > {})", scene.bones.len(), limits::MAX_BONES)));
    }
    for (i, bone) in scene.bones.iter().enumerate() {
        validate_bone(bone, i, scene.bones.len()).map_err(SceneError::ValidationError)?;
    }
    Ok(())
}

// ============================================================================
// Loading
// ============================================================================

/// Load a scene from a RON string
pub fn load_scene_from_str(s: &str) -> Result<Rig, SceneError> {
    let scene: SceneFile = ron::from_str(s)?;
    scene.into_rig()
}

/// Load a scene from a RON file
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Rig, SceneError> {
    let contents = fs::read_to_string(path)?;
    load_scene_from_str(&contents)
}

/// Save a rig's rest pose to a RON file
pub fn save_scene<P: AsRef<Path>>(rig: &Rig, path: P) -> Result<(), SceneError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());

    let ron_string = ron::ser::to_string_pretty(&SceneFile::from_rig(rig), config)?;
    fs::write(path, ron_string)?;
    Ok(())
}

/// Source of rigs addressed by asset name
pub trait SceneLoader {
    fn load_scene(&mut self, asset: &str) -> Result<Rig, SceneError>;
}

/// Loads `<root>/<asset>.ron` from disk
#[derive(Debug, Clone)]
pub struct RonSceneLoader {
    pub root: PathBuf,
}

impl RonSceneLoader {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Path an asset name resolves to. Names with an extension are used as given.
    pub fn resolve(&self, asset: &str) -> PathBuf {
        let path = Path::new(asset);
        if path.extension().is_some() {
            path.to_path_buf()
        } else {
            self.root.join(format!("{}.ron", asset))
        }
    }
}

impl SceneLoader for RonSceneLoader {
    fn load_scene(&mut self, asset: &str) -> Result<Rig, SceneError> {
        let path = self.resolve(asset);
        let rig = load_scene(&path)?;
        log::info!("loaded scene '{}' ({} bones) from {}", rig.name, rig.skeleton.len(), path.display());
        Ok(rig)
    }
}
