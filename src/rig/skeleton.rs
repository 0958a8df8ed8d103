//! Skeleton arena
//!
//! Bones live in a flat `Vec` and reference each other by index: each bone
//! keeps its parent index and the indices of its children. Posed state
//! (position, endpoint, rotation) is always derived from the rest pose and
//! the local rotations of the bone and its ancestors.

use macroquad::math::{Quat, Vec3};

/// Error type for skeleton construction
#[derive(Debug, Clone, PartialEq)]
pub enum SkeletonError {
    /// Parent index does not name a bone
    ParentOutOfRange { bone: usize, parent: usize },
    /// Bone lists itself as its parent
    SelfParent(usize),
    /// Following parents from this bone loops back on itself
    Cycle(usize),
    /// Pose has a different bone count than the skeleton
    PoseLength { expected: usize, got: usize },
}

impl std::fmt::Display for SkeletonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkeletonError::ParentOutOfRange { bone, parent } => {
                write!(f, "bone {} has parent {} which does not exist", bone, parent)
            }
            SkeletonError::SelfParent(bone) => write!(f, "bone {} is its own parent", bone),
            SkeletonError::Cycle(bone) => write!(f, "bone {} is part of a parent cycle", bone),
            SkeletonError::PoseLength { expected, got } => {
                write!(f, "pose has {} rotations, skeleton has {} bones", got, expected)
            }
        }
    }
}

impl std::error::Error for SkeletonError {}

/// A rigid segment of the skeleton
#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,

    // Rest pose (from the scene file, never edited)
    pub(crate) rest_position: Vec3,
    pub(crate) rest_endpoint: Vec3,

    // Posed state, world space
    pub(crate) position: Vec3,
    pub(crate) endpoint: Vec3,
    pub(crate) rotation: Quat,
    /// Rotation applied to this bone itself since the rest pose ("T")
    pub(crate) local_rotation: Quat,

    /// Pick radius around the bone axis
    pub radius: f32,
    pub(crate) highlighted: bool,
}

impl Bone {
    pub fn new(rest_position: Vec3, rest_endpoint: Vec3, radius: f32) -> Self {
        Self {
            name: String::new(),
            parent: None,
            children: Vec::new(),
            rest_position,
            rest_endpoint,
            position: rest_position,
            endpoint: rest_endpoint,
            rotation: Quat::IDENTITY,
            local_rotation: Quat::IDENTITY,
            radius,
            highlighted: false,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn rest_position(&self) -> Vec3 {
        self.rest_position
    }

    pub fn rest_endpoint(&self) -> Vec3 {
        self.rest_endpoint
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn endpoint(&self) -> Vec3 {
        self.endpoint
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn local_rotation(&self) -> Quat {
        self.local_rotation
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// Bone vector in rest pose (endpoint relative to position)
    pub fn rest_offset(&self) -> Vec3 {
        self.rest_endpoint - self.rest_position
    }

    pub fn length(&self) -> f32 {
        (self.endpoint - self.position).length()
    }

    fn reset(&mut self) {
        self.position = self.rest_position;
        self.endpoint = self.rest_endpoint;
        self.rotation = Quat::IDENTITY;
        self.local_rotation = Quat::IDENTITY;
    }
}

/// Posed state of one bone, as computed from scratch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonePose {
    pub position: Vec3,
    pub endpoint: Vec3,
    pub rotation: Quat,
}

#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Skeleton {
    /// Build the arena, filling in child lists from parent links
    pub fn new(mut bones: Vec<Bone>) -> Result<Self, SkeletonError> {
        let count = bones.len();
        for (idx, bone) in bones.iter().enumerate() {
            match bone.parent {
                Some(parent) if parent == idx => return Err(SkeletonError::SelfParent(idx)),
                Some(parent) if parent >= count => {
                    return Err(SkeletonError::ParentOutOfRange { bone: idx, parent })
                }
                _ => {}
            }
        }

        // A chain longer than the bone count must revisit a bone
        for start in 0..count {
            let mut current = bones[start].parent;
            let mut steps = 0;
            while let Some(parent) = current {
                steps += 1;
                if steps > count {
                    return Err(SkeletonError::Cycle(start));
                }
                current = bones[parent].parent;
            }
        }

        for bone in bones.iter_mut() {
            bone.children.clear();
        }
        for idx in 0..count {
            if let Some(parent) = bones[idx].parent {
                bones[parent].children.push(idx);
            }
        }

        let mut skeleton = Self { bones };
        skeleton.reset_to_rest();
        Ok(skeleton)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter()
    }

    /// Indices of bones without a parent
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent.is_none())
            .map(|(i, _)| i)
    }

    /// Index of the highlighted bone, if any
    pub fn highlighted(&self) -> Option<usize> {
        self.bones.iter().position(|b| b.highlighted)
    }

    /// Highlight one bone (or none), clearing every other highlight
    pub fn set_highlighted(&mut self, index: Option<usize>) {
        for (i, bone) in self.bones.iter_mut().enumerate() {
            bone.highlighted = Some(i) == index;
        }
    }

    /// Put every bone back in its rest pose
    pub fn reset_to_rest(&mut self) {
        for bone in &mut self.bones {
            bone.reset();
        }
    }

    /// Snapshot of every bone's local rotation, in bone order
    pub fn local_rotations(&self) -> Vec<Quat> {
        self.bones.iter().map(|b| b.local_rotation).collect()
    }

    /// Replace every bone's local rotation and re-pose the whole skeleton
    pub fn apply_local_rotations(&mut self, rotations: &[Quat]) -> Result<(), SkeletonError> {
        if rotations.len() != self.bones.len() {
            return Err(SkeletonError::PoseLength {
                expected: self.bones.len(),
                got: rotations.len(),
            });
        }
        for (bone, rotation) in self.bones.iter_mut().zip(rotations) {
            bone.local_rotation = *rotation;
        }
        let poses = self.solve_pose();
        for (bone, pose) in self.bones.iter_mut().zip(poses) {
            bone.position = pose.position;
            bone.endpoint = pose.endpoint;
            bone.rotation = pose.rotation;
        }
        Ok(())
    }

    /// Compute every bone's pose from scratch: rest offsets composed with
    /// the local rotations along each ancestor chain
    pub fn solve_pose(&self) -> Vec<BonePose> {
        let mut poses: Vec<Option<BonePose>> = vec![None; self.bones.len()];
        let mut stack: Vec<usize> = self.roots().collect();

        while let Some(idx) = stack.pop() {
            let bone = &self.bones[idx];
            let (position, rotation) = match bone.parent.and_then(|p| poses[p].map(|pose| (p, pose))) {
                Some((parent, parent_pose)) => {
                    let parent_bone = &self.bones[parent];
                    (
                        parent_pose.position
                            + parent_pose.rotation * (bone.rest_position - parent_bone.rest_position),
                        parent_pose.rotation * bone.local_rotation,
                    )
                }
                None => (bone.rest_position, bone.local_rotation),
            };
            poses[idx] = Some(BonePose {
                position,
                endpoint: position + rotation * bone.rest_offset(),
                rotation,
            });
            stack.extend(bone.children.iter().copied());
        }

        poses
            .into_iter()
            .zip(&self.bones)
            .map(|(pose, bone)| {
                pose.unwrap_or(BonePose {
                    position: bone.rest_position,
                    endpoint: bone.rest_endpoint,
                    rotation: Quat::IDENTITY,
                })
            })
            .collect()
    }

    /// Re-pose every descendant of `index` from its parent, parents first
    pub(crate) fn propagate_from(&mut self, index: usize) {
        let Some(bone) = self.bones.get(index) else { return };
        let mut stack: Vec<usize> = bone.children.clone();

        while let Some(child) = stack.pop() {
            let Some(parent) = self.bones[child].parent else { continue };
            let (parent_rotation, parent_position, parent_rest) = {
                let p = &self.bones[parent];
                (p.rotation, p.position, p.rest_position)
            };

            let c = &mut self.bones[child];
            c.rotation = parent_rotation * c.local_rotation;
            c.position = parent_position + parent_rotation * (c.rest_position - parent_rest);
            c.endpoint = c.position + c.rotation * (c.rest_endpoint - c.rest_position);

            stack.extend(self.bones[child].children.iter().copied());
        }
    }

    pub(crate) fn bone_mut(&mut self, index: usize) -> Option<&mut Bone> {
        self.bones.get_mut(index)
    }
}
