use glam::{Affine3A, Quat, Vec3};

use crate::animation::skeleton::Skeleton;

/// Local translation/rotation/scale of one bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl BoneTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    #[must_use]
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    #[inline]
    #[must_use]
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Live pose buffer: one local transform per skeleton bone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pose {
    transforms: Vec<BoneTransform>,
}

impl Pose {
    #[must_use]
    pub fn new(transforms: Vec<BoneTransform>) -> Self {
        Self { transforms }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, bone: usize) -> Option<&BoneTransform> {
        self.transforms.get(bone)
    }

    #[inline]
    #[must_use]
    pub fn transforms(&self) -> &[BoneTransform] {
        &self.transforms
    }

    /// Overwrites one bone. Out-of-range indices are ignored.
    pub fn set(&mut self, bone: usize, transform: BoneTransform) {
        if let Some(slot) = self.transforms.get_mut(bone) {
            *slot = transform;
        }
    }

    /// Resets every bone to the skeleton's bind transform, resizing to match.
    pub fn reset_to_bind(&mut self, skeleton: &Skeleton) {
        self.transforms.clear();
        self.transforms
            .extend(skeleton.bones().iter().map(|bone| bone.bind));
    }

    /// Model-space matrices, given each bone's parent index.
    ///
    /// Parents are resolved lazily so bone order does not matter.
    #[must_use]
    pub fn model_matrices(&self, parents: &[Option<usize>]) -> Vec<Affine3A> {
        let count = self.transforms.len();
        let mut result: Vec<Option<Affine3A>> = vec![None; count];

        for start in 0..count {
            let mut chain = Vec::new();
            let mut cursor = Some(start);
            while let Some(i) = cursor {
                if result[i].is_some() {
                    break;
                }
                chain.push(i);
                cursor = parents.get(i).copied().flatten().filter(|&p| p < count);
            }
            while let Some(i) = chain.pop() {
                let local = self.transforms[i].to_affine();
                let parent = parents
                    .get(i)
                    .copied()
                    .flatten()
                    .and_then(|p| result.get(p).copied().flatten());
                result[i] = Some(parent.map_or(local, |p| p * local));
            }
        }

        result.into_iter().map(Option::unwrap_or_default).collect()
    }
}
