use rustc_hash::FxHashMap;

use crate::animation::pose::{BoneTransform, Pose};
use crate::errors::{PoseError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    /// `None` for a root bone.
    pub parent: Option<usize>,
    /// Bind-pose local transform.
    pub bind: BoneTransform,
}

impl Bone {
    #[must_use]
    pub fn new(name: impl Into<String>, parent: Option<usize>, bind: BoneTransform) -> Self {
        Self {
            name: name.into(),
            parent,
            bind,
        }
    }
}

/// Immutable bone hierarchy of one loaded model.
///
/// Built once per load; replacing the model replaces the whole skeleton.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub name: String,
    bones: Vec<Bone>,
    by_name: FxHashMap<String, usize>,
    children: Vec<Vec<usize>>,
}

impl Skeleton {
    /// Validates and indexes a bone list.
    ///
    /// Fails with `InvalidArgument` on duplicate names, out-of-range parents,
    /// or a cycle in the parent graph.
    pub fn new(name: impl Into<String>, bones: Vec<Bone>) -> Result<Self> {
        let count = bones.len();
        let mut by_name = FxHashMap::default();
        let mut children = vec![Vec::new(); count];

        for (index, bone) in bones.iter().enumerate() {
            if by_name.insert(bone.name.clone(), index).is_some() {
                return Err(PoseError::InvalidArgument(format!(
                    "duplicate bone name '{}'",
                    bone.name
                )));
            }
            if let Some(parent) = bone.parent {
                if parent >= count {
                    return Err(PoseError::InvalidArgument(format!(
                        "bone '{}' has parent index {parent} but the skeleton has {count} bones",
                        bone.name
                    )));
                }
                children[parent].push(index);
            }
        }

        // Walking up from every bone must reach a root within `count` steps.
        for (index, bone) in bones.iter().enumerate() {
            let mut cursor = bone.parent;
            let mut steps = 0;
            while let Some(parent) = cursor {
                steps += 1;
                if steps > count || parent == index {
                    return Err(PoseError::InvalidArgument(format!(
                        "bone '{}' is part of a parent cycle",
                        bone.name
                    )));
                }
                cursor = bones[parent].parent;
            }
        }

        Ok(Self {
            name: name.into(),
            bones,
            by_name,
            children,
        })
    }

    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    #[must_use]
    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Parent of bone `index`; `None` for roots and out-of-range indices.
    #[inline]
    #[must_use]
    pub fn parent_index(&self, index: usize) -> Option<usize> {
        self.bones.get(index).and_then(|b| b.parent)
    }

    #[inline]
    #[must_use]
    pub fn bind_transform(&self, index: usize) -> Option<&BoneTransform> {
        self.bones.get(index).map(|b| &b.bind)
    }

    /// Index of the named bone.
    pub fn find_by_name(&self, name: &str) -> Result<usize> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| PoseError::NotFound(format!("bone '{name}' in skeleton '{}'", self.name)))
    }

    /// Non-failing lookup for hot paths.
    #[inline]
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    #[must_use]
    pub fn children(&self, index: usize) -> &[usize] {
        self.children.get(index).map_or(&[][..], Vec::as_slice)
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent.is_none())
            .map(|(i, _)| i)
    }

    #[inline]
    #[must_use]
    pub fn is_root(&self, index: usize) -> bool {
        self.bones.get(index).is_some_and(|b| b.parent.is_none())
    }

    /// Number of ancestors of bone `index`.
    #[must_use]
    pub fn depth(&self, index: usize) -> usize {
        let mut depth = 0;
        let mut cursor = self.parent_index(index);
        while let Some(parent) = cursor {
            depth += 1;
            cursor = self.parent_index(parent);
        }
        depth
    }

    #[must_use]
    pub fn parents(&self) -> Vec<Option<usize>> {
        self.bones.iter().map(|b| b.parent).collect()
    }

    #[must_use]
    pub fn bind_pose(&self) -> Pose {
        Pose::new(self.bind_pose_transforms())
    }

    #[must_use]
    pub fn bind_pose_transforms(&self) -> Vec<BoneTransform> {
        self.bones.iter().map(|b| b.bind).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bones.iter().map(|b| b.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(name: &str, parent: Option<usize>) -> Bone {
        Bone::new(name, parent, BoneTransform::IDENTITY)
    }

    #[test]
    fn rejects_self_parent() {
        let err = Skeleton::new("s", vec![b("a", Some(0))]);
        assert!(matches!(err, Err(PoseError::InvalidArgument(_))));
    }

    #[test]
    fn rejects_two_bone_cycle() {
        let err = Skeleton::new("s", vec![b("a", Some(1)), b("b", Some(0))]);
        assert!(err.is_err());
    }

    #[test]
    fn accepts_parent_after_child() {
        let skel = Skeleton::new("s", vec![b("child", Some(1)), b("root", None)]).unwrap();
        assert_eq!(skel.depth(0), 1);
        assert_eq!(skel.children(1), &[0]);
        assert_eq!(skel.roots().collect::<Vec<_>>(), vec![1]);
    }
}
