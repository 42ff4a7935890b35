//! Retargeting Engine
//!
//! Drives a target skeleton from a source skeleton's current pose through a
//! [`MappingTable`].
//!
//! For a mapped pair the source bone's rotation is first expressed relative
//! to its own bind orientation, conjugated by the table's twist, and then
//! re-applied on top of the target bone's bind orientation:
//!
//! ```text
//! delta  = source_bind⁻¹ · source_local
//! target = target_bind · (twist⁻¹ · delta · twist)
//! ```
//!
//! A source bone at rest therefore puts the target bone at rest, whatever the
//! two rigs' bind orientations are. Unmapped target bones, and mappings whose
//! source name no longer resolves, fall back to the target bind transform.

use glam::Vec3;

use crate::animation::clip::AnimationClip;
use crate::animation::mapping::MappingTable;
use crate::animation::pose::{BoneTransform, Pose};
use crate::animation::skeleton::Skeleton;
use crate::animation::tracks::{TrackTarget, TransformTrack};
use crate::errors::{PoseError, Result};
use crate::settings::{RetargetSettings, TranslationPolicy};

/// Keyframe times closer than this are merged when retargeting a clip.
const MERGE_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, Default)]
pub struct Retargeter {
    pub settings: RetargetSettings,
}

impl Retargeter {
    #[must_use]
    pub fn new(settings: RetargetSettings) -> Self {
        Self { settings }
    }

    /// Resolves, for every target bone, the index of its mapped source bone.
    ///
    /// `None` marks bones that are unmapped or whose source name does not
    /// resolve in `source`.
    #[must_use]
    pub fn resolve(
        source: &Skeleton,
        target: &Skeleton,
        mapping: &MappingTable,
    ) -> Vec<Option<usize>> {
        target
            .names()
            .map(|name| {
                mapping
                    .source_bone_for(name)
                    .and_then(|source_name| source.index_of(source_name))
            })
            .collect()
    }

    /// Target local transform for one mapped pair.
    #[must_use]
    pub fn retarget_bone(
        &self,
        source_bind: &BoneTransform,
        source_local: &BoneTransform,
        target_bind: &BoneTransform,
        carry_translation: bool,
        mapping: &MappingTable,
    ) -> BoneTransform {
        let twist = mapping.twist();
        let twist_inv = twist.inverse();

        let delta = source_bind.rotation.inverse() * source_local.rotation;
        let rotation = (target_bind.rotation * (twist_inv * delta * twist)).normalize();

        let translation = if carry_translation {
            let offset = source_local.translation - source_bind.translation;
            target_bind.translation + twist_inv * offset * self.settings.translation_scale
        } else {
            target_bind.translation
        };

        let scale = target_bind.scale * safe_ratio(source_local.scale, source_bind.scale);

        BoneTransform {
            translation,
            rotation,
            scale,
        }
    }

    fn carries_translation(&self, target: &Skeleton, index: usize) -> bool {
        match self.settings.translations {
            TranslationPolicy::All => true,
            TranslationPolicy::RootOnly => target.is_root(index),
            TranslationPolicy::None => false,
        }
    }

    /// Recomputes the whole target pose from the source pose. Never fails.
    pub fn retarget_pose(
        &self,
        source: &Skeleton,
        source_pose: &Pose,
        target: &Skeleton,
        mapping: &MappingTable,
        out: &mut Pose,
    ) {
        out.reset_to_bind(target);

        for (index, bone) in target.bones().iter().enumerate() {
            let Some(source_name) = mapping.source_bone_for(&bone.name) else {
                continue;
            };
            let Some(source_index) = source.index_of(source_name) else {
                log::trace!(
                    "Source bone '{source_name}' for '{}' is not in '{}'",
                    bone.name,
                    source.name
                );
                continue;
            };
            let (Some(source_bind), Some(source_local)) = (
                source.bind_transform(source_index),
                source_pose.get(source_index),
            ) else {
                continue;
            };

            let carry = self.carries_translation(target, index);
            out.set(
                index,
                self.retarget_bone(source_bind, source_local, &bone.bind, carry, mapping),
            );
        }
    }

    /// Builds a clip for `target` by retargeting `clip` (which animates `source`).
    ///
    /// The result is sampled at every keyframe time of the source tracks that
    /// drive mapped bones, and has one track per resolvable target bone.
    pub fn retarget_clip(
        &self,
        source: &Skeleton,
        clip: &AnimationClip,
        target: &Skeleton,
        mapping: &MappingTable,
        name: &str,
    ) -> Result<AnimationClip> {
        let resolved = Self::resolve(source, target, mapping);
        let mapped: Vec<(usize, usize)> = resolved
            .iter()
            .enumerate()
            .filter_map(|(t, s)| s.map(|s| (t, s)))
            .collect();
        if mapped.is_empty() {
            return Err(PoseError::InvalidArgument(format!(
                "no bone of '{}' maps to a bone of '{}'",
                target.name, source.name
            )));
        }

        let times = Self::sample_times(clip, &mapped);
        let has_scale = |source_index: usize| {
            clip.bone_track(source_index)
                .is_some_and(|t| t.scales().is_some())
        };

        let mut source_pose = Pose::default();
        let mut target_pose = Pose::default();
        let mut frames: Vec<Vec<BoneTransform>> = vec![Vec::with_capacity(times.len()); mapped.len()];
        for &time in &times {
            clip.sample_pose(source, time, &mut source_pose);
            self.retarget_pose(source, &source_pose, target, mapping, &mut target_pose);
            for (frame, &(target_index, _)) in frames.iter_mut().zip(&mapped) {
                if let Some(transform) = target_pose.get(target_index) {
                    frame.push(*transform);
                }
            }
        }

        let mut tracks = Vec::with_capacity(mapped.len());
        for (frame, &(target_index, source_index)) in frames.iter().zip(&mapped) {
            let translations = self
                .carries_translation(target, target_index)
                .then(|| frame.iter().map(|f| f.translation).collect());
            let rotations = Some(frame.iter().map(|f| f.rotation).collect());
            let scales = has_scale(source_index).then(|| frame.iter().map(|f| f.scale).collect());
            tracks.push(TransformTrack::new(
                TrackTarget::Bone(target_index),
                times.clone(),
                translations,
                rotations,
                scales,
            )?);
        }

        log::info!(
            "Retargeted '{}' onto '{}' as '{name}': {} tracks, {} samples each",
            clip.name,
            target.name,
            tracks.len(),
            times.len()
        );
        Ok(AnimationClip::new(name, tracks))
    }

    /// Sorted, de-duplicated keyframe times of the tracks that drive mapped bones.
    fn sample_times(clip: &AnimationClip, mapped: &[(usize, usize)]) -> Vec<f32> {
        let mut times: Vec<f32> = mapped
            .iter()
            .filter_map(|&(_, source_index)| clip.bone_track(source_index))
            .flat_map(|track| track.times().iter().copied())
            .collect();
        times.push(0.0);
        times.push(clip.duration());
        times.sort_by(f32::total_cmp);
        times.dedup_by(|a, b| (*a - *b).abs() < MERGE_EPSILON);
        // Merging keeps the earlier time; the clip must still end on its duration.
        if let Some(last) = times.last_mut() {
            *last = clip.duration();
        }
        times
    }
}

#[inline]
fn safe_ratio(numerator: Vec3, denominator: Vec3) -> Vec3 {
    let pick = |n: f32, d: f32| if d.abs() > f32::EPSILON { n / d } else { 1.0 };
    Vec3::new(
        pick(numerator.x, denominator.x),
        pick(numerator.y, denominator.y),
        pick(numerator.z, denominator.z),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_ratio_ignores_zero_denominators() {
        let r = safe_ratio(Vec3::new(2.0, 3.0, 4.0), Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(r, Vec3::new(2.0, 1.0, 2.0));
    }
}
