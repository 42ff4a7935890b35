// src/animation/tracks.rs
use glam::{Quat, Vec3};

use crate::animation::pose::BoneTransform;
use crate::animation::values::Interpolatable;
use crate::errors::{PoseError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Linear,
    Step,
}

/// What a track animates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrackTarget {
    /// A bone of the owning model's skeleton, by index.
    Bone(usize),
    /// A named non-bone spatial (attachment node, camera, ...).
    Spatial(String),
}

const MAX_SCAN_OFFSET: usize = 3;

/// Tolerance used when validating that rotation keys are unit quaternions.
const UNIT_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Clone, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

/// Keyframe sequence of `(time, translation, rotation, scale)` samples.
///
/// All channels share `times`. A channel that never varies may be omitted;
/// sampling then falls back to the caller-supplied base transform.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformTrack {
    pub target: TrackTarget,
    pub interpolation: InterpolationMode,
    times: Vec<f32>,
    translations: Option<Vec<Vec3>>,
    rotations: Option<Vec<Quat>>,
    scales: Option<Vec<Vec3>>,
}

impl TransformTrack {
    /// Builds a validated track.
    ///
    /// Times must be finite, non-negative and strictly increasing; every
    /// present channel must have one value per time and rotations must be
    /// unit length.
    pub fn new(
        target: TrackTarget,
        times: Vec<f32>,
        translations: Option<Vec<Vec3>>,
        rotations: Option<Vec<Quat>>,
        scales: Option<Vec<Vec3>>,
    ) -> Result<Self> {
        if times.is_empty() {
            return Err(PoseError::InvalidArgument(
                "a track needs at least one keyframe".to_string(),
            ));
        }
        if let Some(bad) = times.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(PoseError::InvalidArgument(format!(
                "keyframe time {bad} is negative or not finite"
            )));
        }
        if let Some(pair) = times.windows(2).find(|w| w[1] <= w[0]) {
            return Err(PoseError::InvalidArgument(format!(
                "keyframe times must strictly increase ({} then {})",
                pair[0], pair[1]
            )));
        }

        let len = times.len();
        check_channel_len("translation", translations.as_deref(), len)?;
        check_channel_len("rotation", rotations.as_deref(), len)?;
        check_channel_len("scale", scales.as_deref(), len)?;

        if let Some(q) = rotations
            .iter()
            .flatten()
            .find(|q| (q.length() - 1.0).abs() > UNIT_TOLERANCE)
        {
            return Err(PoseError::InvalidArgument(format!(
                "rotation key {q} is not a unit quaternion"
            )));
        }

        Ok(Self {
            target,
            interpolation: InterpolationMode::Linear,
            times,
            translations,
            rotations,
            scales,
        })
    }

    /// Internal constructor for edit operations that already uphold the invariants.
    pub(crate) fn from_parts(
        target: TrackTarget,
        interpolation: InterpolationMode,
        times: Vec<f32>,
        translations: Option<Vec<Vec3>>,
        rotations: Option<Vec<Quat>>,
        scales: Option<Vec<Vec3>>,
    ) -> Self {
        debug_assert!(!times.is_empty());
        debug_assert!(times.windows(2).all(|w| w[0] < w[1]));
        Self {
            target,
            interpolation,
            times,
            translations,
            rotations,
            scales,
        }
    }

    #[must_use]
    pub fn with_interpolation(mut self, interpolation: InterpolationMode) -> Self {
        self.interpolation = interpolation;
        self
    }

    #[inline]
    #[must_use]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    #[inline]
    #[must_use]
    pub fn translations(&self) -> Option<&[Vec3]> {
        self.translations.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn rotations(&self) -> Option<&[Quat]> {
        self.rotations.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn scales(&self) -> Option<&[Vec3]> {
        self.scales.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn keyframe_count(&self) -> usize {
        self.times.len()
    }

    #[inline]
    #[must_use]
    pub fn first_time(&self) -> f32 {
        self.times[0]
    }

    #[inline]
    #[must_use]
    pub fn last_time(&self) -> f32 {
        self.times[self.times.len() - 1]
    }

    /// Stored values of keyframe `index`, absent channels taken from `base`.
    #[must_use]
    pub fn keyframe(&self, index: usize, base: &BoneTransform) -> BoneTransform {
        BoneTransform {
            translation: channel_at(self.translations.as_deref(), index, base.translation),
            rotation: channel_at(self.rotations.as_deref(), index, base.rotation),
            scale: channel_at(self.scales.as_deref(), index, base.scale),
        }
    }

    /// Evaluates the track at `time`, absent channels reported as identity.
    #[must_use]
    pub fn sample(&self, time: f32) -> BoneTransform {
        self.sample_over(time, &BoneTransform::IDENTITY)
    }

    /// Evaluates the track at `time`, absent channels taken from `base`.
    ///
    /// Outside `[first_time, last_time]` the boundary keyframe is held.
    #[must_use]
    pub fn sample_over(&self, time: f32, base: &BoneTransform) -> BoneTransform {
        // partition_point finds the first index where t > time, i.e. next_index
        let next_idx = self.times.partition_point(|&t| t <= time);
        let index = next_idx.saturating_sub(1);
        self.sample_at_frame(index, time, base)
    }

    /// Sampling with cursor.
    /// cursor: mutable reference that will be updated.
    pub fn sample_with_cursor(
        &self,
        time: f32,
        cursor: &mut KeyframeCursor,
        base: &BoneTransform,
    ) -> BoneTransform {
        let len = self.times.len();
        // Fast path: static data (single keyframe)
        if len == 1 {
            return self.keyframe(0, base);
        }

        let i = cursor.last_index.min(len - 1);
        let t_curr = self.times[i];

        let found_index = if time >= t_curr {
            // Forward playback: scan ahead a few intervals
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = i + offset;
                if idx >= len - 1 {
                    if time >= self.times[len - 1] {
                        res = Some(len - 1);
                    }
                    break;
                }
                if time < self.times[idx + 1] {
                    res = Some(idx);
                    break;
                }
            }
            res
        } else {
            // Reverse playback or loop reset: scan back a few intervals
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                if i < offset {
                    break;
                }
                let idx = i - offset;
                if time >= self.times[idx] {
                    res = Some(idx);
                    break;
                }
            }
            res
        };

        let final_index = found_index.unwrap_or_else(|| {
            // Large jump (scrubbing / wrap): binary search
            let next_idx = self.times.partition_point(|&t| t <= time);
            next_idx.saturating_sub(1)
        });
        cursor.last_index = final_index;

        self.sample_at_frame(final_index, time, base)
    }

    fn sample_at_frame(&self, index: usize, time: f32, base: &BoneTransform) -> BoneTransform {
        let len = self.times.len();

        if index >= len - 1 {
            return self.keyframe(len - 1, base);
        }

        let next_idx = index + 1;
        let t0 = self.times[index];
        let t1 = self.times[next_idx];
        let dt = t1 - t0;

        let t = if dt > 1e-6 { (time - t0) / dt } else { 0.0 };
        let t = t.clamp(0.0, 1.0);

        match self.interpolation {
            InterpolationMode::Step => self.keyframe(index, base),
            InterpolationMode::Linear => BoneTransform {
                translation: lerp_channel(self.translations.as_deref(), index, t, base.translation),
                rotation: lerp_channel(self.rotations.as_deref(), index, t, base.rotation),
                scale: lerp_channel(self.scales.as_deref(), index, t, base.scale),
            },
        }
    }

    /// Replaces every channel from a list of full transforms.
    ///
    /// Channels absent in `self` stay absent.
    pub(crate) fn rebuild(&self, times: Vec<f32>, samples: &[BoneTransform]) -> Self {
        Self::from_parts(
            self.target.clone(),
            self.interpolation,
            times,
            self.translations
                .as_ref()
                .map(|_| samples.iter().map(|s| s.translation).collect()),
            self.rotations
                .as_ref()
                .map(|_| samples.iter().map(|s| s.rotation).collect()),
            self.scales
                .as_ref()
                .map(|_| samples.iter().map(|s| s.scale).collect()),
        )
    }

    /// Keeps only the keyframes whose indices are listed (ascending).
    pub(crate) fn select(&self, indices: &[usize]) -> Self {
        Self {
            target: self.target.clone(),
            interpolation: self.interpolation,
            times: pick(&self.times, indices),
            translations: self.translations.as_ref().map(|v| pick(v, indices)),
            rotations: self.rotations.as_ref().map(|v| pick(v, indices)),
            scales: self.scales.as_ref().map(|v| pick(v, indices)),
        }
    }

    pub(crate) fn rotations_mut(&mut self) -> Option<&mut Vec<Quat>> {
        self.rotations.as_mut()
    }
}

fn check_channel_len<T>(name: &str, channel: Option<&[T]>, expected: usize) -> Result<()> {
    match channel {
        Some(values) if values.len() != expected => Err(PoseError::InvalidArgument(format!(
            "{name} channel has {} values for {expected} keyframes",
            values.len()
        ))),
        _ => Ok(()),
    }
}

fn pick<T: Copy>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| values[i]).collect()
}

#[inline]
fn channel_at<T: Copy>(channel: Option<&[T]>, index: usize, fallback: T) -> T {
    channel.map_or(fallback, |values| values[index])
}

#[inline]
fn lerp_channel<T: Interpolatable>(channel: Option<&[T]>, index: usize, t: f32, fallback: T) -> T {
    match channel {
        Some(values) => T::interpolate_linear(&values[index], &values[index + 1], t),
        None => fallback,
    }
}
