//! Keyframe Track Editing
//!
//! On-demand operations that derive new keyframe data from existing data:
//!
//! - [`TransformTrack::resample_to_count`] / [`TransformTrack::resample_to_rate`]:
//!   re-time a track onto evenly spaced samples spanning `[0, duration]`
//! - [`TransformTrack::reduce`]: keep every Nth keyframe
//! - [`TransformTrack::wrap`]: make the final keyframe blend back towards the
//!   first so the animation loops without a pose jump
//! - [`TransformTrack::truncate`], [`TransformTrack::reversed`],
//!   [`TransformTrack::rescaled`], [`TransformTrack::normalize_rotations`]
//!
//! Track operations are pure: they return a new track and leave `self`
//! untouched. The [`AnimationClip`] wrappers validate first and swap the whole
//! track list in only after every track succeeded, so a failed edit never
//! leaves a clip half-modified.

use glam::Quat;

use crate::animation::clip::AnimationClip;
use crate::animation::pose::BoneTransform;
use crate::animation::tracks::TransformTrack;
use crate::animation::values::slerp_shortest;
use crate::errors::{PoseError, Result};

/// Times closer than this are treated as the same instant.
const TIME_EPSILON: f32 = 1e-5;

/// Upper bound on the keyframes a single resample may produce.
pub const MAX_SAMPLES: usize = 1_000_000;

fn check_duration(duration: f32) -> Result<()> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(PoseError::InvalidArgument(format!(
            "duration must be positive, got {duration}"
        )));
    }
    Ok(())
}

/// Blends two transforms: `weight = 0` gives `a`, `weight = 1` gives `b`.
#[must_use]
pub fn blend(a: &BoneTransform, b: &BoneTransform, weight: f32) -> BoneTransform {
    BoneTransform {
        translation: a.translation.lerp(b.translation, weight),
        rotation: slerp_shortest(a.rotation, b.rotation, weight),
        scale: a.scale.lerp(b.scale, weight),
    }
}

impl TransformTrack {
    fn sample_all(&self, times: &[f32]) -> Vec<BoneTransform> {
        times
            .iter()
            .map(|&t| self.sample_over(t, &BoneTransform::IDENTITY))
            .collect()
    }

    /// Resamples onto `count` evenly spaced times spanning `[0, duration]`.
    pub fn resample_to_count(&self, duration: f32, count: usize) -> Result<Self> {
        check_duration(duration)?;
        if !(2..=MAX_SAMPLES).contains(&count) {
            return Err(PoseError::InvalidArgument(format!(
                "resampling needs between 2 and {MAX_SAMPLES} samples, got {count}"
            )));
        }

        let last = (count - 1) as f32;
        let times: Vec<f32> = (0..count)
            .map(|i| {
                if i == count - 1 {
                    duration
                } else {
                    duration * i as f32 / last
                }
            })
            .collect();

        let samples = self.sample_all(&times);
        Ok(self.rebuild(times, &samples))
    }

    /// Resamples at a fixed `rate` (samples per second) over `[0, duration]`.
    ///
    /// The final sample always lands exactly on `duration`.
    pub fn resample_to_rate(&self, duration: f32, rate: f32) -> Result<Self> {
        check_duration(duration)?;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(PoseError::InvalidArgument(format!(
                "sample rate must be positive, got {rate}"
            )));
        }

        let span = f64::from(duration) * f64::from(rate);
        if span >= MAX_SAMPLES as f64 {
            return Err(PoseError::InvalidArgument(format!(
                "resampling {duration}s at {rate} per second exceeds {MAX_SAMPLES} samples"
            )));
        }

        let interval = rate.recip();
        let steps = span.ceil() as usize;
        let mut times = Vec::with_capacity(steps + 1);
        for k in 0..=steps {
            let t = k as f32 * interval;
            if t >= duration - TIME_EPSILON {
                break;
            }
            times.push(t);
        }
        times.push(duration);

        let samples = self.sample_all(&times);
        Ok(self.rebuild(times, &samples))
    }

    /// Keeps every `factor`-th keyframe, always including the first and last.
    pub fn reduce(&self, factor: usize) -> Result<Self> {
        if factor < 1 {
            return Err(PoseError::InvalidArgument(
                "reduction factor must be at least 1".to_string(),
            ));
        }
        if factor == 1 {
            return Ok(self.clone());
        }

        let last = self.keyframe_count() - 1;
        let mut indices: Vec<usize> = (0..=last).step_by(factor).collect();
        if indices.last() != Some(&last) {
            indices.push(last);
        }
        Ok(self.select(&indices))
    }

    /// Sets a final keyframe at `duration` blended between the first and last keyframes.
    ///
    /// `weight = 0` repeats the first keyframe, `weight = 1` repeats the last.
    /// An existing keyframe at `duration` is overwritten.
    pub fn wrap(&self, duration: f32, weight: f32) -> Result<Self> {
        check_duration(duration)?;
        if !(0.0..=1.0).contains(&weight) {
            return Err(PoseError::InvalidArgument(format!(
                "wrap weight must be within [0, 1], got {weight}"
            )));
        }
        let last_time = self.last_time();
        if last_time > duration + TIME_EPSILON {
            return Err(PoseError::InvalidArgument(format!(
                "track ends at {last_time}, after the wrap time {duration}"
            )));
        }

        let count = self.keyframe_count();
        let first = self.keyframe(0, &BoneTransform::IDENTITY);
        let last = self.keyframe(count - 1, &BoneTransform::IDENTITY);
        let end = blend(&first, &last, weight);

        let mut times = self.times().to_vec();
        let mut samples: Vec<BoneTransform> = (0..count)
            .map(|i| self.keyframe(i, &BoneTransform::IDENTITY))
            .collect();

        if (duration - last_time).abs() <= TIME_EPSILON {
            times[count - 1] = duration;
            samples[count - 1] = end;
        } else {
            times.push(duration);
            samples.push(end);
        }

        Ok(self.rebuild(times, &samples))
    }

    /// Drops keyframes at or after `end_time`, ending on an interpolated key.
    pub fn truncate(&self, end_time: f32) -> Result<Self> {
        if !end_time.is_finite() || end_time < 0.0 {
            return Err(PoseError::InvalidArgument(format!(
                "truncation time must be non-negative, got {end_time}"
            )));
        }
        if end_time >= self.last_time() {
            return Ok(self.clone());
        }

        let end_sample = self.sample_over(end_time, &BoneTransform::IDENTITY);
        let kept = self.times().partition_point(|&t| t < end_time - TIME_EPSILON);

        let mut times = self.times()[..kept].to_vec();
        let mut samples: Vec<BoneTransform> = (0..kept)
            .map(|i| self.keyframe(i, &BoneTransform::IDENTITY))
            .collect();
        times.push(end_time);
        samples.push(end_sample);

        Ok(self.rebuild(times, &samples))
    }

    /// Plays the track backwards over `[0, duration]`.
    pub fn reversed(&self, duration: f32) -> Result<Self> {
        check_duration(duration)?;
        if self.last_time() > duration + TIME_EPSILON {
            return Err(PoseError::InvalidArgument(format!(
                "track ends at {}, after the clip duration {duration}",
                self.last_time()
            )));
        }

        let count = self.keyframe_count();
        let times: Vec<f32> = self
            .times()
            .iter()
            .rev()
            .map(|&t| (duration - t).max(0.0))
            .collect();
        let samples: Vec<BoneTransform> = (0..count)
            .rev()
            .map(|i| self.keyframe(i, &BoneTransform::IDENTITY))
            .collect();

        Ok(self.rebuild(times, &samples))
    }

    /// Uniformly stretches keyframe times from `old_duration` to `new_duration`.
    pub fn rescaled(&self, old_duration: f32, new_duration: f32) -> Result<Self> {
        check_duration(old_duration)?;
        check_duration(new_duration)?;

        let factor = new_duration / old_duration;
        let times: Vec<f32> = self.times().iter().map(|&t| t * factor).collect();
        if times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(PoseError::InvalidArgument(format!(
                "rescaling to {new_duration} would merge keyframes"
            )));
        }
        let samples: Vec<BoneTransform> = (0..self.keyframe_count())
            .map(|i| self.keyframe(i, &BoneTransform::IDENTITY))
            .collect();
        Ok(self.rebuild(times, &samples))
    }

    /// Re-normalizes rotation keys and keeps consecutive keys in the same hemisphere.
    pub fn normalize_rotations(&mut self) {
        if let Some(rotations) = self.rotations_mut() {
            let mut previous: Option<Quat> = None;
            for q in rotations.iter_mut() {
                let mut n = q.normalize();
                if let Some(p) = previous
                    && p.dot(n) < 0.0
                {
                    n = -n;
                }
                *q = n;
                previous = Some(n);
            }
        }
    }
}

impl AnimationClip {
    /// Applies `edit` to every track, replacing them only if all succeed.
    fn edit_tracks<F>(&mut self, what: &str, edit: F) -> Result<()>
    where
        F: Fn(&TransformTrack) -> Result<TransformTrack>,
    {
        let tracks = self.tracks.iter().map(edit).collect::<Result<Vec<_>>>()?;
        self.tracks = tracks;
        log::debug!("{what} '{}': {} keyframes", self.name, self.keyframe_count());
        Ok(())
    }

    pub fn resample_to_count(&mut self, count: usize) -> Result<()> {
        let duration = self.duration();
        check_duration(duration)?;
        self.edit_tracks("Resampled", |t| t.resample_to_count(duration, count))
    }

    pub fn resample_to_rate(&mut self, rate: f32) -> Result<()> {
        let duration = self.duration();
        check_duration(duration)?;
        self.edit_tracks("Resampled", |t| t.resample_to_rate(duration, rate))
    }

    pub fn reduce(&mut self, factor: usize) -> Result<()> {
        self.edit_tracks("Reduced", |t| t.reduce(factor))
    }

    pub fn wrap(&mut self, weight: f32) -> Result<()> {
        let duration = self.duration();
        self.edit_tracks("Wrapped", |t| t.wrap(duration, weight))
    }

    pub fn truncate(&mut self, end_time: f32) -> Result<()> {
        self.edit_tracks("Truncated", |t| t.truncate(end_time))
    }

    pub fn reverse(&mut self) -> Result<()> {
        let duration = self.duration();
        self.edit_tracks("Reversed", |t| t.reversed(duration))
    }

    pub fn set_duration(&mut self, new_duration: f32) -> Result<()> {
        let duration = self.duration();
        self.edit_tracks("Rescaled", |t| t.rescaled(duration, new_duration))
    }

    pub fn normalize_rotations(&mut self) {
        for track in &mut self.tracks {
            track.normalize_rotations();
        }
    }
}
