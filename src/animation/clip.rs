use crate::animation::pose::Pose;
use crate::animation::skeleton::Skeleton;
use crate::animation::tracks::{KeyframeCursor, TrackTarget, TransformTrack};
use crate::errors::{PoseError, Result};

/// Named set of tracks sharing one duration.
///
/// The duration is never stored: it is the latest keyframe time over all
/// tracks, so editing a final keyframe changes it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub tracks: Vec<TransformTrack>,
}

impl AnimationClip {
    #[must_use]
    pub fn new(name: impl Into<String>, tracks: Vec<TransformTrack>) -> Self {
        Self {
            name: name.into(),
            tracks,
        }
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        self.tracks
            .iter()
            .map(TransformTrack::last_time)
            .fold(0.0_f32, f32::max)
    }

    #[inline]
    #[must_use]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// The track driving bone `index`, if any.
    #[must_use]
    pub fn bone_track(&self, index: usize) -> Option<&TransformTrack> {
        self.tracks
            .iter()
            .find(|t| t.target == TrackTarget::Bone(index))
    }

    #[must_use]
    pub fn spatial_track(&self, name: &str) -> Option<&TransformTrack> {
        self.tracks
            .iter()
            .find(|t| matches!(&t.target, TrackTarget::Spatial(n) if n == name))
    }

    /// Poses `skeleton` at `time`.
    ///
    /// Bones without a track, and channels a track omits, keep the bind
    /// transform. Tracks aimed at bones the skeleton lacks are skipped.
    pub fn sample_pose(&self, skeleton: &Skeleton, time: f32, out: &mut Pose) {
        out.reset_to_bind(skeleton);
        for track in &self.tracks {
            if let TrackTarget::Bone(index) = track.target
                && let Some(bind) = skeleton.bind_transform(index)
            {
                out.set(index, track.sample_over(time, bind));
            }
        }
    }

    /// Like [`Self::sample_pose`], reusing one cursor per track for sequential playback.
    pub fn sample_pose_with_cursors(
        &self,
        skeleton: &Skeleton,
        time: f32,
        cursors: &mut Vec<KeyframeCursor>,
        out: &mut Pose,
    ) {
        cursors.resize_with(self.tracks.len(), KeyframeCursor::default);
        out.reset_to_bind(skeleton);
        for (track, cursor) in self.tracks.iter().zip(cursors.iter_mut()) {
            if let TrackTarget::Bone(index) = track.target
                && let Some(bind) = skeleton.bind_transform(index)
            {
                out.set(index, track.sample_with_cursor(time, cursor, bind));
            }
        }
    }

    /// Total keyframes over every track.
    #[must_use]
    pub fn keyframe_count(&self) -> usize {
        self.tracks.iter().map(TransformTrack::keyframe_count).sum()
    }
}

/// The clips owned by one loaded model, kept sorted by name.
#[derive(Debug, Clone, Default)]
pub struct AnimationLibrary {
    clips: Vec<AnimationClip>,
}

impl AnimationLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Position of the named clip in sorted order (for "#3 of 12" labels).
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.clips
            .binary_search_by(|c| c.name.as_str().cmp(name))
            .ok()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AnimationClip> {
        self.index_of(name).map(|i| &self.clips[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut AnimationClip> {
        self.index_of(name).map(move |i| &mut self.clips[i])
    }

    /// Looks up a clip, failing with `NotFound`.
    pub fn clip(&self, name: &str) -> Result<&AnimationClip> {
        self.get(name)
            .ok_or_else(|| PoseError::NotFound(format!("animation '{name}'")))
    }

    #[must_use]
    pub fn at(&self, index: usize) -> Option<&AnimationClip> {
        self.clips.get(index)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clips.iter().map(|c| c.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnimationClip> {
        self.clips.iter()
    }

    pub fn add(&mut self, clip: AnimationClip) -> Result<()> {
        validate_name(&clip.name)?;
        match self.clips.binary_search_by(|c| c.name.cmp(&clip.name)) {
            Ok(_) => Err(PoseError::DuplicateName(clip.name)),
            Err(pos) => {
                log::debug!("Added animation '{}' ({} tracks)", clip.name, clip.tracks.len());
                self.clips.insert(pos, clip);
                Ok(())
            }
        }
    }

    /// Adds the clip, replacing any clip with the same name.
    pub fn insert_or_replace(&mut self, clip: AnimationClip) -> Result<()> {
        validate_name(&clip.name)?;
        match self.clips.binary_search_by(|c| c.name.cmp(&clip.name)) {
            Ok(pos) => self.clips[pos] = clip,
            Err(pos) => self.clips.insert(pos, clip),
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<AnimationClip> {
        let index = self
            .index_of(name)
            .ok_or_else(|| PoseError::NotFound(format!("animation '{name}'")))?;
        Ok(self.clips.remove(index))
    }

    /// Renames a clip, keeping the library sorted.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        validate_name(new_name)?;
        if old_name == new_name {
            return self.clip(old_name).map(|_| ());
        }
        if self.index_of(new_name).is_some() {
            return Err(PoseError::DuplicateName(new_name.to_string()));
        }
        let mut clip = self.remove(old_name)?;
        clip.name = new_name.to_string();
        log::debug!("Renamed animation '{old_name}' to '{new_name}'");
        self.add(clip)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PoseError::InvalidArgument(
            "animation names must not be blank".to_string(),
        ));
    }
    Ok(())
}
