//! Editor Context
//!
//! [`EditorContext`] is the explicit state object a host passes around instead
//! of process-wide singletons. It owns up to two [`LoadedModel`]s (a source
//! and a target), the [`MappingTable`] pairing them, and the settings.
//!
//! The host calls [`EditorContext::update`] once per rendered frame and reads
//! [`EditorContext::current_pose`] to draw. Edits arrive as typed calls with
//! primitive arguments and either succeed completely or leave state untouched.
//!
//! ```rust,ignore
//! let mut editor = EditorContext::new(EditorSettings::default());
//! editor.load_model(ModelSlot::Source, LoadedModel::new("Sinbad", skeleton, clips));
//! editor.load_animation(ModelSlot::Source, "Dance")?;
//!
//! // In the render loop:
//! editor.update(frame_dt);
//! let pose = editor.current_pose(ModelSlot::Source);
//! ```

use std::fmt;

use crate::animation::clip::{AnimationClip, AnimationLibrary};
use crate::animation::mapping::{Axis, MappingTable};
use crate::animation::playback::PlayState;
use crate::animation::pose::{BoneTransform, Pose};
use crate::animation::retarget::Retargeter;
use crate::animation::skeleton::Skeleton;
use crate::animation::tracks::KeyframeCursor;
use crate::errors::{PoseError, Result};
use crate::settings::{EditorSettings, PlaybackDefaults};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSlot {
    Source,
    Target,
}

impl fmt::Display for ModelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSlot::Source => f.write_str("source"),
            ModelSlot::Target => f.write_str("target"),
        }
    }
}

// ============================================================================
// LoadedModel
// ============================================================================

/// A skeleton, its clips, and the play state of whichever clip is loaded.
///
/// With no clip loaded the model shows its bind pose.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub name: String,
    skeleton: Skeleton,
    pub library: AnimationLibrary,
    loaded: Option<String>,
    pub play: PlayState,
    pose: Pose,
    cursors: Vec<KeyframeCursor>,
}

impl LoadedModel {
    #[must_use]
    pub fn new(name: impl Into<String>, skeleton: Skeleton, library: AnimationLibrary) -> Self {
        Self::with_defaults(name, skeleton, library, PlaybackDefaults::default())
    }

    #[must_use]
    pub fn with_defaults(
        name: impl Into<String>,
        skeleton: Skeleton,
        library: AnimationLibrary,
        defaults: PlaybackDefaults,
    ) -> Self {
        let pose = skeleton.bind_pose();
        Self {
            name: name.into(),
            skeleton,
            library,
            loaded: None,
            play: PlayState::new(defaults),
            pose,
            cursors: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Name of the loaded clip; `None` while showing the bind pose.
    #[inline]
    #[must_use]
    pub fn loaded_animation_name(&self) -> Option<&str> {
        self.loaded.as_deref()
    }

    #[must_use]
    pub fn loaded_animation(&self) -> Option<&AnimationClip> {
        self.loaded.as_deref().and_then(|name| self.library.get(name))
    }

    /// `(1-based position, count)` of the loaded clip, for "#3 of 12" labels.
    #[must_use]
    pub fn animation_position(&self) -> Option<(usize, usize)> {
        let name = self.loaded.as_deref()?;
        self.library
            .index_of(name)
            .map(|i| (i + 1, self.library.len()))
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        self.loaded_animation().map_or(0.0, AnimationClip::duration)
    }

    /// Loads a clip by name, resetting play state.
    pub fn load_animation(&mut self, name: &str) -> Result<()> {
        let duration = self.library.clip(name)?.duration();
        self.loaded = Some(name.to_string());
        self.cursors.clear();
        self.play.reset_for_clip(duration);
        self.repose();
        log::info!("Loaded animation '{name}' on '{}' ({duration}s)", self.name);
        Ok(())
    }

    /// Shows the bind pose (the zero-length pseudo-animation).
    pub fn load_bind_pose(&mut self) {
        self.loaded = None;
        self.cursors.clear();
        self.play.reset_for_clip(0.0);
        self.pose.reset_to_bind(&self.skeleton);
    }

    /// Replaces skeleton and clips with a freshly loaded asset.
    pub fn replace(&mut self, name: impl Into<String>, skeleton: Skeleton, library: AnimationLibrary) {
        self.name = name.into();
        self.skeleton = skeleton;
        self.library = library;
        self.load_bind_pose();
        log::info!(
            "Loaded model '{}' ({} bones, {} animations)",
            self.name,
            self.skeleton.bone_count(),
            self.library.len()
        );
    }

    /// Recomputes the live pose at the current play time.
    pub fn repose(&mut self) {
        let time = self.play.time();
        match self.loaded.as_deref().and_then(|name| self.library.get(name)) {
            Some(clip) => {
                clip.sample_pose_with_cursors(&self.skeleton, time, &mut self.cursors, &mut self.pose);
            }
            None => self.pose.reset_to_bind(&self.skeleton),
        }
    }

    /// Advances play time and reposes.
    pub fn update(&mut self, dt: f32) {
        self.play.advance(dt);
        self.repose();
    }

    #[inline]
    #[must_use]
    pub fn current_pose(&self) -> &[BoneTransform] {
        self.pose.transforms()
    }

    #[inline]
    #[must_use]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Applies an edit to the loaded clip, then follows any change in duration.
    pub fn edit_loaded<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut AnimationClip) -> Result<()>,
    {
        let name = self
            .loaded
            .clone()
            .ok_or_else(|| PoseError::InvalidArgument("no animation is loaded".to_string()))?;
        let clip = self
            .library
            .get_mut(&name)
            .ok_or_else(|| PoseError::IllegalState(format!("loaded animation '{name}' is missing")))?;

        // Edit a copy so a failure leaves the clip as it was.
        let mut edited = clip.clone();
        edit(&mut edited)?;
        *clip = edited;

        let duration = clip.duration();
        self.cursors.clear();
        self.play.sync_duration(duration);
        self.repose();
        Ok(())
    }

    /// Renames a clip, following the rename if it is the loaded one.
    pub fn rename_animation(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        self.library.rename(old_name, new_name)?;
        if self.loaded.as_deref() == Some(old_name) {
            self.loaded = Some(new_name.to_string());
        }
        Ok(())
    }
}

// ============================================================================
// EditorContext
// ============================================================================

#[derive(Debug, Clone)]
pub struct EditorContext {
    pub settings: EditorSettings,
    source: Option<LoadedModel>,
    target: Option<LoadedModel>,
    pub mapping: MappingTable,
    retargeting: bool,
}

impl EditorContext {
    #[must_use]
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            settings,
            source: None,
            target: None,
            mapping: MappingTable::new(),
            retargeting: false,
        }
    }

    #[must_use]
    pub fn model(&self, slot: ModelSlot) -> Option<&LoadedModel> {
        match slot {
            ModelSlot::Source => self.source.as_ref(),
            ModelSlot::Target => self.target.as_ref(),
        }
    }

    pub fn model_mut(&mut self, slot: ModelSlot) -> Option<&mut LoadedModel> {
        match slot {
            ModelSlot::Source => self.source.as_mut(),
            ModelSlot::Target => self.target.as_mut(),
        }
    }

    fn require_mut(&mut self, slot: ModelSlot) -> Result<&mut LoadedModel> {
        self.model_mut(slot)
            .ok_or_else(|| PoseError::InvalidArgument(format!("no {slot} model is loaded")))
    }

    /// Installs a model in `slot`, replacing any model there.
    ///
    /// The model's play state takes the context's playback defaults. The
    /// mapping table survives; entries that no longer resolve are logged.
    pub fn load_model(&mut self, slot: ModelSlot, mut model: LoadedModel) {
        model.play.apply_defaults(self.settings.playback);
        log::info!(
            "Loaded {slot} model '{}' ({} bones, {} animations)",
            model.name,
            model.skeleton().bone_count(),
            model.library.len()
        );
        match slot {
            ModelSlot::Source => self.source = Some(model),
            ModelSlot::Target => self.target = Some(model),
        }
        self.warn_unresolved();
    }

    pub fn unload_model(&mut self, slot: ModelSlot) -> Option<LoadedModel> {
        match slot {
            ModelSlot::Source => self.source.take(),
            ModelSlot::Target => self.target.take(),
        }
    }

    fn warn_unresolved(&self) {
        for (source_name, target_name) in self.mapping.pairs() {
            if let Some(source) = &self.source
                && !source.skeleton().contains(source_name)
            {
                log::warn!(
                    "Mapped source bone '{source_name}' is not in '{}'",
                    source.name
                );
            }
            if let Some(target) = &self.target
                && !target.skeleton().contains(target_name)
            {
                log::warn!(
                    "Mapped target bone '{target_name}' is not in '{}'",
                    target.name
                );
            }
        }
    }

    // ========================================================================
    // Per-frame
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn is_retargeting(&self) -> bool {
        self.retargeting
    }

    /// While on, the target pose follows the source through the mapping.
    pub fn set_retargeting(&mut self, retargeting: bool) {
        self.retargeting = retargeting;
    }

    /// One frame tick. Never fails.
    pub fn update(&mut self, dt: f32) {
        if let Some(source) = &mut self.source {
            source.update(dt);
        }

        let retargeting = self.retargeting;
        match (&self.source, &mut self.target) {
            (Some(source), Some(target)) if retargeting => {
                Retargeter::new(self.settings.retarget).retarget_pose(
                    &source.skeleton,
                    &source.pose,
                    &target.skeleton,
                    &self.mapping,
                    &mut target.pose,
                );
            }
            (_, Some(target)) => target.update(dt),
            (_, None) => {}
        }
    }

    /// The live pose of `slot`, or `None` if nothing is loaded there.
    #[must_use]
    pub fn current_pose(&self, slot: ModelSlot) -> Option<&[BoneTransform]> {
        self.model(slot).map(LoadedModel::current_pose)
    }

    // ========================================================================
    // Animation edits
    // ========================================================================

    pub fn load_animation(&mut self, slot: ModelSlot, name: &str) -> Result<()> {
        self.require_mut(slot)?.load_animation(name)
    }

    pub fn rename_animation(&mut self, slot: ModelSlot, old_name: &str, new_name: &str) -> Result<()> {
        self.require_mut(slot)?.rename_animation(old_name, new_name)
    }

    pub fn resample_to_count(&mut self, slot: ModelSlot, count: usize) -> Result<()> {
        self.require_mut(slot)?
            .edit_loaded(|clip| clip.resample_to_count(count))
    }

    pub fn resample_to_rate(&mut self, slot: ModelSlot, rate: f32) -> Result<()> {
        self.require_mut(slot)?
            .edit_loaded(|clip| clip.resample_to_rate(rate))
    }

    /// Resamples at the configured `resample_rate`.
    pub fn resample_to_default_rate(&mut self, slot: ModelSlot) -> Result<()> {
        let rate = self.settings.resample_rate;
        self.resample_to_rate(slot, rate)
    }

    pub fn reduce(&mut self, slot: ModelSlot, factor: usize) -> Result<()> {
        self.require_mut(slot)?.edit_loaded(|clip| clip.reduce(factor))
    }

    pub fn wrap(&mut self, slot: ModelSlot, weight: f32) -> Result<()> {
        self.require_mut(slot)?.edit_loaded(|clip| clip.wrap(weight))
    }

    pub fn truncate(&mut self, slot: ModelSlot, end_time: f32) -> Result<()> {
        self.require_mut(slot)?
            .edit_loaded(|clip| clip.truncate(end_time))
    }

    /// Retargets the source's loaded clip into a new clip on the target.
    pub fn retarget_loaded_animation(&mut self, new_name: &str) -> Result<()> {
        let (Some(source), Some(target)) = (&self.source, &mut self.target) else {
            return Err(PoseError::InvalidArgument(
                "retargeting needs both a source and a target model".to_string(),
            ));
        };
        let clip = source
            .loaded_animation()
            .ok_or_else(|| PoseError::InvalidArgument("the source has no animation loaded".to_string()))?;
        if target.library.get(new_name).is_some() {
            return Err(PoseError::DuplicateName(new_name.to_string()));
        }

        let retargeter = Retargeter::new(self.settings.retarget);
        let retargeted =
            retargeter.retarget_clip(source.skeleton(), clip, target.skeleton(), &self.mapping, new_name)?;
        target.library.add(retargeted)
    }

    // ========================================================================
    // Mapping edits
    // ========================================================================

    pub fn map_bones(&mut self, source_bone: &str, target_bone: &str) -> Result<()> {
        self.mapping.map(source_bone, target_bone)
    }

    pub fn unmap_target_bone(&mut self, target_bone: &str) -> Result<()> {
        self.mapping.unmap_target(target_bone).map(|_| ())
    }

    pub fn unmap_source_bone(&mut self, source_bone: &str) -> Result<()> {
        self.mapping.unmap_source(source_bone).map(|_| ())
    }

    pub fn set_twist(&mut self, x: f32, y: f32, z: f32, w: f32) -> Result<()> {
        self.mapping.set_twist(glam::Quat::from_xyzw(x, y, z, w))
    }

    pub fn snap_twist(&mut self, axis: Axis) {
        self.mapping.snap_twist(axis);
    }

    pub fn cardinalize_twist(&mut self) {
        self.mapping.cardinalize_twist();
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// e.g. "73.2% matches the source skeleton"
    #[must_use]
    pub fn source_match_status(&self) -> Option<String> {
        self.source
            .as_ref()
            .map(|m| self.mapping.describe_source_match(m.skeleton()))
    }

    #[must_use]
    pub fn target_match_status(&self) -> Option<String> {
        self.target
            .as_ref()
            .map(|m| self.mapping.describe_target_match(m.skeleton()))
    }
}

impl Default for EditorContext {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}
