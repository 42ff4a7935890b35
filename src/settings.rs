//! Editor Settings
//!
//! Host-tunable defaults for playback and retargeting.
//!
//! Every struct implements [`Default`] and deserializes with missing fields
//! filled from that default, so a settings file only needs the keys it wants
//! to override.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use posekit::settings::{EditorSettings, TranslationPolicy};
//!
//! let settings = EditorSettings::from_json_str(r#"{ "retarget": { "translations": "All" } }"#)?;
//! assert_eq!(settings.retarget.translations, TranslationPolicy::All);
//! assert_eq!(settings.playback.speed, 1.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{PoseError, Result};

// ---------------------------------------------------------------------------
// PlaybackDefaults
// ---------------------------------------------------------------------------

/// Initial flags applied to a freshly created play state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackDefaults {
    /// Signed playback rate. Must be finite and non-zero.
    pub speed: f32,
    /// Loop at the limits instead of stopping.
    pub continue_flag: bool,
    /// Bounce at the limits (pingpong).
    pub reverse_flag: bool,
}

impl Default for PlaybackDefaults {
    fn default() -> Self {
        Self {
            speed: 1.0,
            continue_flag: true,
            reverse_flag: false,
        }
    }
}

// ---------------------------------------------------------------------------
// RetargetSettings
// ---------------------------------------------------------------------------

/// Which bones carry the source animation's translations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TranslationPolicy {
    /// Only root bones follow the source translation; others keep their bind offset.
    #[default]
    RootOnly,
    /// Every mapped bone follows the source translation.
    All,
    /// Translations are never retargeted.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetargetSettings {
    pub translations: TranslationPolicy,
    /// Multiplier applied to retargeted translation offsets, e.g. to
    /// compensate for rigs of different heights.
    pub translation_scale: f32,
}

impl Default for RetargetSettings {
    fn default() -> Self {
        Self {
            translations: TranslationPolicy::RootOnly,
            translation_scale: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// EditorSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub playback: PlaybackDefaults,
    pub retarget: RetargetSettings,
    /// Samples per second for [`crate::EditorContext::resample_to_default_rate`].
    pub resample_rate: f32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            playback: PlaybackDefaults::default(),
            retarget: RetargetSettings::default(),
            resample_rate: 30.0,
        }
    }
}

impl EditorSettings {
    /// Parses settings, then checks the values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: EditorSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let speed = self.playback.speed;
        if !speed.is_finite() || speed == 0.0 {
            return Err(PoseError::InvalidArgument(format!(
                "playback speed must be finite and non-zero, got {speed}"
            )));
        }
        if !self.retarget.translation_scale.is_finite() {
            return Err(PoseError::InvalidArgument(
                "translation scale must be finite".to_string(),
            ));
        }
        if !self.resample_rate.is_finite() || self.resample_rate <= 0.0 {
            return Err(PoseError::InvalidArgument(format!(
                "resample rate must be positive, got {}",
                self.resample_rate
            )));
        }
        Ok(())
    }
}
