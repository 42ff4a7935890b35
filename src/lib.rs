#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod animation;
pub mod errors;
pub mod settings;

pub use animation::{
    AnimationClip, AnimationLibrary, Axis, Bone, BoneTransform, EditorContext, LoadedModel,
    MappingTable, ModelSlot, PlayState, Pose, Retargeter, Skeleton, TrackTarget, TransformTrack,
};
pub use errors::{PoseError, Result};
pub use settings::{EditorSettings, PlaybackDefaults, RetargetSettings, TranslationPolicy};
