//! Animation Module
//!
//! Skeletal animation playback, keyframe editing and retargeting:
//!
//! - [`Skeleton`]: immutable bone hierarchy with bind transforms
//! - [`TransformTrack`] / [`AnimationClip`] / [`AnimationLibrary`]: keyframe storage
//! - [`edit`]: resample, reduce, wrap and friends
//! - [`MappingTable`]: source-to-target bone correspondence plus twist
//! - [`PlayState`]: per-frame time advance with loop/pingpong/pin semantics
//! - [`Retargeter`]: drives a target skeleton from a source pose
//! - [`EditorContext`]: the per-frame entry point tying it all together

pub mod values;
pub mod pose;
pub mod skeleton;
pub mod tracks;
pub mod clip;
pub mod edit;
pub mod mapping;
pub mod playback;
pub mod retarget;
pub mod editor;

pub use clip::{AnimationClip, AnimationLibrary};
pub use editor::{EditorContext, LoadedModel, ModelSlot};
pub use mapping::{Axis, BoneMapping, MappingTable};
pub use playback::PlayState;
pub use pose::{BoneTransform, Pose};
pub use retarget::Retargeter;
pub use skeleton::{Bone, Skeleton};
pub use tracks::{InterpolationMode, KeyframeCursor, TrackTarget, TransformTrack};
