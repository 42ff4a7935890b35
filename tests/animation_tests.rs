//! Animation Track Tests
//!
//! Tests for:
//! - TransformTrack linear/step sampling and boundary hold
//! - KeyframeCursor sequential access and binary search fallback
//! - AnimationClip duration derivation and pose sampling
//! - Track editing: resample, reduce, wrap, truncate
//! - AnimationLibrary rename/add conflicts

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Quat, Vec3};

use posekit::animation::clip::{AnimationClip, AnimationLibrary};
use posekit::animation::pose::{BoneTransform, Pose};
use posekit::animation::skeleton::{Bone, Skeleton};
use posekit::animation::tracks::{InterpolationMode, KeyframeCursor, TrackTarget, TransformTrack};
use posekit::errors::PoseError;

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

/// `q` and `-q` are the same rotation.
fn approx_quat(a: Quat, b: Quat) -> bool {
    a.dot(b).abs() > 1.0 - 1e-6
}

fn translation_track(times: &[f32], xs: &[f32]) -> TransformTrack {
    TransformTrack::new(
        TrackTarget::Bone(0),
        times.to_vec(),
        Some(xs.iter().map(|&x| Vec3::new(x, 0.0, 0.0)).collect()),
        None,
        None,
    )
    .unwrap()
}

fn rotation_track(times: &[f32], angles: &[f32]) -> TransformTrack {
    TransformTrack::new(
        TrackTarget::Bone(0),
        times.to_vec(),
        None,
        Some(angles.iter().map(|&a| Quat::from_rotation_y(a)).collect()),
        None,
    )
    .unwrap()
}

fn x_at(track: &TransformTrack, time: f32) -> f32 {
    track.sample(time).translation.x
}

// ============================================================================
// Sampling
// ============================================================================

#[test]
fn sample_linear_midpoint() {
    let track = translation_track(&[0.0, 1.0], &[0.0, 10.0]);
    assert!(approx(x_at(&track, 0.5), 5.0), "got {}", x_at(&track, 0.5));
}

#[test]
fn sample_exact_keyframes() {
    let track = translation_track(&[0.0, 1.0, 2.0], &[0.0, 10.0, 20.0]);
    assert_eq!(x_at(&track, 0.0), 0.0);
    assert_eq!(x_at(&track, 1.0), 10.0);
    assert_eq!(x_at(&track, 2.0), 20.0);
}

#[test]
fn sample_holds_boundaries() {
    let track = translation_track(&[1.0, 2.0], &[10.0, 20.0]);
    assert!(approx(x_at(&track, 0.0), 10.0));
    assert!(approx(x_at(&track, 5.0), 20.0));
}

#[test]
fn sample_converges_to_keyframe_values() {
    let track = translation_track(&[0.0, 1.0, 2.0, 3.0], &[0.0, 7.0, -3.0, 4.0]);
    for (i, &key) in track.times().iter().enumerate() {
        let stored = track.translations().unwrap()[i].x;
        for delta in [1e-3_f32, 1e-4, 1e-5] {
            let before = x_at(&track, (key - delta).max(0.0));
            let after = x_at(&track, key + delta);
            assert!((before - stored).abs() < 20.0 * delta + EPSILON);
            assert!((after - stored).abs() < 20.0 * delta + EPSILON);
        }
        assert_eq!(x_at(&track, key), stored);
    }
}

#[test]
fn sample_step_holds_value() {
    let track = translation_track(&[0.0, 1.0, 2.0], &[0.0, 100.0, 200.0])
        .with_interpolation(InterpolationMode::Step);
    assert!(approx(x_at(&track, 0.5), 0.0));
    assert!(approx(x_at(&track, 0.99), 0.0));
    assert!(approx(x_at(&track, 1.0), 100.0));
    assert!(approx(x_at(&track, 1.5), 100.0));
}

#[test]
fn sample_rotation_is_slerp() {
    let track = rotation_track(&[0.0, 1.0], &[0.0, FRAC_PI_2]);
    let val = track.sample(0.5).rotation;
    let expected = Quat::from_rotation_y(FRAC_PI_2 * 0.5);
    assert!(approx_quat(val, expected), "got {val}");
}

#[test]
fn sample_rotation_takes_shorter_arc() {
    // Second key is stored with the opposite sign; the blend must not sweep 300°.
    let q0 = Quat::from_rotation_z(0.2);
    let q1 = -Quat::from_rotation_z(0.6);
    let track = TransformTrack::new(TrackTarget::Bone(0), vec![0.0, 1.0], None, Some(vec![q0, q1]), None)
        .unwrap();
    let mid = track.sample(0.5).rotation;
    assert!(approx_quat(mid, Quat::from_rotation_z(0.4)), "got {mid}");
}

#[test]
fn sample_absent_channels_use_base() {
    let track = rotation_track(&[0.0, 1.0], &[0.0, PI]);
    let base = BoneTransform::new(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::splat(2.0));
    let s = track.sample_over(0.25, &base);
    assert_eq!(s.translation, base.translation);
    assert_eq!(s.scale, base.scale);
}

#[test]
fn cursor_matches_stateless_sample() {
    let track = translation_track(&[0.0, 1.0, 2.0, 3.0, 4.0], &[0.0, 10.0, 5.0, 20.0, 15.0]);
    let mut cursor = KeyframeCursor::default();
    for i in 0..=40 {
        let t = i as f32 * 0.1;
        let a = track.sample_with_cursor(t, &mut cursor, &BoneTransform::IDENTITY);
        let b = track.sample(t);
        assert!(approx_vec3(a.translation, b.translation), "t={t}");
    }
}

#[test]
fn cursor_forward_then_jump_back() {
    let track = translation_track(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
    let mut cursor = KeyframeCursor::default();
    let base = BoneTransform::IDENTITY;

    assert!(approx(track.sample_with_cursor(5.5, &mut cursor, &base).translation.x, 55.0));
    assert!(approx(track.sample_with_cursor(0.5, &mut cursor, &base).translation.x, 5.0));
    assert!(approx(track.sample_with_cursor(4.5, &mut cursor, &base).translation.x, 45.0));
}

// ============================================================================
// AnimationClip
// ============================================================================

fn two_bone_skeleton() -> Skeleton {
    Skeleton::new(
        "rig",
        vec![
            Bone::new("root", None, BoneTransform::IDENTITY),
            Bone::new(
                "arm",
                Some(0),
                BoneTransform::new(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY, Vec3::ONE),
            ),
        ],
    )
    .unwrap()
}

#[test]
fn clip_duration_is_latest_keyframe() {
    let clip = AnimationClip::new(
        "walk",
        vec![
            translation_track(&[0.0, 1.5], &[0.0, 1.0]),
            rotation_track(&[0.0, 3.0], &[0.0, 1.0]),
        ],
    );
    assert!(approx(clip.duration(), 3.0));
}

#[test]
fn clip_without_tracks_has_zero_duration() {
    assert_eq!(AnimationClip::new("bind", vec![]).duration(), 0.0);
}

#[test]
fn clip_duration_follows_edits() {
    let mut clip = AnimationClip::new("walk", vec![translation_track(&[0.0, 2.0], &[0.0, 1.0])]);
    clip.truncate(1.0).unwrap();
    assert!(approx(clip.duration(), 1.0));
}

#[test]
fn clip_pose_keeps_bind_for_unanimated_bones() {
    let skeleton = two_bone_skeleton();
    let clip = AnimationClip::new("wave", vec![rotation_track(&[0.0, 1.0], &[0.0, 1.0])]);
    let mut pose = Pose::default();
    clip.sample_pose(&skeleton, 1.0, &mut pose);

    assert_eq!(pose.len(), 2);
    assert!(approx_quat(pose.get(0).unwrap().rotation, Quat::from_rotation_y(1.0)));
    assert_eq!(*pose.get(1).unwrap(), skeleton.bones()[1].bind);
}

#[test]
fn clip_pose_skips_tracks_for_missing_bones() {
    let skeleton = two_bone_skeleton();
    let mut track = rotation_track(&[0.0, 1.0], &[0.0, 1.0]);
    track.target = TrackTarget::Bone(7);
    let clip = AnimationClip::new("stray", vec![track]);
    let mut pose = Pose::default();
    clip.sample_pose(&skeleton, 0.5, &mut pose);
    assert_eq!(pose, skeleton.bind_pose());
}

// ============================================================================
// Resample
// ============================================================================

#[test]
fn resample_count_spans_duration() {
    let track = translation_track(&[0.0, 2.0], &[0.0, 10.0]);
    let r = track.resample_to_count(2.0, 5).unwrap();
    assert_eq!(r.times(), &[0.0, 0.5, 1.0, 1.5, 2.0]);
    assert!(approx(r.translations().unwrap()[1].x, 2.5));
}

#[test]
fn resample_two_keys_round_trips_exactly() {
    let track = translation_track(&[0.0, 2.0], &[3.0, 10.0]);
    let back = track
        .resample_to_count(2.0, 9)
        .unwrap()
        .resample_to_count(2.0, 2)
        .unwrap();
    assert_eq!(back.times(), track.times());
    for (a, b) in back.translations().unwrap().iter().zip(track.translations().unwrap()) {
        assert!(approx_vec3(*a, *b));
    }
}

#[test]
fn resample_introduces_no_new_extrema() {
    let track = translation_track(&[0.0, 0.7, 1.3, 2.0, 3.0], &[0.0, 5.0, -2.0, 8.0, 1.0]);
    let r = track
        .resample_to_count(3.0, 17)
        .unwrap()
        .resample_to_count(3.0, 5)
        .unwrap();
    for v in r.translations().unwrap() {
        assert!(v.x >= -2.0 - EPSILON && v.x <= 8.0 + EPSILON, "x={}", v.x);
    }
}

#[test]
fn resample_rejects_degenerate_input() {
    let track = translation_track(&[0.0, 1.0], &[0.0, 1.0]);
    assert!(matches!(track.resample_to_count(0.0, 5), Err(PoseError::InvalidArgument(_))));
    assert!(matches!(track.resample_to_count(1.0, 1), Err(PoseError::InvalidArgument(_))));
    assert!(matches!(track.resample_to_rate(1.0, 0.0), Err(PoseError::InvalidArgument(_))));
    assert!(matches!(track.resample_to_rate(0.0, 30.0), Err(PoseError::InvalidArgument(_))));
}

#[test]
fn resample_rejects_unbounded_sample_counts() {
    let track = translation_track(&[0.0, 10.0], &[0.0, 1.0]);
    assert!(matches!(track.resample_to_rate(10.0, 1e8), Err(PoseError::InvalidArgument(_))));
    assert!(matches!(
        track.resample_to_count(10.0, usize::MAX),
        Err(PoseError::InvalidArgument(_))
    ));
}

#[test]
fn resample_rate_spacing() {
    let track = translation_track(&[0.0, 1.0], &[0.0, 10.0]);
    let r = track.resample_to_rate(1.0, 4.0).unwrap();
    assert_eq!(r.keyframe_count(), 5);
    assert!(approx(r.times()[1], 0.25));
    assert_eq!(r.last_time(), 1.0);
}

#[test]
fn clip_resample_failure_leaves_clip_untouched() {
    let mut clip = AnimationClip::new("bind", vec![translation_track(&[0.0], &[1.0])]);
    let before = clip.clone();
    assert!(clip.resample_to_count(10).is_err());
    assert_eq!(clip, before);
}

// ============================================================================
// Reduce
// ============================================================================

#[test]
fn reduce_by_one_is_identity() {
    let track = translation_track(&[0.0, 0.5, 1.0, 1.5], &[0.0, 2.0, 1.0, 3.0]);
    assert_eq!(track.reduce(1).unwrap(), track);
}

#[test]
fn reduce_keeps_first_and_last() {
    let track = translation_track(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    let r = track.reduce(2).unwrap();
    assert_eq!(r.times(), &[0.0, 2.0, 4.0, 5.0]);
    let r = track.reduce(10).unwrap();
    assert_eq!(r.times(), &[0.0, 5.0]);
}

#[test]
fn reduce_rejects_zero() {
    let track = translation_track(&[0.0, 1.0], &[0.0, 1.0]);
    assert!(matches!(track.reduce(0), Err(PoseError::InvalidArgument(_))));
}

// ============================================================================
// Wrap
// ============================================================================

#[test]
fn wrap_weight_zero_repeats_first_key() {
    let track = translation_track(&[0.0, 1.0], &[2.0, 6.0]);
    let w = track.wrap(1.5, 0.0).unwrap();
    assert_eq!(w.times(), &[0.0, 1.0, 1.5]);
    assert!(approx(w.translations().unwrap()[2].x, 2.0));
}

#[test]
fn wrap_weight_one_repeats_last_key() {
    let track = translation_track(&[0.0, 1.0], &[2.0, 6.0]);
    let w = track.wrap(1.5, 1.0).unwrap();
    assert!(approx(w.translations().unwrap()[2].x, 6.0));
}

#[test]
fn wrap_overwrites_key_at_duration() {
    let track = translation_track(&[0.0, 1.0, 2.0], &[0.0, 5.0, 10.0]);
    let w = track.wrap(2.0, 0.25).unwrap();
    assert_eq!(w.times(), &[0.0, 1.0, 2.0]);
    assert!(approx(w.translations().unwrap()[2].x, 2.5));
}

#[test]
fn wrap_rotation_blend() {
    let track = rotation_track(&[0.0, 1.0], &[0.0, 1.0]);
    let w = track.wrap(1.0, 0.0).unwrap();
    assert!(approx_quat(w.rotations().unwrap()[1], Quat::IDENTITY));
}

#[test]
fn wrap_rejects_weight_out_of_range() {
    let track = translation_track(&[0.0, 1.0], &[0.0, 1.0]);
    assert!(track.wrap(1.0, -0.1).is_err());
    assert!(track.wrap(1.0, 1.1).is_err());
    assert!(track.wrap(0.5, 0.5).is_err());
}

// ============================================================================
// AnimationLibrary
// ============================================================================

#[test]
fn library_is_sorted_and_indexed() {
    let mut library = AnimationLibrary::new();
    library.add(AnimationClip::new("walk", vec![])).unwrap();
    library.add(AnimationClip::new("idle", vec![])).unwrap();
    library.add(AnimationClip::new("run", vec![])).unwrap();

    assert_eq!(library.names().collect::<Vec<_>>(), vec!["idle", "run", "walk"]);
    assert_eq!(library.index_of("run"), Some(1));
    assert_eq!(library.len(), 3);
}

#[test]
fn library_rename_conflicts() {
    let mut library = AnimationLibrary::new();
    library.add(AnimationClip::new("walk", vec![])).unwrap();
    library.add(AnimationClip::new("idle", vec![])).unwrap();

    assert!(library.rename("walk", "idle").unwrap_err().is_conflict());
    assert!(matches!(library.rename("walk", "  "), Err(PoseError::InvalidArgument(_))));
    assert!(matches!(library.rename("swim", "dive"), Err(PoseError::NotFound(_))));

    library.rename("walk", "stroll").unwrap();
    assert!(library.get("walk").is_none());
    assert_eq!(library.get("stroll").unwrap().name, "stroll");
}

#[test]
fn library_rejects_duplicate_add() {
    let mut library = AnimationLibrary::new();
    library.add(AnimationClip::new("walk", vec![])).unwrap();
    assert!(matches!(
        library.add(AnimationClip::new("walk", vec![])),
        Err(PoseError::DuplicateName(_))
    ));
}
