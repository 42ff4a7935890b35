//! Per-frame cost of sampling a clip and retargeting the pose.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use glam::{Quat, Vec3};

use posekit::animation::clip::AnimationClip;
use posekit::animation::mapping::MappingTable;
use posekit::animation::pose::{BoneTransform, Pose};
use posekit::animation::retarget::Retargeter;
use posekit::animation::skeleton::{Bone, Skeleton};
use posekit::animation::tracks::{KeyframeCursor, TrackTarget, TransformTrack};

const BONES: usize = 64;
const KEYS: usize = 120;

fn skeleton(name: &str, prefix: &str) -> Skeleton {
    let bones = (0..BONES)
        .map(|i| {
            Bone::new(
                format!("{prefix}{i}"),
                i.checked_sub(1),
                BoneTransform::new(Vec3::Y, Quat::from_rotation_z(0.1), Vec3::ONE),
            )
        })
        .collect();
    Skeleton::new(name, bones).unwrap()
}

fn clip() -> AnimationClip {
    let times: Vec<f32> = (0..KEYS).map(|k| k as f32 / 30.0).collect();
    let tracks = (0..BONES)
        .map(|bone| {
            let rotations = times
                .iter()
                .map(|&t| Quat::from_rotation_y((t + bone as f32).sin()))
                .collect();
            TransformTrack::new(TrackTarget::Bone(bone), times.clone(), None, Some(rotations), None)
                .unwrap()
        })
        .collect();
    AnimationClip::new("loop", tracks)
}

fn bench_frame(c: &mut Criterion) {
    let source = skeleton("source", "src_");
    let target = skeleton("target", "tgt_");
    let clip = clip();
    let mut mapping = MappingTable::new();
    for i in 0..BONES {
        mapping.map(&format!("src_{i}"), &format!("tgt_{i}")).unwrap();
    }
    mapping.set_twist(Quat::from_rotation_x(0.5)).unwrap();

    let retargeter = Retargeter::default();
    let duration = clip.duration();

    c.bench_function("sample_pose_with_cursors", |b| {
        let mut cursors: Vec<KeyframeCursor> = Vec::new();
        let mut pose = Pose::default();
        let mut time = 0.0_f32;
        b.iter(|| {
            time = (time + 1.0 / 60.0) % duration;
            clip.sample_pose_with_cursors(&source, black_box(time), &mut cursors, &mut pose);
        });
    });

    c.bench_function("retarget_pose", |b| {
        let mut source_pose = Pose::default();
        clip.sample_pose(&source, duration * 0.5, &mut source_pose);
        let mut out = Pose::default();
        b.iter(|| {
            retargeter.retarget_pose(&source, black_box(&source_pose), &target, &mapping, &mut out);
        });
    });
}

criterion_group!(benches, bench_frame);
criterion_main!(benches);
