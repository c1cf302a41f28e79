use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stickfigure_core::{
    points_from_pose, pose_at_progress, solve_ik_for_end_effector, EndEffector, Keyframe,
    MotionTrail, Point, Skeleton, TrailSettings,
};

fn clip(skeleton: &Skeleton, count: usize) -> Vec<Keyframe> {
    (0..count)
        .map(|i| {
            let mut pose = skeleton.default_pose().clone();
            pose.hip = pose.hip + Point::new(i as f64 * 7.0, (i % 3) as f64 * 4.0);
            let time = i as f64 / (count - 1) as f64;
            Keyframe::new(pose, time)
        })
        .collect()
}

fn bench_sampling(c: &mut Criterion) {
    let skeleton = Skeleton::standard(800.0, 450.0);
    let keys = clip(&skeleton, 32);

    c.bench_function("pose_at_progress_32_keys", |b| {
        let mut p = 0.0;
        b.iter(|| {
            p = (p + 0.013) % 1.0;
            black_box(pose_at_progress(black_box(p), &keys))
        })
    });

    let pose = skeleton.default_pose().clone();
    c.bench_function("points_from_pose", |b| {
        b.iter(|| black_box(points_from_pose(black_box(&pose), &skeleton)))
    });

    let target = pose.hip + Point::new(-40.0, -50.0);
    c.bench_function("ik_left_hand", |b| {
        b.iter(|| {
            black_box(solve_ik_for_end_effector(
                black_box(target),
                EndEffector::LeftHand,
                &pose,
                &skeleton,
            ))
        })
    });

    let settings = TrailSettings {
        enabled: true,
        ..TrailSettings::default()
    };
    c.bench_function("motion_trail_5s", |b| {
        b.iter(|| black_box(MotionTrail::build(&keys, 5000.0, &skeleton, &settings)))
    });
}

criterion_group!(benches, bench_sampling);
criterion_main!(benches);
