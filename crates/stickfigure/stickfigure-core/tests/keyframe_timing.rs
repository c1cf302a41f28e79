use stickfigure_core::{EditorError, Joint, KeyframeStore, Point, Pose};

fn approx(a: f64, b: f64, eps: f64) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn pose(tag: f64) -> Pose {
    Pose::new(Point::new(tag, 0.0)).with_angle(Joint::Head, tag)
}

fn times(store: &KeyframeStore) -> Vec<f64> {
    store.keyframes().iter().map(|k| k.time).collect()
}

fn tags(store: &KeyframeStore) -> Vec<f64> {
    store.keyframes().iter().map(|k| k.pose.hip.x).collect()
}

fn assert_sorted(store: &KeyframeStore) {
    assert!(
        store.keyframes().windows(2).all(|w| w[0].time <= w[1].time),
        "not sorted: {:?}",
        times(store)
    );
}

fn store_at(ts: &[f64]) -> KeyframeStore {
    let mut store = KeyframeStore::default();
    for (i, t) in ts.iter().enumerate() {
        store.insert_at_time(&pose(i as f64), *t);
    }
    store
}

#[test]
fn add_sequence_assigns_times_and_extends_past_end() {
    let mut store = KeyframeStore::default();
    let working = pose(0.0);

    assert_eq!(store.add(&working, 0.3), 0);
    assert_eq!(times(&store), vec![0.0]);
    assert_eq!(store.duration_ms(), 5000.0);

    assert_eq!(store.add(&working, 0.0), 1);
    assert_eq!(times(&store), vec![0.0, 1.0]);
    let before_third = store.duration_ms();

    let third = store.add(&working, 0.5);
    assert_eq!(third, 1);
    approx(store.keyframes()[1].time, 0.5, 1e-12);
    assert_eq!(store.duration_ms(), before_third);

    let absolute_before = store.absolute_times_ms();
    let fourth = store.add(&working, 1.0);
    assert_eq!(fourth, 3);
    assert_eq!(store.keyframes()[3].time, 1.0);
    assert_eq!(store.duration_ms(), before_third + 1000.0);
    for (before, after) in absolute_before.iter().zip(store.absolute_times_ms()) {
        approx(*before, after, 1e-9);
    }
    assert_eq!(store.active_index(), Some(3));
    assert_sorted(&store);
}

#[test]
fn add_on_occupied_time_splits_gap_to_next() {
    let mut store = store_at(&[0.0, 0.5, 1.0]);
    let index = store.add(&pose(9.0), 0.5);
    assert_eq!(index, 2);
    approx(store.keyframes()[2].time, 0.75, 1e-12);
    assert_eq!(store.duration_ms(), 5000.0);
    assert_sorted(&store);
}

#[test]
fn add_autosaves_active_keyframe_first() {
    let mut store = store_at(&[0.0, 1.0]);
    store.set_active(Some(0));
    let edited = pose(42.0);
    store.add(&edited, 0.5);
    assert_eq!(store.keyframes()[0].pose, edited);
}

#[test]
fn deleting_chronological_last_renormalizes_to_one() {
    let mut store = store_at(&[0.0, 0.4, 1.0]);
    store.delete(2, &pose(0.0)).unwrap();
    assert_eq!(times(&store), vec![0.0, 1.0]);
    approx(store.duration_ms(), 2000.0, 1e-9);

    let mut store = store_at(&[0.0, 0.2, 0.4, 1.0]);
    store.delete(3, &pose(0.0)).unwrap();
    let t = times(&store);
    assert_eq!(t[0], 0.0);
    approx(t[1], 0.5, 1e-12);
    assert_eq!(t[2], 1.0);
    approx(store.duration_ms(), 2000.0, 1e-9);
}

#[test]
fn deleting_middle_keeps_times() {
    let mut store = store_at(&[0.0, 0.4, 0.7, 1.0]);
    store.delete(1, &pose(0.0)).unwrap();
    assert_eq!(times(&store), vec![0.0, 0.7, 1.0]);
    assert_eq!(store.duration_ms(), 5000.0);
}

#[test]
fn deleting_down_to_one_and_none() {
    let mut store = store_at(&[0.0, 0.6]);
    store.set_duration_ms(8000.0).unwrap();
    store.delete(0, &pose(0.0)).unwrap();
    assert_eq!(times(&store), vec![0.0]);
    store.delete(0, &pose(0.0)).unwrap();
    assert!(store.is_empty());
    assert_eq!(store.duration_ms(), 5000.0);
}

#[test]
fn delete_tracks_active_selection() {
    let mut store = store_at(&[0.0, 0.5, 1.0]);
    store.set_active(Some(2));
    let deleted = store.delete(0, &pose(2.0)).unwrap();
    assert!(!deleted.was_active);
    assert_eq!(store.active_index(), Some(1));

    let deleted = store.delete(1, &pose(2.0)).unwrap();
    assert!(deleted.was_active);
    assert_eq!(store.active_index(), None);
}

#[test]
fn delete_out_of_range_is_an_error() {
    let mut store = store_at(&[0.0, 0.5, 1.0]);
    assert_eq!(
        store.delete(5, &pose(0.0)).unwrap_err(),
        EditorError::KeyframeOutOfRange { index: 5, len: 3 }
    );
    assert_eq!(store.len(), 3);
}

#[test]
fn store_stays_sorted_through_mixed_edits() {
    let mut store = KeyframeStore::default();
    let working = pose(0.0);
    for progress in [0.9, 0.1, 0.5, 0.5, 1.0, 0.0, 0.3] {
        store.add(&working, progress);
        assert_sorted(&store);
    }
    for t in [0.95, 0.05, 0.33] {
        store.insert_at_time(&working, t);
        assert_sorted(&store);
    }
    while store.len() > 1 {
        store.delete(store.len() / 2, &working).unwrap();
        assert_sorted(&store);
    }
}

#[test]
fn redistribute_even_spacing() {
    let mut store = store_at(&[0.0, 0.1, 0.15, 1.0]);
    store.redistribute_even();
    let t = times(&store);
    approx(t[1], 1.0 / 3.0, 1e-12);
    approx(t[2], 2.0 / 3.0, 1e-12);
    assert_eq!(t[3], 1.0);

    let mut single = store_at(&[0.7]);
    single.redistribute_even();
    assert_eq!(times(&single), vec![0.0]);
}

#[test]
fn reorder_swaps_times_with_drop_slot() {
    let mut store = store_at(&[0.0, 0.25, 0.5, 1.0]);
    let index = store.reorder(0, 2, &pose(0.0)).unwrap();
    assert_eq!(tags(&store), vec![2.0, 1.0, 0.0, 3.0]);
    assert_eq!(times(&store), vec![0.0, 0.25, 0.5, 1.0]);
    assert_eq!(index, 2);
    assert_eq!(store.active_index(), Some(2));
    assert_eq!(store.duration_ms(), 5000.0);
}

#[test]
fn reorder_rescales_when_last_is_not_at_end() {
    let mut store = store_at(&[0.0, 0.3, 0.6, 0.8]);
    store.reorder(0, 1, &pose(0.0)).unwrap();
    assert_eq!(tags(&store), vec![1.0, 0.0, 2.0, 3.0]);
    let t = times(&store);
    assert_eq!(t[0], 0.0);
    approx(t[1], 0.375, 1e-12);
    approx(t[2], 0.75, 1e-12);
    assert_eq!(t[3], 1.0);
    approx(store.duration_ms(), 4000.0, 1e-9);
}

#[test]
fn reorder_onto_itself_is_a_noop() {
    let mut store = store_at(&[0.0, 0.5, 1.0]);
    assert_eq!(store.reorder(1, 1, &pose(0.0)).unwrap(), 1);
    assert_eq!(tags(&store), vec![0.0, 1.0, 2.0]);
    assert!(store.reorder(1, 7, &pose(0.0)).is_err());
}

#[test]
fn insert_clamps_time_and_rejects_non_finite() {
    let mut store = store_at(&[0.0, 0.5]);
    assert_eq!(store.insert_at_time(&pose(2.0), f64::NAN), None);
    assert_eq!(store.insert_at_time(&pose(3.0), f64::INFINITY), None);
    assert_eq!(times(&store), vec![0.0, 0.5]);

    assert_eq!(store.insert_at_time(&pose(4.0), 7.5), Some(2));
    assert_eq!(store.insert_at_time(&pose(5.0), -2.0), Some(1));
    assert_eq!(times(&store), vec![0.0, 0.0, 0.5, 1.0]);
    assert_sorted(&store);

    approx(store.move_marker(2, 0.3).unwrap(), 0.3, 1e-12);
    approx(store.move_marker(2, f64::NAN).unwrap(), 0.3, 1e-12);
}
