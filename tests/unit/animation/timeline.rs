use super::*;
use crate::animation::{ease::Ease, tween::Repeat};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Key {
    A,
    B,
}

fn linear(from: f64, to: f64, d: f64) -> Tween<f64> {
    Tween::new(from, to, d, Ease::Linear)
}

#[test]
fn later_tween_on_same_track_takes_over() {
    let mut tl = Timeline::new();
    tl.to(Key::A, linear(0.0, 1.0, 0.2), 0.0)
        .to(Key::A, linear(1.0, 0.0, 0.25), 1.0);
    assert_eq!(tl.sample(Key::A, 0.1), Some(0.5));
    assert_eq!(tl.sample(Key::A, 0.6), Some(1.0));
    assert_eq!(tl.sample(Key::A, 1.25), Some(0.0));
    assert_eq!(tl.natural_duration(), 1.25);
    assert_eq!(tl.sample(Key::B, 0.0), None);
}

#[test]
fn track_reads_from_value_before_first_start() {
    let mut tl = Timeline::new();
    tl.to(Key::B, linear(3.0, 4.0, 1.0), 2.0);
    assert_eq!(tl.sample(Key::B, 0.0), Some(3.0));
}

#[test]
fn stagger_offsets_each_key_and_marks_first_start() {
    let mut tl = Timeline::new();
    tl.stagger([Key::A, Key::B], 1.0, 0.5, |_, _| linear(0.0, 1.0, 1.0));
    assert_eq!(tl.last_start(), 1.0);
    assert_eq!(tl.sample(Key::A, 1.5), Some(0.5));
    assert_eq!(tl.sample(Key::B, 1.5), Some(0.0));
    assert_eq!(tl.natural_duration(), 2.5);
}

#[test]
fn insert_flattens_child_at_offset() {
    let mut child = Timeline::new();
    child.to(Key::A, linear(0.0, 10.0, 2.0), 0.0);
    let mut master = Timeline::new();
    master.insert(0.5, child);
    assert_eq!(master.sample(Key::A, 1.5), Some(5.0));
    assert_eq!(master.natural_duration(), 2.5);
}

#[test]
fn rescale_hits_target_exactly_both_ways() {
    for target in [0.5, 2.5, 10.0] {
        let mut tl = Timeline::new();
        tl.to(Key::A, linear(0.0, 1.0, 1.0), 0.3)
            .to(Key::B, linear(0.0, 1.0, 2.0), 0.0);
        tl.set_total_duration(target).unwrap();
        assert_eq!(tl.total_duration(), target);
        assert!(!tl.is_complete(target * 0.999));
        assert!(tl.is_complete(target));
        assert!((tl.sample(Key::B, target).unwrap() - 1.0).abs() < 1e-12);
        assert!((tl.sample(Key::B, target * 0.5).unwrap() - 0.5).abs() < 1e-12);
    }
}

#[test]
fn rescale_rejects_non_positive() {
    let mut tl: Timeline<Key> = Timeline::new();
    assert!(tl.set_total_duration(0.0).is_err());
    assert!(tl.set_total_duration(f64::NAN).is_err());
}

#[test]
fn empty_timeline_can_still_be_given_a_length() {
    let mut tl: Timeline<Key> = Timeline::new();
    tl.set_total_duration(3.0).unwrap();
    assert_eq!(tl.total_duration(), 3.0);
    assert!(tl.is_complete(3.0));
}

#[test]
fn infinite_tweens_do_not_extend_duration() {
    let mut tl = Timeline::new();
    tl.to(Key::A, linear(0.0, 1.0, 1.0).repeat(Repeat::Forever), 0.0)
        .to(Key::B, linear(0.0, 1.0, 2.0), 0.0);
    assert_eq!(tl.natural_duration(), 2.0);
}
