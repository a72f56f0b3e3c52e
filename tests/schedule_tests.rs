//! Integration tests for schedules and the fold engine that consumes them.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use proptest::prelude::*;
use reductive::effect::Error;
use reductive::schedule::{Schedule, fold, fold_until, fold_while};
use reductive::transducer::{self, TState, TransducerExt, invoke1, invoke1_with};
use rstest::rstest;

fn millis(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_millis).collect()
}

fn counting_source() -> (Arc<AtomicUsize>, impl Fn(()) -> usize + Clone + Send + Sync + 'static) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    (calls, move |()| counter.fetch_add(1, Ordering::SeqCst) + 1)
}

#[rstest]
#[case(Schedule::linear(Duration::from_millis(10)).take(4), &[10, 20, 30, 40])]
#[case(Schedule::fibonacci(Duration::from_millis(1)).take(6), &[1, 1, 2, 3, 5, 8])]
#[case(Schedule::exponential(Duration::from_millis(1)).take(5), &[1, 2, 4, 8, 16])]
#[case(Schedule::spaced(Duration::from_millis(7)).take(2), &[7, 7])]
#[case(Schedule::recurs(3), &[0, 0, 0])]
#[case(Schedule::once(), &[0])]
#[case(Schedule::never(), &[])]
fn constructors_produce_expected_delays(#[case] schedule: Schedule, #[case] expected: &[u64]) {
    assert_eq!(schedule.run().collect::<Vec<_>>(), millis(expected));
}

#[rstest]
fn union_takes_shorter_delay_and_longer_lifetime() {
    let fast = Schedule::spaced(Duration::from_millis(5)).take(2);
    let slow = Schedule::spaced(Duration::from_millis(20)).take(4);
    assert_eq!(
        fast.union(slow).run().collect::<Vec<_>>(),
        millis(&[5, 5, 20, 20])
    );
}

#[rstest]
fn intersect_takes_longer_delay_and_shorter_lifetime() {
    let fast = Schedule::spaced(Duration::from_millis(5)).take(2);
    let slow = Schedule::spaced(Duration::from_millis(20)).take(4);
    assert_eq!(
        fast.intersect(slow).run().collect::<Vec<_>>(),
        millis(&[20, 20])
    );
}

#[rstest]
fn append_and_cumulative_cap() {
    let warmup = Schedule::from_durations(millis(&[1, 2]));
    let steady = Schedule::spaced(Duration::from_millis(10));
    let capped = warmup.append(steady).max_cumulative(Duration::from_millis(25));
    assert_eq!(capped.run().collect::<Vec<_>>(), millis(&[1, 2, 10, 10]));
}

#[rstest]
fn exponential_by_saturates_instead_of_overflowing() {
    let huge = Schedule::exponential_by(Duration::from_secs(u64::MAX / 2), 10.0).take(3);
    assert!(huge.run().all(|delay| delay >= Duration::from_secs(u64::MAX / 2)));
}

#[rstest]
fn every_run_restarts_the_sequence() {
    let schedule = Schedule::fibonacci(Duration::from_millis(1)).take(3);
    let first: Vec<_> = schedule.run().collect();
    let second: Vec<_> = schedule.clone().run().collect();
    assert_eq!(first, second);
}

proptest! {
    #[test]
    fn prop_take_bounds_length(count in 0usize..50, limit in 0usize..50) {
        let schedule = Schedule::recurs(count).take(limit);
        prop_assert_eq!(schedule.run().count(), count.min(limit));
    }

    #[test]
    fn prop_max_delay_caps_every_wait(base in 1u64..1_000, cap in 1u64..1_000) {
        let schedule = Schedule::linear(Duration::from_millis(base))
            .max_delay(Duration::from_millis(cap))
            .take(10);
        prop_assert!(schedule.run().all(|delay| delay <= Duration::from_millis(cap)));
    }

    #[test]
    fn prop_recurs_gives_one_more_attempt_than_durations(count in 0usize..20) {
        let (calls, source) = counting_source();
        let looped = fold(
            transducer::map(source),
            Schedule::recurs(count),
            0usize,
            |total: usize, _: usize| total + 1,
        );
        prop_assert_eq!(invoke1(&looped, ()), Ok(count + 1));
        prop_assert_eq!(calls.load(Ordering::SeqCst), count + 1);
    }
}

#[rstest]
fn fold_while_includes_the_stopping_value() {
    let (_, source) = counting_source();
    let collected = fold_while(
        transducer::map(source),
        Schedule::forever(),
        Vec::new(),
        |mut seen: Vec<usize>, x: usize| {
            seen.push(x);
            seen
        },
        |x: &usize| *x < 3,
    );
    assert_eq!(invoke1(&collected, ()), Ok(vec![1, 2, 3]));
}

#[rstest]
fn fold_until_stops_when_predicate_first_holds() {
    let (calls, source) = counting_source();
    let total = fold_until(
        transducer::map(source),
        Schedule::recurs(100),
        0usize,
        |total: usize, x: usize| total + x,
        |x: &usize| *x == 4,
    );
    assert_eq!(invoke1(&total, ()), Ok(1 + 2 + 3 + 4));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[rstest]
fn fold_waits_between_attempts() {
    let (_, source) = counting_source();
    let looped = fold(
        transducer::map(source),
        Schedule::spaced(Duration::from_millis(15)).take(2),
        0usize,
        |_: usize, x: usize| x,
    );
    let started = Instant::now();
    assert_eq!(invoke1(&looped, ()), Ok(3));
    assert!(started.elapsed() >= Duration::from_millis(30));
}

#[rstest]
fn fold_stops_on_failure() {
    let (calls, source) = counting_source();
    let failing = transducer::map(source).bind(|attempt: usize| {
        if attempt < 3 {
            transducer::map(move |()| attempt).boxed()
        } else {
            transducer::fail::<(), usize>(Error::new("third attempt")).boxed()
        }
    });
    let looped = fold(failing, Schedule::recurs(10), 0usize, |total: usize, _: usize| total + 1);
    assert_eq!(invoke1(&looped, ()), Err(Error::new("third attempt")));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[rstest]
fn fold_observes_cancellation_between_attempts() {
    let state = TState::new();
    let token = state.cancel_token();
    let looped = fold(
        transducer::map(move |()| {
            token.cancel();
        }),
        Schedule::recurs(5),
        0usize,
        |total: usize, ()| total + 1,
    );
    assert_eq!(invoke1_with(&looped, &state, ()), Err(Error::Cancelled));
}
