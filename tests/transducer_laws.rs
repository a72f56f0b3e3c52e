//! Property-based tests for transducer composition laws.
//!
//! - **Identity**: `identity.then(t) == t == t.then(identity)`
//! - **Associativity**: `(f.then(g)).then(h) == f.then(g.then(h))`
//! - **Sync/async agreement**: a transducer driven asynchronously produces
//!   the same outputs as when driven synchronously
//!
//! Equality is observational: both sides are run on the same input and
//! their collected outputs compared.

use std::sync::Arc;

use futures::executor::block_on;
use proptest::prelude::*;
use reductive::transducer::{
    self, Transducer, TransducerExt, invoke_many, invoke_many_async, invoke1, invoke1_async,
};
use rstest::rstest;

type Stage = Arc<dyn Transducer<i64, i64>>;

fn add(offset: i64) -> Stage {
    transducer::map(move |x: i64| x.wrapping_add(offset)).boxed()
}

fn left_nested(offsets: &[i64]) -> Stage {
    offsets
        .iter()
        .fold(transducer::identity::<i64>().boxed(), |chain, offset| {
            chain.then(add(*offset)).boxed()
        })
}

fn right_nested(offsets: &[i64]) -> Stage {
    offsets
        .iter()
        .rev()
        .fold(transducer::identity::<i64>().boxed(), |chain, offset| {
            add(*offset).then(chain).boxed()
        })
}

fn expected(input: i64, offsets: &[i64]) -> i64 {
    offsets
        .iter()
        .fold(input, |running, offset| running.wrapping_add(*offset))
}

proptest! {
    #[test]
    fn prop_left_identity(input in any::<i64>(), offset in any::<i64>()) {
        let composed = transducer::identity::<i64>().then(add(offset));
        prop_assert_eq!(invoke1(&composed, input), invoke1(&add(offset), input));
    }

    #[test]
    fn prop_right_identity(input in any::<i64>(), offset in any::<i64>()) {
        let composed = add(offset).then(transducer::identity::<i64>());
        prop_assert_eq!(invoke1(&composed, input), invoke1(&add(offset), input));
    }

    #[test]
    fn prop_associativity(input in any::<i64>(), f in any::<i64>(), g in any::<i64>(), h in any::<i64>()) {
        let left = add(f).then(add(g)).then(add(h));
        let right = add(f).then(add(g).then(add(h)));
        prop_assert_eq!(invoke1(&left, input), invoke1(&right, input));
    }

    #[test]
    fn prop_associativity_with_filtering(values in prop::collection::vec(-50i64..50, 0..20)) {
        let evens = || transducer::filter(|x: &i64| x % 2 == 0);
        let double = || transducer::map(|x: i64| x * 2);
        let left = transducer::each::<Vec<i64>>().then(evens()).then(double());
        let right = transducer::each::<Vec<i64>>().then(evens().then(double()));
        prop_assert_eq!(invoke_many(&left, values.clone()), invoke_many(&right, values));
    }

    #[test]
    fn prop_nesting_order_is_irrelevant(input in any::<i64>(), offsets in prop::collection::vec(any::<i64>(), 0..32)) {
        let left = invoke1(&left_nested(&offsets), input);
        let right = invoke1(&right_nested(&offsets), input);
        prop_assert_eq!(left.clone(), right);
        prop_assert_eq!(left, Ok(expected(input, &offsets)));
    }

    #[test]
    fn prop_async_agrees_with_sync(values in prop::collection::vec(any::<i32>(), 0..20)) {
        let pipeline = transducer::each::<Vec<i32>>()
            .filter(|x: &i32| x % 3 != 0)
            .map(|x: i32| i64::from(x) * 2);
        let sync = invoke_many(&pipeline, values.clone());
        let asynchronous = block_on(invoke_many_async(&pipeline, values));
        prop_assert_eq!(sync, asynchronous);
    }
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(5)]
#[case(20)]
#[case(256)]
fn deep_chains_associate(#[case] depth: usize) {
    let offsets: Vec<i64> = (1..=depth as i64).collect();
    let left = left_nested(&offsets);
    let right = right_nested(&offsets);

    assert_eq!(invoke1(&left, 0), Ok(expected(0, &offsets)));
    assert_eq!(invoke1(&right, 0), Ok(expected(0, &offsets)));
    assert_eq!(block_on(invoke1_async(&left, 0)), Ok(expected(0, &offsets)));
}

#[rstest]
fn bind_reruns_on_original_input() {
    let step = |x: i64| transducer::map(move |y: i64| y.wrapping_mul(x));
    let source = transducer::map(|x: i64| x + 1);

    let left_identity = transducer::identity::<i64>().bind(step);
    assert_eq!(invoke1(&left_identity, 7), invoke1(&step(7), 7));

    // The continuation sees the input, not the value that picked it.
    let reread = source.clone().bind(|_: i64| transducer::identity::<i64>());
    assert_eq!(invoke1(&reread, 7), Ok(7));

    let nested = source.clone().bind(move |x: i64| step(x).then(transducer::map(|y: i64| y - 1)));
    let flat = source.bind(step).then(transducer::map(|y: i64| y - 1));
    assert_eq!(invoke1(&nested, 3), invoke1(&flat, 3));
}
