//! Integration tests for product transducers: context threading through
//! composed stages.

use futures::executor::block_on;
use proptest::prelude::*;
use reductive::bifunctor::{both, context, first, product_bind, second, with_context};
use reductive::transducer::{self, TransducerExt, invoke_many, invoke1, invoke1_async};
use rstest::rstest;

#[derive(Debug, Clone, PartialEq)]
struct Request {
    locale: &'static str,
    scale: i64,
}

fn request() -> Request {
    Request {
        locale: "en",
        scale: 3,
    }
}

proptest! {
    #[test]
    fn prop_second_never_touches_context(context_value in any::<u16>(), value in any::<i32>()) {
        let stage = second::<_, u16>(transducer::map(|x: i32| i64::from(x) - 1));
        prop_assert_eq!(
            invoke1(&stage, (context_value, value)),
            Ok((context_value, i64::from(value) - 1))
        );
    }

    #[test]
    fn prop_both_equals_first_then_second(x in any::<i32>(), a in any::<i32>()) {
        let by_both = both(
            transducer::map(|x: i32| x.wrapping_add(1)),
            transducer::map(|a: i32| a.wrapping_mul(2)),
        );
        let by_parts = first::<_, i32>(transducer::map(|x: i32| x.wrapping_add(1)))
            .then(second::<_, i32>(transducer::map(|a: i32| a.wrapping_mul(2))));
        prop_assert_eq!(invoke1(&by_both, (x, a)), invoke1(&by_parts, (x, a)));
    }
}

#[rstest]
fn context_is_threaded_through_a_pipeline() {
    let pipeline = with_context(|request: &Request, amount: i64| amount * request.scale)
        .then(second::<_, Request>(transducer::map(|amount: i64| amount + 1)))
        .then(with_context(|request: &Request, amount: i64| {
            format!("{}:{amount}", request.locale)
        }));

    assert_eq!(
        invoke1(&pipeline, (request(), 4)),
        Ok((request(), "en:13".to_string()))
    );
}

#[rstest]
fn context_projection_replaces_value() {
    let projected = context::<Request, i64>().then(second::<_, Request>(transducer::map(
        |request: Request| request.locale.len(),
    )));
    assert_eq!(invoke1(&projected, (request(), 99)), Ok((request(), 2)));
}

#[rstest]
fn each_output_keeps_its_context() {
    let spread = second::<_, Request>(transducer::each::<Vec<i64>>())
        .then(with_context(|request: &Request, x: i64| x * request.scale));
    assert_eq!(
        invoke_many(&spread, (request(), vec![1, 2, 3])),
        Ok(vec![(request(), 3), (request(), 6), (request(), 9)])
    );
}

#[rstest]
#[case(0, "zero")]
#[case(5, "positive")]
#[case(-5, "negative")]
fn bind_picks_next_stage_from_value(#[case] input: i64, #[case] expected: &str) {
    let classified = product_bind(
        second::<_, Request>(transducer::identity::<i64>()),
        |value: &i64| {
            let label = match value.signum() {
                0 => "zero",
                1 => "positive",
                _ => "negative",
            };
            second::<_, Request>(transducer::map(move |_: i64| label))
        },
    );
    assert_eq!(invoke1(&classified, (request(), input)), Ok((request(), expected)));
}

#[rstest]
fn async_matches_sync() {
    let pipeline = with_context(|request: &Request, amount: i64| amount * request.scale)
        .then(second::<_, Request>(transducer::map(|amount: i64| amount - 2)));
    assert_eq!(
        block_on(invoke1_async(&pipeline, (request(), 10))),
        invoke1(&pipeline, (request(), 10))
    );
}
