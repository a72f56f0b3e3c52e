//! Bifunctor transducers.
//!
//! Two families generalise the transducer protocol to two parallel
//! channels:
//!
//! - **Sum** transducers map `Sum<X, A>` to `Sum<Y, B>`: the left channel
//!   carries the alternative (error) value, the right channel the success
//!   value. Once the left channel is taken, the right-channel computation of
//!   that node never runs.
//! - **Product** transducers map `(X, A)` to `(Y, B)`: the first element
//!   carries an ambient context that is threaded alongside the value.
//!
//! Both families are ordinary [`Transducer`](crate::transducer::Transducer)s
//! over their carrier types, so they compose with
//! [`TransducerExt::then`](crate::transducer::TransducerExt::then) and run
//! through the usual invoke entry points.
//!
//! # Examples
//!
//! ```rust
//! use reductive::bifunctor::{map_right, sum_bind};
//! use reductive::control::Sum;
//! use reductive::transducer::{self, invoke1};
//!
//! let parse = transducer::map(|s: Sum<String, &str>| {
//!     s.and_then(|text| match text.parse::<i32>() {
//!         Ok(number) => Sum::Right(number),
//!         Err(error) => Sum::Left(error.to_string()),
//!     })
//! });
//! let doubled = sum_bind(parse, |n: i32| map_right(move |_: &str| n * 2));
//!
//! assert_eq!(invoke1(&doubled, Sum::Right("21")), Ok(Sum::Right(42)));
//! assert!(invoke1(&doubled, Sum::Right("x")).unwrap().is_left());
//! ```

mod product;
mod sum;

pub use product::{
    Both, Context, First, ProductBind, ProductTransducer, ProductTransducerAsync, Second,
    WithContext, both, context, first, product_bimap, product_bind, second, with_context,
};
pub use sum::{
    BiMap, LeftChannel, Merge, OnRight, RightChannel, SumApply, SumBind, SumTransducer,
    SumTransducerAsync, Swap, bi_transform, bimap, left_channel, map_left, map_right, merge,
    on_right, right_channel, sum_apply, sum_bind, swap, transform_left, transform_right,
};
