//! # reductive
//!
//! Composable effects built on transducers.
//!
//! ## Overview
//!
//! The crate is layered bottom-up:
//!
//! - **Control**: [`Sum`](control::Sum), the two-channel value every
//!   fallible stage produces
//! - **Transducers**: push-based pipeline stages with an explicit
//!   termination protocol ([`TResult`](transducer::TResult)), shared run
//!   state for cancellation and resource tracking
//!   ([`TState`](transducer::TState)), and sync and async drivers
//! - **Bifunctors**: transducers over `Sum` and tuple carriers, the
//!   building blocks for short-circuiting and context-threading pipelines
//! - **Schedules**: lazily generated sequences of delays, and the fold
//!   engine that drives retry and repeat loops
//! - **Effects**: [`Eff`](effect::Eff) and [`EffAsync`](effect::EffAsync),
//!   environment-reading computations with typed failure
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` for [`Sum`](control::Sum)
//!
//! ## Example
//!
//! ```rust
//! use reductive::prelude::*;
//!
//! let flaky = Eff::<u32, u32>::lift(|threshold: &u32| {
//!     if *threshold > 10 { Ok(*threshold) } else { Err(Error::new("too small")) }
//! });
//!
//! let checked = flaky.retry(Schedule::recurs(2)).map(|value| value + 1);
//! assert_eq!(checked.run(41), Ok(42));
//! assert_eq!(checked.run(1), Err(Error::new("too small")));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use reductive::prelude::*;
/// ```
pub mod prelude {
    pub use crate::control::Sum;
    pub use crate::effect::{Eff, EffAsync, Error, Fin};
    pub use crate::schedule::Schedule;
    pub use crate::transducer::{
        CancelToken, TResult, TState, Transducer, TransducerAsync, TransducerExt,
    };
}

pub mod bifunctor;
pub mod control;
pub mod effect;
pub mod schedule;
pub mod transducer;
