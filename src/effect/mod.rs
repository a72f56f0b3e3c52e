//! Environment-reading effects with typed failure.
//!
//! [`Eff<Env, A>`] is a lazily evaluated computation that reads an `Env`
//! and either succeeds with an `A` or fails with an [`Error`]. Internally it
//! is a single sum transducer, so everything the transducer layer offers
//! (cancellation, resource scopes, schedule-driven loops, panic capture)
//! applies to effects as well. [`EffAsync`] is the asynchronous twin.
//!
//! Effects are values: building, mapping and chaining them performs no
//! work. Nothing happens until [`Eff::run`] (or [`EffAsync::run`]) is
//! called, and the same effect may be run any number of times.
//!
//! # Examples
//!
//! ```rust
//! use reductive::effect::{Eff, Error};
//!
//! #[derive(Clone)]
//! struct Config {
//!     retries: u32,
//! }
//!
//! let retries = Eff::asks(|config: &Config| config.retries)
//!     .filter(|retries| *retries > 0)
//!     .map(|retries| retries * 2);
//!
//! assert_eq!(retries.run(Config { retries: 3 }), Ok(6));
//! assert_eq!(retries.run(Config { retries: 0 }), Err(Error::NoValue));
//! ```
//!
//! # Do-Notation with `eff!`
//!
//! ```rust
//! use reductive::eff;
//! use reductive::effect::Eff;
//!
//! let sum = eff! {
//!     x <= Eff::<(), i32>::success(5);
//!     y <= Eff::success(10);
//!     let z = x + y;
//!     Eff::success(z * 2)
//! };
//! assert_eq!(sum.run(()), Ok(30));
//! ```

mod eff;
mod eff_async;
mod eff_macro;
mod error;

pub use eff::Eff;
pub use eff_async::EffAsync;
pub use error::{Error, Fin};
