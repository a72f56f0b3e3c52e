//! Control structures shared by the transducer and effect layers.
//!
//! - [`Sum`]: a value on one of two channels, `Left` for the alternative
//!   (usually an error) and `Right` for the main value
//!
//! # Examples
//!
//! ```rust
//! use reductive::control::Sum;
//!
//! let parsed: Sum<String, i32> = Sum::Right(20);
//! let doubled = parsed.map_right(|x| x * 2);
//! assert_eq!(doubled, Sum::Right(40));
//!
//! let failed: Sum<String, i32> = Sum::Left("bad input".to_string());
//! assert_eq!(failed.fold(|error| error.len() as i32, |x| x), 9);
//! ```

mod sum;

pub use sum::Sum;
