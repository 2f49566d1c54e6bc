//! Core abstractions shared by the boundhist crates
//!
//! This crate holds the pieces every other boundhist crate builds on:
//!
//! - [`Error`] / [`Result`]: the unified error type with its coarse [`ErrorKind`]
//! - [`numeric`]: order-preserving float mapping, monotone search and interpolation
//! - [`wire`]: big-endian and varint primitives for the binary formats
//!
//! # Example
//!
//! ```rust
//! use boundhist_core::numeric::{f64_to_ordered, ordered_to_f64};
//!
//! let ordered = f64_to_ordered(-0.0);
//! assert_eq!(ordered, -1);
//! assert!(ordered < f64_to_ordered(0.0));
//! assert_eq!(ordered_to_f64(ordered).to_bits(), (-0.0f64).to_bits());
//! ```

pub mod error;
pub mod numeric;
pub mod wire;

pub use error::{Error, ErrorKind, Result};

/// Largest supported value of any counter and of the total count
pub const MAX_TOTAL_COUNT: u64 = i64::MAX as u64;
