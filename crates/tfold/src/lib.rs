#![warn(missing_docs, unused)]
//! # `tfold` T-Transform Suite
//!
//! An information-theoretic decomposition engine for finite symbol
//! sequences. The T-transform repeatedly collapses the longest repeated
//! copy pattern of a sequence into a single fresh token; from the chain of
//! collapse levels it derives the T-complexity, T-information, and the
//! average and instantaneous T-entropy rates, plus two normalised
//! inter-sequence distances (NTID and NTCD).
//!
//! ## Client Summary
//!
//! ### Core Client Types
//! * [`SourceSet`] / [`Sequence`] - input configuration and the
//!   materialised symbol sequence (byte or bit symbols).
//! * [`TTransform`] - the engine; one instance analyses one sequence.
//! * [`TransformHandler`] - the observer trait for per-level step records,
//!   progress ticks, and lifecycle events.
//! * [`TransformResult`] - the final quantities of a run.
//!
//! ### Derived Quantities
//! * [`metrics`] - unit scaling (bits/nats), T-information, and the
//!   T-entropy rates.
//! * [`ntid`] / [`ntcd`] - normalised T-information / T-complexity
//!   distances between two inputs.
//!
//! ## Example
//!
//! ```rust
//! use tfold::{Sequence, SymbolMode, TTransform, TfResult};
//!
//! fn example() -> TfResult<f64> {
//!     let sequence = Sequence::from_bytes(b"AAAA", SymbolMode::Byte)?;
//!     let result = TTransform::from_sequence(sequence).compute()?;
//!     Ok(result.complexity)
//! }
//!
//! // A constant run of n symbols collapses in one level: C = log2(n).
//! assert_eq!(example().unwrap(), 2.0);
//! ```
//!
//! The engine is single-threaded and synchronous; independent instances on
//! separate threads share only the read-only `log2` table of the
//! [`numeric`] kernel.

pub mod distance;
pub mod events;
pub mod graph;
pub mod input;
pub mod metrics;
pub mod numeric;
pub mod transform;

mod errors;

#[doc(inline)]
pub use distance::{ntcd, ntcd_symmetric, ntid, ntid_symmetric};
#[doc(inline)]
pub use errors::*;
#[doc(inline)]
pub use events::{NoHandler, StepRecord, TransformHandler};
#[doc(inline)]
pub use input::{InputSource, Sequence, SourceSet, SymbolMode};
#[doc(inline)]
pub use metrics::Unit;
#[doc(inline)]
pub use transform::{TTransform, TransformResult};
