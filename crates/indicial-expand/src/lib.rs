//! # indicial-expand
//!
//! Expansion of equations written in Einstein index notation into fully
//! explicit, contraction-free scalar equations over indexed components.
//!
//! The pipeline for one equation:
//! 1. [`signature`] computes free-index signatures (an index repeated exactly
//!    twice in a product is summed away)
//! 2. [`materialize`] turns indexed terms and function forms into dense
//!    N-dimensional arrays of scalar expressions
//! 3. [`array`] contracts repeated-index axis pairs
//! 4. [`expansion`] drives classification, materialization order and final
//!    scalar-equation assembly
//! 5. [`equation`] is the front end: parse, substitute, mark constants,
//!    expand

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod array;
pub mod equation;
pub mod error;
pub mod expansion;
pub mod materialize;
pub mod signature;

#[cfg(test)]
mod proptests;

pub use array::IndexedArray;
pub use equation::{Equation, EquationError};
pub use error::ExpandError;
pub use expansion::{EinsteinExpansion, ScalarEquation};
pub use signature::{index_signature, remove_repeated};
