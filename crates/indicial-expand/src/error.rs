//! Errors produced while expanding an equation.
//!
//! All of these are unrecoverable for the equation being processed; the
//! caller drops that equation and may continue with others.

use indicial_core::ParseError;
use thiserror::Error;

/// Errors that can occur during Einstein expansion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// The equation text was malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Index structure is inconsistent: addends of a sum disagree on their
    /// index sets, or an index occurs more than twice in a product.
    #[error("index mismatch: {0}")]
    IndexMismatch(String),

    /// Only squaring of an indexed base is supported, and exponents must not
    /// contain indexed terms.
    #[error("unsupported power: {0}")]
    UnsupportedPower(String),

    /// The two sides of an equation evaluated to different shapes.
    #[error("shape mismatch: lhs has shape {lhs:?}, rhs has shape {rhs:?}")]
    ShapeMismatch {
        /// Shape of the evaluated left-hand side.
        lhs: Vec<usize>,
        /// Shape of the evaluated right-hand side.
        rhs: Vec<usize>,
    },

    /// A referenced leaf had no dictionary entry. This indicates a
    /// materialization-ordering bug, not bad input.
    #[error("unknown term `{0}`: no materialized entry (ordering bug)")]
    UnknownTerm(String),

    /// A function form was used outside its domain, e.g. `LC` with ndim != 3
    /// or a derivative direction that is not a symbol.
    #[error("invalid function use: {0}")]
    InvalidFunction(String),

    /// The spatial dimensionality must be at least 1.
    #[error("invalid dimension {0}: ndim must be at least 1")]
    InvalidDimension(usize),
}
