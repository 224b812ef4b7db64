//! # Indicial
//!
//! Expansion of partial differential equations written in Einstein index
//! notation into fully explicit scalar equations, plus dependency ordering
//! of the derived quantities a discretization evaluates.
//!
//! ## Quick Start
//!
//! ```rust
//! use indicial::prelude::*;
//!
//! let mut arena = ExprArena::new();
//! let eq = Equation::new(
//!     "Eq(Der(rho, t), -Conservative(rhou_j, x_j))",
//!     2,
//!     "x",
//!     &[],
//!     &[],
//!     &mut arena,
//! )
//! .unwrap();
//! assert_eq!(eq.expanded.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use indicial_core as core;
pub use indicial_expand as expand;
pub use indicial_schedule as schedule;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use indicial_core::{
        parse_equation, parse_expression, ExprArena, ExprHandle, ExprNode, FunctionKind,
    };
    pub use indicial_expand::{
        EinsteinExpansion, Equation, EquationError, ExpandError, IndexedArray, ScalarEquation,
    };
    pub use indicial_schedule::{DependencyGraph, FxHashSet, ScheduleError};
}
