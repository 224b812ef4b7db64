//! # indicial-core
//!
//! Core expression engine for the Indicial tensor-expansion system.
//!
//! This crate provides:
//! - Arena-allocated expression storage with hash-consing
//! - Einstein terms with explicit index structure
//! - A parser for equations written in Einstein index notation
//! - Structural differentiation of scalar expressions
//!
//! ## Design Principles
//!
//! - **Hash-Consing**: Every structurally unique expression stored exactly once,
//!   so handle equality is structural equality
//! - **Explicit Index Structure**: A term's index list is derived once from its
//!   name at intern time and stored immutably, never re-parsed
//! - **Zero-Cost Handles**: 32-bit indices instead of pointers

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod diff;
pub mod display;
pub mod expr;
pub mod handle;
pub mod parse;
pub mod rewrite;
pub mod term;

pub use arena::ExprArena;
pub use diff::diff;
pub use expr::{ExprNode, FunctionKind, IndexId, TermId};
pub use handle::ExprHandle;
pub use parse::{parse_equation, parse_expression, ParseError};
pub use rewrite::substitute;
pub use term::EinsteinTerm;
