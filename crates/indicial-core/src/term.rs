//! Einstein terms: named leaves with explicit index structure.
//!
//! Every symbol in an equation is an Einstein term. This could be e.g.
//! `tau_i_j`, but also `u` or `rho`. In other words, all symbols are Einstein
//! terms with zero or more indices. The index list is derived exactly once
//! from the underscore-separated name when the term is interned, and stored
//! as an immutable value alongside the base name.

use smallvec::SmallVec;

use crate::expr::IndexId;

/// An interned Einstein term.
///
/// Two terms with the same full name are interchangeable; the arena interns
/// them to a single [`crate::expr::TermId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EinsteinTerm {
    /// The full name as written, e.g. `tau_i_j`.
    pub name: String,
    /// The part of the name before the first underscore, e.g. `tau`.
    pub base: String,
    /// The index symbols, in the order they appear in the name.
    pub indices: SmallVec<[IndexId; 2]>,
    /// True for terms that are constant in space and time.
    pub is_constant: bool,
    /// True for the spatial/temporal coordinate symbols.
    pub is_coordinate: bool,
}

impl EinsteinTerm {
    /// Returns true if the term carries at least one index.
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Returns the number of indices.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.indices.len()
    }
}

/// Splits a full term name into its base and index-name parts.
///
/// `tau_i_j` becomes `("tau", ["i", "j"])`; a name without underscores has
/// no indices. A leading underscore yields an empty base, which is how bare
/// index arguments such as `_i` in `KD(_i, _j)` are written.
#[must_use]
pub fn split_name(name: &str) -> (&str, Vec<&str>) {
    let mut parts = name.split('_');
    let base = parts.next().unwrap_or("");
    (base, parts.collect())
}
