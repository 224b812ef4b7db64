//! Free-index signature extraction.
//!
//! The signature of a node is the ordered list of indices that survive
//! implicit summation: an index occurring exactly twice within a
//! multiplicative scope is summed away, one occurring once stays free.
//! `None` means the node carries no index structure at all.

use indicial_core::{ExprArena, ExprHandle, ExprNode, FunctionKind, IndexId};

use crate::error::ExpandError;

/// Keeps the indices that occur exactly once, in their original order.
///
/// This is the summation-elimination step: a repeated index names a
/// contraction and does not survive into the signature.
#[must_use]
pub fn remove_repeated(indices: &[IndexId]) -> Vec<IndexId> {
    indices
        .iter()
        .copied()
        .filter(|i| indices.iter().filter(|j| *j == i).count() == 1)
        .collect()
}

/// Returns true if any leaf of `expr` is an indexed term.
#[must_use]
pub fn has_indexed_term(arena: &ExprArena, expr: ExprHandle) -> bool {
    match arena.get(expr) {
        ExprNode::Term(id) => arena.term(*id).is_indexed(),
        node => node
            .children()
            .iter()
            .any(|&c| has_indexed_term(arena, c)),
    }
}

/// The index contribution of one `KD`/`LC` argument: an indexed term
/// contributes its indices, a bare symbol contributes itself as an index.
pub(crate) fn argument_indices(
    arena: &mut ExprArena,
    args: &[ExprHandle],
) -> Result<Vec<IndexId>, ExpandError> {
    let mut out = Vec::new();
    for &arg in args {
        match arena.get(arg) {
            ExprNode::Term(id) => {
                let term = arena.term(*id);
                if term.is_indexed() {
                    out.extend(term.indices.iter().copied());
                } else if term.base.is_empty() {
                    return Err(ExpandError::InvalidFunction(format!(
                        "`{}` is not a valid index argument",
                        term.name
                    )));
                } else {
                    let name = term.base.clone();
                    out.push(arena.intern_index(&name));
                }
            }
            _ => {
                return Err(ExpandError::InvalidFunction(format!(
                    "`{}` is not a valid index argument",
                    arena.display(arg)
                )))
            }
        }
    }
    Ok(out)
}

/// Computes the free-index signature of a node.
///
/// Rules:
/// - an atom has no signature unless it is an indexed term;
/// - a product concatenates child signatures, then eliminates indices
///   occurring exactly twice; three or more occurrences are an error;
/// - all addends of a sum must share one index set, and the first addend's
///   order is the result;
/// - only exponent 2 on an indexed base is supported (a full
///   self-contraction, with empty signature); an indexed exponent, or any
///   other exponent on an indexed base, is rejected.
pub fn index_signature(
    arena: &mut ExprArena,
    expr: ExprHandle,
) -> Result<Option<Vec<IndexId>>, ExpandError> {
    match arena.get(expr).clone() {
        ExprNode::Integer(_) | ExprNode::Rational(_, _) | ExprNode::Derivative { .. } => Ok(None),
        ExprNode::Term(id) => {
            let term = arena.term(id);
            if term.is_indexed() {
                Ok(Some(remove_repeated(&term.indices)))
            } else {
                Ok(None)
            }
        }
        ExprNode::Mul(args) => {
            let mut combined: Vec<IndexId> = Vec::new();
            for &arg in &args {
                if let Some(sig) = index_signature(arena, arg)? {
                    combined.extend(sig);
                }
            }
            check_multiplicity(arena, &combined)?;
            let free = remove_repeated(&combined);
            if free.is_empty() {
                Ok(None)
            } else {
                Ok(Some(free))
            }
        }
        ExprNode::Add(args) => {
            let mut sigs = Vec::with_capacity(args.len());
            for &arg in &args {
                sigs.push(index_signature(arena, arg)?);
            }
            if sigs.iter().all(Option::is_none) {
                return Ok(None);
            }
            let first = sigs[0].clone().unwrap_or_default();
            for sig in &sigs[1..] {
                let other = sig.clone().unwrap_or_default();
                if !same_index_set(&first, &other) {
                    return Err(ExpandError::IndexMismatch(format!(
                        "addends of `{}` disagree on their index sets",
                        arena.display(expr)
                    )));
                }
            }
            Ok(Some(first))
        }
        ExprNode::Pow { base, exp } => {
            if has_indexed_term(arena, exp) {
                return Err(ExpandError::UnsupportedPower(format!(
                    "indexed terms are not allowed in exponents: `{}`",
                    arena.display(expr)
                )));
            }
            match index_signature(arena, base)? {
                None => Ok(None),
                Some(_) => {
                    if matches!(arena.get(exp), ExprNode::Integer(2)) {
                        // Squaring doubles every occurrence, so the base
                        // contracts fully with itself.
                        Ok(None)
                    } else {
                        Err(ExpandError::UnsupportedPower(format!(
                            "only exponent 2 is supported on an indexed base: `{}`",
                            arena.display(expr)
                        )))
                    }
                }
            }
        }
        ExprNode::Function { kind, args } => match kind {
            FunctionKind::KroneckerDelta | FunctionKind::LeviCivita => {
                let indices = argument_indices(arena, &args)?;
                Ok(Some(remove_repeated(&indices)))
            }
            FunctionKind::Der | FunctionKind::Conservative => {
                let mut combined = index_signature(arena, args[0])?.unwrap_or_default();
                for &dir in &args[1..] {
                    if let ExprNode::Term(id) = arena.get(dir) {
                        combined.extend(arena.term(*id).indices.iter().copied());
                    }
                }
                check_multiplicity(arena, &combined)?;
                let free = remove_repeated(&combined);
                if free.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(free))
                }
            }
            FunctionKind::Plain(_) => {
                let mut combined: Vec<IndexId> = Vec::new();
                for &arg in &args {
                    if let Some(sig) = index_signature(arena, arg)? {
                        combined.extend(sig);
                    }
                }
                check_multiplicity(arena, &combined)?;
                let free = remove_repeated(&combined);
                if free.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(free))
                }
            }
        },
    }
}

/// An index occurring more than twice has no defined summation meaning.
pub(crate) fn check_multiplicity(
    arena: &ExprArena,
    indices: &[IndexId],
) -> Result<(), ExpandError> {
    for &i in indices {
        let count = indices.iter().filter(|&&j| j == i).count();
        if count > 2 {
            return Err(ExpandError::IndexMismatch(format!(
                "index `{}` occurs {count} times; at most two occurrences are allowed",
                arena.index_name(i)
            )));
        }
    }
    Ok(())
}

fn same_index_set(a: &[IndexId], b: &[IndexId]) -> bool {
    a.len() == b.len() && a.iter().all(|i| b.contains(i)) && b.iter().all(|i| a.contains(i))
}
