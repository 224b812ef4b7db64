//! Human-readable printing of expressions.
//!
//! Nodes hold arena handles, so printing goes through a borrowing wrapper:
//! `arena.display(handle)` implements [`fmt::Display`].

use std::fmt;

use crate::arena::ExprArena;
use crate::expr::{ExprNode, FunctionKind};
use crate::handle::ExprHandle;

/// Binding strength, used to decide parenthesization.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Add,
    Mul,
    Pow,
    Atom,
}

/// Borrowing display wrapper for an expression handle.
pub struct ExprDisplay<'a> {
    arena: &'a ExprArena,
    handle: ExprHandle,
}

impl ExprArena {
    /// Returns a [`fmt::Display`] wrapper for the given expression.
    #[must_use]
    pub fn display(&self, handle: ExprHandle) -> ExprDisplay<'_> {
        ExprDisplay {
            arena: self,
            handle,
        }
    }
}

impl fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self.arena, self.handle, Prec::Add)
    }
}

fn write_expr(
    f: &mut fmt::Formatter<'_>,
    arena: &ExprArena,
    handle: ExprHandle,
    min_prec: Prec,
) -> fmt::Result {
    let prec = node_prec(arena.get(handle));
    if prec < min_prec {
        write!(f, "(")?;
        write_node(f, arena, handle)?;
        write!(f, ")")
    } else {
        write_node(f, arena, handle)
    }
}

fn node_prec(node: &ExprNode) -> Prec {
    match node {
        ExprNode::Add(_) => Prec::Add,
        ExprNode::Mul(_) => Prec::Mul,
        ExprNode::Pow { .. } => Prec::Pow,
        ExprNode::Integer(v) if *v < 0 => Prec::Mul,
        _ => Prec::Atom,
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, arena: &ExprArena, handle: ExprHandle) -> fmt::Result {
    match arena.get(handle) {
        ExprNode::Integer(v) => write!(f, "{v}"),
        ExprNode::Rational(n, d) => write!(f, "{n}/{d}"),
        ExprNode::Term(id) => write!(f, "{}", arena.term(*id).name),
        ExprNode::Add(args) => {
            for (i, &arg) in args.iter().enumerate() {
                if i > 0 {
                    let rendered = format!("{}", arena.display(arg));
                    if let Some(stripped) = rendered.strip_prefix('-') {
                        write!(f, " - {stripped}")?;
                        continue;
                    }
                    write!(f, " + ")?;
                }
                write_expr(f, arena, arg, Prec::Mul)?;
            }
            Ok(())
        }
        ExprNode::Mul(args) => {
            let mut rest: &[ExprHandle] = args;
            // A leading -1 coefficient prints as a sign.
            if let ExprNode::Integer(-1) = arena.get(args[0]) {
                write!(f, "-")?;
                rest = &args[1..];
            }
            for (i, &arg) in rest.iter().enumerate() {
                if i > 0 {
                    write!(f, "*")?;
                }
                write_expr(f, arena, arg, Prec::Pow)?;
            }
            Ok(())
        }
        ExprNode::Pow { base, exp } => {
            write_expr(f, arena, *base, Prec::Atom)?;
            write!(f, "**")?;
            write_expr(f, arena, *exp, Prec::Atom)
        }
        ExprNode::Function { kind, args } => {
            let name = match kind {
                FunctionKind::Der => "Der",
                FunctionKind::Conservative => "Conservative",
                FunctionKind::KroneckerDelta => "KD",
                FunctionKind::LeviCivita => "LC",
                FunctionKind::Plain(id) => &arena.term(*id).name,
            };
            write!(f, "{name}(")?;
            write_args(f, arena, args)?;
            write!(f, ")")
        }
        ExprNode::Derivative { target, directions } => {
            write!(f, "Derivative({}", arena.display(*target))?;
            for &d in directions {
                write!(f, ", {}", arena.display(d))?;
            }
            write!(f, ")")
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, arena: &ExprArena, args: &[ExprHandle]) -> fmt::Result {
    for (i, &arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arena.display(arg))?;
    }
    Ok(())
}
