//! Structural differentiation of concrete scalar expressions.
//!
//! A derivation D satisfies additivity D(a + b) = D(a) + D(b) and the
//! Leibniz rule D(a * b) = D(a) * b + a * D(b). Applied here to scalar
//! expressions produced by materialization: component terms, literals and
//! field applications such as `u0(x0, x1, t)`. A field application whose
//! argument list depends on the differentiation variable stays as an
//! unevaluated [`ExprNode::Derivative`]; everything the expansion engine
//! feeds in is either that or differentiates to zero or one directly.

use smallvec::SmallVec;

use crate::arena::ExprArena;
use crate::expr::{ExprNode, FunctionKind};
use crate::handle::ExprHandle;

/// Returns true if `expr` structurally contains `var`.
#[must_use]
pub fn depends_on(arena: &ExprArena, expr: ExprHandle, var: ExprHandle) -> bool {
    if expr == var {
        return true;
    }
    arena
        .get(expr)
        .children()
        .iter()
        .any(|&c| depends_on(arena, c, var))
}

/// Differentiates `expr` with respect to `var`.
///
/// `var` is a single symbol (a coordinate component such as `x0`, or `t`).
pub fn diff(arena: &mut ExprArena, expr: ExprHandle, var: ExprHandle) -> ExprHandle {
    if expr == var {
        return arena.integer(1);
    }
    match arena.get(expr).clone() {
        ExprNode::Integer(_) | ExprNode::Rational(_, _) | ExprNode::Term(_) => arena.integer(0),
        ExprNode::Add(args) => {
            let parts: SmallVec<[ExprHandle; 4]> =
                args.iter().map(|&a| diff(arena, a, var)).collect();
            arena.add(parts)
        }
        ExprNode::Mul(args) => {
            // Leibniz rule: one addend per differentiated factor.
            let mut addends: SmallVec<[ExprHandle; 4]> = SmallVec::new();
            for i in 0..args.len() {
                let mut factors: SmallVec<[ExprHandle; 4]> = SmallVec::new();
                for (j, &a) in args.iter().enumerate() {
                    if i == j {
                        factors.push(diff(arena, a, var));
                    } else {
                        factors.push(a);
                    }
                }
                addends.push(arena.mul(factors));
            }
            arena.add(addends)
        }
        ExprNode::Pow { base, exp } => {
            if let ExprNode::Integer(n) = *arena.get(exp) {
                let db = diff(arena, base, var);
                let coeff = arena.integer(n);
                let lower = arena.integer(n - 1);
                let reduced = arena.pow(base, lower);
                arena.mul([coeff, reduced, db])
            } else if depends_on(arena, expr, var) {
                arena.derivative(expr, [var])
            } else {
                arena.integer(0)
            }
        }
        ExprNode::Function {
            kind: FunctionKind::Plain(_),
            args,
        } => {
            if args.iter().any(|&a| depends_on(arena, a, var)) {
                arena.derivative(expr, [var])
            } else {
                arena.integer(0)
            }
        }
        // Der/Conservative/KD/LC never survive into concrete scalars.
        ExprNode::Function { .. } => arena.integer(0),
        ExprNode::Derivative { target, directions } => {
            if depends_on(arena, target, var) {
                let mut directions = directions;
                directions.push(var);
                arena.derivative(target, directions)
            } else {
                arena.integer(0)
            }
        }
    }
}
