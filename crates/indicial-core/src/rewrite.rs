//! Structural substitution.
//!
//! Substitution rules (e.g. replacing a stress-tensor symbol with its
//! definition) are applied to the parsed tree before expansion. The match is
//! exact structural identity of a subtree, which with hash-consing is plain
//! handle equality.

use smallvec::SmallVec;

use crate::arena::ExprArena;
use crate::expr::ExprNode;
use crate::handle::ExprHandle;

/// Replaces every occurrence of the subtree `from` in `expr` with `to`,
/// rebuilding interior nodes bottom-up. Returns the (possibly unchanged)
/// root handle.
pub fn substitute(
    arena: &mut ExprArena,
    expr: ExprHandle,
    from: ExprHandle,
    to: ExprHandle,
) -> ExprHandle {
    if expr == from {
        return to;
    }
    match arena.get(expr).clone() {
        ExprNode::Integer(_) | ExprNode::Rational(_, _) | ExprNode::Term(_) => expr,
        ExprNode::Add(args) => {
            let args: SmallVec<[ExprHandle; 4]> = args
                .iter()
                .map(|&a| substitute(arena, a, from, to))
                .collect();
            arena.add(args)
        }
        ExprNode::Mul(args) => {
            let args: SmallVec<[ExprHandle; 4]> = args
                .iter()
                .map(|&a| substitute(arena, a, from, to))
                .collect();
            arena.mul(args)
        }
        ExprNode::Pow { base, exp } => {
            let base = substitute(arena, base, from, to);
            let exp = substitute(arena, exp, from, to);
            arena.pow(base, exp)
        }
        ExprNode::Function { kind, args } => {
            let args: SmallVec<[ExprHandle; 2]> = args
                .iter()
                .map(|&a| substitute(arena, a, from, to))
                .collect();
            arena.function(kind, args)
        }
        ExprNode::Derivative { target, directions } => {
            let target = substitute(arena, target, from, to);
            let directions: SmallVec<[ExprHandle; 2]> = directions
                .iter()
                .map(|&d| substitute(arena, d, from, to))
                .collect();
            arena.derivative(target, directions)
        }
    }
}

/// Collects every distinct subtree of `expr` in post-order (children before
/// parents), visiting shared subtrees once.
#[must_use]
pub fn postorder(arena: &ExprArena, expr: ExprHandle) -> Vec<ExprHandle> {
    let mut seen: Vec<ExprHandle> = Vec::new();
    let mut out: Vec<ExprHandle> = Vec::new();
    walk(arena, expr, &mut seen, &mut out);
    out
}

fn walk(arena: &ExprArena, expr: ExprHandle, seen: &mut Vec<ExprHandle>, out: &mut Vec<ExprHandle>) {
    if seen.contains(&expr) {
        return;
    }
    seen.push(expr);
    for child in arena.get(expr).children() {
        walk(arena, child, seen, out);
    }
    out.push(expr);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_leaf() {
        let mut arena = ExprArena::new();
        let x = arena.term_expr("x");
        let y = arena.term_expr("y");
        let z = arena.term_expr("z");
        let sum = arena.add([x, y]);

        let replaced = substitute(&mut arena, sum, y, z);
        let expected = arena.add([x, z]);
        assert_eq!(replaced, expected);
    }

    #[test]
    fn test_substitute_subtree() {
        let mut arena = ExprArena::new();
        let x = arena.term_expr("x");
        let y = arena.term_expr("y");
        let xy = arena.mul([x, y]);
        let two = arena.integer(2);
        let expr = arena.pow(xy, two);

        let w = arena.term_expr("w");
        let replaced = substitute(&mut arena, expr, xy, w);
        let expected = arena.pow(w, two);
        assert_eq!(replaced, expected);
    }

    #[test]
    fn test_postorder_children_first() {
        let mut arena = ExprArena::new();
        let x = arena.term_expr("x");
        let y = arena.term_expr("y");
        let sum = arena.add([x, y]);

        let order = postorder(&arena, sum);
        let sum_pos = order.iter().position(|&h| h == sum).unwrap();
        let x_pos = order.iter().position(|&h| h == x).unwrap();
        let y_pos = order.iter().position(|&h| h == y).unwrap();
        assert!(x_pos < sum_pos);
        assert!(y_pos < sum_pos);
    }
}
