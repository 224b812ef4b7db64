//! Expression node types.
//!
//! This module defines the core expression types stored in the arena.

use smallvec::SmallVec;

use crate::handle::ExprHandle;

/// Unique identifier for an interned Einstein term.
pub type TermId = u32;

/// Unique identifier for an interned index symbol.
pub type IndexId = u32;

/// The closed set of function forms understood by the expansion engine.
///
/// Each variant has its own materialization rule, selected by a single
/// `match` in the expansion driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// `Der(f, x, ...)`: a derivative that is applied symbolically once its
    /// operands are concrete scalars.
    Der,
    /// `Conservative(f, x, ...)`: a derivative kept in unevaluated form so the
    /// discretization layer can treat the whole flux as one entity.
    Conservative,
    /// `KD(i, j)`: the Kronecker delta.
    KroneckerDelta,
    /// `LC(i, j, k)`: the Levi-Civita symbol (three dimensions only).
    LeviCivita,
    /// Any other named function application, e.g. a field evaluated at the
    /// coordinate tuple such as `u0(x0, x1, t)`.
    Plain(TermId),
}

/// An expression node stored in the arena.
///
/// Each variant uses `SmallVec` for inline storage of small argument lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprNode {
    /// A 64-bit integer literal.
    Integer(i64),

    /// A rational number (numerator, denominator).
    ///
    /// Invariant: denominator > 0, gcd(num, den) == 1.
    Rational(i64, u64),

    /// An Einstein term: a named leaf with zero or more indices.
    Term(TermId),

    /// Sum of expressions: a + b + c + ...
    ///
    /// Invariant: at least 2 arguments.
    Add(SmallVec<[ExprHandle; 4]>),

    /// Product of expressions: a * b * c * ...
    ///
    /// Invariant: at least 2 arguments.
    Mul(SmallVec<[ExprHandle; 4]>),

    /// Power expression: base^exp.
    Pow {
        /// The base of the power.
        base: ExprHandle,
        /// The exponent.
        exp: ExprHandle,
    },

    /// A function application: `Der(...)`, `KD(...)`, `f(...)`, etc.
    Function {
        /// Which function form this is.
        kind: FunctionKind,
        /// The arguments.
        args: SmallVec<[ExprHandle; 2]>,
    },

    /// An unevaluated derivative of `target` with respect to each direction
    /// in turn. These appear in expansion output, never in parsed input.
    Derivative {
        /// The differentiated expression.
        target: ExprHandle,
        /// The differentiation directions, applied left to right.
        directions: SmallVec<[ExprHandle; 2]>,
    },
}

impl ExprNode {
    /// Returns true if this node is a leaf (no children).
    #[must_use]
    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            ExprNode::Integer(_) | ExprNode::Rational(_, _) | ExprNode::Term(_)
        )
    }

    /// Returns true if this node is a numeric literal.
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, ExprNode::Integer(_) | ExprNode::Rational(_, _))
    }

    /// Returns true if this is the integer zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, ExprNode::Integer(0))
    }

    /// Returns true if this is the integer one.
    #[must_use]
    pub fn is_one(&self) -> bool {
        matches!(self, ExprNode::Integer(1))
    }

    /// Returns the children of this node.
    #[must_use]
    pub fn children(&self) -> SmallVec<[ExprHandle; 4]> {
        match self {
            ExprNode::Integer(_) | ExprNode::Rational(_, _) | ExprNode::Term(_) => SmallVec::new(),
            ExprNode::Add(args) | ExprNode::Mul(args) => args.clone(),
            ExprNode::Pow { base, exp } => smallvec::smallvec![*base, *exp],
            ExprNode::Function { args, .. } => args.iter().copied().collect(),
            ExprNode::Derivative { target, directions } => {
                let mut out = smallvec::smallvec![*target];
                out.extend(directions.iter().copied());
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_atom() {
        assert!(ExprNode::Integer(42).is_atom());
        assert!(ExprNode::Term(0).is_atom());
        assert!(!ExprNode::Pow {
            base: ExprHandle::new(0),
            exp: ExprHandle::new(1)
        }
        .is_atom());
    }

    #[test]
    fn test_is_zero_one() {
        assert!(ExprNode::Integer(0).is_zero());
        assert!(!ExprNode::Integer(1).is_zero());
        assert!(ExprNode::Integer(1).is_one());
        assert!(!ExprNode::Integer(0).is_one());
    }

    #[test]
    fn test_derivative_children() {
        let node = ExprNode::Derivative {
            target: ExprHandle::new(3),
            directions: smallvec::smallvec![ExprHandle::new(4), ExprHandle::new(5)],
        };
        assert_eq!(
            node.children().as_slice(),
            &[ExprHandle::new(3), ExprHandle::new(4), ExprHandle::new(5)]
        );
    }
}
