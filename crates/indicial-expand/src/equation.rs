//! The equation front end: parse, substitute, classify, expand.
//!
//! An `Equation` is built from the notation text plus the problem context
//! (dimensionality, coordinate base symbol, substitution rules, constant
//! names) and carries its own expansion.

use tracing::debug;

use indicial_core::{parse_equation, substitute, ExprArena, ExprHandle, ExprNode};
use thiserror::Error;

use crate::error::ExpandError;
use crate::expansion::{EinsteinExpansion, ScalarEquation};

/// An expansion failure tagged with the equation it occurred in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("in equation `{equation}`: {source}")]
pub struct EquationError {
    /// The notation text of the offending equation.
    pub equation: String,
    /// The underlying failure.
    #[source]
    pub source: ExpandError,
}

/// One equation in Einstein notation, together with its expansion into
/// explicit scalar equations.
#[derive(Debug, Clone)]
pub struct Equation {
    /// The notation text the equation was built from.
    pub text: String,
    /// Parsed left-hand side, after substitutions.
    pub lhs: ExprHandle,
    /// Parsed right-hand side, after substitutions.
    pub rhs: ExprHandle,
    /// The scalar equations this equation expands to, in row-major order of
    /// the surviving free indices.
    pub expanded: Vec<ScalarEquation>,
}

impl Equation {
    /// Parses and expands one equation.
    ///
    /// Substitution rules are themselves written as `Eq(symbol, definition)`
    /// and applied to both sides before expansion, in the given order.
    /// `constants` lists the full names of terms that are constant in space
    /// and time; terms whose base is `coordinate_symbol` or `t` are treated
    /// as coordinates.
    ///
    /// # Errors
    ///
    /// Any parse or expansion failure is reported with the equation text
    /// attached. The arena may retain nodes built before the failure; they
    /// are harmless.
    pub fn new(
        text: &str,
        ndim: usize,
        coordinate_symbol: &str,
        substitutions: &[&str],
        constants: &[&str],
        arena: &mut ExprArena,
    ) -> Result<Self, EquationError> {
        let fail = |source: ExpandError| EquationError {
            equation: text.to_string(),
            source,
        };

        let (mut lhs, mut rhs) =
            parse_equation(text, arena).map_err(|e| fail(ExpandError::Parse(e)))?;
        for rule in substitutions {
            let (from, to) =
                parse_equation(rule, arena).map_err(|e| fail(ExpandError::Parse(e)))?;
            lhs = substitute(arena, lhs, from, to);
            rhs = substitute(arena, rhs, from, to);
        }

        mark_classification(arena, lhs, coordinate_symbol, constants);
        mark_classification(arena, rhs, coordinate_symbol, constants);

        let expanded = EinsteinExpansion::new(arena, ndim, coordinate_symbol)
            .and_then(|driver| driver.expand(lhs, rhs))
            .map_err(fail)?;
        debug!(equation = text, count = expanded.len(), "expanded");
        Ok(Self {
            text: text.to_string(),
            lhs,
            rhs,
            expanded,
        })
    }
}

/// Marks every term leaf that is a named constant or a coordinate symbol.
/// Constants match on the full term name; coordinates on the base, so `x_j`
/// and a literal component like `x0` both qualify.
fn mark_classification(
    arena: &mut ExprArena,
    expr: ExprHandle,
    coordinate_symbol: &str,
    constants: &[&str],
) {
    for node in indicial_core::rewrite::postorder(arena, expr) {
        if let ExprNode::Term(id) = *arena.get(node) {
            let term = arena.term(id);
            if term.base == coordinate_symbol || term.base == "t" {
                arena.mark_coordinate(id);
            } else if constants.contains(&term.name.as_str()) {
                arena.mark_constant(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicial_core::FunctionKind;
    use smallvec::SmallVec;

    fn coords(arena: &mut ExprArena, ndim: usize) -> Vec<ExprHandle> {
        let mut out: Vec<ExprHandle> = (0..ndim)
            .map(|d| arena.term_expr(&format!("x{d}")))
            .collect();
        out.push(arena.term_expr("t"));
        out
    }

    fn field(arena: &mut ExprArena, name: &str, coords: &[ExprHandle]) -> ExprHandle {
        let id = arena.intern_term(name);
        let args: SmallVec<[ExprHandle; 2]> = coords.iter().copied().collect();
        arena.function(FunctionKind::Plain(id), args)
    }

    #[test]
    fn test_continuity_equation() {
        let arena = &mut ExprArena::new();
        let eq = Equation::new(
            "Eq(Der(rho, t), -Conservative(rhou_j, x_j))",
            2,
            "x",
            &[],
            &[],
            arena,
        )
        .unwrap();
        assert_eq!(eq.expanded.len(), 1);

        let c = coords(arena, 2);
        let rho = field(arena, "rho", &c);
        let t = arena.term_expr("t");
        let lhs = arena.derivative(rho, [t]);
        assert_eq!(eq.expanded[0].lhs, lhs);
    }

    #[test]
    fn test_substitution_rules_apply_before_expansion() {
        let arena = &mut ExprArena::new();
        let eq = Equation::new(
            "Eq(phi, 2*k)",
            2,
            "x",
            &["Eq(k, u_i*u_i)"],
            &[],
            arena,
        )
        .unwrap();
        assert_eq!(eq.expanded.len(), 1);

        // The coefficient flattens into the substituted product, so each
        // contraction addend carries it.
        let c = coords(arena, 2);
        let two = arena.integer(2);
        let mut addends = Vec::new();
        for i in 0..2 {
            let u = field(arena, &format!("u{i}"), &c);
            addends.push(arena.mul([two, u, u]));
        }
        let expected = arena.add(addends);
        assert_eq!(eq.expanded[0].rhs, expected);
    }

    #[test]
    fn test_constants_by_full_name() {
        let arena = &mut ExprArena::new();
        let eq = Equation::new("Eq(w_i, Re*u_i)", 2, "x", &[], &["Re"], arena).unwrap();
        assert_eq!(eq.expanded.len(), 2);

        let c = coords(arena, 2);
        let re = arena.term_expr("Re");
        let u1 = field(arena, "u1", &c);
        let expected = arena.mul([re, u1]);
        assert_eq!(eq.expanded[1].rhs, expected);
    }

    #[test]
    fn test_parse_failure_names_the_equation() {
        let arena = &mut ExprArena::new();
        let err = Equation::new("Eq(u_i,", 2, "x", &[], &[], arena).unwrap_err();
        assert_eq!(err.equation, "Eq(u_i,");
        assert!(matches!(err.source, ExpandError::Parse(_)));
    }

    #[test]
    fn test_shape_mismatch_names_the_equation() {
        let arena = &mut ExprArena::new();
        let err = Equation::new("Eq(w, u_j)", 2, "x", &[], &[], arena).unwrap_err();
        assert!(matches!(err.source, ExpandError::ShapeMismatch { .. }));
    }
}
