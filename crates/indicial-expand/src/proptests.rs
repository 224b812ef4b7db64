//! Property-based tests for the expansion pipeline.

use proptest::prelude::*;
use smallvec::SmallVec;

use indicial_core::{ExprArena, ExprHandle, FunctionKind};

use crate::equation::Equation;

fn field(arena: &mut ExprArena, name: &str, ndim: usize) -> ExprHandle {
    let id = arena.intern_term(name);
    let mut coords: SmallVec<[ExprHandle; 2]> = (0..ndim)
        .map(|d| arena.term_expr(&format!("x{d}")))
        .collect();
    coords.push(arena.term_expr("t"));
    arena.function(FunctionKind::Plain(id), coords)
}

fn render(text: &str, ndim: usize) -> Vec<String> {
    let arena = &mut ExprArena::new();
    let eq = Equation::new(text, ndim, "x", &[], &[], arena)
        .unwrap_or_else(|e| panic!("{e}"));
    eq.expanded
        .iter()
        .map(|s| format!("{} = {}", arena.display(s.lhs), arena.display(s.rhs)))
        .collect()
}

proptest! {
    /// k surviving free indices always expand to ndim^k scalar equations.
    #[test]
    fn prop_free_index_count_governs_expansion(ndim in 1usize..=3) {
        for (text, rank) in [
            ("Eq(w, p)", 0u32),
            ("Eq(w_i, u_i)", 1),
            ("Eq(tau_i_j, u_i*v_j)", 2),
        ] {
            let arena = &mut ExprArena::new();
            let eq = Equation::new(text, ndim, "x", &[], &[], arena)
                .unwrap_or_else(|e| panic!("{e}"));
            prop_assert_eq!(eq.expanded.len(), ndim.pow(rank));
        }
    }

    /// The name of a summed index never affects the expansion.
    #[test]
    fn prop_summed_index_name_is_immaterial(ndim in 1usize..=3) {
        prop_assert_eq!(
            render("Eq(w, u_i*v_i)", ndim),
            render("Eq(w, u_a*v_a)", ndim)
        );
        prop_assert_eq!(
            render("Eq(w_i, tau_i_j*u_j)", ndim),
            render("Eq(w_i, tau_i_k*u_k)", ndim)
        );
    }

    /// A literal coefficient passes through to every component equation.
    #[test]
    fn prop_literal_coefficient_distributes(ndim in 1usize..=3, c in 2i64..100) {
        let text = format!("Eq(w_i, {c}*u_i)");
        let arena = &mut ExprArena::new();
        let eq = Equation::new(&text, ndim, "x", &[], &[], arena)
            .unwrap_or_else(|e| panic!("{e}"));
        prop_assert_eq!(eq.expanded.len(), ndim);
        let coeff = arena.integer(c);
        for (i, scalar) in eq.expanded.iter().enumerate() {
            let u = field(arena, &format!("u{i}"), ndim);
            let expected = arena.mul([coeff, u]);
            prop_assert_eq!(scalar.rhs, expected);
        }
    }

    /// The dot product contracts to exactly one scalar equation whose
    /// right-hand side has ndim addends.
    #[test]
    fn prop_dot_product_is_scalar(ndim in 1usize..=3) {
        let arena = &mut ExprArena::new();
        let eq = Equation::new("Eq(w, u_i*v_i)", ndim, "x", &[], &[], arena)
            .unwrap_or_else(|e| panic!("{e}"));
        prop_assert_eq!(eq.expanded.len(), 1);

        let mut addends = Vec::new();
        for i in 0..ndim {
            let u = field(arena, &format!("u{i}"), ndim);
            let v = field(arena, &format!("v{i}"), ndim);
            addends.push(arena.mul([u, v]));
        }
        let expected = arena.add(addends);
        prop_assert_eq!(eq.expanded[0].rhs, expected);
    }
}
