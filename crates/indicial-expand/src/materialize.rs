//! Materialization rules: from index-parameterized symbols to concrete
//! arrays of scalar sub-expressions.
//!
//! Each function form has one materialization rule, selected by a single
//! `match` in the expansion driver. The Kronecker delta and Levi-Civita
//! symbols evaluate their closed-form combinatorial definitions per
//! coordinate tuple; indexed terms expand into component-named leaves.

use indicial_core::{ExprArena, ExprHandle, FunctionKind, TermId};
use smallvec::SmallVec;

use crate::array::{IndexedArray, Shape};
use crate::error::ExpandError;

/// Expands an indexed term into its component array.
///
/// Field components (non-constant terms) become function applications over
/// the coordinate tuple, e.g. `u_i` at `i = 0` becomes `u0(x0, x1, t)`.
/// Constant and coordinate components stay bare terms.
pub fn term_components(
    arena: &mut ExprArena,
    id: TermId,
    ndim: usize,
    coordinates: Option<&[ExprHandle]>,
) -> IndexedArray {
    let rank = arena.term(id).rank();
    let shape: Shape = std::iter::repeat(ndim).take(rank).collect();
    let mut out = IndexedArray::zeros(arena, shape);
    for index in out.indices().collect::<Vec<_>>() {
        let component = arena.component(id, &index);
        let element = match coordinates {
            Some(coords) => {
                let args: SmallVec<[ExprHandle; 2]> = coords.iter().copied().collect();
                arena.function(FunctionKind::Plain(component), args)
            }
            None => {
                let name = arena.term(component).name.clone();
                arena.term_expr(&name)
            }
        };
        out.set(&index, element);
    }
    out
}

/// The Kronecker delta: element `(i, j)` is 1 iff `i == j`.
pub fn kronecker_array(arena: &mut ExprArena, ndim: usize) -> IndexedArray {
    let mut out = IndexedArray::zeros(arena, smallvec::smallvec![ndim, ndim]);
    for index in out.indices().collect::<Vec<_>>() {
        let value = arena.integer(i64::from(index[0] == index[1]));
        out.set(&index, value);
    }
    out
}

/// The Levi-Civita symbol at `ndim == 3`: the signed parity of the index
/// triple, zero when any two indices coincide.
///
/// # Errors
///
/// Rejects any dimensionality other than 3.
pub fn levi_civita_array(arena: &mut ExprArena, ndim: usize) -> Result<IndexedArray, ExpandError> {
    if ndim != 3 {
        return Err(ExpandError::InvalidFunction(format!(
            "LC is defined for ndim == 3, got ndim == {ndim}"
        )));
    }
    let mut out = IndexedArray::zeros(arena, smallvec::smallvec![3, 3, 3]);
    for index in out.indices().collect::<Vec<_>>() {
        let value = arena.integer(permutation_parity(&index));
        out.set(&index, value);
    }
    Ok(out)
}

/// Signed parity of an index tuple: +1 for an even permutation of
/// `0..len`, -1 for an odd one, 0 if any value repeats.
fn permutation_parity(index: &[usize]) -> i64 {
    let mut sign = 1i64;
    for a in 0..index.len() {
        for b in (a + 1)..index.len() {
            match index[b].cmp(&index[a]) {
                std::cmp::Ordering::Equal => return 0,
                std::cmp::Ordering::Less => sign = -sign,
                std::cmp::Ordering::Greater => {}
            }
        }
    }
    sign
}

/// Splits a flat coordinate tuple across sub-terms in left-to-right order,
/// giving each sub-term as many components as it has indices.
///
/// # Errors
///
/// The total index count must equal the sum of the arities; anything else is
/// a contract violation between signature extraction and materialization.
pub fn split_tuple<'t>(
    tuple: &'t [usize],
    arities: &[usize],
) -> Result<Vec<&'t [usize]>, ExpandError> {
    let total: usize = arities.iter().sum();
    if total != tuple.len() {
        return Err(ExpandError::UnknownTerm(format!(
            "coordinate tuple of length {} cannot be split into arities {arities:?}",
            tuple.len()
        )));
    }
    let mut out = Vec::with_capacity(arities.len());
    let mut offset = 0;
    for &arity in arities {
        out.push(&tuple[offset..offset + arity]);
        offset += arity;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicial_core::ExprNode;

    #[test]
    fn test_kronecker_delta_closed_form() {
        for ndim in 1..=3 {
            let arena = &mut ExprArena::new();
            let kd = kronecker_array(arena, ndim);
            for index in kd.indices() {
                let expected = i64::from(index[0] == index[1]);
                assert_eq!(arena.get(kd.get(&index)), &ExprNode::Integer(expected));
            }
        }
    }

    #[test]
    fn test_levi_civita_entries() {
        let arena = &mut ExprArena::new();
        let lc = levi_civita_array(arena, 3).unwrap();

        let mut positive = 0;
        let mut negative = 0;
        let mut zero = 0;
        for index in lc.indices() {
            match arena.get(lc.get(&index)) {
                ExprNode::Integer(1) => positive += 1,
                ExprNode::Integer(-1) => negative += 1,
                ExprNode::Integer(0) => zero += 1,
                other => panic!("unexpected entry {other:?}"),
            }
        }
        // 27 entries: 6 nonzero (three +1, three -1), 21 zero.
        assert_eq!((positive, negative, zero), (3, 3, 21));

        let plus = arena.integer(1);
        let minus = arena.integer(-1);
        assert_eq!(lc.get(&[0, 1, 2]), plus);
        assert_eq!(lc.get(&[1, 2, 0]), plus);
        assert_eq!(lc.get(&[2, 1, 0]), minus);
    }

    #[test]
    fn test_levi_civita_wrong_dimension() {
        let arena = &mut ExprArena::new();
        assert!(matches!(
            levi_civita_array(arena, 2),
            Err(ExpandError::InvalidFunction(_))
        ));
    }

    #[test]
    fn test_field_components_are_coordinate_functions() {
        let arena = &mut ExprArena::new();
        let x0 = arena.term_expr("x0");
        let t = arena.term_expr("t");
        let u = arena.intern_term("u_i");
        let coords = [x0, t];

        let array = term_components(arena, u, 2, Some(&coords));
        assert_eq!(array.shape(), &[2]);

        let u1 = arena.intern_term("u1");
        let expected = arena.function(FunctionKind::Plain(u1), [x0, t]);
        assert_eq!(array.get(&[1]), expected);
    }

    #[test]
    fn test_constant_components_stay_bare() {
        let arena = &mut ExprArena::new();
        let a = arena.intern_term("a_i");
        arena.mark_constant(a);
        let array = term_components(arena, a, 3, None);
        assert_eq!(array.shape(), &[3]);
        let a2 = arena.term_expr("a2");
        assert_eq!(array.get(&[2]), a2);
        match arena.get(a2) {
            ExprNode::Term(id) => assert!(arena.term(*id).is_constant),
            other => panic!("expected a term, got {other:?}"),
        }
    }

    #[test]
    fn test_split_tuple() {
        let split = split_tuple(&[0, 1, 2], &[2, 1]).unwrap();
        assert_eq!(split, vec![&[0usize, 1][..], &[2usize][..]]);
        assert!(split_tuple(&[0, 1], &[2, 1]).is_err());
        let empty = split_tuple(&[], &[0]).unwrap();
        assert_eq!(empty, vec![&[][..] as &[usize]]);
    }
}
