//! The Einstein-expansion driver.
//!
//! Expands one equation at a time. The driver classifies every leaf,
//! materializes Kronecker-delta and Levi-Civita occurrences, then function
//! nodes innermost-first, and finally evaluates both sides through the
//! per-equation term→array dictionary. The dictionary is owned by the
//! expansion call and dropped when it returns; there is no cross-equation
//! cache.

use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::debug;

use indicial_core::rewrite::postorder;
use indicial_core::{diff, ExprArena, ExprHandle, ExprNode, FunctionKind, IndexId, TermId};

use crate::array::{apply_contraction, tensor_product, IndexedArray, Shape};
use crate::error::ExpandError;
use crate::materialize::{
    kronecker_array, levi_civita_array, split_tuple, term_components,
};
use crate::signature::{argument_indices, check_multiplicity, has_indexed_term, remove_repeated};

/// One fully explicit scalar equation, free of indices and contractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarEquation {
    /// Left-hand side.
    pub lhs: ExprHandle,
    /// Right-hand side.
    pub rhs: ExprHandle,
}

/// A dictionary entry: the array a sub-expression materialized to, together
/// with its declared index list (which may contain repeats; those contract
/// on evaluation).
#[derive(Debug, Clone)]
struct Materialized {
    indices: Vec<IndexId>,
    array: IndexedArray,
}

/// An evaluated expression: a (possibly rank-0) array and its free-index
/// order.
struct Evaluated {
    indices: Vec<IndexId>,
    array: IndexedArray,
}

/// Expands one equation written in Einstein notation.
pub struct EinsteinExpansion<'a> {
    arena: &'a mut ExprArena,
    ndim: usize,
    coordinate_symbol: String,
    /// Per-equation term→array dictionary, keyed by structural identity
    /// (hash-consing makes that plain handle equality).
    dictionary: HashMap<ExprHandle, Materialized>,
    /// Expanded coordinate components plus `t`.
    coordinates: Vec<ExprHandle>,
    /// Counter for synthetic placeholder names.
    fresh: usize,
}

impl<'a> EinsteinExpansion<'a> {
    /// Creates a driver for one equation.
    ///
    /// # Errors
    ///
    /// Fails if `ndim` is zero.
    pub fn new(
        arena: &'a mut ExprArena,
        ndim: usize,
        coordinate_symbol: &str,
    ) -> Result<Self, ExpandError> {
        if ndim == 0 {
            return Err(ExpandError::InvalidDimension(ndim));
        }
        Ok(Self {
            arena,
            ndim,
            coordinate_symbol: coordinate_symbol.to_string(),
            dictionary: HashMap::new(),
            coordinates: Vec::new(),
            fresh: 0,
        })
    }

    /// Expands `lhs = rhs` into explicit scalar equations, one per
    /// coordinate tuple of the surviving free-index shape, in row-major
    /// order. Consumes the driver; the dictionary does not outlive the
    /// equation.
    pub fn expand(
        mut self,
        lhs: ExprHandle,
        rhs: ExprHandle,
    ) -> Result<Vec<ScalarEquation>, ExpandError> {
        // Every distinct subtree, children before parents, so nested
        // functions are materialized after their arguments resolve.
        let mut nodes = postorder(self.arena, lhs);
        for node in postorder(self.arena, rhs) {
            if !nodes.contains(&node) {
                nodes.push(node);
            }
        }

        self.setup_coordinates(&nodes);
        self.materialize_terms(&nodes);
        self.materialize_deltas(&nodes)?;
        self.materialize_functions(&nodes)?;

        let lhs_eval = self.evaluate(lhs)?;
        let rhs_eval = self.evaluate(rhs)?;
        if lhs_eval.array.shape() != rhs_eval.array.shape() {
            return Err(ExpandError::ShapeMismatch {
                lhs: lhs_eval.array.shape().to_vec(),
                rhs: rhs_eval.array.shape().to_vec(),
            });
        }

        let mut expanded = Vec::new();
        for index in lhs_eval.array.indices() {
            expanded.push(ScalarEquation {
                lhs: lhs_eval.array.get(&index),
                rhs: rhs_eval.array.get(&index),
            });
        }
        debug!(count = expanded.len(), "expanded equation");
        Ok(expanded)
    }

    /// Builds the coordinate tuple every field is a function of: the
    /// expanded components of the indexed coordinate symbol (synthesized
    /// from the coordinate base when the equation never mentions one),
    /// followed by `t`.
    fn setup_coordinates(&mut self, nodes: &[ExprHandle]) {
        let mut components = Vec::new();
        for &node in nodes {
            if let ExprNode::Term(id) = *self.arena.get(node) {
                let term = self.arena.term(id);
                if term.is_coordinate && term.is_indexed() {
                    let array = term_components(self.arena, id, self.ndim, None);
                    components = array.indices().map(|i| array.get(&i)).collect();
                    break;
                }
            }
        }
        if components.is_empty() {
            for dim in 0..self.ndim {
                let name = format!("{}{dim}", self.coordinate_symbol);
                let id = self.arena.intern_term(&name);
                self.arena.mark_coordinate(id);
                components.push(self.arena.term_expr(&name));
            }
        }
        let t_id = self.arena.intern_term("t");
        self.arena.mark_coordinate(t_id);
        components.push(self.arena.term_expr("t"));
        self.coordinates = components;
    }

    /// Classifies and materializes every distinct term leaf: constant
    /// scalars stay themselves, constant indexed terms expand to bare
    /// components, fields become functions of the coordinate tuple.
    fn materialize_terms(&mut self, nodes: &[ExprHandle]) {
        for &node in nodes {
            let ExprNode::Term(id) = *self.arena.get(node) else {
                continue;
            };
            if self.dictionary.contains_key(&node) {
                continue;
            }
            let term = self.arena.term(id);
            // A leading-underscore name such as `_i` is a bare index
            // argument, not a quantity.
            if term.base.is_empty() {
                continue;
            }
            let indices: Vec<IndexId> = term.indices.iter().copied().collect();
            let entry = if term.is_constant {
                if term.is_indexed() {
                    Materialized {
                        indices,
                        array: term_components(self.arena, id, self.ndim, None),
                    }
                } else {
                    Materialized {
                        indices,
                        array: IndexedArray::scalar(node),
                    }
                }
            } else {
                let coordinates = self.coordinates.clone();
                if term.is_indexed() {
                    Materialized {
                        indices,
                        array: term_components(self.arena, id, self.ndim, Some(&coordinates)),
                    }
                } else {
                    let args: SmallVec<[ExprHandle; 2]> =
                        coordinates.iter().copied().collect();
                    let applied = self.arena.function(FunctionKind::Plain(id), args);
                    Materialized {
                        indices,
                        array: IndexedArray::scalar(applied),
                    }
                }
            };
            self.dictionary.insert(node, entry);
        }
    }

    /// Materializes Kronecker-delta and Levi-Civita occurrences. These have
    /// no dependencies and go first.
    fn materialize_deltas(&mut self, nodes: &[ExprHandle]) -> Result<(), ExpandError> {
        for &node in nodes {
            let ExprNode::Function { kind, args } = self.arena.get(node).clone() else {
                continue;
            };
            if self.dictionary.contains_key(&node) {
                continue;
            }
            match kind {
                FunctionKind::KroneckerDelta => {
                    let indices = argument_indices(self.arena, &args)?;
                    if indices.len() != 2 {
                        return Err(ExpandError::InvalidFunction(format!(
                            "KD carries {} indices, expected 2",
                            indices.len()
                        )));
                    }
                    let array = kronecker_array(self.arena, self.ndim);
                    self.dictionary.insert(node, Materialized { indices, array });
                }
                FunctionKind::LeviCivita => {
                    let indices = argument_indices(self.arena, &args)?;
                    if indices.len() != 3 {
                        return Err(ExpandError::InvalidFunction(format!(
                            "LC carries {} indices, expected 3",
                            indices.len()
                        )));
                    }
                    let array = levi_civita_array(self.arena, self.ndim)?;
                    self.dictionary.insert(node, Materialized { indices, array });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Materializes derivative and plain-function nodes. `nodes` is in
    /// post-order, so a nested function's arguments are always resolved
    /// before the function itself.
    fn materialize_functions(&mut self, nodes: &[ExprHandle]) -> Result<(), ExpandError> {
        for &node in nodes {
            let ExprNode::Function { kind, args } = self.arena.get(node).clone() else {
                continue;
            };
            if self.dictionary.contains_key(&node) {
                continue;
            }
            match kind {
                FunctionKind::Der | FunctionKind::Conservative => {
                    self.materialize_derivative(node, kind, &args)?;
                }
                FunctionKind::Plain(id) => {
                    self.materialize_plain(node, id, &args)?;
                }
                FunctionKind::KroneckerDelta | FunctionKind::LeviCivita => {}
            }
        }
        Ok(())
    }

    fn fresh_name(&mut self) -> String {
        let name = format!("Arr{}", self.fresh);
        self.fresh += 1;
        name
    }

    fn materialize_derivative(
        &mut self,
        node: ExprHandle,
        kind: FunctionKind,
        args: &[ExprHandle],
    ) -> Result<(), ExpandError> {
        let target = self.evaluate(args[0])?;

        // The flat index structure: the target's free indices followed by
        // each direction's indices, left to right.
        let mut der_struct = target.indices.clone();
        let mut directions: Vec<(ExprHandle, TermId)> = Vec::new();
        for &dir in &args[1..] {
            let ExprNode::Term(id) = *self.arena.get(dir) else {
                return Err(ExpandError::InvalidFunction(format!(
                    "derivative direction `{}` is not a symbol",
                    self.arena.display(dir)
                )));
            };
            der_struct.extend(self.arena.term(id).indices.iter().copied());
            directions.push((dir, id));
        }
        check_multiplicity(self.arena, &der_struct)?;

        let mut arities = vec![target.indices.len()];
        for &(_, id) in &directions {
            arities.push(self.arena.term(id).rank());
        }

        let shape: Shape = std::iter::repeat(self.ndim)
            .take(der_struct.len())
            .collect();
        let mut array = IndexedArray::zeros(self.arena, shape);
        for index in array.indices().collect::<Vec<_>>() {
            let parts = split_tuple(&index, &arities)?;
            let operand = if target.indices.is_empty() {
                target.array.as_scalar()
            } else {
                target.array.get(parts[0])
            };
            let mut scalars: SmallVec<[ExprHandle; 2]> = SmallVec::new();
            for (pos, &(handle, id)) in directions.iter().enumerate() {
                if self.arena.term(id).is_indexed() {
                    let component = self.arena.component(id, parts[pos + 1]);
                    let name = self.arena.term(component).name.clone();
                    scalars.push(self.arena.term_expr(&name));
                } else {
                    scalars.push(handle);
                }
            }
            let value = match kind {
                FunctionKind::Der => {
                    let mut out = operand;
                    for &direction in &scalars {
                        out = diff(self.arena, out, direction);
                    }
                    out
                }
                _ => self.arena.derivative(operand, scalars),
            };
            array.set(&index, value);
        }

        let outer = remove_repeated(&der_struct);
        let array = apply_contraction(self.arena, &outer, &der_struct, array);
        let name = self.fresh_name();
        debug!(
            placeholder = name.as_str(),
            expr = %self.arena.display(node),
            "materialized derivative"
        );
        self.dictionary.insert(
            node,
            Materialized {
                indices: outer,
                array,
            },
        );
        Ok(())
    }

    fn materialize_plain(
        &mut self,
        node: ExprHandle,
        id: TermId,
        args: &[ExprHandle],
    ) -> Result<(), ExpandError> {
        let mut evaluated = Vec::with_capacity(args.len());
        let mut combined: Vec<IndexId> = Vec::new();
        let mut arities = Vec::with_capacity(args.len());
        for &arg in args {
            let ev = self.evaluate(arg)?;
            combined.extend(ev.indices.iter().copied());
            arities.push(ev.indices.len());
            evaluated.push(ev);
        }
        check_multiplicity(self.arena, &combined)?;

        let shape: Shape = std::iter::repeat(self.ndim).take(combined.len()).collect();
        let mut array = IndexedArray::zeros(self.arena, shape);
        for index in array.indices().collect::<Vec<_>>() {
            let parts = split_tuple(&index, &arities)?;
            let mut elements: SmallVec<[ExprHandle; 2]> = SmallVec::new();
            for (pos, ev) in evaluated.iter().enumerate() {
                if ev.indices.is_empty() {
                    elements.push(ev.array.as_scalar());
                } else {
                    elements.push(ev.array.get(parts[pos]));
                }
            }
            let value = self.arena.function(FunctionKind::Plain(id), elements);
            array.set(&index, value);
        }

        let outer = remove_repeated(&combined);
        let array = apply_contraction(self.arena, &outer, &combined, array);
        let name = self.fresh_name();
        debug!(
            placeholder = name.as_str(),
            expr = %self.arena.display(node),
            "materialized function"
        );
        self.dictionary.insert(
            node,
            Materialized {
                indices: outer,
                array,
            },
        );
        Ok(())
    }

    /// Looks up a dictionary entry and contracts its repeated indices.
    fn lookup(&mut self, node: ExprHandle) -> Result<Evaluated, ExpandError> {
        let Some(entry) = self.dictionary.get(&node).cloned() else {
            return Err(ExpandError::UnknownTerm(
                self.arena.display(node).to_string(),
            ));
        };
        let outer = remove_repeated(&entry.indices);
        let array = apply_contraction(self.arena, &outer, &entry.indices, entry.array);
        Ok(Evaluated {
            indices: outer,
            array,
        })
    }

    /// Evaluates an expression through the materialized-term dictionary,
    /// producing a (possibly rank-0) array and its free-index order.
    fn evaluate(&mut self, expr: ExprHandle) -> Result<Evaluated, ExpandError> {
        match self.arena.get(expr).clone() {
            ExprNode::Integer(_) | ExprNode::Rational(_, _) => Ok(Evaluated {
                indices: Vec::new(),
                array: IndexedArray::scalar(expr),
            }),
            ExprNode::Term(_) | ExprNode::Function { .. } => self.lookup(expr),
            ExprNode::Mul(args) => self.evaluate_product(&args),
            ExprNode::Add(args) => self.evaluate_sum(expr, &args),
            ExprNode::Pow { base, exp } => self.evaluate_power(expr, base, exp),
            ExprNode::Derivative { .. } => Err(ExpandError::UnknownTerm(
                self.arena.display(expr).to_string(),
            )),
        }
    }

    /// Outer product of the operand arrays, then contraction of every index
    /// repeated across them.
    fn evaluate_product(&mut self, args: &[ExprHandle]) -> Result<Evaluated, ExpandError> {
        let one = self.arena.integer(1);
        let mut array = IndexedArray::scalar(one);
        let mut combined: Vec<IndexId> = Vec::new();
        for &arg in args {
            let ev = self.evaluate(arg)?;
            array = tensor_product(self.arena, &array, &ev.array);
            combined.extend(ev.indices.iter().copied());
        }
        check_multiplicity(self.arena, &combined)?;
        let outer = remove_repeated(&combined);
        let array = apply_contraction(self.arena, &outer, &combined, array);
        Ok(Evaluated {
            indices: outer,
            array,
        })
    }

    /// Adds evaluated addends. The leading addend fixes the index order; an
    /// addend reporting the exact reverse order is transposed before adding
    /// (rank 2 only). Any other disagreement is an error.
    fn evaluate_sum(
        &mut self,
        expr: ExprHandle,
        args: &[ExprHandle],
    ) -> Result<Evaluated, ExpandError> {
        let mut evaluated = Vec::with_capacity(args.len());
        for &arg in args {
            evaluated.push(self.evaluate(arg)?);
        }
        let mut iter = evaluated.into_iter();
        let Some(leading) = iter.next() else {
            return Err(ExpandError::UnknownTerm(
                self.arena.display(expr).to_string(),
            ));
        };
        let mut array = leading.array;
        let indices = leading.indices;
        for ev in iter {
            let reversed: Vec<IndexId> = ev.indices.iter().rev().copied().collect();
            if ev.indices == indices {
                for index in array.indices().collect::<Vec<_>>() {
                    let sum = self.arena.add([array.get(&index), ev.array.get(&index)]);
                    array.set(&index, sum);
                }
            } else if reversed == indices && ev.indices.len() == 2 {
                let transposed = ev.array.transposed();
                for index in array.indices().collect::<Vec<_>>() {
                    let sum = self
                        .arena
                        .add([array.get(&index), transposed.get(&index)]);
                    array.set(&index, sum);
                }
            } else {
                return Err(ExpandError::IndexMismatch(format!(
                    "addends of `{}` disagree on index order ({} vs {})",
                    self.arena.display(expr),
                    self.format_indices(&indices),
                    self.format_indices(&ev.indices),
                )));
            }
        }
        Ok(Evaluated { indices, array })
    }

    /// Only squaring of an indexed base is supported: the square contracts
    /// fully with itself, yielding a scalar.
    fn evaluate_power(
        &mut self,
        expr: ExprHandle,
        base: ExprHandle,
        exp: ExprHandle,
    ) -> Result<Evaluated, ExpandError> {
        if has_indexed_term(self.arena, exp) {
            return Err(ExpandError::UnsupportedPower(format!(
                "indexed terms are not allowed in exponents: `{}`",
                self.arena.display(expr)
            )));
        }
        let base_eval = self.evaluate(base)?;
        if base_eval.indices.is_empty() {
            let exponent = self.evaluate(exp)?;
            let value = self
                .arena
                .pow(base_eval.array.as_scalar(), exponent.array.as_scalar());
            return Ok(Evaluated {
                indices: Vec::new(),
                array: IndexedArray::scalar(value),
            });
        }
        if !matches!(self.arena.get(exp), ExprNode::Integer(2)) {
            return Err(ExpandError::UnsupportedPower(format!(
                "only exponent 2 is supported on an indexed base: `{}`",
                self.arena.display(expr)
            )));
        }
        let two = self.arena.integer(2);
        let mut squared = base_eval.array.clone();
        for index in squared.indices().collect::<Vec<_>>() {
            let value = self.arena.pow(squared.get(&index), two);
            squared.set(&index, value);
        }
        let array = apply_contraction(self.arena, &[], &base_eval.indices, squared);
        Ok(Evaluated {
            indices: Vec::new(),
            array,
        })
    }

    fn format_indices(&self, indices: &[IndexId]) -> String {
        let names: Vec<&str> = indices.iter().map(|&i| self.arena.index_name(i)).collect();
        format!("[{}]", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicial_core::parse_equation;

    /// Parses, marks coordinate/constant flags the way the front end does,
    /// and expands.
    fn expand(
        arena: &mut ExprArena,
        text: &str,
        ndim: usize,
        constants: &[&str],
    ) -> Result<Vec<ScalarEquation>, ExpandError> {
        let (lhs, rhs) = parse_equation(text, arena)?;
        let mut nodes = postorder(arena, lhs);
        nodes.extend(postorder(arena, rhs));
        for node in nodes {
            if let ExprNode::Term(id) = *arena.get(node) {
                let term = arena.term(id);
                if constants.contains(&term.name.as_str()) {
                    arena.mark_constant(id);
                } else if term.base == "x" || term.base == "t" {
                    arena.mark_coordinate(id);
                }
            }
        }
        EinsteinExpansion::new(arena, ndim, "x")?.expand(lhs, rhs)
    }

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
    fn test_gradient_of_velocity_is_identity() {
        // Der(u_i, x_j) = KD(i, j) at ndim = 2 gives the four component
        // equations of an identity velocity gradient.
        let arena = &mut ExprArena::new();
        let expanded = expand(arena, "Eq(Der(u_i, x_j), KD(i, j))", 2, &[]).unwrap();
        assert_eq!(expanded.len(), 4);

        let c = coords(arena, 2);
        let one = arena.integer(1);
        let zero = arena.integer(0);
        let mut expected = Vec::new();
        for i in 0..2 {
            for j in 0..2 {
                let u = field(arena, &format!("u{i}"), &c);
                let xj = c[j];
                let lhs = arena.derivative(u, [xj]);
                let rhs = if i == j { one } else { zero };
                expected.push(ScalarEquation { lhs, rhs });
            }
        }
        assert_eq!(expanded, expected);
    }

    #[test]
    fn test_dot_product_contracts_to_scalar() {
        let arena = &mut ExprArena::new();
        let expanded = expand(arena, "Eq(k, u_i*v_i)", 3, &[]).unwrap();
        assert_eq!(expanded.len(), 1);

        let c = coords(arena, 3);
        let mut addends = Vec::new();
        for i in 0..3 {
            let u = field(arena, &format!("u{i}"), &c);
            let v = field(arena, &format!("v{i}"), &c);
            addends.push(arena.mul([u, v]));
        }
        let expected = arena.add(addends);
        assert_eq!(expanded[0].rhs, expected);
    }

    #[test]
    fn test_square_is_full_self_contraction() {
        for ndim in 1..=3 {
            let arena = &mut ExprArena::new();
            let expanded = expand(arena, "Eq(k, a_i**2)", ndim, &[]).unwrap();
            assert_eq!(expanded.len(), 1);

            let c = coords(arena, ndim);
            let two = arena.integer(2);
            let mut addends = Vec::new();
            for i in 0..ndim {
                let a = field(arena, &format!("a{i}"), &c);
                addends.push(arena.pow(a, two));
            }
            let expected = arena.add(addends);
            assert_eq!(expanded[0].rhs, expected);
        }
    }

    #[test]
    fn test_expansion_count_matches_free_indices() {
        // ndim^k scalar equations for k surviving free indices.
        for ndim in 1..=3 {
            let arena = &mut ExprArena::new();
            let rank1 = expand(arena, "Eq(w_i, u_i)", ndim, &[]).unwrap();
            assert_eq!(rank1.len(), ndim);

            let arena = &mut ExprArena::new();
            let rank2 = expand(arena, "Eq(tau_i_j, u_i*v_j)", ndim, &[]).unwrap();
            assert_eq!(rank2.len(), ndim * ndim);
        }
    }

    #[test]
    fn test_time_derivative_of_scalar_field() {
        let arena = &mut ExprArena::new();
        let expanded = expand(arena, "Eq(Der(rho, t), 0)", 2, &[]).unwrap();
        assert_eq!(expanded.len(), 1);

        let c = coords(arena, 2);
        let rho = field(arena, "rho", &c);
        let t = arena.term_expr("t");
        let expected = arena.derivative(rho, [t]);
        assert_eq!(expanded[0].lhs, expected);
    }

    #[test]
    fn test_conservative_keeps_derivative_unevaluated() {
        let arena = &mut ExprArena::new();
        let expanded = expand(
            arena,
            "Eq(Der(rho, t), -Conservative(rhou_j, x_j))",
            2,
            &[],
        )
        .unwrap();
        assert_eq!(expanded.len(), 1);

        let c = coords(arena, 2);
        let mut addends = Vec::new();
        for j in 0..2 {
            let flux = field(arena, &format!("rhou{j}"), &c);
            let xj = c[j];
            addends.push(arena.derivative(flux, [xj]));
        }
        let sum = arena.add(addends);
        let expected = arena.neg(sum);
        assert_eq!(expanded[0].rhs, expected);
    }

    #[test]
    fn test_constants_are_not_coordinate_functions() {
        let arena = &mut ExprArena::new();
        let expanded = expand(arena, "Eq(w_i, Re*u_i)", 2, &["Re"]).unwrap();
        assert_eq!(expanded.len(), 2);

        let c = coords(arena, 2);
        let re = arena.term_expr("Re");
        let u0 = field(arena, "u0", &c);
        let expected = arena.mul([re, u0]);
        assert_eq!(expanded[0].rhs, expected);
    }

    #[test]
    fn test_levi_civita_cross_product() {
        let arena = &mut ExprArena::new();
        let expanded = expand(arena, "Eq(w_i, LC(i, j, k)*u_j*v_k)", 3, &[]).unwrap();
        assert_eq!(expanded.len(), 3);

        // w_0 = u_1*v_2 - u_2*v_1; addends come out in ascending order of
        // the summed component, so the negative term is first.
        let c = coords(arena, 3);
        let u1 = field(arena, "u1", &c);
        let u2 = field(arena, "u2", &c);
        let v1 = field(arena, "v1", &c);
        let v2 = field(arena, "v2", &c);
        let pos = arena.mul([u1, v2]);
        let neg_part = arena.mul([u2, v1]);
        let neg = arena.neg(neg_part);
        let expected = arena.add([neg, pos]);
        assert_eq!(expanded[0].rhs, expected);
    }

    #[test]
    fn test_shape_mismatch_is_fatal() {
        let arena = &mut ExprArena::new();
        let err = expand(arena, "Eq(w_i, u_i*v_i)", 2, &[]).unwrap_err();
        assert!(matches!(err, ExpandError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_reversed_rank2_addends_transpose() {
        let arena = &mut ExprArena::new();
        let expanded = expand(arena, "Eq(s_i_j, tau_i_j + tau_j_i)", 2, &[]).unwrap();
        assert_eq!(expanded.len(), 4);

        // Element (0, 1) is tau01 + tau10.
        let c = coords(arena, 2);
        let tau01 = field(arena, "tau01", &c);
        let tau10 = field(arena, "tau10", &c);
        let expected = arena.add([tau01, tau10]);
        assert_eq!(expanded[1].rhs, expected);
    }

    #[test]
    fn test_invalid_dimension() {
        let arena = &mut ExprArena::new();
        assert!(matches!(
            EinsteinExpansion::new(arena, 0, "x"),
            Err(ExpandError::InvalidDimension(0))
        ));
    }
}
