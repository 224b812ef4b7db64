//! Arena allocator for expression storage.
//!
//! All expressions live contiguously in a `Vec`, with hash-consing ensuring
//! each unique expression is stored exactly once. The arena also owns the
//! term and index tables, so a term's index structure is computed once at
//! intern time and shared by every node referring to it.
//!
//! The convenience constructors perform only the light normalization the
//! expansion engine relies on (dropping zero addends, absorbing zero factors,
//! folding integer literals). General algebraic simplification is out of
//! scope.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::expr::{ExprNode, FunctionKind, IndexId, TermId};
use crate::handle::ExprHandle;
use crate::term::{split_name, EinsteinTerm};

/// The main arena for storing expressions.
#[derive(Debug, Default)]
pub struct ExprArena {
    /// Storage for all expression nodes.
    nodes: Vec<ExprNode>,
    /// Interning table: maps node content to its handle.
    intern_map: HashMap<ExprNode, ExprHandle>,
    /// Term table: all interned Einstein terms.
    terms: Vec<EinsteinTerm>,
    /// Maps full term names to their IDs.
    term_map: HashMap<String, TermId>,
    /// Index-symbol names by ID.
    index_names: Vec<String>,
    /// Maps index-symbol names to their IDs.
    index_map: HashMap<String, IndexId>,
}

impl ExprArena {
    /// Creates a new empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns an expression node, returning its handle.
    ///
    /// If an identical node already exists, returns the existing handle.
    pub fn intern(&mut self, node: ExprNode) -> ExprHandle {
        if let Some(&handle) = self.intern_map.get(&node) {
            return handle;
        }

        let index = self.nodes.len();
        assert!(index < u32::MAX as usize, "Arena capacity exceeded");

        let handle = ExprHandle::new(index as u32);
        self.nodes.push(node.clone());
        self.intern_map.insert(node, handle);
        handle
    }

    /// Gets the node at the given handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is invalid.
    #[must_use]
    pub fn get(&self, handle: ExprHandle) -> &ExprNode {
        &self.nodes[handle.index() as usize]
    }

    /// Returns the number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // === Index symbols ===

    /// Interns an index symbol, returning its unique ID.
    pub fn intern_index(&mut self, name: &str) -> IndexId {
        if let Some(&id) = self.index_map.get(name) {
            return id;
        }
        let id = self.index_names.len() as IndexId;
        self.index_map.insert(name.to_string(), id);
        self.index_names.push(name.to_string());
        id
    }

    /// Gets the name of an index symbol by its ID.
    #[must_use]
    pub fn index_name(&self, id: IndexId) -> &str {
        &self.index_names[id as usize]
    }

    // === Einstein terms ===

    /// Interns a term by its full name, deriving its index structure from the
    /// underscore-separated suffix (`tau_i_j` has base `tau` and indices
    /// `i`, `j`). Returns the existing ID if the name was seen before.
    pub fn intern_term(&mut self, name: &str) -> TermId {
        if let Some(&id) = self.term_map.get(name) {
            return id;
        }
        let (base, index_names) = split_name(name);
        let base = base.to_string();
        let indices: SmallVec<[IndexId; 2]> = index_names
            .iter()
            .map(|n| self.intern_index(n))
            .collect();
        let id = self.terms.len() as TermId;
        self.terms.push(EinsteinTerm {
            name: name.to_string(),
            base,
            indices,
            is_constant: false,
            is_coordinate: false,
        });
        self.term_map.insert(name.to_string(), id);
        id
    }

    /// Gets a term record by its ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is invalid.
    #[must_use]
    pub fn term(&self, id: TermId) -> &EinsteinTerm {
        &self.terms[id as usize]
    }

    /// Marks the term as constant in space and time.
    pub fn mark_constant(&mut self, id: TermId) {
        self.terms[id as usize].is_constant = true;
    }

    /// Marks the term as a coordinate symbol (coordinates are also constant).
    pub fn mark_coordinate(&mut self, id: TermId) {
        let term = &mut self.terms[id as usize];
        term.is_constant = true;
        term.is_coordinate = true;
    }

    /// Builds the component term obtained by substituting concrete values
    /// for the term's indices, e.g. `u_i` at `[0]` becomes `u0`.
    ///
    /// The constant and coordinate flags carry over to the component.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not match the term's rank.
    pub fn component(&mut self, id: TermId, values: &[usize]) -> TermId {
        let term = self.term(id);
        assert_eq!(
            values.len(),
            term.indices.len(),
            "component values must match term rank"
        );
        let mut name = term.base.clone();
        for v in values {
            name.push_str(&v.to_string());
        }
        let is_constant = term.is_constant;
        let is_coordinate = term.is_coordinate;
        let component = self.intern_term(&name);
        if is_constant {
            self.mark_constant(component);
        }
        if is_coordinate {
            self.mark_coordinate(component);
        }
        component
    }

    // === Convenience constructors ===

    /// Creates an integer expression.
    pub fn integer(&mut self, value: i64) -> ExprHandle {
        self.intern(ExprNode::Integer(value))
    }

    /// Creates a rational expression, normalized to lowest terms with a
    /// positive denominator. A denominator of 1 collapses to an integer.
    ///
    /// # Panics
    ///
    /// Panics if the denominator is zero.
    pub fn rational(&mut self, num: i64, den: i64) -> ExprHandle {
        assert!(den != 0, "rational denominator must be nonzero");
        let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
        let g = gcd(num.unsigned_abs(), den.unsigned_abs());
        let (num, den) = (num / g as i64, den as u64 / g);
        if den == 1 {
            self.integer(num)
        } else {
            self.intern(ExprNode::Rational(num, den))
        }
    }

    /// Creates a term expression from its full name.
    pub fn term_expr(&mut self, name: &str) -> ExprHandle {
        let id = self.intern_term(name);
        self.intern(ExprNode::Term(id))
    }

    /// Creates an addition, dropping zero addends, folding integer literals
    /// and flattening nested sums. An empty or fully-cancelled sum is zero;
    /// a single surviving addend is returned unwrapped.
    pub fn add(&mut self, args: impl IntoIterator<Item = ExprHandle>) -> ExprHandle {
        let mut terms: SmallVec<[ExprHandle; 4]> = SmallVec::new();
        let mut acc: i64 = 0;
        for arg in args {
            match self.get(arg) {
                ExprNode::Integer(v) => acc += v,
                ExprNode::Add(inner) => {
                    let inner = inner.clone();
                    for h in inner {
                        if let ExprNode::Integer(v) = self.get(h) {
                            acc += v;
                        } else {
                            terms.push(h);
                        }
                    }
                }
                _ => terms.push(arg),
            }
        }
        if acc != 0 {
            let lit = self.integer(acc);
            terms.push(lit);
        }
        match terms.len() {
            0 => self.integer(0),
            1 => terms[0],
            _ => self.intern(ExprNode::Add(terms)),
        }
    }

    /// Creates a multiplication, absorbing zero, dropping unit factors,
    /// folding integer literals and flattening nested products. A nontrivial
    /// integer coefficient is kept as the leading factor.
    pub fn mul(&mut self, args: impl IntoIterator<Item = ExprHandle>) -> ExprHandle {
        let mut factors: SmallVec<[ExprHandle; 4]> = SmallVec::new();
        let mut coeff: i64 = 1;
        for arg in args {
            match self.get(arg) {
                ExprNode::Integer(0) => return self.integer(0),
                ExprNode::Integer(v) => coeff *= v,
                ExprNode::Mul(inner) => {
                    let inner = inner.clone();
                    for h in inner {
                        match self.get(h) {
                            ExprNode::Integer(0) => return self.integer(0),
                            ExprNode::Integer(v) => coeff *= v,
                            _ => factors.push(h),
                        }
                    }
                }
                _ => factors.push(arg),
            }
        }
        if coeff == 0 {
            return self.integer(0);
        }
        if coeff != 1 {
            let lit = self.integer(coeff);
            factors.insert(0, lit);
        }
        match factors.len() {
            0 => self.integer(1),
            1 => factors[0],
            _ => self.intern(ExprNode::Mul(factors)),
        }
    }

    /// Creates a power expression; `x^0` is one and `x^1` is `x`.
    pub fn pow(&mut self, base: ExprHandle, exp: ExprHandle) -> ExprHandle {
        match self.get(exp) {
            ExprNode::Integer(0) => self.integer(1),
            ExprNode::Integer(1) => base,
            _ => {
                if self.get(base).is_one() {
                    base
                } else {
                    self.intern(ExprNode::Pow { base, exp })
                }
            }
        }
    }

    /// Creates a negation as multiplication by `-1`.
    pub fn neg(&mut self, arg: ExprHandle) -> ExprHandle {
        let minus_one = self.integer(-1);
        self.mul([minus_one, arg])
    }

    /// Creates a function application.
    pub fn function(
        &mut self,
        kind: FunctionKind,
        args: impl Into<SmallVec<[ExprHandle; 2]>>,
    ) -> ExprHandle {
        self.intern(ExprNode::Function {
            kind,
            args: args.into(),
        })
    }

    /// Creates an unevaluated derivative node. With no directions the target
    /// is returned unchanged.
    pub fn derivative(
        &mut self,
        target: ExprHandle,
        directions: impl IntoIterator<Item = ExprHandle>,
    ) -> ExprHandle {
        let directions: SmallVec<[ExprHandle; 2]> = directions.into_iter().collect();
        if directions.is_empty() {
            return target;
        }
        self.intern(ExprNode::Derivative { target, directions })
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    if a == 0 {
        return b.max(1);
    }
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}
