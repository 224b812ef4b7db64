//! Dense N-dimensional arrays of scalar expressions.
//!
//! A materialized term is a mapping from index tuples (each component in
//! `[0, ndim)`) to scalar sub-expressions, stored row-major in a flat `Vec`.
//! Rank 0 is a single scalar. Arrays are freshly allocated per
//! materialization and never shared.

use indicial_core::{ExprArena, ExprHandle, IndexId};
use smallvec::SmallVec;

/// Shape type: one extent per axis.
pub type Shape = SmallVec<[usize; 4]>;

/// A dense row-major array of scalar expression handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedArray {
    shape: Shape,
    data: Vec<ExprHandle>,
}

impl IndexedArray {
    /// Creates an array of the given shape filled with zeros.
    pub fn zeros(arena: &mut ExprArena, shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let len = shape.iter().product();
        let zero = arena.integer(0);
        Self {
            shape,
            data: vec![zero; len],
        }
    }

    /// Creates a rank-0 array holding one scalar.
    pub fn scalar(value: ExprHandle) -> Self {
        Self {
            shape: Shape::new(),
            data: vec![value],
        }
    }

    /// The array's shape.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The number of axes.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Returns the single element of a rank-0 array.
    ///
    /// # Panics
    ///
    /// Panics if the array is not rank 0.
    #[must_use]
    pub fn as_scalar(&self) -> ExprHandle {
        assert!(self.rank() == 0, "as_scalar on a rank-{} array", self.rank());
        self.data[0]
    }

    fn offset(&self, index: &[usize]) -> usize {
        debug_assert_eq!(index.len(), self.shape.len());
        let mut offset = 0;
        for (i, &extent) in index.iter().zip(self.shape.iter()) {
            debug_assert!(*i < extent);
            offset = offset * extent + i;
        }
        offset
    }

    /// Gets the element at a multi-index.
    #[must_use]
    pub fn get(&self, index: &[usize]) -> ExprHandle {
        self.data[self.offset(index)]
    }

    /// Sets the element at a multi-index.
    pub fn set(&mut self, index: &[usize], value: ExprHandle) {
        let offset = self.offset(index);
        self.data[offset] = value;
    }

    /// Iterates over all multi-indices of this shape in row-major order.
    /// A rank-0 array yields exactly one empty tuple.
    #[must_use]
    pub fn indices(&self) -> MultiIndexIter {
        MultiIndexIter::new(self.shape.clone())
    }

    /// Transposes a rank-2 array.
    ///
    /// # Panics
    ///
    /// Panics if the array is not rank 2.
    #[must_use]
    pub fn transposed(&self) -> Self {
        assert!(self.rank() == 2, "transpose is defined for rank 2 only");
        let mut out = Self {
            shape: smallvec::smallvec![self.shape[1], self.shape[0]],
            data: self.data.clone(),
        };
        for index in self.indices() {
            out.set(&[index[1], index[0]], self.get(&index));
        }
        out
    }
}

/// Row-major multi-index iterator (an odometer over a shape).
pub struct MultiIndexIter {
    shape: Shape,
    next: Option<SmallVec<[usize; 4]>>,
}

impl MultiIndexIter {
    /// Creates an iterator over all multi-indices of `shape`.
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        let next = if shape.iter().any(|&e| e == 0) {
            None
        } else {
            Some(smallvec::smallvec![0; shape.len()])
        };
        Self { shape, next }
    }
}

impl Iterator for MultiIndexIter {
    type Item = SmallVec<[usize; 4]>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.clone()?;
        // Advance the odometer, last axis fastest.
        let mut bump = self.next.clone();
        let mut done = true;
        if let Some(ref mut idx) = bump {
            for axis in (0..self.shape.len()).rev() {
                idx[axis] += 1;
                if idx[axis] < self.shape[axis] {
                    done = false;
                    break;
                }
                idx[axis] = 0;
            }
        }
        self.next = if done { None } else { bump };
        Some(current)
    }
}

/// Tensor product: the result's shape is the concatenation of both shapes
/// and each element is the product of the paired elements.
pub fn tensor_product(arena: &mut ExprArena, a: &IndexedArray, b: &IndexedArray) -> IndexedArray {
    let mut shape = a.shape.clone();
    shape.extend(b.shape.iter().copied());
    let mut out = IndexedArray::zeros(arena, shape);
    for ia in a.indices() {
        for ib in b.indices() {
            let mut index = ia.clone();
            index.extend(ib.iter().copied());
            let product = arena.mul([a.get(&ia), b.get(&ib)]);
            out.set(&index, product);
        }
    }
    out
}

/// Sums over the listed axes jointly: elements whose coordinates agree on
/// every listed axis are added. Two axes give the classic pair contraction;
/// one axis is a plain axis sum (the self-contraction of a squared term).
///
/// # Panics
///
/// Panics if the listed axes do not all have the same extent.
pub fn contract(arena: &mut ExprArena, array: &IndexedArray, axes: &[usize]) -> IndexedArray {
    debug_assert!(!axes.is_empty());
    let extent = array.shape()[axes[0]];
    assert!(
        axes.iter().all(|&a| array.shape()[a] == extent),
        "contracted axes must share one extent"
    );

    let kept: Vec<usize> = (0..array.rank()).filter(|a| !axes.contains(a)).collect();
    let out_shape: Shape = kept.iter().map(|&a| array.shape()[a]).collect();
    let mut out = IndexedArray::zeros(arena, out_shape);

    for out_index in out.indices() {
        let mut addends: SmallVec<[ExprHandle; 4]> = SmallVec::new();
        for k in 0..extent {
            let mut full: SmallVec<[usize; 4]> = smallvec::smallvec![0; array.rank()];
            for (pos, &axis) in kept.iter().enumerate() {
                full[axis] = out_index[pos];
            }
            for &axis in axes {
                full[axis] = k;
            }
            addends.push(array.get(&full));
        }
        let sum = arena.add(addends);
        out.set(&out_index, sum);
    }
    out
}

/// Contracts every index present in `raw` but absent from `outer`, summing
/// the matched axes and shrinking rank accordingly, until none remain.
pub fn apply_contraction(
    arena: &mut ExprArena,
    outer: &[IndexId],
    raw: &[IndexId],
    array: IndexedArray,
) -> IndexedArray {
    let mut raw: Vec<IndexId> = raw.to_vec();
    let mut array = array;
    loop {
        let Some(&index) = raw.iter().find(|i| !outer.contains(i)) else {
            return array;
        };
        let axes: Vec<usize> = raw
            .iter()
            .enumerate()
            .filter_map(|(pos, &i)| (i == index).then_some(pos))
            .collect();
        array = contract(arena, &array, &axes);
        raw.retain(|&i| i != index);
    }
}
