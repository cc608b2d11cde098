//! Keep-dims reductions: sum and max down to a target shape.

use crate::array::{Array, Walk};
use crate::element::{with_elem, Element};
use crate::error::TesselError;
use crate::shape::Shape;
use crate::storage::Storage;
use crate::Result;

#[derive(Clone, Copy)]
enum Reduction {
    Sum,
    Max,
}

impl Reduction {
    fn name(self) -> &'static str {
        match self {
            Reduction::Sum => "sum",
            Reduction::Max => "max",
        }
    }
}

impl Array {
    /// Sum over every axis where `shape` differs from `self.shape()`.
    ///
    /// The rank is preserved with reduced axes collapsed to 1. Accumulation
    /// happens in the input dtype, so integer sums wrap and a bool sum is a
    /// logical any. Returns `self` unchanged when the shapes are equal.
    ///
    /// ```
    /// use tessel_core::Array;
    ///
    /// let a = Array::from_vec(vec![1i32, 2, 3, 4, 5, 6], [2, 3]).unwrap();
    /// let s = a.sum_to([2, 1]).unwrap();
    /// assert_eq!(s.to_vec::<i32>().unwrap(), vec![6, 15]);
    /// ```
    pub fn sum_to(&self, shape: impl Into<Shape>) -> Result<Array> {
        reduce(self, shape.into(), Reduction::Sum)
    }

    /// Maximum over every axis where `shape` differs from `self.shape()`.
    ///
    /// NaN propagates. Reducing an axis of extent 0 fails with
    /// [`TesselError::EmptyReduction`].
    pub fn max_to(&self, shape: impl Into<Shape>) -> Result<Array> {
        reduce(self, shape.into(), Reduction::Max)
    }
}

fn reduce(a: &Array, target: Shape, op: Reduction) -> Result<Array> {
    let axes = a.shape().reduced_axes(&target)?;
    if axes.is_empty() {
        return Ok(a.clone());
    }
    if axes.iter().any(|&axis| target.dims()[axis] != 1) {
        return Err(TesselError::ShapeMismatch {
            expected: a.shape().collapse(&axes).dims().to_vec(),
            got: target.dims().to_vec(),
        });
    }
    if matches!(op, Reduction::Max) && axes.iter().any(|&axis| a.shape().dims()[axis] == 0) {
        return Err(TesselError::EmptyReduction { op: op.name() });
    }

    // Output strides with reduced axes pinned, walked in input order.
    let mut out_strides = target.contiguous_strides();
    for &axis in &axes {
        out_strides[axis] = 0;
    }
    let targets = Walk::new(a.shape().dims(), &out_strides, 0);

    let storage = with_elem!(a.dtype(), T => {
        let out = accumulate::<T>(a.values::<T>(), targets, target.numel(), op);
        Storage::from_vec(out)
    });
    Ok(Array::from_contiguous(storage, target))
}

fn accumulate<T: Element>(values: Vec<T>, targets: Walk<'_>, numel: usize, op: Reduction) -> Vec<T> {
    match op {
        Reduction::Sum => {
            let mut out = vec![T::zero(); numel];
            for (x, j) in values.into_iter().zip(targets) {
                out[j] = out[j].plus(x);
            }
            out
        }
        Reduction::Max => {
            let mut out: Vec<Option<T>> = vec![None; numel];
            for (x, j) in values.into_iter().zip(targets) {
                out[j] = Some(match out[j] {
                    Some(acc) => acc.maximum(x),
                    None => x,
                });
            }
            out.into_iter().map(|v| v.unwrap_or_else(T::zero)).collect()
        }
    }
}
