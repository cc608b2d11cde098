use smallvec::SmallVec;
use std::fmt;

use crate::{Result, TesselError};

/// Array shape with stack-allocated storage for ≤4 dimensions.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    dims: SmallVec<[usize; 4]>,
}

impl Shape {
    /// Create a new shape from dimensions.
    pub fn new(dims: &[usize]) -> Self {
        Self {
            dims: SmallVec::from_slice(dims),
        }
    }

    /// Scalar shape (0 dimensions).
    pub fn scalar() -> Self {
        Self {
            dims: SmallVec::new(),
        }
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements. A scalar holds one.
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    /// Get dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Get size of a specific dimension.
    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.dims.get(axis).copied()
    }

    /// Whether this is a scalar (0-dimensional).
    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Default element strides for a contiguous row-major layout.
    pub fn contiguous_strides(&self) -> SmallVec<[isize; 4]> {
        let ndim = self.dims.len();
        let mut strides = SmallVec::from_elem(0isize, ndim);
        let mut acc = 1isize;
        for i in (0..ndim).rev() {
            strides[i] = acc;
            acc *= self.dims[i] as isize;
        }
        strides
    }

    /// Attempt to broadcast this shape with another (numpy rules).
    /// Returns the broadcasted shape or None if incompatible.
    pub fn broadcast_with(&self, other: &Shape) -> Option<Shape> {
        let max_ndim = self.ndim().max(other.ndim());
        let mut result = SmallVec::with_capacity(max_ndim);

        for i in 0..max_ndim {
            let a = if i < self.ndim() {
                self.dims[self.ndim() - 1 - i]
            } else {
                1
            };
            let b = if i < other.ndim() {
                other.dims[other.ndim() - 1 - i]
            } else {
                1
            };

            if a == b {
                result.push(a);
            } else if a == 1 {
                result.push(b);
            } else if b == 1 {
                result.push(a);
            } else {
                return None;
            }
        }

        result.reverse();
        Some(Shape { dims: result })
    }

    /// Axes that differ between `self` and a reduced shape of equal rank.
    ///
    /// These are the axes a SUM or MAX reduction collapses. Equal shapes
    /// yield no axes.
    pub fn reduced_axes(&self, new_shape: &Shape) -> Result<Vec<usize>> {
        if self.ndim() != new_shape.ndim() {
            return Err(TesselError::ShapeMismatch {
                expected: self.dims.to_vec(),
                got: new_shape.dims.to_vec(),
            });
        }
        Ok(self
            .dims
            .iter()
            .zip(new_shape.dims.iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect())
    }

    /// `self` with every axis in `axes` set to 1.
    pub fn collapse(&self, axes: &[usize]) -> Shape {
        let mut dims = self.dims.clone();
        for &axis in axes {
            dims[axis] = 1;
        }
        Shape { dims }
    }
}

/// Free-function form of [`Shape::reduced_axes`].
pub fn reduced_axes(old_shape: &Shape, new_shape: &Shape) -> Result<Vec<usize>> {
    old_shape.reduced_axes(new_shape)
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({:?})", self.dims.as_slice())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape {
            dims: SmallVec::from_vec(dims),
        }
    }
}

impl From<&Shape> for Shape {
    fn from(shape: &Shape) -> Self {
        shape.clone()
    }
}

macro_rules! impl_shape_from_array {
    ($($n:expr),*) => {
        $(
            impl From<[usize; $n]> for Shape {
                fn from(dims: [usize; $n]) -> Self {
                    Shape::new(&dims)
                }
            }

            impl From<&[usize; $n]> for Shape {
                fn from(dims: &[usize; $n]) -> Self {
                    Shape::new(dims)
                }
            }
        )*
    };
}

impl_shape_from_array!(0, 1, 2, 3, 4, 5, 6);
