use std::fmt;

use smallvec::SmallVec;

use crate::dtype::DType;
use crate::element::{with_elem, Element, Scalar};
use crate::error::TesselError;
use crate::shape::Shape;
use crate::storage::{with_host, Storage};
use crate::Result;

/// An n-dimensional, strided projection of shared [`Storage`].
///
/// Movement operations (reshape, permute, expand, as-strided, ...) return
/// new `Array`s that share the same storage and only differ in shape,
/// strides and offset. Strides and offset count elements, not bytes. A
/// zero stride marks a broadcast axis; negative strides walk backwards.
///
/// Because the storage is reference-counted, a view keeps the data it
/// projects alive for as long as the view exists.
///
/// # Examples
///
/// ```
/// use tessel_core::Array;
///
/// let a = Array::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], [2, 2]).unwrap();
/// assert_eq!(a.shape().dims(), &[2, 2]);
///
/// let t = a.permute(&[1, 0]).unwrap();
/// assert_eq!(t.to_vec::<f32>().unwrap(), vec![1.0, 3.0, 2.0, 4.0]);
/// ```
#[derive(Clone)]
pub struct Array {
    storage: Storage,
    shape: Shape,
    strides: SmallVec<[isize; 4]>,
    offset: usize,
}

impl Array {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a row-major array from typed data.
    pub fn from_vec<T: Element>(data: Vec<T>, shape: impl Into<Shape>) -> Result<Self> {
        Self::from_storage(Storage::from_vec(data), shape)
    }

    /// Wrap existing storage as a row-major array of `shape`.
    pub fn from_storage(storage: Storage, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        if shape.numel() != storage.numel() {
            return Err(TesselError::DataLength {
                expected: shape.numel(),
                got: storage.numel(),
            });
        }
        let strides = shape.contiguous_strides();
        Ok(Self {
            storage,
            shape,
            strides,
            offset: 0,
        })
    }

    /// Row-major array over storage already known to hold `shape.numel()`
    /// elements.
    pub(crate) fn from_contiguous(storage: Storage, shape: Shape) -> Self {
        debug_assert_eq!(storage.numel(), shape.numel());
        let strides = shape.contiguous_strides();
        Self {
            storage,
            shape,
            strides,
            offset: 0,
        }
    }

    /// Create an array of zeros with the given shape and dtype.
    pub fn zeros(shape: impl Into<Shape>, dtype: DType) -> Self {
        let shape = shape.into();
        let strides = shape.contiguous_strides();
        Self {
            storage: Storage::zeros(dtype, shape.numel()),
            shape,
            strides,
            offset: 0,
        }
    }

    /// Create an array filled with `value` converted to `dtype`.
    pub fn full(shape: impl Into<Shape>, value: Scalar, dtype: DType) -> Self {
        let shape = shape.into();
        let strides = shape.contiguous_strides();
        let numel = shape.numel();
        let storage = with_elem!(dtype, T => Storage::from_vec(vec![T::from_scalar(value); numel]));
        Self {
            storage,
            shape,
            strides,
            offset: 0,
        }
    }

    /// 0-d array holding a single value.
    pub fn scalar(value: Scalar, dtype: DType) -> Self {
        Self::full(Shape::scalar(), value, dtype)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Strides (in elements, not bytes).
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Element offset of index `[0, 0, ...]` into the storage.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Whether this array exactly covers its storage in row-major order.
    ///
    /// Strides of size-1 axes are ignored, as they never move.
    pub fn is_contiguous(&self) -> bool {
        if self.offset != 0 || self.storage.numel() != self.numel() {
            return false;
        }
        let expected = self.shape.contiguous_strides();
        self.shape
            .dims()
            .iter()
            .zip(self.strides.iter().zip(expected.iter()))
            .all(|(&d, (s, e))| d <= 1 || s == e)
    }

    /// Whether `self` and `other` project the same storage allocation.
    pub fn shares_storage(&self, other: &Array) -> bool {
        self.storage.ptr_eq(&other.storage)
    }

    // =========================================================================
    // Data access
    // =========================================================================

    /// Physical storage indices in logical row-major order.
    pub(crate) fn walk(&self) -> Walk<'_> {
        Walk::new(self.shape.dims(), &self.strides, self.offset)
    }

    /// Contiguous typed slice, if the array is contiguous and `T` matches.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        if !self.is_contiguous() {
            return None;
        }
        self.storage.as_slice()
    }

    /// Copy the elements out in logical order. `T` must match the dtype.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        let src = self
            .storage
            .as_slice::<T>()
            .ok_or(TesselError::DTypeMismatch {
                expected: T::DTYPE,
                got: self.dtype(),
            })?;
        Ok(self.walk().map(|i| src[i]).collect())
    }

    /// Elements in logical order, value-cast to `T`.
    pub fn values<T: Element>(&self) -> Vec<T> {
        if let Some(src) = self.storage.as_slice::<T>() {
            return self.walk().map(|i| src[i]).collect();
        }
        with_host!(self.storage.data(), src => self.walk().map(|i| src[i].cast::<T>()).collect())
    }

    /// Read one element by multi-dimensional index.
    pub fn get(&self, index: &[usize]) -> Option<Scalar> {
        if index.len() != self.ndim() {
            return None;
        }
        let mut physical = self.offset as isize;
        for ((&i, &d), &s) in index.iter().zip(self.shape.dims()).zip(self.strides.iter()) {
            if i >= d {
                return None;
            }
            physical += i as isize * s;
        }
        let physical = usize::try_from(physical).ok()?;
        with_host!(self.storage.data(), src => src.get(physical).map(|v| v.to_scalar()))
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Return a contiguous copy of this array if it isn't already contiguous.
    pub fn contiguous(&self) -> Array {
        if self.is_contiguous() {
            return self.clone();
        }
        let storage = with_host!(self.storage.data(), src => {
            let data: Vec<_> = self.walk().map(|i| src[i]).collect();
            Storage::from_vec(data)
        });
        let strides = self.shape.contiguous_strides();
        Array {
            storage,
            shape: self.shape.clone(),
            strides,
            offset: 0,
        }
    }

    /// Value-convert to `dtype`; a cheap clone if it already matches.
    pub fn astype(&self, dtype: DType) -> Array {
        if self.dtype() == dtype {
            return self.clone();
        }
        let storage = with_elem!(dtype, T => Storage::from_vec(self.values::<T>()));
        let strides = self.shape.contiguous_strides();
        Array {
            storage,
            shape: self.shape.clone(),
            strides,
            offset: 0,
        }
    }

    // =========================================================================
    // Views (zero-copy)
    // =========================================================================

    /// Build a view over the same storage without bounds validation.
    ///
    /// Only the rank of `strides` is checked. The caller guarantees every
    /// index reachable through `shape`, `strides` and `offset` lies inside
    /// the storage; reading an element outside it panics.
    pub fn as_strided_unchecked(
        &self,
        shape: impl Into<Shape>,
        strides: &[isize],
        offset: usize,
    ) -> Result<Array> {
        let shape = shape.into();
        if strides.len() != shape.ndim() {
            return Err(TesselError::ShapeMismatch {
                expected: shape.dims().to_vec(),
                got: vec![strides.len()],
            });
        }
        let base = self.contiguous();
        tracing::trace!(offset, ?strides, "unchecked strided view");
        Ok(Array {
            storage: base.storage,
            shape,
            strides: SmallVec::from_slice(strides),
            offset,
        })
    }

    /// Build a strided view over the contiguous form of this array.
    ///
    /// The source is made contiguous first (copying only if needed), then
    /// re-interpreted with the given element strides and offset. Zero
    /// strides repeat elements. Fails with [`TesselError::OutOfBoundsView`]
    /// if any reachable index falls outside the source.
    pub fn as_strided(&self, shape: impl Into<Shape>, strides: &[isize], offset: usize) -> Result<Array> {
        let shape = shape.into();
        if strides.len() != shape.ndim() {
            return Err(TesselError::ShapeMismatch {
                expected: shape.dims().to_vec(),
                got: vec![strides.len()],
            });
        }
        let base = self.contiguous();
        let len = base.numel();
        if let Some((min, max)) = extent(shape.dims(), strides, offset) {
            if min < 0 || max >= len as isize {
                return Err(TesselError::OutOfBoundsView { min, max, len });
            }
        }
        Ok(Array {
            storage: base.storage,
            shape,
            strides: SmallVec::from_slice(strides),
            offset,
        })
    }

    /// Broadcast to `shape` (numpy `broadcast_to`) as a zero-stride view.
    ///
    /// Missing leading axes and size-1 axes become stride 0; every other
    /// axis must already match.
    pub fn expand(&self, shape: impl Into<Shape>) -> Result<Array> {
        let target = shape.into();
        let broadcast_err = || TesselError::BroadcastError {
            a: self.shape.dims().to_vec(),
            b: target.dims().to_vec(),
        };
        if target.ndim() < self.ndim() {
            return Err(broadcast_err());
        }
        let lead = target.ndim() - self.ndim();
        let mut strides = SmallVec::from_elem(0isize, target.ndim());
        for (i, &d) in target.dims().iter().enumerate().skip(lead) {
            let src = self.shape.dims()[i - lead];
            if src == d {
                strides[i] = self.strides[i - lead];
            } else if src != 1 {
                return Err(broadcast_err());
            }
        }
        Ok(Array {
            storage: self.storage.clone(),
            shape: target,
            strides,
            offset: self.offset,
        })
    }

    /// Reshape (zero-copy if contiguous, otherwise copies first).
    pub fn reshape(&self, shape: impl Into<Shape>) -> Result<Array> {
        let shape = shape.into();
        if shape.numel() != self.numel() {
            return Err(TesselError::InvalidReshape {
                numel: self.numel(),
                shape: shape.dims().to_vec(),
            });
        }
        let base = self.contiguous();
        let strides = shape.contiguous_strides();
        Ok(Array {
            storage: base.storage,
            shape,
            strides,
            offset: 0,
        })
    }

    /// Reorder axes; `order[i]` names the source axis placed at position `i`.
    pub fn permute(&self, order: &[usize]) -> Result<Array> {
        let ndim = self.ndim();
        let mut seen = vec![false; ndim];
        if order.len() != ndim {
            return Err(TesselError::ShapeMismatch {
                expected: self.shape.dims().to_vec(),
                got: order.to_vec(),
            });
        }
        for &axis in order {
            if axis >= ndim || seen[axis] {
                return Err(TesselError::InvalidAxis { axis, ndim });
            }
            seen[axis] = true;
        }
        let dims: Vec<usize> = order.iter().map(|&a| self.shape.dims()[a]).collect();
        Ok(Array {
            storage: self.storage.clone(),
            shape: Shape::from(dims),
            strides: order.iter().map(|&a| self.strides[a]).collect(),
            offset: self.offset,
        })
    }

    /// Keep the half-open range `[start, end)` of every axis.
    pub fn shrink(&self, bounds: &[(usize, usize)]) -> Result<Array> {
        if bounds.len() != self.ndim() {
            return Err(TesselError::ShapeMismatch {
                expected: self.shape.dims().to_vec(),
                got: bounds.iter().map(|&(s, e)| e.saturating_sub(s)).collect(),
            });
        }
        let mut offset = self.offset as isize;
        let mut dims = Vec::with_capacity(bounds.len());
        for (axis, (&(start, end), &d)) in bounds.iter().zip(self.shape.dims()).enumerate() {
            if start > end || end > d {
                return Err(TesselError::InvalidAxis {
                    axis,
                    ndim: self.ndim(),
                });
            }
            if end > start {
                offset += start as isize * self.strides[axis];
            }
            dims.push(end - start);
        }
        Ok(Array {
            storage: self.storage.clone(),
            shape: Shape::from(dims),
            strides: self.strides.clone(),
            offset: offset.max(0) as usize,
        })
    }

    /// Keep only `axes`, pinning every other axis at index 0.
    pub fn take_axes(&self, axes: &[usize]) -> Array {
        let dims: Vec<usize> = axes.iter().map(|&a| self.shape.dims()[a]).collect();
        Array {
            storage: self.storage.clone(),
            shape: Shape::from(dims),
            strides: axes.iter().map(|&a| self.strides[a]).collect(),
            offset: self.offset,
        }
    }
}

/// Smallest and largest physical index reachable by a layout, or `None`
/// when the layout addresses no elements.
fn extent(dims: &[usize], strides: &[isize], offset: usize) -> Option<(isize, isize)> {
    if dims.contains(&0) {
        return None;
    }
    let mut min = offset as isize;
    let mut max = offset as isize;
    for (&d, &s) in dims.iter().zip(strides) {
        let span = (d as isize - 1) * s;
        if span < 0 {
            min += span;
        } else {
            max += span;
        }
    }
    Some((min, max))
}

/// Odometer over a strided layout yielding physical indices.
pub(crate) struct Walk<'a> {
    dims: &'a [usize],
    strides: &'a [isize],
    index: SmallVec<[usize; 4]>,
    pos: isize,
    remaining: usize,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(dims: &'a [usize], strides: &'a [isize], offset: usize) -> Self {
        Self {
            dims,
            strides,
            index: SmallVec::from_elem(0, dims.len()),
            pos: offset as isize,
            remaining: dims.iter().product(),
        }
    }
}

impl Iterator for Walk<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.pos as usize;
        self.remaining -= 1;
        if self.remaining > 0 {
            for axis in (0..self.dims.len()).rev() {
                self.index[axis] += 1;
                self.pos += self.strides[axis];
                if self.index[axis] < self.dims[axis] {
                    break;
                }
                self.pos -= self.strides[axis] * self.dims[axis] as isize;
                self.index[axis] = 0;
            }
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Walk<'_> {}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Array(shape={}, dtype={}, strides={:?}, offset={}, contiguous={})",
            self.shape,
            self.dtype(),
            self.strides.as_slice(),
            self.offset,
            self.is_contiguous(),
        )
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.values::<f64>();
        if values.len() <= 20 {
            write!(f, "array({:?}, shape={}, dtype={})", values, self.shape, self.dtype())
        } else {
            write!(
                f,
                "array([{:.4}, {:.4}, ..., {:.4}], shape={}, dtype={})",
                values[0],
                values[1],
                values[values.len() - 1],
                self.shape,
                self.dtype()
            )
        }
    }
}
