//! Constant padding. The other movement ops are zero-copy views on [`Array`].

use crate::array::{Array, Walk};
use crate::element::{with_elem, Element, Scalar};
use crate::error::TesselError;
use crate::shape::Shape;
use crate::storage::Storage;
use crate::Result;

impl Array {
    /// Zero-pad each axis by `(before, after)` elements.
    pub fn pad(&self, padding: &[(usize, usize)]) -> Result<Array> {
        self.pad_with(padding, Scalar::Int(0))
    }

    /// Pad each axis by `(before, after)` elements filled with `value`.
    ///
    /// Padding always copies; the result is contiguous.
    pub fn pad_with(&self, padding: &[(usize, usize)], value: Scalar) -> Result<Array> {
        if padding.len() != self.ndim() {
            return Err(TesselError::ShapeMismatch {
                expected: self.shape().dims().to_vec(),
                got: padding.iter().map(|&(b, a)| b + a).collect(),
            });
        }
        let out_shape: Shape = self
            .shape()
            .dims()
            .iter()
            .zip(padding)
            .map(|(&d, &(before, after))| before + d + after)
            .collect::<Vec<_>>()
            .into();
        let out_strides = out_shape.contiguous_strides();
        let start: isize = padding
            .iter()
            .zip(out_strides.iter())
            .map(|(&(before, _), &s)| before as isize * s)
            .sum();
        let targets = Walk::new(self.shape().dims(), &out_strides, start as usize);

        let storage = with_elem!(self.dtype(), T => {
            let mut out = vec![T::from_scalar(value); out_shape.numel()];
            for (x, j) in self.values::<T>().into_iter().zip(targets) {
                out[j] = x;
            }
            Storage::from_vec(out)
        });
        Ok(Array::from_contiguous(storage, out_shape))
    }
}
