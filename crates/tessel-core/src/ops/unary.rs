//! Element-wise unary operations and casts.

use crate::array::Array;
use crate::dtype::DType;
use crate::element::{with_elem, with_float, Element, FloatElement};
use crate::error::TesselError;
use crate::storage::{HostData, Storage};
use crate::Result;

#[derive(Clone, Copy)]
enum Transcendental {
    Exp2,
    Log2,
    Sin,
    Sqrt,
}

impl Transcendental {
    fn name(self) -> &'static str {
        match self {
            Transcendental::Exp2 => "exp2",
            Transcendental::Log2 => "log2",
            Transcendental::Sin => "sin",
            Transcendental::Sqrt => "sqrt",
        }
    }

    fn apply<T: FloatElement>(self, x: T) -> T {
        match self {
            Transcendental::Exp2 => x.exp2(),
            Transcendental::Log2 => x.log2(),
            Transcendental::Sin => x.sin(),
            Transcendental::Sqrt => x.sqrt(),
        }
    }
}

impl Array {
    /// A contiguous version of `self`; shares storage if already contiguous.
    pub fn noop(&self) -> Array {
        self.contiguous()
    }

    /// Element-wise `2^x`.
    pub fn exp2(&self) -> Result<Array> {
        transcendental(self, Transcendental::Exp2)
    }

    /// Element-wise base-2 logarithm.
    pub fn log2(&self) -> Result<Array> {
        transcendental(self, Transcendental::Log2)
    }

    /// Element-wise sine (radians).
    pub fn sin(&self) -> Result<Array> {
        transcendental(self, Transcendental::Sin)
    }

    /// Element-wise square root.
    pub fn sqrt(&self) -> Result<Array> {
        transcendental(self, Transcendental::Sqrt)
    }

    /// Element-wise negation. Bools are logically inverted, integers wrap.
    pub fn neg(&self) -> Array {
        with_elem!(self.dtype(), T => map_unary(self, <T as Element>::negate))
    }

    /// Value conversion to `dtype` (C `astype` rules). Always contiguous.
    pub fn cast(&self, dtype: DType) -> Array {
        if self.dtype() == dtype {
            return self.contiguous();
        }
        self.astype(dtype)
    }

    /// Reinterpret the raw element bits as `dtype`.
    ///
    /// Both dtypes must have the same width. Any non-zero byte read as
    /// `Bool` becomes `true`.
    pub fn bitcast(&self, dtype: DType) -> Result<Array> {
        let from = self.dtype();
        if from.itemsize() != dtype.itemsize() {
            return Err(TesselError::CastFailure {
                from,
                to: dtype,
                reason: format!(
                    "bitcast needs equal widths, got {} and {} bytes",
                    from.itemsize(),
                    dtype.itemsize()
                ),
            });
        }
        let src = self.contiguous();
        let bytes = src.storage().data().to_bytes();
        let data = HostData::from_bytes(dtype, &bytes)?;
        Ok(Array::from_contiguous(Storage::new(data), self.shape().clone()))
    }
}

fn transcendental(a: &Array, op: Transcendental) -> Result<Array> {
    let out = a.dtype().float_result();
    with_float!(out, T => Ok(map_unary(a, |x: T| op.apply(x))), _ => Err(TesselError::UnsupportedDType {
        op: op.name(),
        dtype: a.dtype(),
    }))
}

/// Map every element (value-cast to `T`) through `f` into a new array.
pub(crate) fn map_unary<T: Element, U: Element>(a: &Array, f: impl Fn(T) -> U) -> Array {
    let out: Vec<U> = a.values::<T>().into_iter().map(f).collect();
    Array::from_contiguous(Storage::from_vec(out), a.shape().clone())
}
