//! Element-wise binary operations with promotion and broadcasting.

use crate::array::Array;
use crate::element::{with_elem, Element, Scalar};
use crate::error::TesselError;
use crate::promote::{match_types, promote};
use crate::storage::Storage;
use crate::Result;

impl Array {
    /// Element-wise addition. Bool operands combine with logical or.
    pub fn add(&self, other: &Array) -> Result<Array> {
        let (a, b) = broadcast_pair(self, other)?;
        Ok(with_elem!(a.dtype(), T => zip_map(&a, &b, <T as Element>::plus)))
    }

    /// Element-wise subtraction. Not defined for bool operands.
    pub fn sub(&self, other: &Array) -> Result<Array> {
        let (a, b) = broadcast_pair(self, other)?;
        if a.dtype().is_bool() {
            return Err(TesselError::UnsupportedDType {
                op: "sub",
                dtype: a.dtype(),
            });
        }
        Ok(with_elem!(a.dtype(), T => zip_map(&a, &b, <T as Element>::minus)))
    }

    /// Element-wise multiplication. Bool operands combine with logical and.
    pub fn mul(&self, other: &Array) -> Result<Array> {
        let (a, b) = broadcast_pair(self, other)?;
        Ok(with_elem!(a.dtype(), T => zip_map(&a, &b, <T as Element>::times)))
    }

    /// True division cast back to the promoted dtype.
    ///
    /// Integer quotients truncate toward zero; integer division by zero
    /// yields 0 (the saturating cast of NaN) or the saturated infinity.
    pub fn div(&self, other: &Array) -> Result<Array> {
        let (a, b) = broadcast_pair(self, other)?;
        Ok(with_elem!(a.dtype(), T => zip_map(&a, &b, <T as Element>::divide)))
    }

    /// Element-wise maximum. NaN in either operand yields NaN.
    pub fn maximum(&self, other: &Array) -> Result<Array> {
        let (a, b) = broadcast_pair(self, other)?;
        Ok(with_elem!(a.dtype(), T => zip_map(&a, &b, <T as Element>::maximum)))
    }

    /// `self < other` as 1 or 0 in the promoted dtype.
    ///
    /// Values are compared in their own dtypes before the result is
    /// written, so `-1i8 < 1u8` holds even though the promoted dtype is
    /// unsigned.
    pub fn cmplt(&self, other: &Array) -> Result<Array> {
        let (a, b) = broadcast(self, other)?;
        let lhs = scalars(&a);
        let rhs = scalars(&b);
        let dtype = promote(a.dtype(), b.dtype());
        let storage = with_elem!(dtype, T => {
            let out: Vec<T> = lhs
                .into_iter()
                .zip(rhs)
                .map(|(x, y)| T::from_scalar(Scalar::Bool(less_than(x, y))))
                .collect();
            Storage::from_vec(out)
        });
        Ok(Array::from_contiguous(storage, a.shape().clone()))
    }
}

fn scalars(a: &Array) -> Vec<Scalar> {
    with_elem!(a.dtype(), T => a.values::<T>().into_iter().map(T::to_scalar).collect())
}

/// Mixed-sign comparison; any float operand compares as `f64`.
fn less_than(x: Scalar, y: Scalar) -> bool {
    let exact = |s: Scalar| match s {
        Scalar::Bool(b) => Some(b as i128),
        Scalar::Int(i) => Some(i as i128),
        Scalar::UInt(u) => Some(u as i128),
        Scalar::Float(_) => None,
    };
    match (exact(x), exact(y)) {
        (Some(x), Some(y)) => x < y,
        _ => x.to_f64() < y.to_f64(),
    }
}

/// Promote both operands and broadcast them to a common shape.
pub(crate) fn broadcast_pair(a: &Array, b: &Array) -> Result<(Array, Array)> {
    let (a, b) = match_types(a, b);
    broadcast(&a, &b)
}

/// Broadcast both operands to a common shape, keeping their dtypes.
fn broadcast(a: &Array, b: &Array) -> Result<(Array, Array)> {
    if a.shape() == b.shape() {
        return Ok((a.clone(), b.clone()));
    }
    let shape = a
        .shape()
        .broadcast_with(b.shape())
        .ok_or_else(|| TesselError::BroadcastError {
            a: a.shape().dims().to_vec(),
            b: b.shape().dims().to_vec(),
        })?;
    Ok((a.expand(&shape)?, b.expand(&shape)?))
}

/// Combine two equal-shape arrays of dtype `T` element by element.
pub(crate) fn zip_map<T: Element>(a: &Array, b: &Array, f: impl Fn(T, T) -> T) -> Array {
    let out: Vec<T> = a
        .values::<T>()
        .into_iter()
        .zip(b.values::<T>())
        .map(|(x, y)| f(x, y))
        .collect();
    Array::from_contiguous(Storage::from_vec(out), a.shape().clone())
}
