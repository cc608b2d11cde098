//! Two-operand tensor contraction and the broadcast-aware multiply-accumulate
//! built on top of it.

use smallvec::SmallVec;

use crate::array::{Array, Walk};
use crate::element::{with_elem, Element, Scalar};
use crate::error::TesselError;
use crate::promote::match_types;
use crate::shape::Shape;
use crate::storage::Storage;
use crate::Result;

/// Contract `a` and `b` over their labelled axes.
///
/// `a_labels[i]` names axis `i` of `a` (likewise for `b`). Labels listed in
/// `out_labels` become the result's axes in that order; every other label
/// is summed over. A label repeated inside one operand walks its diagonal,
/// and a label shared by both operands pairs their elements, so
/// `einsum(x, [0, 1], y, [1, 2], [0, 2])` is a matrix product.
///
/// Operands are promoted to a common dtype first. Every occurrence of a
/// label must have the same extent.
pub fn einsum(
    a: &Array,
    a_labels: &[usize],
    b: &Array,
    b_labels: &[usize],
    out_labels: &[usize],
) -> Result<Array> {
    for (operand, labels) in [(a, a_labels), (b, b_labels)] {
        if labels.len() != operand.ndim() {
            return Err(TesselError::ShapeMismatch {
                expected: operand.shape().dims().to_vec(),
                got: labels.to_vec(),
            });
        }
    }

    // Every distinct label with its extent; output labels first so the
    // innermost loop runs over the summed ones.
    let mut labels: Vec<usize> = Vec::new();
    let mut extents: Vec<usize> = Vec::new();
    for (operand, operand_labels) in [(a, a_labels), (b, b_labels)] {
        for (&label, &d) in operand_labels.iter().zip(operand.shape().dims()) {
            match labels.iter().position(|&l| l == label) {
                Some(i) if extents[i] != d => {
                    return Err(TesselError::ShapeMismatch {
                        expected: vec![extents[i]],
                        got: vec![d],
                    });
                }
                Some(_) => {}
                None => {
                    labels.push(label);
                    extents.push(d);
                }
            }
        }
    }
    let mut order: Vec<usize> = Vec::with_capacity(labels.len());
    for &label in out_labels {
        let i = labels
            .iter()
            .position(|&l| l == label)
            .ok_or(TesselError::InvalidAxis {
                axis: label,
                ndim: labels.len(),
            })?;
        if order.contains(&i) {
            return Err(TesselError::InvalidAxis {
                axis: label,
                ndim: labels.len(),
            });
        }
        order.push(i);
    }
    let summed: Vec<usize> = (0..labels.len()).filter(|i| !order.contains(i)).collect();
    order.extend(summed);

    let dims: Vec<usize> = order.iter().map(|&i| extents[i]).collect();
    let out_shape = Shape::from(order[..out_labels.len()].iter().map(|&i| extents[i]).collect::<Vec<_>>());

    // Per-label element strides of each operand; repeated labels add up.
    let label_strides = |operand: &Array, operand_labels: &[usize]| -> SmallVec<[isize; 4]> {
        order
            .iter()
            .map(|&i| {
                operand_labels
                    .iter()
                    .zip(operand.strides())
                    .filter(|(&l, _)| l == labels[i])
                    .map(|(_, &s)| s)
                    .sum::<isize>()
            })
            .collect()
    };
    let (a, b) = match_types(a, b);
    let a_strides = label_strides(&a, a_labels);
    let b_strides = label_strides(&b, b_labels);
    let mut out_strides: SmallVec<[isize; 4]> = SmallVec::from_elem(0, dims.len());
    out_strides[..out_labels.len()].copy_from_slice(&out_shape.contiguous_strides());

    tracing::trace!(
        ?labels,
        ?out_labels,
        ?dims,
        "contracting {} x {} -> {}",
        a.shape(),
        b.shape(),
        out_shape
    );

    let walks = Contraction {
        a: Walk::new(&dims, &a_strides, a.offset()),
        b: Walk::new(&dims, &b_strides, b.offset()),
        out: Walk::new(&dims, &out_strides, 0),
    };
    let storage = with_elem!(a.dtype(), T => Storage::from_vec(walks.run::<T>(&a, &b, out_shape.numel())?));
    Ok(Array::from_contiguous(storage, out_shape))
}

/// Three synchronized walks over the full label space.
struct Contraction<'a> {
    a: Walk<'a>,
    b: Walk<'a>,
    out: Walk<'a>,
}

impl Contraction<'_> {
    fn run<T: Element>(self, a: &Array, b: &Array, numel: usize) -> Result<Vec<T>> {
        let lhs: &[T] = typed(a)?;
        let rhs: &[T] = typed(b)?;
        let mut out = vec![T::zero(); numel];
        for ((i, j), k) in self.a.zip(self.b).zip(self.out) {
            out[k] = out[k].plus(lhs[i].times(rhs[j]));
        }
        Ok(out)
    }
}

fn typed<T: Element>(a: &Array) -> Result<&[T]> {
    a.storage().as_slice::<T>().ok_or(TesselError::DTypeMismatch {
        expected: T::DTYPE,
        got: a.dtype(),
    })
}

/// Sum of `a * b` over every axis where `a.shape()` differs from
/// `new_shape`, without materializing the broadcast product.
///
/// `a` and `b` are usually broadcast views. Axes with a zero stride in an
/// operand are pinned at index 0 so only its real data is contracted; the
/// result is then reshaped and broadcast back out to `new_shape`. An axis
/// that is broadcast in both operands and reduced scales the result by its
/// extent.
///
/// ```
/// use tessel_core::{mulacc, Array};
///
/// let a = Array::from_vec(vec![1i32, 2, 3, 4, 5, 6], [2, 3, 1]).unwrap();
/// let b = Array::from_vec(vec![1i32, 0, 0, 1, 1, 1], [1, 3, 2]).unwrap();
/// let c = mulacc(&a.expand([2, 3, 2]).unwrap(), &b.expand([2, 3, 2]).unwrap(), [2, 1, 2]).unwrap();
/// assert_eq!(c.to_vec::<i32>().unwrap(), vec![4, 5, 10, 11]);
/// ```
pub fn mulacc(a: &Array, b: &Array, new_shape: impl Into<Shape>) -> Result<Array> {
    let new_shape = new_shape.into();
    if a.shape() != b.shape() {
        return Err(TesselError::ShapeMismatch {
            expected: a.shape().dims().to_vec(),
            got: b.shape().dims().to_vec(),
        });
    }
    let reduced = a.shape().reduced_axes(&new_shape)?;
    if reduced.iter().any(|&axis| new_shape.dims()[axis] != 1) {
        return Err(TesselError::ShapeMismatch {
            expected: a.shape().collapse(&reduced).dims().to_vec(),
            got: new_shape.dims().to_vec(),
        });
    }

    let real_axes = |x: &Array| -> Vec<usize> {
        x.strides()
            .iter()
            .enumerate()
            .filter(|(_, &s)| s != 0)
            .map(|(i, _)| i)
            .collect()
    };
    let a_axes = real_axes(a);
    let b_axes = real_axes(b);
    let is_real = |i: &usize| a_axes.contains(i) || b_axes.contains(i);
    let out_axes: Vec<usize> = (0..new_shape.ndim())
        .filter(|i| !reduced.contains(i) && is_real(i))
        .collect();
    tracing::trace!(?a_axes, ?b_axes, ?out_axes, "mulacc axis partition");

    let mut result = einsum(
        &a.take_axes(&a_axes),
        &a_axes,
        &b.take_axes(&b_axes),
        &b_axes,
        &out_axes,
    )?;

    let repeats: usize = reduced
        .iter()
        .filter(|i| !is_real(*i))
        .map(|&i| a.shape().dims()[i])
        .product();
    if repeats != 1 {
        let factor = Array::scalar(Scalar::UInt(repeats as u64), result.dtype());
        result = result.mul(&factor)?;
    }

    let kept: Vec<usize> = new_shape
        .dims()
        .iter()
        .enumerate()
        .map(|(i, &d)| if is_real(&i) { d } else { 1 })
        .collect();
    result.reshape(kept)?.expand(new_shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;

    fn matmul_operands() -> (Array, Array) {
        let a = Array::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3, 1])
            .unwrap()
            .expand([2, 3, 2])
            .unwrap();
        let b = Array::from_vec(vec![1.0f32, 0.0, 0.0, 1.0, 1.0, 1.0], [1, 3, 2])
            .unwrap()
            .expand([2, 3, 2])
            .unwrap();
        (a, b)
    }

    #[test]
    fn test_einsum_matmul() {
        let a = Array::from_vec(vec![1i32, 2, 3, 4, 5, 6], [2, 3]).unwrap();
        let b = Array::from_vec(vec![1i32, 0, 0, 1, 1, 1], [3, 2]).unwrap();
        let c = einsum(&a, &[0, 1], &b, &[1, 2], &[0, 2]).unwrap();
        assert_eq!(c.shape().dims(), &[2, 2]);
        assert_eq!(c.to_vec::<i32>().unwrap(), vec![4, 5, 10, 11]);
    }

    #[test]
    fn test_einsum_output_order_and_trace() {
        let a = Array::from_vec(vec![1i32, 2, 3, 4], [2, 2]).unwrap();
        let one = Array::scalar(Scalar::Int(1), DType::I32);
        let t = einsum(&a, &[1, 0], &one, &[], &[0, 1]).unwrap();
        assert_eq!(t.to_vec::<i32>().unwrap(), vec![1, 3, 2, 4]);
        let trace = einsum(&a, &[0, 0], &one, &[], &[]).unwrap();
        assert_eq!(trace.to_vec::<i32>().unwrap(), vec![5]);
    }

    #[test]
    fn test_einsum_promotes() {
        let a = Array::from_vec(vec![1i32, 2], [2]).unwrap();
        let b = Array::from_vec(vec![0.5f64, 0.5], [2]).unwrap();
        let c = einsum(&a, &[0], &b, &[0], &[]).unwrap();
        assert_eq!(c.dtype(), DType::F64);
        assert_eq!(c.to_vec::<f64>().unwrap(), vec![1.5]);
    }

    #[test]
    fn test_einsum_extent_mismatch() {
        let a = Array::zeros([2, 3], DType::F32);
        let b = Array::zeros([2, 3], DType::F32);
        assert!(einsum(&a, &[0, 1], &b, &[1, 2], &[0, 2]).is_err());
        assert!(einsum(&a, &[0, 1], &b, &[0, 1], &[7]).is_err());
    }

    #[test]
    fn test_mulacc_matmul() {
        let (a, b) = matmul_operands();
        let c = mulacc(&a, &b, [2, 1, 2]).unwrap();
        assert_eq!(c.shape().dims(), &[2, 1, 2]);
        assert_eq!(c.to_vec::<f32>().unwrap(), vec![4.0, 5.0, 10.0, 11.0]);
    }

    #[test]
    fn test_mulacc_matches_direct_sum() {
        let (a, b) = matmul_operands();
        let direct = a.mul(&b).unwrap().sum_to([2, 1, 2]).unwrap();
        let fused = mulacc(&a, &b, [2, 1, 2]).unwrap();
        assert_eq!(fused.to_vec::<f32>().unwrap(), direct.to_vec::<f32>().unwrap());
    }

    #[test]
    fn test_mulacc_no_reduction_broadcasts_back() {
        let (a, b) = matmul_operands();
        let c = mulacc(&a, &b, [2, 3, 2]).unwrap();
        let direct = a.mul(&b).unwrap();
        assert_eq!(c.to_vec::<f32>().unwrap(), direct.to_vec::<f32>().unwrap());
    }

    #[test]
    fn test_mulacc_scalar_operands() {
        let a = Array::scalar(Scalar::Int(3), DType::I64).expand([2, 2]).unwrap();
        let b = Array::scalar(Scalar::Int(4), DType::I64).expand([2, 2]).unwrap();
        let kept = mulacc(&a, &b, [2, 2]).unwrap();
        assert_eq!(kept.to_vec::<i64>().unwrap(), vec![12; 4]);
        let reduced = mulacc(&a, &b, [2, 1]).unwrap();
        assert_eq!(reduced.to_vec::<i64>().unwrap(), vec![24, 24]);
    }

    #[test]
    fn test_mulacc_shape_checks() {
        let a = Array::zeros([2, 3], DType::F32);
        let b = Array::zeros([3, 2], DType::F32);
        assert!(matches!(mulacc(&a, &b, [2, 1]), Err(TesselError::ShapeMismatch { .. })));
        assert!(matches!(mulacc(&a, &a, [2]), Err(TesselError::ShapeMismatch { .. })));
        assert!(matches!(mulacc(&a, &a, [2, 2]), Err(TesselError::ShapeMismatch { .. })));
    }
}
