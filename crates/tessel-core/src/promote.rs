//! Binary dtype promotion.

use crate::array::Array;
use crate::dtype::DType;

/// Result dtype when `a` and `b` meet in a binary operation.
///
/// The higher-priority dtype wins, so the function is commutative and
/// `promote(t, t) == t`.
pub fn promote(a: DType, b: DType) -> DType {
    if a.priority() >= b.priority() {
        a
    } else {
        b
    }
}

/// Cast both operands to their promoted dtype.
///
/// An operand that already has the promoted dtype is returned as a cheap
/// clone sharing its storage.
pub fn match_types(a: &Array, b: &Array) -> (Array, Array) {
    let dtype = promote(a.dtype(), b.dtype());
    (a.astype(dtype), b.astype(dtype))
}
