use crate::dtype::DType;

/// Errors raised by array primitives.
///
/// Every failing operation leaves its operands untouched, so callers can
/// surface these directly without cleanup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TesselError {
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },

    #[error("cannot broadcast shapes {a:?} and {b:?}")]
    BroadcastError { a: Vec<usize>, b: Vec<usize> },

    #[error("cannot reshape {numel} elements into {shape:?}")]
    InvalidReshape { numel: usize, shape: Vec<usize> },

    #[error("axis {axis} out of range for {ndim}-d array")]
    InvalidAxis { axis: usize, ndim: usize },

    #[error("dtype mismatch: expected {expected}, got {got}")]
    DTypeMismatch { expected: DType, got: DType },

    #[error("{op} does not support dtype {dtype}")]
    UnsupportedDType { op: &'static str, dtype: DType },

    #[error("cannot cast {from} to {to}: {reason}")]
    CastFailure {
        from: DType,
        to: DType,
        reason: String,
    },

    #[error("strided view reaches elements [{min}, {max}] outside storage of {len} elements")]
    OutOfBoundsView { min: isize, max: isize, len: usize },

    #[error("{op} over a zero-size extent has no identity")]
    EmptyReduction { op: &'static str },

    #[error("expected {expected} elements, got {got}")]
    DataLength { expected: usize, got: usize },
}
