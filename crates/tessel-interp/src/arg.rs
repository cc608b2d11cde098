//! Per-instruction arguments.

use tessel_core::{DType, Scalar, Shape};

/// The non-operand argument of an instruction.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OpArg {
    /// The instruction takes no argument.
    #[default]
    None,
    /// CONST payload.
    Const { value: Scalar, dtype: DType },
    /// CAST target; `bitcast` reinterprets bits instead of converting values.
    Cast { dtype: DType, bitcast: bool },
    /// Target shape of SUM, MAX, EXPAND, RESHAPE and MULACC.
    Shape(Shape),
    /// AS_STRIDED layout, in elements.
    Strided {
        shape: Shape,
        strides: Vec<isize>,
        offset: usize,
    },
    /// PAD amounts, one `(before, after)` pair per axis, and the border value.
    Padding { pairs: Vec<(usize, usize)>, fill: Scalar },
    /// PERMUTE axis order.
    Permutation(Vec<usize>),
    /// SHRINK ranges, one half-open `(start, end)` pair per axis.
    Bounds(Vec<(usize, usize)>),
}

impl OpArg {
    pub fn shape(shape: impl Into<Shape>) -> Self {
        OpArg::Shape(shape.into())
    }

    pub fn strided(shape: impl Into<Shape>, strides: &[isize], offset: usize) -> Self {
        OpArg::Strided {
            shape: shape.into(),
            strides: strides.to_vec(),
            offset,
        }
    }

    pub fn constant(value: impl Into<Scalar>, dtype: DType) -> Self {
        OpArg::Const {
            value: value.into(),
            dtype,
        }
    }

    /// Zero padding.
    pub fn padding(pairs: &[(usize, usize)]) -> Self {
        Self::padding_with(pairs, Scalar::Int(0))
    }

    pub fn padding_with(pairs: &[(usize, usize)], fill: impl Into<Scalar>) -> Self {
        OpArg::Padding {
            pairs: pairs.to_vec(),
            fill: fill.into(),
        }
    }

    pub fn cast(dtype: DType) -> Self {
        OpArg::Cast {
            dtype,
            bitcast: false,
        }
    }

    pub fn bitcast(dtype: DType) -> Self {
        OpArg::Cast {
            dtype,
            bitcast: true,
        }
    }
}
