//! Instruction tags understood by the interpreter.

use std::fmt;

/// Buffer-level operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferOp {
    /// Expose a buffer's host memory as a 1-D array.
    Mem,
    /// Create a 0-d array from a constant.
    Const,
    /// Wrap an array as a buffer.
    FromUnderlying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Noop,
    Exp2,
    Log2,
    Sin,
    Sqrt,
    Neg,
    Cast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Max,
    CmpLt,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReduceOp {
    Sum,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovementOp {
    AsStrided,
    Pad,
    Expand,
    Reshape,
    Permute,
    Shrink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TernaryOp {
    MulAcc,
    Where,
}

/// Any instruction tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Buffer(BufferOp),
    Unary(UnaryOp),
    Binary(BinaryOp),
    Reduce(ReduceOp),
    Movement(MovementOp),
    Ternary(TernaryOp),
}

impl Op {
    /// Every instruction tag, grouped by family.
    pub const ALL: [Op; 26] = [
        Op::Buffer(BufferOp::Mem),
        Op::Buffer(BufferOp::Const),
        Op::Buffer(BufferOp::FromUnderlying),
        Op::Unary(UnaryOp::Noop),
        Op::Unary(UnaryOp::Exp2),
        Op::Unary(UnaryOp::Log2),
        Op::Unary(UnaryOp::Sin),
        Op::Unary(UnaryOp::Sqrt),
        Op::Unary(UnaryOp::Neg),
        Op::Unary(UnaryOp::Cast),
        Op::Binary(BinaryOp::Max),
        Op::Binary(BinaryOp::CmpLt),
        Op::Binary(BinaryOp::Add),
        Op::Binary(BinaryOp::Sub),
        Op::Binary(BinaryOp::Mul),
        Op::Binary(BinaryOp::Div),
        Op::Reduce(ReduceOp::Sum),
        Op::Reduce(ReduceOp::Max),
        Op::Movement(MovementOp::AsStrided),
        Op::Movement(MovementOp::Pad),
        Op::Movement(MovementOp::Expand),
        Op::Movement(MovementOp::Reshape),
        Op::Movement(MovementOp::Permute),
        Op::Movement(MovementOp::Shrink),
        Op::Ternary(TernaryOp::MulAcc),
        Op::Ternary(TernaryOp::Where),
    ];

    /// Number of operands the instruction consumes.
    pub fn arity(&self) -> usize {
        match self {
            Op::Buffer(BufferOp::Const) => 0,
            Op::Buffer(_) | Op::Unary(_) | Op::Reduce(_) | Op::Movement(_) => 1,
            Op::Binary(_) | Op::Ternary(TernaryOp::MulAcc) => 2,
            Op::Ternary(TernaryOp::Where) => 3,
        }
    }

    /// Upper-case instruction name, e.g. `MULACC`.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Buffer(BufferOp::Mem) => "MEM",
            Op::Buffer(BufferOp::Const) => "CONST",
            Op::Buffer(BufferOp::FromUnderlying) => "FROM_UNDERLYING",
            Op::Unary(UnaryOp::Noop) => "NOOP",
            Op::Unary(UnaryOp::Exp2) => "EXP2",
            Op::Unary(UnaryOp::Log2) => "LOG2",
            Op::Unary(UnaryOp::Sin) => "SIN",
            Op::Unary(UnaryOp::Sqrt) => "SQRT",
            Op::Unary(UnaryOp::Neg) => "NEG",
            Op::Unary(UnaryOp::Cast) => "CAST",
            Op::Binary(BinaryOp::Max) => "MAX",
            Op::Binary(BinaryOp::CmpLt) => "CMPLT",
            Op::Binary(BinaryOp::Add) => "ADD",
            Op::Binary(BinaryOp::Sub) => "SUB",
            Op::Binary(BinaryOp::Mul) => "MUL",
            Op::Binary(BinaryOp::Div) => "DIV",
            Op::Reduce(ReduceOp::Sum) => "SUM",
            Op::Reduce(ReduceOp::Max) => "MAX",
            Op::Movement(MovementOp::AsStrided) => "AS_STRIDED",
            Op::Movement(MovementOp::Pad) => "PAD",
            Op::Movement(MovementOp::Expand) => "EXPAND",
            Op::Movement(MovementOp::Reshape) => "RESHAPE",
            Op::Movement(MovementOp::Permute) => "PERMUTE",
            Op::Movement(MovementOp::Shrink) => "SHRINK",
            Op::Ternary(TernaryOp::MulAcc) => "MULACC",
            Op::Ternary(TernaryOp::Where) => "WHERE",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Buffer(_) => write!(f, "BufferOps.{}", self.name()),
            Op::Unary(_) => write!(f, "UnaryOps.{}", self.name()),
            Op::Binary(_) => write!(f, "BinaryOps.{}", self.name()),
            Op::Reduce(_) => write!(f, "ReduceOps.{}", self.name()),
            Op::Movement(_) => write!(f, "MovementOps.{}", self.name()),
            Op::Ternary(_) => write!(f, "TernaryOps.{}", self.name()),
        }
    }
}

macro_rules! impl_from_family {
    ($($family:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$family> for Op {
                fn from(op: $family) -> Self {
                    Op::$variant(op)
                }
            }
        )*
    };
}

impl_from_family! {
    BufferOp => Buffer,
    UnaryOp => Unary,
    BinaryOp => Binary,
    ReduceOp => Reduce,
    MovementOp => Movement,
    TernaryOp => Ternary,
}
