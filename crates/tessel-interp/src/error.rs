use tessel_core::TesselError;

use crate::op::Op;

/// Errors raised while dispatching an instruction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecError {
    #[error(transparent)]
    Core(#[from] TesselError),

    #[error("no kernel registered for {0}")]
    Unsupported(Op),

    #[error("{op} takes {expected} operands, got {got}")]
    Arity { op: Op, expected: usize, got: usize },

    #[error("{op} expects a {expected} argument")]
    BadArgument { op: Op, expected: &'static str },

    #[error("{op} expects {expected} operands")]
    OperandKind { op: Op, expected: &'static str },
}

pub type Result<T> = std::result::Result<T, ExecError>;
