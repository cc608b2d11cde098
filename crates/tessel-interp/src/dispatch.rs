//! Instruction dispatch.

use std::collections::HashMap;

use crate::arg::OpArg;
use crate::config::InterpreterConfig;
use crate::error::{ExecError, Result};
use crate::kernels::{self, Kernel, KernelContext};
use crate::op::{BinaryOp, BufferOp, MovementOp, Op, ReduceOp, TernaryOp, UnaryOp};
use crate::value::Value;

/// Mapping from instruction tag to kernel.
#[derive(Clone, Default)]
pub struct DispatchTable {
    kernels: HashMap<Op, Kernel>,
}

impl DispatchTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The full CPU instruction set.
    pub fn cpu() -> Self {
        let entries: [(Op, Kernel); 26] = [
            (BufferOp::Mem.into(), kernels::mem),
            (BufferOp::Const.into(), kernels::constant),
            (BufferOp::FromUnderlying.into(), kernels::from_underlying),
            (UnaryOp::Noop.into(), kernels::noop),
            (UnaryOp::Exp2.into(), kernels::exp2),
            (UnaryOp::Log2.into(), kernels::log2),
            (UnaryOp::Sin.into(), kernels::sin),
            (UnaryOp::Sqrt.into(), kernels::sqrt),
            (UnaryOp::Neg.into(), kernels::neg),
            (UnaryOp::Cast.into(), kernels::cast),
            (BinaryOp::Max.into(), kernels::maximum),
            (BinaryOp::CmpLt.into(), kernels::cmplt),
            (BinaryOp::Add.into(), kernels::add),
            (BinaryOp::Sub.into(), kernels::sub),
            (BinaryOp::Mul.into(), kernels::mul),
            (BinaryOp::Div.into(), kernels::div),
            (ReduceOp::Sum.into(), kernels::sum),
            (ReduceOp::Max.into(), kernels::reduce_max),
            (MovementOp::AsStrided.into(), kernels::as_strided),
            (MovementOp::Pad.into(), kernels::pad),
            (MovementOp::Expand.into(), kernels::expand),
            (MovementOp::Reshape.into(), kernels::reshape),
            (MovementOp::Permute.into(), kernels::permute),
            (MovementOp::Shrink.into(), kernels::shrink),
            (TernaryOp::MulAcc.into(), kernels::mul_acc),
            (TernaryOp::Where.into(), kernels::where_select),
        ];
        Self {
            kernels: entries.into_iter().collect(),
        }
    }

    /// Add or replace the kernel for `op`, returning the previous one.
    pub fn insert(&mut self, op: impl Into<Op>, kernel: Kernel) -> Option<Kernel> {
        self.kernels.insert(op.into(), kernel)
    }

    pub fn get(&self, op: Op) -> Option<Kernel> {
        self.kernels.get(&op).copied()
    }

    pub fn contains(&self, op: Op) -> bool {
        self.kernels.contains_key(&op)
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }
}

/// Executes single instructions against in-memory arrays.
///
/// The dispatch table is fixed once the interpreter is in use; every kernel
/// is pure, so one interpreter may serve many threads.
///
/// ```
/// use tessel_core::Array;
/// use tessel_interp::{BinaryOp, Interpreter, OpArg, Value};
///
/// let interp = Interpreter::default();
/// let a = Value::from(Array::from_vec(vec![1.0f32, 2.0], [2]).unwrap());
/// let b = Value::from(Array::from_vec(vec![3.0f32, 4.0], [2]).unwrap());
/// let out = interp.execute(BinaryOp::Add, &[a, b], &OpArg::None).unwrap();
/// let sum = out.into_array().unwrap();
/// assert_eq!(sum.to_vec::<f32>().unwrap(), vec![4.0, 6.0]);
/// ```
pub struct Interpreter {
    config: InterpreterConfig,
    table: DispatchTable,
}

impl Interpreter {
    /// Interpreter over the CPU dispatch table.
    pub fn new(config: InterpreterConfig) -> Self {
        Self::with_table(config, DispatchTable::cpu())
    }

    pub fn with_table(config: InterpreterConfig, table: DispatchTable) -> Self {
        if !config.check_views {
            tracing::warn!("strided view checks disabled; AS_STRIDED layouts are trusted");
        }
        tracing::debug!("interpreter ready with {} kernels", table.len());
        Self { config, table }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Add or replace the kernel for `op`.
    pub fn register(&mut self, op: impl Into<Op>, kernel: Kernel) {
        self.table.insert(op, kernel);
    }

    pub fn supports(&self, op: impl Into<Op>) -> bool {
        self.table.contains(op.into())
    }

    /// Run one instruction.
    ///
    /// Operands are never modified. On error nothing is produced and the
    /// operands remain valid.
    pub fn execute(&self, op: impl Into<Op>, operands: &[Value], arg: &OpArg) -> Result<Value> {
        let op = op.into();
        let kernel = self.table.get(op).ok_or(ExecError::Unsupported(op))?;
        if operands.len() != op.arity() {
            return Err(ExecError::Arity {
                op,
                expected: op.arity(),
                got: operands.len(),
            });
        }
        let shown = operands.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
        tracing::debug!("{} [{}]", op, shown);
        let ctx = KernelContext {
            op,
            config: &self.config,
        };
        let out = kernel(&ctx, operands, arg);
        if let Err(e) = &out {
            tracing::debug!("{} failed: {}", op, e);
        }
        out
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}
