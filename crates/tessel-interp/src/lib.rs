//! # tessel-interp
//!
//! Interpreted execution of single tensor instructions.
//!
//! A scheduler hands the [`Interpreter`] one instruction at a time: a tag
//! ([`Op`]), its operands ([`Value`]) and an argument ([`OpArg`]). The
//! interpreter looks the tag up in its [`DispatchTable`] and runs the
//! matching `tessel-core` kernel.

pub mod arg;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod kernels;
pub mod op;
pub mod value;

pub use arg::OpArg;
pub use config::InterpreterConfig;
pub use dispatch::{DispatchTable, Interpreter};
pub use error::{ExecError, Result};
pub use kernels::{Kernel, KernelContext};
pub use op::{BinaryOp, BufferOp, MovementOp, Op, ReduceOp, TernaryOp, UnaryOp};
pub use value::Value;
