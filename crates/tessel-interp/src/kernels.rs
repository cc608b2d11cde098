//! CPU kernels behind the default dispatch table.
//!
//! Each kernel unpacks its operands and argument, then defers to the
//! matching `tessel-core` primitive. Arity is checked by the interpreter
//! before a kernel runs.

use tessel_core::{mulacc, Array, Buffer, Shape};

use crate::arg::OpArg;
use crate::config::InterpreterConfig;
use crate::error::{ExecError, Result};
use crate::op::Op;
use crate::value::Value;

/// Read-only state a kernel may consult.
pub struct KernelContext<'a> {
    pub op: Op,
    pub config: &'a InterpreterConfig,
}

/// Signature shared by every dispatch table entry.
pub type Kernel = fn(&KernelContext<'_>, &[Value], &OpArg) -> Result<Value>;

fn array<'v>(ctx: &KernelContext<'_>, operands: &'v [Value], i: usize) -> Result<&'v Array> {
    operands
        .get(i)
        .and_then(Value::as_array)
        .ok_or(ExecError::OperandKind {
            op: ctx.op,
            expected: "array",
        })
}

fn shape_arg<'a>(ctx: &KernelContext<'_>, arg: &'a OpArg) -> Result<&'a Shape> {
    match arg {
        OpArg::Shape(shape) => Ok(shape),
        _ => Err(ExecError::BadArgument {
            op: ctx.op,
            expected: "shape",
        }),
    }
}

// Buffer ops

pub(crate) fn mem(ctx: &KernelContext<'_>, operands: &[Value], _: &OpArg) -> Result<Value> {
    let buffer = operands
        .first()
        .and_then(Value::as_buffer)
        .ok_or(ExecError::OperandKind {
            op: ctx.op,
            expected: "buffer",
        })?;
    Ok(Array::from_storage(buffer.to_host(), [buffer.numel()])?.into())
}

pub(crate) fn constant(ctx: &KernelContext<'_>, _: &[Value], arg: &OpArg) -> Result<Value> {
    match arg {
        OpArg::Const { value, dtype } => Ok(Array::scalar(*value, *dtype).into()),
        _ => Err(ExecError::BadArgument {
            op: ctx.op,
            expected: "constant",
        }),
    }
}

pub(crate) fn from_underlying(ctx: &KernelContext<'_>, operands: &[Value], _: &OpArg) -> Result<Value> {
    Ok(Buffer::from_host(array(ctx, operands, 0)?).into())
}

// Unary ops

pub(crate) fn noop(ctx: &KernelContext<'_>, operands: &[Value], _: &OpArg) -> Result<Value> {
    Ok(array(ctx, operands, 0)?.noop().into())
}

pub(crate) fn exp2(ctx: &KernelContext<'_>, operands: &[Value], _: &OpArg) -> Result<Value> {
    Ok(array(ctx, operands, 0)?.exp2()?.into())
}

pub(crate) fn log2(ctx: &KernelContext<'_>, operands: &[Value], _: &OpArg) -> Result<Value> {
    Ok(array(ctx, operands, 0)?.log2()?.into())
}

pub(crate) fn sin(ctx: &KernelContext<'_>, operands: &[Value], _: &OpArg) -> Result<Value> {
    Ok(array(ctx, operands, 0)?.sin()?.into())
}

pub(crate) fn sqrt(ctx: &KernelContext<'_>, operands: &[Value], _: &OpArg) -> Result<Value> {
    Ok(array(ctx, operands, 0)?.sqrt()?.into())
}

pub(crate) fn neg(ctx: &KernelContext<'_>, operands: &[Value], _: &OpArg) -> Result<Value> {
    Ok(array(ctx, operands, 0)?.neg().into())
}

pub(crate) fn cast(ctx: &KernelContext<'_>, operands: &[Value], arg: &OpArg) -> Result<Value> {
    let a = array(ctx, operands, 0)?;
    match arg {
        OpArg::Cast { dtype, bitcast: true } => Ok(a.bitcast(*dtype)?.into()),
        OpArg::Cast { dtype, bitcast: false } => Ok(a.cast(*dtype).into()),
        _ => Err(ExecError::BadArgument {
            op: ctx.op,
            expected: "cast",
        }),
    }
}

// Binary ops

macro_rules! binary_kernel {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            pub(crate) fn $name(ctx: &KernelContext<'_>, operands: &[Value], _: &OpArg) -> Result<Value> {
                let a = array(ctx, operands, 0)?;
                let b = array(ctx, operands, 1)?;
                Ok(a.$method(b)?.into())
            }
        )*
    };
}

binary_kernel! {
    maximum => maximum,
    cmplt => cmplt,
    add => add,
    sub => sub,
    mul => mul,
    div => div,
}

// Reduce ops

pub(crate) fn sum(ctx: &KernelContext<'_>, operands: &[Value], arg: &OpArg) -> Result<Value> {
    Ok(array(ctx, operands, 0)?.sum_to(shape_arg(ctx, arg)?)?.into())
}

pub(crate) fn reduce_max(ctx: &KernelContext<'_>, operands: &[Value], arg: &OpArg) -> Result<Value> {
    Ok(array(ctx, operands, 0)?.max_to(shape_arg(ctx, arg)?)?.into())
}

// Movement ops

pub(crate) fn as_strided(ctx: &KernelContext<'_>, operands: &[Value], arg: &OpArg) -> Result<Value> {
    let a = array(ctx, operands, 0)?;
    let OpArg::Strided { shape, strides, offset } = arg else {
        return Err(ExecError::BadArgument {
            op: ctx.op,
            expected: "strided layout",
        });
    };
    if ctx.config.check_views {
        Ok(a.as_strided(shape, strides, *offset)?.into())
    } else {
        Ok(a.as_strided_unchecked(shape, strides, *offset)?.into())
    }
}

pub(crate) fn pad(ctx: &KernelContext<'_>, operands: &[Value], arg: &OpArg) -> Result<Value> {
    let a = array(ctx, operands, 0)?;
    match arg {
        OpArg::Padding { pairs, fill } => Ok(a.pad_with(pairs, *fill)?.into()),
        _ => Err(ExecError::BadArgument {
            op: ctx.op,
            expected: "padding",
        }),
    }
}

pub(crate) fn expand(ctx: &KernelContext<'_>, operands: &[Value], arg: &OpArg) -> Result<Value> {
    Ok(array(ctx, operands, 0)?.expand(shape_arg(ctx, arg)?)?.into())
}

pub(crate) fn reshape(ctx: &KernelContext<'_>, operands: &[Value], arg: &OpArg) -> Result<Value> {
    Ok(array(ctx, operands, 0)?.reshape(shape_arg(ctx, arg)?)?.into())
}

pub(crate) fn permute(ctx: &KernelContext<'_>, operands: &[Value], arg: &OpArg) -> Result<Value> {
    let a = array(ctx, operands, 0)?;
    match arg {
        OpArg::Permutation(order) => Ok(a.permute(order)?.into()),
        _ => Err(ExecError::BadArgument {
            op: ctx.op,
            expected: "permutation",
        }),
    }
}

pub(crate) fn shrink(ctx: &KernelContext<'_>, operands: &[Value], arg: &OpArg) -> Result<Value> {
    let a = array(ctx, operands, 0)?;
    match arg {
        OpArg::Bounds(bounds) => Ok(a.shrink(bounds)?.into()),
        _ => Err(ExecError::BadArgument {
            op: ctx.op,
            expected: "bounds",
        }),
    }
}

// Ternary ops

pub(crate) fn mul_acc(ctx: &KernelContext<'_>, operands: &[Value], arg: &OpArg) -> Result<Value> {
    let a = array(ctx, operands, 0)?;
    let b = array(ctx, operands, 1)?;
    Ok(mulacc(a, b, shape_arg(ctx, arg)?)?.into())
}

pub(crate) fn where_select(ctx: &KernelContext<'_>, operands: &[Value], _: &OpArg) -> Result<Value> {
    let cond = array(ctx, operands, 0)?;
    let x = array(ctx, operands, 1)?;
    let y = array(ctx, operands, 2)?;
    Ok(cond.where_select(x, y)?.into())
}
