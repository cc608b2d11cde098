//! Operands and results exchanged with the interpreter.

use std::fmt;

use tessel_core::{Array, Buffer};

/// An operand or result: a flat buffer or a strided array.
#[derive(Debug, Clone)]
pub enum Value {
    Buffer(Buffer),
    Array(Array),
}

impl Value {
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            Value::Buffer(_) => None,
        }
    }

    pub fn as_buffer(&self) -> Option<&Buffer> {
        match self {
            Value::Buffer(b) => Some(b),
            Value::Array(_) => None,
        }
    }

    pub fn into_array(self) -> Option<Array> {
        match self {
            Value::Array(a) => Some(a),
            Value::Buffer(_) => None,
        }
    }

    pub fn into_buffer(self) -> Option<Buffer> {
        match self {
            Value::Buffer(b) => Some(b),
            Value::Array(_) => None,
        }
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Buffer> for Value {
    fn from(b: Buffer) -> Self {
        Value::Buffer(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Array(a) => write!(f, "{}{}", a.dtype(), a.shape()),
            Value::Buffer(b) => write!(f, "buffer<{}>({})", b.dtype(), b.numel()),
        }
    }
}
