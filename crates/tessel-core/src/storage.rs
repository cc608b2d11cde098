use std::sync::Arc;

use half::{bf16, f16};

use crate::element::{with_elem, Element};
use crate::{DType, Result, TesselError};

/// Run `$body` with `$v` bound to the typed vector inside a [`HostData`].
macro_rules! with_host {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            $crate::storage::HostData::Bool($v) => $body,
            $crate::storage::HostData::I8($v) => $body,
            $crate::storage::HostData::U8($v) => $body,
            $crate::storage::HostData::I16($v) => $body,
            $crate::storage::HostData::U16($v) => $body,
            $crate::storage::HostData::I32($v) => $body,
            $crate::storage::HostData::U32($v) => $body,
            $crate::storage::HostData::I64($v) => $body,
            $crate::storage::HostData::U64($v) => $body,
            $crate::storage::HostData::F16($v) => $body,
            $crate::storage::HostData::BF16($v) => $body,
            $crate::storage::HostData::F32($v) => $body,
            $crate::storage::HostData::F64($v) => $body,
        }
    };
}

pub(crate) use with_host;

/// Typed, contiguous host memory.
#[derive(Debug, Clone, PartialEq)]
pub enum HostData {
    Bool(Vec<bool>),
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    F16(Vec<f16>),
    BF16(Vec<bf16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl HostData {
    /// `numel` zeros of `dtype`.
    pub fn zeros(dtype: DType, numel: usize) -> Self {
        with_elem!(dtype, T => T::wrap(vec![T::zero(); numel]))
    }

    pub fn dtype(&self) -> DType {
        match self {
            HostData::Bool(_) => DType::Bool,
            HostData::I8(_) => DType::I8,
            HostData::U8(_) => DType::U8,
            HostData::I16(_) => DType::I16,
            HostData::U16(_) => DType::U16,
            HostData::I32(_) => DType::I32,
            HostData::U32(_) => DType::U32,
            HostData::I64(_) => DType::I64,
            HostData::U64(_) => DType::U64,
            HostData::F16(_) => DType::F16,
            HostData::BF16(_) => DType::BF16,
            HostData::F32(_) => DType::F32,
            HostData::F64(_) => DType::F64,
        }
    }

    pub fn len(&self) -> usize {
        with_host!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw native-endian bytes of every element.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            HostData::Bool(v) => v.iter().map(|&b| b as u8).collect(),
            HostData::I8(v) => bytemuck::cast_slice(v).to_vec(),
            HostData::U8(v) => v.clone(),
            HostData::I16(v) => bytemuck::cast_slice(v).to_vec(),
            HostData::U16(v) => bytemuck::cast_slice(v).to_vec(),
            HostData::I32(v) => bytemuck::cast_slice(v).to_vec(),
            HostData::U32(v) => bytemuck::cast_slice(v).to_vec(),
            HostData::I64(v) => bytemuck::cast_slice(v).to_vec(),
            HostData::U64(v) => bytemuck::cast_slice(v).to_vec(),
            HostData::F16(v) => bytemuck::cast_slice(v).to_vec(),
            HostData::BF16(v) => bytemuck::cast_slice(v).to_vec(),
            HostData::F32(v) => bytemuck::cast_slice(v).to_vec(),
            HostData::F64(v) => bytemuck::cast_slice(v).to_vec(),
        }
    }

    /// Reinterpret native-endian bytes as elements of `dtype`.
    ///
    /// Any non-zero byte reads back as `true` for `Bool`.
    pub fn from_bytes(dtype: DType, bytes: &[u8]) -> Result<Self> {
        if bytes.len() % dtype.itemsize() != 0 {
            return Err(TesselError::DataLength {
                expected: bytes.len() / dtype.itemsize() * dtype.itemsize(),
                got: bytes.len(),
            });
        }
        Ok(match dtype {
            DType::Bool => HostData::Bool(bytes.iter().map(|&b| b != 0).collect()),
            DType::I8 => HostData::I8(bytemuck::pod_collect_to_vec(bytes)),
            DType::U8 => HostData::U8(bytes.to_vec()),
            DType::I16 => HostData::I16(bytemuck::pod_collect_to_vec(bytes)),
            DType::U16 => HostData::U16(bytemuck::pod_collect_to_vec(bytes)),
            DType::I32 => HostData::I32(bytemuck::pod_collect_to_vec(bytes)),
            DType::U32 => HostData::U32(bytemuck::pod_collect_to_vec(bytes)),
            DType::I64 => HostData::I64(bytemuck::pod_collect_to_vec(bytes)),
            DType::U64 => HostData::U64(bytemuck::pod_collect_to_vec(bytes)),
            DType::F16 => HostData::F16(bytemuck::pod_collect_to_vec(bytes)),
            DType::BF16 => HostData::BF16(bytemuck::pod_collect_to_vec(bytes)),
            DType::F32 => HostData::F32(bytemuck::pod_collect_to_vec(bytes)),
            DType::F64 => HostData::F64(bytemuck::pod_collect_to_vec(bytes)),
        })
    }
}

impl<T: Element> From<Vec<T>> for HostData {
    fn from(data: Vec<T>) -> Self {
        T::wrap(data)
    }
}

/// Shared, reference-counted, read-only element storage.
///
/// Views produced by movement ops clone the `Arc`, never the data. Kernels
/// always allocate fresh storage for their results.
#[derive(Debug, Clone)]
pub struct Storage {
    data: Arc<HostData>,
}

impl Storage {
    /// Allocate zero-filled storage for `numel` elements of the given dtype.
    pub fn zeros(dtype: DType, numel: usize) -> Self {
        Self::new(HostData::zeros(dtype, numel))
    }

    pub fn new(data: HostData) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    pub fn from_vec<T: Element>(data: Vec<T>) -> Self {
        Self::new(T::wrap(data))
    }

    /// Create storage from raw bytes, checking the length against `numel`.
    pub fn from_bytes(dtype: DType, numel: usize, bytes: &[u8]) -> Result<Self> {
        let expected = dtype.storage_bytes(numel);
        if bytes.len() != expected {
            return Err(TesselError::DataLength {
                expected,
                got: bytes.len(),
            });
        }
        Ok(Self::new(HostData::from_bytes(dtype, bytes)?))
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    /// Number of logical elements.
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Size in bytes.
    pub fn nbytes(&self) -> usize {
        self.dtype().storage_bytes(self.numel())
    }

    pub fn data(&self) -> &HostData {
        &self.data
    }

    /// Typed view of the elements; `None` if `T` is not this storage's type.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }

    /// Whether this storage is uniquely owned (no other Arc references).
    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.data) == 1
    }

    /// Whether two handles share the same allocation.
    pub fn ptr_eq(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}
