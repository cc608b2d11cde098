use crate::array::Array;
use crate::dtype::DType;
use crate::element::Element;
use crate::storage::Storage;

/// Where a [`Buffer`]'s elements currently live.
#[derive(Debug, Clone)]
pub enum BufferState {
    /// Host memory holding exactly `numel` elements.
    Owned(Storage),
    /// Declared but never written; reads as zeros.
    Uninitialized,
}

/// Flat, typed host allocation exchanged with the scheduler.
///
/// Buffers carry no shape: MEM exposes them as a 1-D [`Array`] and
/// FROM_UNDERLYING turns any array back into one.
#[derive(Debug, Clone)]
pub struct Buffer {
    numel: usize,
    dtype: DType,
    state: BufferState,
}

impl Buffer {
    /// Declare a buffer of `numel` elements without allocating it.
    pub fn new(numel: usize, dtype: DType) -> Self {
        Self {
            numel,
            dtype,
            state: BufferState::Uninitialized,
        }
    }

    pub fn from_vec<T: Element>(data: Vec<T>) -> Self {
        Self::from_storage(Storage::from_vec(data))
    }

    pub fn from_storage(storage: Storage) -> Self {
        Self {
            numel: storage.numel(),
            dtype: storage.dtype(),
            state: BufferState::Owned(storage),
        }
    }

    /// Wrap an array's elements, copying first if it is a strided view.
    pub fn from_host(array: &Array) -> Self {
        Self::from_storage(array.contiguous().storage().clone())
    }

    pub fn numel(&self) -> usize {
        self.numel
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn nbytes(&self) -> usize {
        self.dtype.storage_bytes(self.numel)
    }

    pub fn state(&self) -> &BufferState {
        &self.state
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, BufferState::Owned(_))
    }

    /// Allocate zeroed storage if the buffer was never written.
    pub fn materialize(&mut self) -> Storage {
        let storage = self.to_host();
        self.state = BufferState::Owned(storage.clone());
        storage
    }

    /// Host storage of the buffer. Uninitialized buffers read as zeros.
    pub fn to_host(&self) -> Storage {
        match &self.state {
            BufferState::Owned(storage) => storage.clone(),
            BufferState::Uninitialized => Storage::zeros(self.dtype, self.numel),
        }
    }
}
