//! # tessel-core
//!
//! Data model and primitive kernels for the tessel interpreted tensor
//! backend.
//!
//! Provides:
//! - Thirteen element types with a total promotion order
//! - `Array`, a strided view over shared, reference-counted storage
//! - Zero-copy movement views (as-strided, expand, reshape, permute, shrink)
//! - Element-wise, reduction, padding and select kernels
//! - `mulacc`, a multiply-accumulate contraction that skips broadcast axes

pub mod array;
pub mod buffer;
pub mod dtype;
pub mod element;
pub mod error;
pub mod ops;
pub mod prelude;
pub mod promote;
pub mod shape;
pub mod storage;

pub use array::Array;
pub use buffer::{Buffer, BufferState};
pub use dtype::DType;
pub use element::{Element, FloatElement, Scalar};
pub use error::TesselError;
pub use ops::{einsum, mulacc};
pub use promote::{match_types, promote};
pub use shape::{reduced_axes, Shape};
pub use storage::{HostData, Storage};

pub type Result<T> = std::result::Result<T, TesselError>;
