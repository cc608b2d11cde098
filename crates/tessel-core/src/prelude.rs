//! Convenience re-exports for common tessel-core types.
//!
//! ```rust
//! use tessel_core::prelude::*;
//! ```

pub use crate::Array;
pub use crate::Buffer;
pub use crate::DType;
pub use crate::Scalar;
pub use crate::Shape;
pub use crate::TesselError;
pub use crate::Result;
