//! Array kernels: element-wise, reduction, movement, select and contraction.
//!
//! Every kernel is pure. Results live in freshly allocated storage unless
//! the operation is a view, in which case the input storage is shared.

pub mod binary;
pub mod contraction;
pub mod movement;
pub mod reduce;
pub mod ternary;
pub mod unary;

pub use contraction::{einsum, mulacc};
