//! Element-wise selection.

use crate::array::Array;
use crate::element::with_elem;
use crate::error::TesselError;
use crate::promote::match_types;
use crate::storage::Storage;
use crate::Result;

impl Array {
    /// Pick `x` where `self` is non-zero, `y` elsewhere.
    ///
    /// All three arrays must share one shape. `x` and `y` are promoted to a
    /// common dtype, which is the dtype of the result.
    pub fn where_select(&self, x: &Array, y: &Array) -> Result<Array> {
        for other in [x, y] {
            if other.shape() != self.shape() {
                return Err(TesselError::ShapeMismatch {
                    expected: self.shape().dims().to_vec(),
                    got: other.shape().dims().to_vec(),
                });
            }
        }
        let cond = self.values::<bool>();
        let (x, y) = match_types(x, y);
        let storage = with_elem!(x.dtype(), T => {
            let out: Vec<T> = cond
                .into_iter()
                .zip(x.values::<T>().into_iter().zip(y.values::<T>()))
                .map(|(c, (a, b))| if c { a } else { b })
                .collect();
            Storage::from_vec(out)
        });
        Ok(Array::from_contiguous(storage, self.shape().clone()))
    }
}
