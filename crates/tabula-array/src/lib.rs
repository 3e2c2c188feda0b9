//! Array backends for the tabula workspace.
//!
//! Three implementations of [`tabula_core::InitializableArray`]:
//!
//! - [`VecArray`]: a plain buffer whose `init` fills in Θ(N); reference
//!   oracle and performance baseline
//! - [`Block2Array`]: the two-cell-block in-place scheme (2⌈log₂N⌉ extra
//!   bits held as two scalar fields)
//! - [`Block4Array`]: the four-cell-block refinement that stashes its
//!   boundary and fill value inside the array's own final block
//!
//! plus [`ShadowOracle`], the epoch-stamped verifier each backend embeds
//! behind `enable_verification`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod baseline;
pub mod block2;
pub mod block4;
pub mod shadow;

#[cfg(test)]
pub(crate) mod compliance;

pub use baseline::VecArray;
pub use block2::Block2Array;
pub use block4::Block4Array;
pub use shadow::ShadowOracle;

use tabula_core::ArrayError;

/// Allocate a zero-filled buffer, surfacing allocation failure as
/// [`ArrayError::OutOfMemory`] instead of aborting.
pub(crate) fn zeroed_buf<T: Copy + Default>(n: usize) -> Result<Vec<T>, ArrayError> {
    let mut buf = Vec::new();
    if buf.try_reserve_exact(n).is_err() {
        return Err(ArrayError::OutOfMemory {
            requested_bytes: n.saturating_mul(std::mem::size_of::<T>()),
        });
    }
    buf.resize(n, T::default());
    Ok(buf)
}
