//! Tabula: in-place initializable arrays with constant-time `init`.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the tabula sub-crates. For most users, adding `tabula` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tabula::prelude::*;
//!
//! // A 1M-cell array whose init is O(1).
//! let mut a = Block4Array::new(1_000_000).unwrap();
//! a.init(42);
//! assert_eq!(a.read(999_999).unwrap(), 42);
//!
//! a.write(7, -3).unwrap();
//! assert_eq!(a.read(7).unwrap(), -3);
//!
//! // A second init logically wipes the write, again in O(1).
//! a.init(0);
//! assert_eq!(a.read(7).unwrap(), 0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tabula-core` | Cell scalar, counters, errors, the array trait |
//! | [`array`] | `tabula-array` | Baseline buffer, both in-place schemes, shadow oracle |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, counters, errors, and the array trait (`tabula-core`).
pub use tabula_core as types;

/// Array backends and the shadow oracle (`tabula-array`).
pub use tabula_array as array;

/// Common imports for typical tabula usage.
///
/// ```rust
/// use tabula::prelude::*;
/// ```
pub mod prelude {
    pub use tabula_array::{Block2Array, Block4Array, ShadowOracle, VecArray};
    pub use tabula_core::{
        ArrayError, Cell, InitializableArray, OpCounters, VerifyFailure,
    };
}
