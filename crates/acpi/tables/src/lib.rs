//! `acpigen-tables` --- byte-exact assembly of ACPI tables.
//!
//! Tables are built into a [`TableBuffer`] by appending fixed-layout records
//! and patching cross-references by offset once their targets exist. The
//! SDT header is written first with zero length and checksum and finalized
//! last.
//!
//! The only table built here is the [PPTT](pptt), which describes the
//! processor and cache hierarchy of a [`Platform`](acpigen_topology::Platform):
//!
//! ```ignore
//! let platform = acpigen_topology::registry::builtin("sm8550")?;
//! let table = acpigen_tables::pptt::build_pptt(&platform)?;
//! assert!(acpigen_tables::sdt::validate_checksum(&table));
//! ```

pub mod buffer;
mod error;
pub mod pptt;
pub mod sdt;

pub use buffer::TableBuffer;
pub use error::TableError;
pub use pptt::build_pptt;
pub use sdt::{SdtHeader, checksum, validate_checksum};
