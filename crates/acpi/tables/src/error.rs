//! Error types for table assembly.

use crate::pptt::{Entity, L1Kind};

/// Errors that can occur while assembling a table.
///
/// Any of these aborts the build. The partially assembled buffer is dropped
/// and no bytes reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// The platform record fails structural validation.
    #[error("invalid topology: {0}")]
    InvalidTopology(#[from] acpigen_topology::TopologyError),
    /// Per-core L2 policy, but no geometry for this core.
    #[error("no L2 geometry configured for core {core}")]
    UndefinedCoreL2 {
        /// ACPI processor id of the core.
        core: u32,
    },
    /// Per-cluster L2 policy, but no geometry for this cluster.
    #[error("no L2 geometry configured for cluster {cluster}")]
    UndefinedClusterL2 {
        /// Cluster index.
        cluster: u32,
    },
    /// A cluster lacks one of its L1 geometries.
    #[error("no {kind} geometry configured for cluster {cluster}")]
    UndefinedL1 {
        /// Cluster index.
        cluster: u32,
        /// Which L1 is missing.
        kind: L1Kind,
    },
    /// Growing the table buffer failed.
    #[error("failed to grow table buffer to {requested} bytes")]
    OutOfMemory {
        /// Capacity that was requested.
        requested: usize,
    },
    /// The table would no longer be addressable with 32-bit offsets.
    #[error("table exceeds the 32-bit length field")]
    TableTooLarge,
    /// The same entity was emitted twice.
    #[error("{0} emitted twice")]
    DuplicateEntity(Entity),
    /// An entity was referenced before it was emitted.
    #[error("{0} referenced before it was emitted")]
    UnresolvedEntity(Entity),
    /// A patch would write past the end of the table.
    #[error("patch of {len} bytes at {offset:#x} exceeds table length {table_len:#x}")]
    PatchOutOfBounds {
        /// Offset of the patch.
        offset: u32,
        /// Number of bytes patched.
        len: usize,
        /// Current table length.
        table_len: usize,
    },
    /// A record would not fit its one-byte length field.
    #[error("record of {0} bytes exceeds the 255-byte length field")]
    RecordTooLong(usize),
}
