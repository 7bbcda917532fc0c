//! Processor Properties Topology Table (PPTT).
//!
//! The table is a flat list of variable-length records after the standard
//! SDT header. Two record kinds are emitted:
//!
//! - **Processor hierarchy nodes** (type 0) form a tree through their
//!   `parent` field: one physical package, one node per cluster, one leaf
//!   per core. A node lists its private caches as table offsets.
//! - **Cache records** (type 1) describe one cache instance each and chain
//!   towards the next level through `next_level`.
//!
//! Every cross-reference is a byte offset from the start of the table.
//! Records are emitted in a fixed order (see [`build_pptt`]) so the output
//! is byte-for-byte reproducible.

mod builder;
mod offsets;
mod resolve;

use core::fmt;

use acpigen_topology::CacheGeometry;

use crate::TableError;

pub use builder::build_pptt;
pub use offsets::{Entity, OffsetTable};

/// PPTT signature.
pub const PPTT_SIGNATURE: [u8; 4] = *b"PPTT";

/// Table revision written into the header.
pub const PPTT_REVISION: u8 = 3;

/// Creator id written into the header (`"ALHA"` on the wire).
pub const CREATOR_ID: u32 = u32::from_le_bytes(*b"ALHA");

/// Creator revision written into the header.
pub const CREATOR_REVISION: u32 = 1;

bitflags::bitflags! {
    /// Flags of a processor hierarchy node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ProcessorFlags: u32 {
        /// The node is a physical package.
        const PHYSICAL_PACKAGE = 1 << 0;
        /// `acpi_processor_id` refers to a processor object.
        const ACPI_PROCESSOR_ID_VALID = 1 << 1;
        /// The node is a thread.
        const IS_THREAD = 1 << 2;
        /// The node has no children.
        const IS_LEAF = 1 << 3;
        /// All children share the same implementation.
        const IDENTICAL_IMPLEMENTATION = 1 << 4;
    }
}

impl ProcessorFlags {
    /// Flags of a core leaf node.
    pub const CORE: Self = Self::ACPI_PROCESSOR_ID_VALID
        .union(Self::IS_THREAD)
        .union(Self::IS_LEAF);
}

bitflags::bitflags! {
    /// Validity flags of a cache record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CacheFlags: u32 {
        /// `size` is valid.
        const SIZE_VALID = 1 << 0;
        /// `number_of_sets` is valid.
        const NUMBER_OF_SETS_VALID = 1 << 1;
        /// `associativity` is valid.
        const ASSOCIATIVITY_VALID = 1 << 2;
        /// Allocation type bits of `attributes` are valid.
        const ALLOCATION_TYPE_VALID = 1 << 3;
        /// Cache type bits of `attributes` are valid.
        const CACHE_TYPE_VALID = 1 << 4;
        /// Write policy bit of `attributes` is valid.
        const WRITE_POLICY_VALID = 1 << 5;
        /// `line_size` is valid.
        const LINE_SIZE_VALID = 1 << 6;
        /// `cache_id` is valid.
        const CACHE_ID_VALID = 1 << 7;
    }
}

/// Which of the two L1 caches of a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum L1Kind {
    /// L1 data cache.
    Data,
    /// L1 instruction cache.
    Instruction,
}

impl fmt::Display for L1Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Data => "L1D",
            Self::Instruction => "L1I",
        })
    }
}

/// A processor hierarchy node (record type 0).
///
/// The fixed part is followed by `private_resources` 32-bit offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorNode {
    /// Node flags.
    pub flags: ProcessorFlags,
    /// Offset of the parent node, or 0 for the root.
    pub parent: u32,
    /// ACPI processor id (meaningful for cores only).
    pub acpi_processor_id: u32,
    /// Number of private resource slots following the fixed part.
    pub private_resources: u32,
}

impl ProcessorNode {
    /// Record type.
    pub const TYPE: u8 = 0;
    /// Size of the fixed part in bytes.
    pub const FIXED_SIZE: usize = 20;
    /// Size of one private resource reference.
    pub const REFERENCE_SIZE: usize = 4;

    /// Offset of `flags` within the record.
    pub const FLAGS_OFFSET: u32 = 4;
    /// Offset of `parent` within the record.
    pub const PARENT_OFFSET: u32 = 8;
    /// Offset of `acpi_processor_id` within the record.
    pub const ACPI_ID_OFFSET: u32 = 12;
    /// Offset of the private resource count within the record.
    pub const RESOURCE_COUNT_OFFSET: u32 = 16;

    /// Total record length including the resource slots.
    #[must_use]
    pub const fn record_len(&self) -> usize {
        Self::FIXED_SIZE + self.private_resources as usize * Self::REFERENCE_SIZE
    }

    /// Offset, relative to the record, of private resource slot `index`.
    #[must_use]
    pub const fn resource_slot(index: u32) -> u32 {
        Self::FIXED_SIZE as u32 + index * Self::REFERENCE_SIZE as u32
    }

    /// Serializes the node with every resource slot zeroed.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::RecordTooLong`] if the record does not fit its
    /// one-byte length field.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TableError> {
        let len = self.record_len();
        let len_byte = u8::try_from(len).map_err(|_| TableError::RecordTooLong(len))?;

        let mut out = Vec::with_capacity(len);
        out.push(Self::TYPE);
        out.push(len_byte);
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&self.flags.bits().to_le_bytes());
        out.extend_from_slice(&self.parent.to_le_bytes());
        out.extend_from_slice(&self.acpi_processor_id.to_le_bytes());
        out.extend_from_slice(&self.private_resources.to_le_bytes());
        out.resize(len, 0);
        Ok(out)
    }
}

/// A cache type record (record type 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheNode {
    /// Validity flags.
    pub flags: CacheFlags,
    /// Offset of the next-level cache, or 0 for the last level.
    pub next_level: u32,
    /// Size in bytes.
    pub size: u32,
    /// Number of sets.
    pub number_of_sets: u32,
    /// Number of ways.
    pub associativity: u8,
    /// Packed attribute byte.
    pub attributes: u8,
    /// Line size in bytes.
    pub line_size: u16,
    /// Cache id.
    pub cache_id: u32,
}

impl CacheNode {
    /// Record type.
    pub const TYPE: u8 = 1;
    /// Record size in bytes.
    pub const SIZE: usize = 28;

    /// Offset of `next_level` within the record.
    pub const NEXT_LEVEL_OFFSET: u32 = 8;
    /// Offset of `size` within the record.
    pub const SIZE_OFFSET: u32 = 12;
    /// Offset of the attribute byte within the record.
    pub const ATTRIBUTES_OFFSET: u32 = 21;

    /// Builds a cache record from a geometry.
    ///
    /// All validity flags are set and the cache id is 0.
    #[must_use]
    pub const fn from_geometry(geometry: &CacheGeometry, next_level: u32) -> Self {
        Self {
            flags: CacheFlags::all(),
            next_level,
            size: geometry.size,
            number_of_sets: geometry.sets,
            associativity: geometry.associativity,
            attributes: geometry.attributes.to_byte(),
            line_size: geometry.line_size,
            cache_id: 0,
        }
    }

    /// Serializes the record.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0] = Self::TYPE;
        out[1] = Self::SIZE as u8;
        out[4..8].copy_from_slice(&self.flags.bits().to_le_bytes());
        out[8..12].copy_from_slice(&self.next_level.to_le_bytes());
        out[12..16].copy_from_slice(&self.size.to_le_bytes());
        out[16..20].copy_from_slice(&self.number_of_sets.to_le_bytes());
        out[20] = self.associativity;
        out[21] = self.attributes;
        out[22..24].copy_from_slice(&self.line_size.to_le_bytes());
        out[24..28].copy_from_slice(&self.cache_id.to_le_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acpigen_topology::CacheAttributes;

    #[test]
    fn core_flags() {
        assert_eq!(ProcessorFlags::CORE.bits(), 0x0E);
        assert_eq!(ProcessorFlags::PHYSICAL_PACKAGE.bits(), 0x01);
        assert_eq!(CacheFlags::all().bits(), 0xFF);
    }

    #[test]
    fn processor_node_layout() {
        let node = ProcessorNode {
            flags: ProcessorFlags::CORE,
            parent: 0x38,
            acpi_processor_id: 5,
            private_resources: 2,
        };
        let bytes = node.to_bytes().unwrap();
        assert_eq!(bytes.len(), 28);
        assert_eq!(&bytes[0..4], &[0, 28, 0, 0]);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 0x0E);
        assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), 0x38);
        assert_eq!(u32::from_le_bytes(bytes[12..16].try_into().unwrap()), 5);
        assert_eq!(u32::from_le_bytes(bytes[16..20].try_into().unwrap()), 2);
        assert_eq!(&bytes[20..28], &[0; 8]);
        assert_eq!(ProcessorNode::resource_slot(1), 24);
    }

    #[test]
    fn oversized_processor_node() {
        let node = ProcessorNode {
            flags: ProcessorFlags::empty(),
            parent: 0,
            acpi_processor_id: 0,
            private_resources: 64,
        };
        assert!(matches!(node.to_bytes(), Err(TableError::RecordTooLong(276))));
    }

    #[test]
    fn cache_record_layout() {
        let geometry = CacheGeometry {
            size: 64 * 1024,
            sets: 256,
            associativity: 4,
            line_size: 64,
            attributes: CacheAttributes::DATA_WRITE_BACK,
        };
        let bytes = CacheNode::from_geometry(&geometry, 0x90).to_bytes();
        assert_eq!(&bytes[0..4], &[1, 28, 0, 0]);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 0xFF);
        assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), 0x90);
        assert_eq!(u32::from_le_bytes(bytes[12..16].try_into().unwrap()), 65536);
        assert_eq!(u32::from_le_bytes(bytes[16..20].try_into().unwrap()), 256);
        assert_eq!(bytes[20], 4);
        assert_eq!(bytes[21], 0x02);
        assert_eq!(u16::from_le_bytes(bytes[22..24].try_into().unwrap()), 64);
        assert_eq!(&bytes[24..28], &[0; 4]);
    }
}
