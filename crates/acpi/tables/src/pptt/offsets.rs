//! Bookkeeping of where each topology entity landed in the table.

use core::fmt;
use std::collections::BTreeMap;

use crate::TableError;

/// A topology entity that occupies one record in the table.
///
/// Cluster indices and ACPI processor ids identify the per-cluster and
/// per-core entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Entity {
    /// The physical package node.
    Package,
    /// The package-wide L2.
    SharedL2,
    /// The package-wide L3.
    SharedL3,
    /// A cluster node.
    Cluster(u32),
    /// The L2 owned by a cluster.
    ClusterL2(u32),
    /// The private L2 of a core.
    CoreL2(u32),
    /// A core leaf node.
    Core(u32),
    /// The L1 data cache of a core.
    L1Data(u32),
    /// The L1 instruction cache of a core.
    L1Instruction(u32),
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package => f.write_str("package node"),
            Self::SharedL2 => f.write_str("shared L2"),
            Self::SharedL3 => f.write_str("shared L3"),
            Self::Cluster(i) => write!(f, "cluster {i} node"),
            Self::ClusterL2(i) => write!(f, "cluster {i} L2"),
            Self::CoreL2(i) => write!(f, "core {i} L2"),
            Self::Core(i) => write!(f, "core {i} node"),
            Self::L1Data(i) => write!(f, "core {i} L1D"),
            Self::L1Instruction(i) => write!(f, "core {i} L1I"),
        }
    }
}

/// Table offset of every entity emitted so far.
///
/// An entity is recorded exactly once, at the moment its record is
/// appended. Lookups of entities that have not been emitted fail rather
/// than yielding a zero offset.
#[derive(Debug, Default)]
pub struct OffsetTable {
    offsets: BTreeMap<Entity, u32>,
}

impl OffsetTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the offset of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::DuplicateEntity`] if it was already recorded.
    pub fn record(&mut self, entity: Entity, offset: u32) -> Result<(), TableError> {
        if self.offsets.insert(entity, offset).is_some() {
            return Err(TableError::DuplicateEntity(entity));
        }
        Ok(())
    }

    /// Returns the offset of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnresolvedEntity`] if it was never recorded.
    pub fn resolve(&self, entity: Entity) -> Result<u32, TableError> {
        self.get(entity).ok_or(TableError::UnresolvedEntity(entity))
    }

    /// Returns the offset of `entity`, if recorded.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<u32> {
        self.offsets.get(&entity).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_resolve() {
        let mut table = OffsetTable::new();
        table.record(Entity::Package, 0x24).unwrap();
        table.record(Entity::Core(3), 0x100).unwrap();
        assert_eq!(table.resolve(Entity::Package).unwrap(), 0x24);
        assert_eq!(table.get(Entity::Core(3)), Some(0x100));
        assert_eq!(table.get(Entity::Core(2)), None);
    }

    #[test]
    fn unresolved_entity_is_an_error() {
        let table = OffsetTable::new();
        assert!(matches!(
            table.resolve(Entity::ClusterL2(1)),
            Err(TableError::UnresolvedEntity(Entity::ClusterL2(1)))
        ));
    }

    #[test]
    fn duplicate_entity_is_an_error() {
        let mut table = OffsetTable::new();
        table.record(Entity::SharedL3, 0x40).unwrap();
        assert!(matches!(
            table.record(Entity::SharedL3, 0x80),
            Err(TableError::DuplicateEntity(Entity::SharedL3))
        ));
    }

    #[test]
    fn display_names() {
        assert_eq!(Entity::L1Instruction(7).to_string(), "core 7 L1I");
        assert_eq!(Entity::ClusterL2(0).to_string(), "cluster 0 L2");
    }
}
