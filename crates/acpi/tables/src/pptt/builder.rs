//! PPTT assembly.

use acpigen_topology::{CacheGeometry, L2Policy, Platform};
use log::{debug, trace};

use super::resolve::Resolver;
use super::{
    CREATOR_ID, CREATOR_REVISION, CacheNode, Entity, L1Kind, OffsetTable, PPTT_REVISION,
    PPTT_SIGNATURE, ProcessorFlags, ProcessorNode,
};
use crate::buffer::TableBuffer;
use crate::sdt::{self, SdtHeader};
use crate::TableError;

/// Builds a complete, checksummed PPTT for `platform`.
///
/// Records are emitted in this order:
///
/// 1. SDT header (length and checksum patched last)
/// 2. package node
/// 3. shared L2, then shared L3 (each only if present)
/// 4. one L2 per core (per-core policy only)
/// 5. for each cluster: the cluster node, its L2 (per-cluster policy only),
///    then for each core its node, L1 data and L1 instruction records
///
/// # Errors
///
/// Returns a [`TableError`] if the platform is invalid, a required cache
/// geometry is missing, or the buffer cannot grow. No partial table is
/// returned.
pub fn build_pptt(platform: &Platform) -> Result<Vec<u8>, TableError> {
    platform.validate()?;
    let mut builder = PpttBuilder::new(platform);
    builder.emit_all()?;
    builder.finish()
}

struct PpttBuilder<'a> {
    platform: &'a Platform,
    resolver: Resolver,
    package_resources: Vec<Entity>,
    table: TableBuffer,
    offsets: OffsetTable,
}

impl<'a> PpttBuilder<'a> {
    fn new(platform: &'a Platform) -> Self {
        let resolver = Resolver::new(platform);
        Self {
            platform,
            resolver,
            package_resources: resolver.package_resources(),
            table: TableBuffer::new(),
            offsets: OffsetTable::new(),
        }
    }

    fn emit_all(&mut self) -> Result<(), TableError> {
        let platform = self.platform;
        debug!(
            "PPTT: {} with {} clusters, {} cores, L2 policy {:?}, L3 {}",
            platform.name,
            platform.clusters.len(),
            platform.num_cores,
            self.resolver.policy(),
            if self.resolver.has_l3() { "present" } else { "absent" },
        );

        self.emit_header()?;
        self.emit_package()?;
        if let Some(l2) = platform.effective_shared_l2() {
            self.emit_shared_l2(l2)?;
        }
        if let Some(l3) = &platform.l3 {
            self.emit_shared_l3(l3)?;
        }
        if self.resolver.policy() == L2Policy::PerCore {
            self.emit_core_l2s()?;
        }
        for cluster in (0u32..).take(platform.clusters.len()) {
            self.emit_cluster(cluster)?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, TableError> {
        let checksum =
            sdt::finalize(self.table.as_mut_bytes()).ok_or(TableError::TableTooLarge)?;
        debug!(
            "PPTT: {} bytes, checksum {checksum:#04x}",
            self.table.len()
        );
        Ok(self.table.into_bytes())
    }

    fn emit_header(&mut self) -> Result<(), TableError> {
        let platform = self.platform;
        let oem = &platform.oem;
        let header = SdtHeader {
            signature: PPTT_SIGNATURE,
            length: 0,
            revision: PPTT_REVISION,
            checksum: 0,
            oem_id: oem.oem_id,
            oem_table_id: oem.oem_table_id,
            oem_revision: oem.oem_revision,
            creator_id: CREATOR_ID,
            creator_revision: CREATOR_REVISION,
        };
        self.table.append(&header.to_bytes())?;
        Ok(())
    }

    fn emit_package(&mut self) -> Result<(), TableError> {
        let node = ProcessorNode {
            flags: ProcessorFlags::PHYSICAL_PACKAGE,
            parent: 0,
            acpi_processor_id: 0,
            private_resources: resource_count(&self.package_resources),
        };
        self.emit_node(Entity::Package, &node)?;
        Ok(())
    }

    fn emit_shared_l2(&mut self, geometry: &CacheGeometry) -> Result<(), TableError> {
        // The L3 does not exist yet; its offset is patched in once it does.
        self.emit_cache(Entity::SharedL2, geometry, 0)?;
        self.link_package(Entity::SharedL2)
    }

    fn emit_shared_l3(&mut self, geometry: &CacheGeometry) -> Result<(), TableError> {
        let l3 = self.emit_cache(Entity::SharedL3, geometry, 0)?;
        self.link_package(Entity::SharedL3)?;
        if let Some(l2) = self.offsets.get(Entity::SharedL2) {
            self.table.patch_u32(l2 + CacheNode::NEXT_LEVEL_OFFSET, l3)?;
            trace!("PPTT: shared L2 at {l2:#x} -> next level {l3:#x}");
        }
        Ok(())
    }

    fn emit_core_l2s(&mut self) -> Result<(), TableError> {
        let platform = self.platform;
        let next_level = self.resolve_next(self.resolver.l2_next_level())?;
        for (_, core) in platform.cores() {
            let geometry = platform
                .core_l2
                .get(core as usize)
                .ok_or(TableError::UndefinedCoreL2 { core })?;
            self.emit_cache(Entity::CoreL2(core), geometry, next_level)?;
        }
        Ok(())
    }

    fn emit_cluster(&mut self, cluster: u32) -> Result<(), TableError> {
        let platform = self.platform;
        let config = &platform.clusters[cluster as usize];
        let resources = self.resolver.cluster_resources(cluster);

        let l2 = if resources.is_empty() {
            None
        } else {
            Some(
                config
                    .l2
                    .as_ref()
                    .ok_or(TableError::UndefinedClusterL2 { cluster })?,
            )
        };

        let node = ProcessorNode {
            flags: ProcessorFlags::empty(),
            parent: self.offsets.resolve(Entity::Package)?,
            acpi_processor_id: 0,
            private_resources: resource_count(&resources),
        };
        self.emit_node(Entity::Cluster(cluster), &node)?;

        if let Some(geometry) = l2 {
            let next_level = self.resolve_next(self.resolver.l2_next_level())?;
            self.emit_cache(Entity::ClusterL2(cluster), geometry, next_level)?;
            self.link(Entity::Cluster(cluster), &resources, Entity::ClusterL2(cluster))?;
        }

        for (_, core) in platform
            .cores()
            .filter(|&(index, _)| index == cluster as usize)
        {
            self.emit_core(cluster, core)?;
        }
        Ok(())
    }

    fn emit_core(&mut self, cluster: u32, core: u32) -> Result<(), TableError> {
        let platform = self.platform;
        let config = &platform.clusters[cluster as usize];
        let l1d = config.l1d.as_ref().ok_or(TableError::UndefinedL1 {
            cluster,
            kind: L1Kind::Data,
        })?;
        let l1i = config.l1i.as_ref().ok_or(TableError::UndefinedL1 {
            cluster,
            kind: L1Kind::Instruction,
        })?;

        let resources = Resolver::core_resources(core);
        let node = ProcessorNode {
            flags: ProcessorFlags::CORE,
            parent: self.offsets.resolve(Entity::Cluster(cluster))?,
            acpi_processor_id: core,
            private_resources: resource_count(&resources),
        };
        self.emit_node(Entity::Core(core), &node)?;

        let next_level = self.resolve_next(self.resolver.l1_next_level(cluster, core))?;
        self.emit_cache(Entity::L1Data(core), l1d, next_level)?;
        self.emit_cache(Entity::L1Instruction(core), l1i, next_level)?;

        for target in resources {
            self.link(Entity::Core(core), &resources, target)?;
        }
        Ok(())
    }

    fn emit_node(&mut self, entity: Entity, node: &ProcessorNode) -> Result<u32, TableError> {
        let offset = self.table.append(&node.to_bytes()?)?;
        self.offsets.record(entity, offset)?;
        debug!(
            "PPTT: {entity} at {offset:#x}, parent {:#x}, {} private resources",
            node.parent, node.private_resources
        );
        Ok(offset)
    }

    fn emit_cache(
        &mut self,
        entity: Entity,
        geometry: &CacheGeometry,
        next_level: u32,
    ) -> Result<u32, TableError> {
        let record = CacheNode::from_geometry(geometry, next_level);
        let offset = self.table.append(&record.to_bytes())?;
        self.offsets.record(entity, offset)?;
        debug!(
            "PPTT: {entity} at {offset:#x}, {} KiB {}-way, next level {next_level:#x}",
            geometry.size_kib(),
            geometry.associativity,
        );
        Ok(offset)
    }

    fn resolve_next(&self, next_level: Option<Entity>) -> Result<u32, TableError> {
        next_level.map_or(Ok(0), |entity| self.offsets.resolve(entity))
    }

    fn link_package(&mut self, target: Entity) -> Result<(), TableError> {
        let resources = self.package_resources.clone();
        self.link(Entity::Package, &resources, target)
    }

    /// Points the private resource slot of `node` that holds `target` at
    /// the target's record.
    fn link(
        &mut self,
        node: Entity,
        resources: &[Entity],
        target: Entity,
    ) -> Result<(), TableError> {
        let slot = (0u32..)
            .zip(resources)
            .find_map(|(slot, &entity)| (entity == target).then_some(slot))
            .ok_or(TableError::UnresolvedEntity(target))?;
        let base = self.offsets.resolve(node)?;
        let offset = self.offsets.resolve(target)?;
        self.table.patch_u32(base + ProcessorNode::resource_slot(slot), offset)?;
        trace!("PPTT: {node} slot {slot} -> {target} at {offset:#x}");
        Ok(())
    }
}

fn resource_count(resources: &[Entity]) -> u32 {
    u32::try_from(resources.len()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use acpigen_topology::{CacheAttributes, Cluster, OemInfo};

    fn cache(size_kib: u32, associativity: u8, attributes: CacheAttributes) -> CacheGeometry {
        CacheGeometry {
            size: size_kib * 1024,
            sets: size_kib * 1024 / 64 / u32::from(associativity),
            associativity,
            line_size: 64,
            attributes,
        }
    }

    fn cluster(cores: u32) -> Cluster {
        Cluster {
            cores,
            l1d: Some(cache(64, 4, CacheAttributes::DATA_WRITE_BACK)),
            l1i: Some(cache(64, 4, CacheAttributes::INSTRUCTION)),
            l2: None,
        }
    }

    fn platform(clusters: Vec<Cluster>) -> Platform {
        Platform {
            name: "test".into(),
            description: String::new(),
            oem: OemInfo {
                oem_id: *b"QCOM  ",
                oem_table_id: *b"QCOMEDK2",
                oem_revision: 1,
            },
            num_cores: clusters.iter().map(|c| c.cores).sum(),
            clusters,
            core_l2: Vec::new(),
            shared_l2: None,
            l3: None,
        }
    }

    fn assemble(platform: &Platform) -> PpttBuilder<'_> {
        let mut builder = PpttBuilder::new(platform);
        builder.emit_all().unwrap();
        builder
    }

    #[test]
    fn emission_order_per_core_l2() {
        let mut p = platform(vec![cluster(1), cluster(1)]);
        p.core_l2 = vec![cache(256, 8, CacheAttributes::UNIFIED_WRITE_BACK); 2];
        p.l3 = Some(cache(8192, 16, CacheAttributes::UNIFIED_WRITE_BACK));
        let builder = assemble(&p);
        let offsets = &builder.offsets;

        // header 36, package 20 + 4
        assert_eq!(offsets.get(Entity::Package), Some(36));
        assert_eq!(offsets.get(Entity::SharedL3), Some(60));
        assert_eq!(offsets.get(Entity::CoreL2(0)), Some(88));
        assert_eq!(offsets.get(Entity::CoreL2(1)), Some(116));
        assert_eq!(offsets.get(Entity::Cluster(0)), Some(144));
        assert_eq!(offsets.get(Entity::Core(0)), Some(164));
        assert_eq!(offsets.get(Entity::L1Data(0)), Some(192));
        assert_eq!(offsets.get(Entity::L1Instruction(0)), Some(220));
        assert_eq!(offsets.get(Entity::Cluster(1)), Some(248));
        assert_eq!(builder.table.len(), 248 + 20 + 28 + 28 + 28);
    }

    #[test]
    fn shared_l2_points_at_l3() {
        let mut p = platform(vec![cluster(2)]);
        p.shared_l2 = Some(cache(1024, 8, CacheAttributes::UNIFIED_WRITE_BACK));
        p.l3 = Some(cache(4096, 16, CacheAttributes::UNIFIED_WRITE_BACK));
        let builder = assemble(&p);
        let bytes = builder.table.as_bytes();
        let l2 = builder.offsets.get(Entity::SharedL2).unwrap() as usize;
        let l3 = builder.offsets.get(Entity::SharedL3).unwrap();
        let next = (l2 + CacheNode::NEXT_LEVEL_OFFSET as usize)..(l2 + 12);
        assert_eq!(u32::from_le_bytes(bytes[next].try_into().unwrap()), l3);
    }

    #[test]
    fn missing_core_l2_fails() {
        let mut p = platform(vec![cluster(3)]);
        p.core_l2 = vec![cache(256, 8, CacheAttributes::UNIFIED_WRITE_BACK); 2];
        assert!(matches!(
            build_pptt(&p),
            Err(TableError::UndefinedCoreL2 { core: 2 })
        ));
    }

    #[test]
    fn missing_cluster_l2_fails() {
        let mut p = platform(vec![cluster(2), cluster(2)]);
        p.clusters[0].l2 = Some(cache(512, 8, CacheAttributes::UNIFIED_WRITE_BACK));
        assert!(matches!(
            build_pptt(&p),
            Err(TableError::UndefinedClusterL2 { cluster: 1 })
        ));
    }

    #[test]
    fn missing_l1_fails() {
        let mut p = platform(vec![cluster(2), cluster(1)]);
        p.clusters[1].l1i = None;
        assert!(matches!(
            build_pptt(&p),
            Err(TableError::UndefinedL1 {
                cluster: 1,
                kind: L1Kind::Instruction
            })
        ));
    }

    #[test]
    fn invalid_platform_is_rejected() {
        let mut p = platform(vec![cluster(2)]);
        p.num_cores = 3;
        assert!(matches!(
            build_pptt(&p),
            Err(TableError::InvalidTopology(_))
        ));
    }

    #[test]
    fn no_l2_no_l3_terminates_at_l1() {
        let p = platform(vec![cluster(2)]);
        let table = build_pptt(&p).unwrap();
        // header, package, cluster, 2 × (core + L1D + L1I)
        assert_eq!(table.len(), 36 + 20 + 20 + 2 * (28 + 28 + 28));
        assert!(sdt::validate_checksum(&table));
    }
}
