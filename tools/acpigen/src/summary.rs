//! Human-readable description of a generated PPTT.

use core::fmt;

use acpigen_topology::{CacheGeometry, L2Policy, Platform};

/// Topology overview printed by `ppttgen` before writing the table.
pub struct TopologySummary<'a> {
    platform: &'a Platform,
    table_len: usize,
}

impl<'a> TopologySummary<'a> {
    /// Summarizes `platform`, whose table is `table_len` bytes long.
    #[must_use]
    pub const fn new(platform: &'a Platform, table_len: usize) -> Self {
        Self {
            platform,
            table_len,
        }
    }
}

struct Geometry<'a>(&'a CacheGeometry);

impl fmt::Display for Geometry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} KB, {}-way", self.0.size_kib(), self.0.associativity)
    }
}

impl fmt::Display for TopologySummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.platform;
        let policy = p.l2_policy();

        writeln!(f, "PPTT Table Structure ({}):", p.name)?;
        writeln!(f, "  Total size: {} bytes", self.table_len)?;
        writeln!(f, "  Package (Physical): 1")?;
        writeln!(f, "  Clusters: {}", p.clusters.len())?;
        for (index, cluster) in p.clusters.iter().enumerate() {
            writeln!(f, "    - Cluster {index}: {} cores", cluster.cores)?;
            if let Some(l1d) = &cluster.l1d {
                writeln!(f, "      L1D: {}", Geometry(l1d))?;
            }
            if let Some(l1i) = &cluster.l1i {
                writeln!(f, "      L1I: {}", Geometry(l1i))?;
            }
            if policy == L2Policy::PerCluster {
                if let Some(l2) = &cluster.l2 {
                    writeln!(f, "      L2: {}", Geometry(l2))?;
                }
            }
        }
        if policy == L2Policy::PerCore {
            writeln!(f, "  L2 Cache (Per-core): Each CPU has private L2")?;
        }
        if let Some(l2) = p.effective_shared_l2() {
            writeln!(f, "  L2 Cache (Shared): {}", Geometry(l2))?;
        }
        if let Some(l3) = &p.l3 {
            writeln!(f, "  L3 Cache (Shared): {}", Geometry(l3))?;
        }
        Ok(())
    }
}
