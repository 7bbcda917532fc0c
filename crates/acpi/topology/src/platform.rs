//! Platform records: OEM identification plus the cluster/core/cache layout.

use serde::{Deserialize, Deserializer};

use crate::geometry::CacheGeometry;
use crate::{MAX_CLUSTERS, MAX_CORES, TopologyError};

/// OEM identification written into the table header.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OemInfo {
    /// OEM id, right-padded with spaces to 6 bytes.
    #[serde(deserialize_with = "deserialize_oem_id")]
    pub oem_id: [u8; 6],
    /// OEM table id, right-padded with spaces to 8 bytes.
    #[serde(deserialize_with = "deserialize_oem_table_id")]
    pub oem_table_id: [u8; 8],
    /// OEM revision.
    pub oem_revision: u32,
}

/// One cluster of cores sharing a microarchitecture.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Cluster {
    /// Number of physical cores in this cluster.
    pub cores: u32,
    /// L1 data cache of every core in this cluster.
    pub l1d: Option<CacheGeometry>,
    /// L1 instruction cache of every core in this cluster.
    pub l1i: Option<CacheGeometry>,
    /// L2 shared by the cores of this cluster (per-cluster policy).
    pub l2: Option<CacheGeometry>,
}

/// How L2 caches are shared across the topology.
///
/// Exactly one policy applies to a platform. It is decided once, in
/// priority order: per-core, per-cluster, shared, none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum L2Policy {
    /// Every core owns a private L2.
    PerCore,
    /// Every cluster owns an L2 shared by its cores.
    PerCluster,
    /// A single L2 is shared by the whole package.
    Shared,
    /// There is no L2.
    None,
}

/// A complete platform description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Platform {
    /// Short platform name (e.g. `sm8550`).
    pub name: String,
    /// Marketing name or free-form note.
    #[serde(default)]
    pub description: String,
    /// OEM identification for the table header.
    pub oem: OemInfo,
    /// Total number of physical cores.
    pub num_cores: u32,
    /// Clusters in ACPI processor id order.
    pub clusters: Vec<Cluster>,
    /// Private L2 per core, indexed by ACPI processor id.
    #[serde(default)]
    pub core_l2: Vec<CacheGeometry>,
    /// L2 shared by the whole package.
    #[serde(default)]
    pub shared_l2: Option<CacheGeometry>,
    /// L3 shared by the whole package.
    #[serde(default)]
    pub l3: Option<CacheGeometry>,
}

impl Platform {
    /// Parse and validate a platform from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::Parse`] if the document is malformed, or any
    /// of the validation errors described in [`Platform::validate`].
    pub fn from_toml_str(doc: &str) -> Result<Self, TopologyError> {
        let platform: Self = toml::from_str(doc)?;
        platform.validate()?;
        Ok(platform)
    }

    /// Check the structural limits of the topology.
    ///
    /// Cache coverage (e.g. a per-core L2 for every core) is not checked
    /// here. The table builder reports a missing geometry when it reaches the
    /// index that lacks one. Surplus per-core L2 entries are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NoClusters`], [`TopologyError::EmptyCluster`],
    /// [`TopologyError::TooManyClusters`], [`TopologyError::TooManyCores`]
    /// [`TopologyError::CoreCountMismatch`] or
    /// [`TopologyError::CoreL2CountMismatch`].
    pub fn validate(&self) -> Result<(), TopologyError> {
        if self.clusters.is_empty() {
            return Err(TopologyError::NoClusters(self.name.clone()));
        }
        if self.clusters.len() > MAX_CLUSTERS {
            return Err(TopologyError::TooManyClusters {
                count: self.clusters.len(),
                max: MAX_CLUSTERS,
            });
        }
        if let Some(cluster) = self.clusters.iter().position(|c| c.cores == 0) {
            return Err(TopologyError::EmptyCluster { cluster });
        }

        let actual: u32 = self.clusters.iter().map(|c| c.cores).sum();
        if actual as usize > MAX_CORES {
            return Err(TopologyError::TooManyCores {
                count: actual as usize,
                max: MAX_CORES,
            });
        }
        if actual != self.num_cores {
            return Err(TopologyError::CoreCountMismatch {
                declared: self.num_cores,
                actual,
            });
        }
        if self.core_l2.len() > self.num_cores as usize {
            return Err(TopologyError::CoreL2CountMismatch {
                count: self.core_l2.len(),
                cores: self.num_cores,
            });
        }
        Ok(())
    }

    /// Returns the L2 sharing policy of this platform.
    #[must_use]
    pub fn l2_policy(&self) -> L2Policy {
        if !self.core_l2.is_empty() {
            L2Policy::PerCore
        } else if self.clusters.iter().any(|c| c.l2.is_some()) {
            L2Policy::PerCluster
        } else if self.shared_l2.is_some() {
            L2Policy::Shared
        } else {
            L2Policy::None
        }
    }

    /// Returns the shared L2 geometry if the shared policy applies.
    ///
    /// A configured shared L2 is ignored when a private policy wins.
    #[must_use]
    pub fn effective_shared_l2(&self) -> Option<&CacheGeometry> {
        match self.l2_policy() {
            L2Policy::Shared => self.shared_l2.as_ref(),
            _ => None,
        }
    }

    /// Returns `true` if a shared L3 is configured.
    #[must_use]
    pub fn has_l3(&self) -> bool {
        self.l3.is_some()
    }

    /// Iterates `(cluster index, ACPI processor id)` for every core, in
    /// ascending ACPI id order.
    pub fn cores(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.clusters
            .iter()
            .enumerate()
            .flat_map(|(index, cluster)| std::iter::repeat_n(index, cluster.cores as usize))
            .zip(0u32..)
    }
}

fn deserialize_oem_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 6], D::Error> {
    deserialize_padded(deserializer)
}

fn deserialize_oem_table_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<[u8; 8], D::Error> {
    deserialize_padded(deserializer)
}

/// Reads an ASCII string into a fixed field, right-padding with spaces.
fn deserialize_padded<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    pad_ascii(&text).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "`{text}` must be at most {N} printable ASCII characters"
        ))
    })
}

fn pad_ascii<const N: usize>(text: &str) -> Option<[u8; N]> {
    if text.len() > N || !text.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
        return None;
    }
    let mut field = [b' '; N];
    field[..text.len()].copy_from_slice(text.as_bytes());
    Some(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_CLUSTERS: &str = r#"
        name = "test"
        num_cores = 3

        [oem]
        oem_id = "QCOM"
        oem_table_id = "QCOMEDK2"
        oem_revision = 0x1234

        [[clusters]]
        cores = 2
        l1d = { size = "32K", sets = 128, associativity = 4, line_size = 64, attributes = "data-wb" }
        l1i = { size = "32K", sets = 128, associativity = 4, line_size = 64, attributes = "instruction" }

        [[clusters]]
        cores = 1
        l1d = { size = "64K", sets = 256, associativity = 4, line_size = 64, attributes = "data-wb" }
        l1i = { size = "64K", sets = 256, associativity = 4, line_size = 64, attributes = "instruction" }
    "#;

    fn two_clusters() -> Platform {
        Platform::from_toml_str(TWO_CLUSTERS).unwrap()
    }

    fn unified(size: u32) -> CacheGeometry {
        CacheGeometry {
            size,
            sets: size / 64 / 8,
            associativity: 8,
            line_size: 64,
            attributes: crate::CacheAttributes::UNIFIED_WRITE_BACK,
        }
    }

    #[test]
    fn oem_strings_are_space_padded() {
        let platform = two_clusters();
        assert_eq!(&platform.oem.oem_id, b"QCOM  ");
        assert_eq!(&platform.oem.oem_table_id, b"QCOMEDK2");
        assert_eq!(platform.oem.oem_revision, 0x1234);
    }

    #[test]
    fn overlong_oem_id_is_rejected() {
        let doc = TWO_CLUSTERS.replace("oem_id = \"QCOM\"", "oem_id = \"QUALCOMM\"");
        assert!(matches!(
            Platform::from_toml_str(&doc),
            Err(TopologyError::Parse(_))
        ));
    }

    #[test]
    fn core_count_must_match_clusters() {
        let doc = TWO_CLUSTERS.replace("num_cores = 3", "num_cores = 4");
        assert!(matches!(
            Platform::from_toml_str(&doc),
            Err(TopologyError::CoreCountMismatch {
                declared: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn cluster_limit_is_enforced() {
        let mut platform = two_clusters();
        let extra = platform.clusters[1].clone();
        platform.clusters.extend(std::iter::repeat_n(extra, 3));
        platform.num_cores = 6;
        assert!(matches!(
            platform.validate(),
            Err(TopologyError::TooManyClusters { count: 5, max: 4 })
        ));
    }

    #[test]
    fn core_limit_is_enforced() {
        let mut platform = two_clusters();
        platform.clusters[0].cores = 16;
        platform.num_cores = 17;
        assert!(matches!(
            platform.validate(),
            Err(TopologyError::TooManyCores { count: 17, max: 16 })
        ));
    }

    #[test]
    fn empty_cluster_is_rejected() {
        let mut platform = two_clusters();
        platform.clusters[1].cores = 0;
        platform.num_cores = 2;
        assert!(matches!(
            platform.validate(),
            Err(TopologyError::EmptyCluster { cluster: 1 })
        ));
    }

    #[test]
    fn surplus_core_l2_is_rejected() {
        let mut platform = two_clusters();
        platform.core_l2 = vec![unified(256 << 10); 3];
        assert!(platform.validate().is_ok());

        platform.core_l2.push(unified(256 << 10));
        assert!(matches!(
            platform.validate(),
            Err(TopologyError::CoreL2CountMismatch { count: 4, cores: 3 })
        ));
    }

    #[test]
    fn policy_priority_order() {
        let mut platform = two_clusters();
        assert_eq!(platform.l2_policy(), L2Policy::None);

        platform.shared_l2 = Some(unified(1 << 20));
        assert_eq!(platform.l2_policy(), L2Policy::Shared);
        assert!(platform.effective_shared_l2().is_some());

        platform.clusters[0].l2 = Some(unified(512 << 10));
        assert_eq!(platform.l2_policy(), L2Policy::PerCluster);
        assert!(platform.effective_shared_l2().is_none());

        platform.core_l2 = vec![unified(128 << 10); 3];
        assert_eq!(platform.l2_policy(), L2Policy::PerCore);
    }

    #[test]
    fn cores_are_numbered_across_clusters() {
        let platform = two_clusters();
        let cores: Vec<_> = platform.cores().collect();
        assert_eq!(cores, vec![(0, 0), (0, 1), (1, 2)]);
    }
}
