//! Next-level and private-resource decisions for each record.
//!
//! The cache hierarchy only depends on the L2 policy and on whether an L3
//! exists. Both are fixed before emission starts.

use acpigen_topology::{L2Policy, Platform};

use super::Entity;

/// Which records a node or cache points at.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Resolver {
    policy: L2Policy,
    has_l3: bool,
}

impl Resolver {
    pub(crate) fn new(platform: &Platform) -> Self {
        Self {
            policy: platform.l2_policy(),
            has_l3: platform.has_l3(),
        }
    }

    pub(crate) const fn policy(&self) -> L2Policy {
        self.policy
    }

    pub(crate) const fn has_l3(&self) -> bool {
        self.has_l3
    }

    /// The record an L1 of `core` (in `cluster`) chains to, or `None` for
    /// the last level.
    pub(crate) const fn l1_next_level(&self, cluster: u32, core: u32) -> Option<Entity> {
        match self.policy {
            L2Policy::PerCore => Some(Entity::CoreL2(core)),
            L2Policy::PerCluster => Some(Entity::ClusterL2(cluster)),
            L2Policy::Shared => Some(Entity::SharedL2),
            L2Policy::None => self.l2_next_level(),
        }
    }

    /// The record any L2 chains to.
    pub(crate) const fn l2_next_level(&self) -> Option<Entity> {
        if self.has_l3 {
            Some(Entity::SharedL3)
        } else {
            None
        }
    }

    /// Private resources of the package node, in slot order.
    pub(crate) fn package_resources(&self) -> Vec<Entity> {
        let mut resources = Vec::with_capacity(2);
        if self.policy == L2Policy::Shared {
            resources.push(Entity::SharedL2);
        }
        if self.has_l3 {
            resources.push(Entity::SharedL3);
        }
        resources
    }

    /// Private resources of a cluster node.
    pub(crate) fn cluster_resources(&self, cluster: u32) -> Vec<Entity> {
        match self.policy {
            L2Policy::PerCluster => vec![Entity::ClusterL2(cluster)],
            _ => Vec::new(),
        }
    }

    /// Private resources of a core node.
    pub(crate) fn core_resources(core: u32) -> [Entity; 2] {
        [Entity::L1Data(core), Entity::L1Instruction(core)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(policy: L2Policy, has_l3: bool) -> Resolver {
        Resolver { policy, has_l3 }
    }

    #[test]
    fn l1_chains_by_policy() {
        assert_eq!(
            resolver(L2Policy::PerCore, true).l1_next_level(1, 6),
            Some(Entity::CoreL2(6))
        );
        assert_eq!(
            resolver(L2Policy::PerCluster, false).l1_next_level(1, 6),
            Some(Entity::ClusterL2(1))
        );
        assert_eq!(
            resolver(L2Policy::Shared, false).l1_next_level(1, 6),
            Some(Entity::SharedL2)
        );
        assert_eq!(
            resolver(L2Policy::None, true).l1_next_level(1, 6),
            Some(Entity::SharedL3)
        );
        assert_eq!(resolver(L2Policy::None, false).l1_next_level(1, 6), None);
    }

    #[test]
    fn package_resource_order() {
        assert_eq!(
            resolver(L2Policy::Shared, true).package_resources(),
            vec![Entity::SharedL2, Entity::SharedL3]
        );
        assert_eq!(
            resolver(L2Policy::PerCore, true).package_resources(),
            vec![Entity::SharedL3]
        );
        assert!(resolver(L2Policy::PerCluster, false)
            .package_resources()
            .is_empty());
    }

    #[test]
    fn cluster_resources_only_for_cluster_l2() {
        assert_eq!(
            resolver(L2Policy::PerCluster, true).cluster_resources(2),
            vec![Entity::ClusterL2(2)]
        );
        assert!(resolver(L2Policy::PerCore, true).cluster_resources(2).is_empty());
    }
}
