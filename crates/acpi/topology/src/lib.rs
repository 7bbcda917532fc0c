//! `acpigen-topology` --- processor and cache topology of the supported SoCs.
//!
//! A [`Platform`] is the single data record that drives table generation: how
//! many clusters exist, how many cores each one holds, and the geometry of
//! every cache in the hierarchy. Platforms are described in TOML and either
//! come from the built-in [`registry`] (one document per SoC) or from a file
//! supplied by the user.
//!
//! # Usage
//!
//! ```ignore
//! let platform = acpigen_topology::registry::builtin("sm8550")?;
//! match platform.l2_policy() {
//!     L2Policy::PerCore => { /* ... */ }
//!     _ => {}
//! }
//! ```

mod error;
pub mod geometry;
pub mod platform;
pub mod registry;

pub use error::TopologyError;
pub use geometry::{AllocationType, CacheAttributes, CacheGeometry, CacheType, WritePolicy};
pub use platform::{Cluster, L2Policy, OemInfo, Platform};

/// Maximum number of clusters a platform may declare.
pub const MAX_CLUSTERS: usize = 4;

/// Maximum number of physical cores a platform may declare.
pub const MAX_CORES: usize = 16;
