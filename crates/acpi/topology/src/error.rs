//! Error types for topology loading and validation.

/// Errors that can occur while loading or validating a [`Platform`](crate::Platform).
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// No built-in platform carries the requested name.
    #[error("unknown platform `{0}`")]
    UnknownPlatform(String),
    /// The TOML document could not be parsed into a platform record.
    #[error("invalid platform description: {0}")]
    Parse(#[from] toml::de::Error),
    /// The platform declares no clusters at all.
    #[error("platform `{0}` declares no clusters")]
    NoClusters(String),
    /// A cluster declares zero cores.
    #[error("cluster {cluster} declares no cores")]
    EmptyCluster {
        /// Index of the offending cluster.
        cluster: usize,
    },
    /// More clusters than the table layout supports.
    #[error("{count} clusters declared, at most {max} are supported")]
    TooManyClusters {
        /// Number of clusters declared.
        count: usize,
        /// Supported maximum.
        max: usize,
    },
    /// More cores than the table layout supports.
    #[error("{count} cores declared, at most {max} are supported")]
    TooManyCores {
        /// Number of cores declared.
        count: usize,
        /// Supported maximum.
        max: usize,
    },
    /// `num_cores` disagrees with the sum of the per-cluster core counts.
    #[error("num_cores is {declared} but the clusters hold {actual} cores")]
    CoreCountMismatch {
        /// Value of `num_cores`.
        declared: u32,
        /// Sum of the per-cluster core counts.
        actual: u32,
    },
    /// More per-core L2 geometries than cores.
    #[error("{count} per-core L2 caches configured for {cores} cores")]
    CoreL2CountMismatch {
        /// Number of `core_l2` entries.
        count: usize,
        /// Value of `num_cores`.
        cores: u32,
    },
}
