//! Built-in platform descriptions.
//!
//! Each supported SoC ships as a TOML document embedded at compile time.

use crate::{Platform, TopologyError};

/// `(name, TOML document)` for every built-in platform, sorted by name.
const BUILTIN: &[(&str, &str)] = &[
    ("sm7325", include_str!("../platforms/sm7325.toml")),
    ("sm8150", include_str!("../platforms/sm8150.toml")),
    ("sm8350", include_str!("../platforms/sm8350.toml")),
    ("sm8450", include_str!("../platforms/sm8450.toml")),
    ("sm8475", include_str!("../platforms/sm8475.toml")),
    ("sm8550", include_str!("../platforms/sm8550.toml")),
    ("sm8650", include_str!("../platforms/sm8650.toml")),
    ("sm8750", include_str!("../platforms/sm8750.toml")),
    ("sm8845", include_str!("../platforms/sm8845.toml")),
    ("sm8850", include_str!("../platforms/sm8850.toml")),
];

/// Returns the names of all built-in platforms.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTIN.iter().map(|(name, _)| *name)
}

/// Load a built-in platform by name (case-insensitive).
///
/// # Errors
///
/// Returns [`TopologyError::UnknownPlatform`] if no platform has that name,
/// or a parse/validation error if the embedded document is invalid.
pub fn builtin(name: &str) -> Result<Platform, TopologyError> {
    let (_, doc) = BUILTIN
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .ok_or_else(|| TopologyError::UnknownPlatform(name.to_string()))?;
    Platform::from_toml_str(doc)
}
