//! Cache geometry and attribute encoding.
//!
//! The attribute byte of a PPTT cache record packs three fields:
//!
//! | Bits | Field           | Values                                   |
//! |------|-----------------|------------------------------------------|
//! | 0-1  | allocation type | 0 read, 1 write, 2 read/write            |
//! | 2-3  | cache type      | 0 data, 1 instruction, 2 unified         |
//! | 4    | write policy    | 0 write-back, 1 write-through            |

use serde::{Deserialize, Deserializer};

/// Geometry of one cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheGeometry {
    /// Total size in bytes. Accepts an integer or a string such as `"64K"`.
    #[serde(deserialize_with = "deserialize_size")]
    pub size: u32,
    /// Number of sets.
    pub sets: u32,
    /// Number of ways.
    pub associativity: u8,
    /// Line size in bytes.
    pub line_size: u16,
    /// Allocation type, cache type and write policy.
    pub attributes: CacheAttributes,
}

impl CacheGeometry {
    /// Size in whole KiB, for human-readable summaries.
    #[must_use]
    pub const fn size_kib(&self) -> u32 {
        self.size / 1024
    }
}

/// Cache allocation type (attribute bits 0-1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationType {
    /// Read allocate.
    Read,
    /// Write allocate.
    Write,
    /// Read and write allocate.
    ReadWrite,
}

/// Cache type (attribute bits 2-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheType {
    /// Data cache.
    Data,
    /// Instruction cache.
    Instruction,
    /// Unified data and instruction cache.
    Unified,
}

/// Write policy (attribute bit 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Write-back.
    WriteBack,
    /// Write-through.
    WriteThrough,
}

/// Decoded form of the cache attribute byte.
///
/// In TOML this is either one of the presets `"data-wb"`, `"instruction"`,
/// `"unified-wb"` or an explicit table with `allocation`, `cache-type` and
/// `write-policy` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "AttributesRepr")]
pub struct CacheAttributes {
    /// Allocation type.
    pub allocation: AllocationType,
    /// Cache type.
    pub cache_type: CacheType,
    /// Write policy.
    pub write_policy: WritePolicy,
}

impl CacheAttributes {
    /// Read/write allocate, data, write-back. Typical L1 data cache.
    pub const DATA_WRITE_BACK: Self = Self {
        allocation: AllocationType::ReadWrite,
        cache_type: CacheType::Data,
        write_policy: WritePolicy::WriteBack,
    };

    /// Read allocate, instruction, write-back. Typical L1 instruction cache.
    pub const INSTRUCTION: Self = Self {
        allocation: AllocationType::Read,
        cache_type: CacheType::Instruction,
        write_policy: WritePolicy::WriteBack,
    };

    /// Read/write allocate, unified, write-back. Typical L2/L3 cache.
    pub const UNIFIED_WRITE_BACK: Self = Self {
        allocation: AllocationType::ReadWrite,
        cache_type: CacheType::Unified,
        write_policy: WritePolicy::WriteBack,
    };

    /// Encodes the attributes into the PPTT attribute byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        let allocation = match self.allocation {
            AllocationType::Read => 0x00,
            AllocationType::Write => 0x01,
            AllocationType::ReadWrite => 0x02,
        };
        let cache_type = match self.cache_type {
            CacheType::Data => 0x00,
            CacheType::Instruction => 0x04,
            CacheType::Unified => 0x08,
        };
        let write_policy = match self.write_policy {
            WritePolicy::WriteBack => 0x00,
            WritePolicy::WriteThrough => 0x10,
        };
        allocation | cache_type | write_policy
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AttributesRepr {
    Preset(Preset),
    Explicit(ExplicitAttributes),
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
enum Preset {
    DataWb,
    Instruction,
    UnifiedWb,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ExplicitAttributes {
    allocation: AllocationType,
    cache_type: CacheType,
    write_policy: WritePolicy,
}

impl From<AttributesRepr> for CacheAttributes {
    fn from(repr: AttributesRepr) -> Self {
        match repr {
            AttributesRepr::Preset(Preset::DataWb) => Self::DATA_WRITE_BACK,
            AttributesRepr::Preset(Preset::Instruction) => Self::INSTRUCTION,
            AttributesRepr::Preset(Preset::UnifiedWb) => Self::UNIFIED_WRITE_BACK,
            AttributesRepr::Explicit(e) => Self {
                allocation: e.allocation,
                cache_type: e.cache_type,
                write_policy: e.write_policy,
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    Bytes(u64),
    Text(String),
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let bytes = match SizeRepr::deserialize(deserializer)? {
        SizeRepr::Bytes(n) => n,
        SizeRepr::Text(s) => parse_size(&s).map_err(serde::de::Error::custom)?,
    };
    u32::try_from(bytes)
        .map_err(|_| serde::de::Error::custom(format!("cache size {bytes} does not fit in 32 bits")))
}

/// Parses a byte count with an optional binary unit suffix (`K`, `KB`,
/// `KiB`, `M`, `MB`, `MiB`; case-insensitive).
fn parse_size(text: &str) -> Result<u64, String> {
    let text = text.trim();
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, suffix) = text.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid cache size `{text}`"))?;

    let multiplier = match suffix.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => 1024,
        "m" | "mb" | "mib" => 1024 * 1024,
        other => return Err(format!("unknown size unit `{other}` in `{text}`")),
    };

    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("cache size `{text}` overflows"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        cache: CacheGeometry,
    }

    fn parse(doc: &str) -> Result<CacheGeometry, toml::de::Error> {
        toml::from_str::<Wrapper>(doc).map(|w| w.cache)
    }

    #[test]
    fn attribute_presets_match_header_encoding() {
        assert_eq!(CacheAttributes::DATA_WRITE_BACK.to_byte(), 0x02);
        assert_eq!(CacheAttributes::INSTRUCTION.to_byte(), 0x04);
        assert_eq!(CacheAttributes::UNIFIED_WRITE_BACK.to_byte(), 0x0A);
    }

    #[test]
    fn write_through_sets_bit_four() {
        let attrs = CacheAttributes {
            allocation: AllocationType::Write,
            cache_type: CacheType::Data,
            write_policy: WritePolicy::WriteThrough,
        };
        assert_eq!(attrs.to_byte(), 0x11);
    }

    #[test]
    fn parse_size_units() {
        assert_eq!(parse_size("512"), Ok(512));
        assert_eq!(parse_size("32K"), Ok(32 * 1024));
        assert_eq!(parse_size("64 KiB"), Ok(64 * 1024));
        assert_eq!(parse_size("12M"), Ok(12 * 1024 * 1024));
        assert_eq!(parse_size("8mb"), Ok(8 * 1024 * 1024));
        assert!(parse_size("12G").is_err());
        assert!(parse_size("K").is_err());
    }

    #[test]
    fn geometry_from_preset_and_string_size() {
        let geometry = parse(
            r#"
            [cache]
            size = "64K"
            sets = 256
            associativity = 4
            line_size = 64
            attributes = "data-wb"
            "#,
        )
        .unwrap();
        assert_eq!(geometry.size, 65536);
        assert_eq!(geometry.size_kib(), 64);
        assert_eq!(geometry.attributes, CacheAttributes::DATA_WRITE_BACK);
    }

    #[test]
    fn geometry_from_explicit_attributes() {
        let geometry = parse(
            r#"
            [cache]
            size = 131072
            sets = 512
            associativity = 4
            line_size = 64
            attributes = { allocation = "read", cache-type = "unified", write-policy = "write-through" }
            "#,
        )
        .unwrap();
        assert_eq!(geometry.size, 131_072);
        assert_eq!(geometry.attributes.to_byte(), 0x18);
    }

    #[test]
    fn oversized_cache_is_rejected() {
        let result = parse(
            r#"
            [cache]
            size = "8192M"
            sets = 1
            associativity = 1
            line_size = 64
            attributes = "unified-wb"
            "#,
        );
        assert!(result.is_err());
    }
}
