//! Locate a finished ACPI table inside a compiled firmware image.
//!
//! Tables are compiled into an object between two marker strings. The table
//! starts right after the last start marker in the image and the scanned
//! region ends at the last end marker after it. The length field of the
//! table header is authoritative; a disagreement with the scanned region is
//! only reported.

use std::path::{Path, PathBuf};

use acpigen_tables::SdtHeader;
use acpigen_tables::sdt;
use log::{debug, warn};

/// Marker placed immediately before a table.
pub const DEFAULT_START_MARKER: &[u8] = b"ACPI_TABLE_START";

/// Marker placed immediately after a table.
pub const DEFAULT_END_MARKER: &[u8] = b"ACPI_TABLE_END!!";

/// Tables with this signature carry no checksum and are copied verbatim.
pub const NO_CHECKSUM_SIGNATURE: [u8; 4] = *b"FACS";

/// Errors that can occur while extracting a table.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The start marker does not occur in the image.
    #[error("table start marker `{0}` not found")]
    MissingStartMarker(String),
    /// The end marker does not occur after the start marker.
    #[error("table end marker `{0}` not found after the start marker")]
    MissingEndMarker(String),
    /// The image ends before the table does.
    #[error("table declares {declared} bytes but only {available} follow the start marker")]
    TruncatedTable {
        /// Bytes required by the header.
        declared: usize,
        /// Bytes between the start marker and the end of the image.
        available: usize,
    },
    /// A marker was given as the empty string.
    #[error("{0} marker must not be empty")]
    EmptyMarker(&'static str),
}

/// The pair of byte strings delimiting a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    start: Vec<u8>,
    end: Vec<u8>,
}

impl Markers {
    /// Creates a marker pair.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::EmptyMarker`] if either marker is empty.
    pub fn new(start: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>) -> Result<Self, ExtractError> {
        let (start, end) = (start.into(), end.into());
        if start.is_empty() {
            return Err(ExtractError::EmptyMarker("start"));
        }
        if end.is_empty() {
            return Err(ExtractError::EmptyMarker("end"));
        }
        Ok(Self { start, end })
    }

    /// The start marker.
    #[must_use]
    pub fn start(&self) -> &[u8] {
        &self.start
    }

    /// The end marker.
    #[must_use]
    pub fn end(&self) -> &[u8] {
        &self.end
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_MARKER.to_vec(),
            end: DEFAULT_END_MARKER.to_vec(),
        }
    }
}

/// A table copied out of an image.
#[derive(Debug, Clone)]
pub struct ExtractedTable {
    /// Header of the copied table, checksum already updated.
    pub header: SdtHeader,
    /// The table, exactly `header.length` bytes.
    pub bytes: Vec<u8>,
    /// Distance between the markers in the image.
    pub scanned_len: usize,
}

impl ExtractedTable {
    /// Signature as text.
    #[must_use]
    pub fn signature(&self) -> String {
        self.header.signature_str()
    }

    /// `<signature>.aml`, lower-cased.
    #[must_use]
    pub fn default_file_name(&self) -> String {
        format!("{}.aml", self.signature().to_ascii_lowercase())
    }
}

/// Copies the table delimited by `markers` out of `image`.
///
/// The checksum of the copy is recomputed unless the signature is
/// [`NO_CHECKSUM_SIGNATURE`]. The image itself is not modified.
///
/// # Errors
///
/// Returns [`ExtractError::MissingStartMarker`] or
/// [`ExtractError::MissingEndMarker`] if a marker is absent, and
/// [`ExtractError::TruncatedTable`] if the image does not hold the whole
/// table.
pub fn extract(image: &[u8], markers: &Markers) -> Result<ExtractedTable, ExtractError> {
    let start = rfind(image, &markers.start)
        .ok_or_else(|| ExtractError::MissingStartMarker(marker_text(&markers.start)))?
        + markers.start.len();
    let body = &image[start..];
    let scanned_len = rfind(body, &markers.end)
        .ok_or_else(|| ExtractError::MissingEndMarker(marker_text(&markers.end)))?;
    debug!("table region at {start:#x}, {scanned_len} bytes between markers");

    let mut header = SdtHeader::read_from_bytes(body).ok_or(ExtractError::TruncatedTable {
        declared: SdtHeader::SIZE,
        available: body.len(),
    })?;
    let declared = header.length() as usize;
    if declared != scanned_len {
        warn!(
            "Table size mismatch: table size in header {declared}, actual size {scanned_len}"
        );
    }

    let truncated = ExtractError::TruncatedTable {
        declared,
        available: body.len(),
    };
    if declared < SdtHeader::SIZE {
        return Err(truncated);
    }
    let mut bytes = body.get(..declared).ok_or(truncated)?.to_vec();

    if header.signature() == NO_CHECKSUM_SIGNATURE {
        debug!("{} carries no checksum, copied verbatim", header.signature_str());
    } else if let Some(checksum) = sdt::update_checksum(&mut bytes) {
        debug!("checksum {:#04x} -> {checksum:#04x}", header.checksum);
        header.checksum = checksum;
    }

    Ok(ExtractedTable {
        header,
        bytes,
        scanned_len,
    })
}

/// Decides where an extracted table is written.
///
/// With no request the default file name is used in the current directory;
/// an existing directory receives the default file name; anything else is
/// taken as the file path.
#[must_use]
pub fn output_path(requested: Option<&Path>, table: &ExtractedTable) -> PathBuf {
    match requested {
        None => PathBuf::from(table.default_file_name()),
        Some(dir) if dir.is_dir() => dir.join(table.default_file_name()),
        Some(path) => path.to_path_buf(),
    }
}

/// Offset of the last occurrence of `needle` in `haystack`.
fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|window| window == needle)
}

fn marker_text(marker: &[u8]) -> String {
    String::from_utf8_lossy(marker).into_owned()
}
