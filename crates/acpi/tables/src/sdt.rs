//! System Description Table (SDT) header and checksum utilities.

/// Standard ACPI System Description Table header.
///
/// This 36-byte header is present at the start of every ACPI table except
/// the FACS. All multi-byte fields are little-endian on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdtHeader {
    /// 4-byte ASCII signature identifying the table type.
    pub signature: [u8; 4],
    /// Total length of the table, including the header, in bytes.
    pub length: u32,
    /// Revision of the table structure.
    pub revision: u8,
    /// Checksum byte. The entire table, including the header, must sum to zero.
    pub checksum: u8,
    /// OEM-supplied identification string.
    pub oem_id: [u8; 6],
    /// OEM-supplied table identification string.
    pub oem_table_id: [u8; 8],
    /// OEM-supplied revision number.
    pub oem_revision: u32,
    /// Vendor ID of the utility that created the table.
    pub creator_id: u32,
    /// Revision of the utility that created the table.
    pub creator_revision: u32,
}

impl SdtHeader {
    /// The size of an SDT header in bytes.
    pub const SIZE: usize = 36;

    /// Offset of the `length` field.
    pub const LENGTH_OFFSET: usize = 4;

    /// Offset of the `checksum` byte.
    pub const CHECKSUM_OFFSET: usize = 9;

    /// Read an [`SdtHeader`] from a byte slice.
    ///
    /// Returns `None` if the slice is shorter than [`SdtHeader::SIZE`] bytes.
    #[must_use]
    pub fn read_from_bytes(data: &[u8]) -> Option<Self> {
        let data: &[u8; Self::SIZE] = data.get(..Self::SIZE)?.try_into().ok()?;
        let u32_at =
            |at: usize| u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);

        let mut signature = [0; 4];
        signature.copy_from_slice(&data[0..4]);
        let mut oem_id = [0; 6];
        oem_id.copy_from_slice(&data[10..16]);
        let mut oem_table_id = [0; 8];
        oem_table_id.copy_from_slice(&data[16..24]);

        Some(Self {
            signature,
            length: u32_at(Self::LENGTH_OFFSET),
            revision: data[8],
            checksum: data[Self::CHECKSUM_OFFSET],
            oem_id,
            oem_table_id,
            oem_revision: u32_at(24),
            creator_id: u32_at(28),
            creator_revision: u32_at(32),
        })
    }

    /// Serializes the header into its 36-byte wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.signature);
        out[4..8].copy_from_slice(&self.length.to_le_bytes());
        out[8] = self.revision;
        out[9] = self.checksum;
        out[10..16].copy_from_slice(&self.oem_id);
        out[16..24].copy_from_slice(&self.oem_table_id);
        out[24..28].copy_from_slice(&self.oem_revision.to_le_bytes());
        out[28..32].copy_from_slice(&self.creator_id.to_le_bytes());
        out[32..36].copy_from_slice(&self.creator_revision.to_le_bytes());
        out
    }

    /// Returns the 4-byte signature.
    #[must_use]
    pub fn signature(&self) -> [u8; 4] {
        self.signature
    }

    /// Returns the signature as text, replacing non-ASCII bytes.
    #[must_use]
    pub fn signature_str(&self) -> String {
        String::from_utf8_lossy(&self.signature).into_owned()
    }

    /// Returns the total length of this table (header included).
    #[must_use]
    pub fn length(&self) -> u32 {
        self.length
    }
}

/// Computes the checksum byte that makes `data` sum to zero.
///
/// The checksum field itself must be zero in `data` for the result to be
/// usable directly.
#[must_use]
pub fn checksum(data: &[u8]) -> u8 {
    0u8.wrapping_sub(data.iter().fold(0u8, |sum, &b| sum.wrapping_add(b)))
}

/// Validate the checksum of a byte slice.
///
/// ACPI tables are designed so that the sum of all bytes in the table equals
/// zero (mod 256). This function computes that sum and returns `true` when
/// the checksum is valid.
#[must_use]
pub fn validate_checksum(data: &[u8]) -> bool {
    let mut sum: u8 = 0;
    for &byte in data {
        sum = sum.wrapping_add(byte);
    }
    sum == 0
}

/// Recomputes the header checksum of a complete table in place.
///
/// Returns the new checksum, or `None` if `table` is too short to hold the
/// checksum byte.
pub fn update_checksum(table: &mut [u8]) -> Option<u8> {
    *table.get_mut(SdtHeader::CHECKSUM_OFFSET)? = 0;
    let sum = checksum(table);
    table[SdtHeader::CHECKSUM_OFFSET] = sum;
    Some(sum)
}

/// Writes `table.len()` into the header length field, then recomputes the
/// checksum.
///
/// Returns `None` if `table` is shorter than a header or longer than the
/// length field can express.
pub fn finalize(table: &mut [u8]) -> Option<u8> {
    if table.len() < SdtHeader::SIZE {
        return None;
    }
    let length = u32::try_from(table.len()).ok()?;
    table[SdtHeader::LENGTH_OFFSET..SdtHeader::LENGTH_OFFSET + 4]
        .copy_from_slice(&length.to_le_bytes());
    update_checksum(table)
}
