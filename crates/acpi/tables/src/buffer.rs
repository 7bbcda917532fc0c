//! Growable byte buffer with offset-addressed patching.

use crate::TableError;

/// Append-only table image.
///
/// Records are appended in emission order. Every append returns the offset
/// of its first byte so that later records can point back at it, and
/// [`patch`](Self::patch) rewrites bytes that were written as placeholders.
#[derive(Debug, Default)]
pub struct TableBuffer {
    data: Vec<u8>,
}

impl TableBuffer {
    /// Capacity reserved on the first append.
    pub const INITIAL_CAPACITY: usize = 4096;

    /// Creates an empty buffer. Nothing is allocated until the first append.
    #[must_use]
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Current length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends `bytes` and returns the offset they were written at.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::TableTooLarge`] if the result would not be
    /// addressable with 32-bit offsets, or [`TableError::OutOfMemory`] if
    /// the allocation fails.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u32, TableError> {
        let offset = self.reserve(bytes.len())?;
        self.data.extend_from_slice(bytes);
        Ok(offset)
    }

    /// Overwrites `bytes.len()` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::PatchOutOfBounds`] unless the whole range was
    /// already written.
    pub fn patch(&mut self, offset: u32, bytes: &[u8]) -> Result<(), TableError> {
        let start = offset as usize;
        let table_len = self.data.len();
        let target = start
            .checked_add(bytes.len())
            .and_then(|end| self.data.get_mut(start..end))
            .ok_or(TableError::PatchOutOfBounds {
                offset,
                len: bytes.len(),
                table_len,
            })?;
        target.copy_from_slice(bytes);
        Ok(())
    }

    /// Overwrites a little-endian `u32` at `offset`.
    ///
    /// # Errors
    ///
    /// Same as [`patch`](Self::patch).
    pub fn patch_u32(&mut self, offset: u32, value: u32) -> Result<(), TableError> {
        self.patch(offset, &value.to_le_bytes())
    }

    /// Returns the bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the bytes written so far, mutably.
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the buffer and returns the table image.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Makes room for `additional` bytes, doubling the capacity when it runs
    /// out. Returns the current length as a 32-bit offset.
    fn reserve(&mut self, additional: usize) -> Result<u32, TableError> {
        let offset = u32::try_from(self.data.len()).map_err(|_| TableError::TableTooLarge)?;
        let end = self
            .data
            .len()
            .checked_add(additional)
            .filter(|&end| u32::try_from(end).is_ok())
            .ok_or(TableError::TableTooLarge)?;

        if end > self.data.capacity() {
            let target = end
                .max(self.data.capacity().saturating_mul(2))
                .max(Self::INITIAL_CAPACITY);
            self.data
                .try_reserve_exact(target - self.data.len())
                .map_err(|_| TableError::OutOfMemory { requested: target })?;
        }
        Ok(offset)
    }
}
