use crate::error::{Error, Result};
use crate::memory::ReadMemory;

/// An owned byte buffer captured from another memory source.
///
/// The data segment is read through a snapshot so that per-tick rendering
/// never touches the underlying image; stale bytes are tolerated until the
/// caller decides to [`refresh`](Snapshot::refresh) (typically on a jump,
/// when `--update-mem` is enabled).
pub struct Snapshot {
    base: u64,
    bytes: Vec<u8>,
}

impl Snapshot {
    /// Capture `len` bytes starting at target address `base` from `source`.
    pub fn capture<R: ReadMemory>(source: &R, base: u64, len: usize) -> Result<Self> {
        let bytes = source.read_bytes(base, len)?;
        Ok(Self { base, bytes })
    }

    /// Wrap an existing buffer. The first byte is target address `base`.
    pub fn from_bytes(base: u64, bytes: Vec<u8>) -> Self {
        Self { base, bytes }
    }

    /// Re-capture the same range from `source`.
    pub fn refresh<R: ReadMemory>(&mut self, source: &R) -> Result<()> {
        self.bytes = source.read_bytes(self.base, self.bytes.len())?;
        Ok(())
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Like [`ReadMemory::read_bytes`] but clamped to the captured range:
    /// a range running off the end of the snapshot yields the bytes that
    /// are there instead of failing. Out-of-range starts yield nothing.
    pub fn read_available(&self, address: u64, len: usize) -> &[u8] {
        let Some(rel) = address.checked_sub(self.base) else {
            return &[];
        };
        let start = rel as usize;
        if start >= self.bytes.len() {
            return &[];
        }
        let end = start.saturating_add(len).min(self.bytes.len());
        &self.bytes[start..end]
    }
}

impl ReadMemory for Snapshot {
    fn read_bytes(&self, address: u64, len: usize) -> Result<Vec<u8>> {
        if len == 0 {
            return Err(Error::EmptyRead { address });
        }
        let available = self.read_available(address, len);
        if available.len() < len {
            return Err(Error::ShortRead {
                address,
                requested: len,
                available: available.len(),
            });
        }
        Ok(available.to_vec())
    }
}
