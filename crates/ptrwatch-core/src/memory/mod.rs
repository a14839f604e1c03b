//! Memory access over raw process/emulator images.
//!
//! Two accessors are normally alive at once over the same underlying image:
//! a "code" accessor for the driver's own variables (re-read every tick) and
//! a "data" accessor for the sequence data the driver consumes (usually
//! wrapped in a [`Snapshot`] and refreshed only on demand). The two may use
//! different base offsets into the same file.

mod file;
mod snapshot;

pub use file::FileSource;
pub use snapshot::Snapshot;

use crate::error::Result;

/// Byte order for multi-byte reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// Read access to a memory image. Addresses are target-domain addresses,
/// relative to the per-accessor base established at construction.
pub trait ReadMemory {
    /// Read `len` bytes starting at `address`. Fails with
    /// [`Error::ShortRead`](crate::Error::ShortRead) when fewer bytes are
    /// available and [`Error::Io`](crate::Error::Io) on a hard read failure.
    fn read_bytes(&self, address: u64, len: usize) -> Result<Vec<u8>>;

    fn read_u8(&self, address: u64) -> Result<u8> {
        let bytes = self.read_bytes(address, 1)?;
        Ok(bytes[0])
    }

    fn read_u16(&self, address: u64, endian: Endian) -> Result<u16> {
        let bytes = self.read_bytes(address, 2)?;
        let raw = [bytes[0], bytes[1]];
        Ok(match endian {
            Endian::Little => u16::from_le_bytes(raw),
            Endian::Big => u16::from_be_bytes(raw),
        })
    }

    fn read_u32(&self, address: u64, endian: Endian) -> Result<u32> {
        let bytes = self.read_bytes(address, 4)?;
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        Ok(match endian {
            Endian::Little => u32::from_le_bytes(raw),
            Endian::Big => u32::from_be_bytes(raw),
        })
    }

    /// Read a "vertical" word whose low and high bytes live at two separate
    /// addresses (parallel low/high arrays in a pointer table).
    fn read_split_u16(&self, lo_address: u64, hi_address: u64) -> Result<u16> {
        let lo = self.read_u8(lo_address)?;
        let hi = self.read_u8(hi_address)?;
        Ok((u16::from(hi) << 8) | u16::from(lo))
    }
}
