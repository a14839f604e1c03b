use crate::error::Result;
use crate::memory::{Endian, ReadMemory};
use crate::resolver::Resolved;
use crate::resolver::settings::{Fields, FlagSet};

/// Pointer width for the direct-pointer resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerWidth {
    Word,
    Dword,
}

/// Direct pointer resolver: the driver keeps the play position as a single
/// 16- or 32-bit pointer, optionally advanced by a one-byte index stored
/// elsewhere.
///
/// Settings: `POINTER[:FLAGS[:OFFSET_PTR]]`, flag `b` = big endian.
#[derive(Debug, Clone)]
pub struct WordResolver {
    base_ptr: u64,
    offset_ptr: Option<u64>,
    endian: Endian,
    width: PointerWidth,
}

impl WordResolver {
    pub fn from_settings(width: PointerWidth, settings: &str) -> Result<Self> {
        let kind = match width {
            PointerWidth::Word => "word",
            PointerWidth::Dword => "dword",
        };
        let mut fields = Fields::new(kind, settings);
        let base_ptr = fields.required_int("pointer")?;
        let flags = FlagSet::parse(kind, fields.optional(), "b")?;
        let offset_ptr = fields.optional_int()?;
        fields.finish()?;

        Ok(Self {
            base_ptr,
            offset_ptr,
            endian: if flags.has('b') {
                Endian::Big
            } else {
                Endian::Little
            },
            width,
        })
    }

    pub fn resolve<R: ReadMemory>(&self, mem: &R) -> Result<Resolved> {
        let base = match self.width {
            PointerWidth::Word => u64::from(mem.read_u16(self.base_ptr, self.endian)?),
            PointerWidth::Dword => u64::from(mem.read_u32(self.base_ptr, self.endian)?),
        };

        let (address, info) = match self.offset_ptr {
            Some(ptr) => {
                let offset = u64::from(mem.read_u8(ptr)?);
                let info = match self.width {
                    PointerWidth::Word => format!("{base:04X}+{offset:02X}"),
                    PointerWidth::Dword => format!("{base:08X}+{offset:02X}"),
                };
                (base + offset, info)
            }
            None => {
                let info = match self.width {
                    PointerWidth::Word => format!("{base:04X}"),
                    PointerWidth::Dword => format!("{base:08X}"),
                };
                (base, info)
            }
        };

        Ok(Resolved { address, info })
    }
}
