use crate::error::Result;
use crate::memory::{Endian, ReadMemory};
use crate::resolver::Resolved;
use crate::resolver::settings::{Fields, FlagSet};

/// Fetch one pointer-table entry at `table + index`.
///
/// Layouts, in priority order:
/// - nonzero `stride`: vertical table, low byte at `table + index` and high
///   byte at `table + index + stride` (swapped when `high_first`);
/// - `direct`: the index is already a byte offset into the table, entry is
///   the LE word at `table + index`;
/// - otherwise the index is an element number, entry is the LE word at
///   `table + index * 2`.
pub(crate) fn read_table_entry<R: ReadMemory>(
    mem: &R,
    table: u64,
    index: u64,
    stride: Option<u64>,
    high_first: bool,
    direct: bool,
) -> Result<u64> {
    if let Some(stride) = stride {
        let first = table + index;
        let second = first + stride;
        let (lo, hi) = if high_first {
            (second, first)
        } else {
            (first, second)
        };
        return Ok(u64::from(mem.read_split_u16(lo, hi)?));
    }
    let entry_addr = if direct { table + index } else { table + index * 2 };
    Ok(u64::from(mem.read_u16(entry_addr, Endian::Little)?))
}

/// `table[index] + offset` resolver.
///
/// Common with C64-style drivers: instead of a direct play pointer, the
/// data is organized as a table of block pointers, and the driver keeps an
/// index into the table plus an offset inside the current block.
///
/// Settings: `TABLE:INDEX_PTR:OFFSET_PTR[:FLAGS[:STRIDE]]`.
/// Flags: `w` index is a word, `W` offset is a word, `d` index is a byte
/// offset into the table, `o` print the final address in the info field,
/// `h` vertical table stores the high byte first.
#[derive(Debug, Clone)]
pub struct TableResolver {
    table_ptr: u64,
    index_ptr: u64,
    offset_ptr: u64,
    index_is_word: bool,
    offset_is_word: bool,
    index_is_pointer: bool,
    print_final: bool,
    high_first: bool,
    stride: Option<u64>,
}

impl TableResolver {
    pub fn from_settings(settings: &str) -> Result<Self> {
        let mut fields = Fields::new("table", settings);
        let table_ptr = fields.required_int("table pointer")?;
        let index_ptr = fields.required_int("index pointer")?;
        let offset_ptr = fields.required_int("offset pointer")?;
        let flags = FlagSet::parse("table", fields.optional(), "wWdoh")?;
        let stride = fields.optional_int()?.filter(|&s| s != 0);
        fields.finish()?;

        Ok(Self {
            table_ptr,
            index_ptr,
            offset_ptr,
            index_is_word: flags.has('w'),
            offset_is_word: flags.has('W'),
            index_is_pointer: flags.has('d'),
            print_final: flags.has('o'),
            high_first: flags.has('h'),
            stride,
        })
    }

    pub fn resolve<R: ReadMemory>(&self, mem: &R) -> Result<Resolved> {
        let index = if self.index_is_word {
            u64::from(mem.read_u16(self.index_ptr, Endian::Little)?)
        } else {
            u64::from(mem.read_u8(self.index_ptr)?)
        };

        let entry = read_table_entry(
            mem,
            self.table_ptr,
            index,
            self.stride,
            self.high_first,
            self.index_is_pointer,
        )?;

        let offset = if self.offset_is_word {
            u64::from(mem.read_u16(self.offset_ptr, Endian::Little)?)
        } else {
            u64::from(mem.read_u8(self.offset_ptr)?)
        };

        let address = entry + offset;
        let info = if self.print_final {
            format!("{index:02X},{offset:02X}:{address:04X}")
        } else {
            format!("{index:02X},{entry:04X}+{offset:02X}")
        };

        Ok(Resolved { address, info })
    }
}
