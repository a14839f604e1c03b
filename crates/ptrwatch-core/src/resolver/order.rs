use crate::error::Result;
use crate::memory::{Endian, ReadMemory};
use crate::resolver::Resolved;
use crate::resolver::settings::{Fields, FlagSet};
use crate::resolver::table::read_table_entry;

/// `data_table[order_table[order_index]] + offset` resolver.
///
/// Tracker-style drivers keep a song as an order list of pattern numbers:
/// the order index selects a pattern, the pattern number selects a data
/// pointer, and the driver keeps an offset inside that pattern.
///
/// Settings: `ORDER_TABLE:DATA_TABLE:ORDER_INDEX_PTR:OFFSET_PTR[:FLAGS[:STRIDE]]`.
/// Flags: `W` offset is a word, `o` append the final address to the info
/// field, `h` vertical data table stores the high byte first.
#[derive(Debug, Clone)]
pub struct OrderTableResolver {
    order_table_ptr: u64,
    data_table_ptr: u64,
    order_index_ptr: u64,
    offset_ptr: u64,
    offset_is_word: bool,
    print_final: bool,
    high_first: bool,
    stride: Option<u64>,
}

impl OrderTableResolver {
    pub fn from_settings(settings: &str) -> Result<Self> {
        let mut fields = Fields::new("order", settings);
        let order_table_ptr = fields.required_int("order table")?;
        let data_table_ptr = fields.required_int("data table")?;
        let order_index_ptr = fields.required_int("order index pointer")?;
        let offset_ptr = fields.required_int("offset pointer")?;
        let flags = FlagSet::parse("order", fields.optional(), "Woh")?;
        let stride = fields.optional_int()?.filter(|&s| s != 0);
        fields.finish()?;

        Ok(Self {
            order_table_ptr,
            data_table_ptr,
            order_index_ptr,
            offset_ptr,
            offset_is_word: flags.has('W'),
            print_final: flags.has('o'),
            high_first: flags.has('h'),
            stride,
        })
    }

    pub fn resolve<R: ReadMemory>(&self, mem: &R) -> Result<Resolved> {
        let order_index = mem.read_u8(self.order_index_ptr)?;
        let pattern = mem.read_u8(self.order_table_ptr + u64::from(order_index))?;

        let entry = read_table_entry(
            mem,
            self.data_table_ptr,
            u64::from(pattern),
            self.stride,
            self.high_first,
            false,
        )?;

        let offset = if self.offset_is_word {
            u64::from(mem.read_u16(self.offset_ptr, Endian::Little)?)
        } else {
            u64::from(mem.read_u8(self.offset_ptr)?)
        };

        let address = entry + offset;
        let mut info = format!("{order_index:02X}:{pattern:02X},{offset:02X}");
        if self.print_final {
            info.push_str(&format!(":{address:04X}"));
        }

        Ok(Resolved { address, info })
    }
}
