use crate::error::Result;
use crate::memory::ReadMemory;
use crate::resolver::Resolved;
use crate::resolver::settings::{Fields, FlagSet};

/// How the low byte and the offset byte combine.
///
/// Drivers that split the play pointer across two zero-page cells disagree
/// about the offset rule. The plain sum matches most targets; the
/// conditional rule (add when the low byte dominates, otherwise the offset
/// minus the low byte) mirrors a subtractive-index convention seen in older
/// drivers. Neither is the documented "correct" one, so both stay selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombineMode {
    #[default]
    Add,
    Conditional,
}

/// Split-byte pointer resolver: the 16-bit pointer lives as separate high
/// and low bytes at two unrelated addresses.
///
/// Settings: `HI_PTR:LO_PTR[:FLAGS[:OFFSET_PTR]]`, flag `c` = conditional
/// low/offset combination.
#[derive(Debug, Clone)]
pub struct HiLoResolver {
    hi_ptr: u64,
    lo_ptr: u64,
    offset_ptr: Option<u64>,
    combine: CombineMode,
}

impl HiLoResolver {
    pub fn from_settings(settings: &str) -> Result<Self> {
        let mut fields = Fields::new("hilo", settings);
        let hi_ptr = fields.required_int("high pointer")?;
        let lo_ptr = fields.required_int("low pointer")?;
        let flags = FlagSet::parse("hilo", fields.optional(), "c")?;
        let offset_ptr = fields.optional_int()?;
        fields.finish()?;

        Ok(Self {
            hi_ptr,
            lo_ptr,
            offset_ptr,
            combine: if flags.has('c') {
                CombineMode::Conditional
            } else {
                CombineMode::Add
            },
        })
    }

    pub fn resolve<R: ReadMemory>(&self, mem: &R) -> Result<Resolved> {
        let hi = mem.read_u8(self.hi_ptr)?;
        let lo = mem.read_u8(self.lo_ptr)?;

        let (low_part, info) = match self.offset_ptr {
            None => (u64::from(lo), format!("{hi:02X}{lo:02X}")),
            Some(ptr) => {
                let offset = mem.read_u8(ptr)?;
                let combined = match self.combine {
                    CombineMode::Add => u64::from(lo) + u64::from(offset),
                    CombineMode::Conditional => {
                        if lo > offset {
                            u64::from(lo) + u64::from(offset)
                        } else {
                            u64::from(offset) - u64::from(lo)
                        }
                    }
                };
                (combined, format!("{hi:02X}{lo:02X}+{offset:02X}"))
            }
        };

        Ok(Resolved {
            address: (u64::from(hi) << 8) + low_part,
            info,
        })
    }
}
