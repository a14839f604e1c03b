//! Address resolvers.
//!
//! A resolver decodes the driver's current data pointer out of raw memory
//! according to one of several layout conventions. Which convention applies
//! is the user's hypothesis about the target; the resolver is picked once
//! from configuration and never re-selected at runtime.

mod hilo;
mod order;
mod settings;
mod table;
mod word;

pub use hilo::{CombineMode, HiLoResolver};
pub use order::OrderTableResolver;
pub use table::TableResolver;
pub use word::{PointerWidth, WordResolver};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use crate::error::Result;
use crate::memory::ReadMemory;

/// Selector for the resolver variant, as it appears on the command line
/// and in saved profiles.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    Word,
    Dword,
    HiLo,
    Table,
    Order,
}

impl ResolverKind {
    /// One-line settings syntax, for CLI help output.
    pub fn syntax(self) -> &'static str {
        match self {
            ResolverKind::Word => "POINTER[:FLAGS[:OFFSET_PTR]] (flags: b = big endian)",
            ResolverKind::Dword => "POINTER[:FLAGS[:OFFSET_PTR]] (flags: b = big endian)",
            ResolverKind::HiLo => {
                "HI_PTR:LO_PTR[:FLAGS[:OFFSET_PTR]] (flags: c = conditional offset combine)"
            }
            ResolverKind::Table => {
                "TABLE:INDEX_PTR:OFFSET_PTR[:FLAGS[:STRIDE]] \
                 (flags: w/W = word index/offset, d = index is pointer, \
                 o = print final address, h = high byte first)"
            }
            ResolverKind::Order => {
                "ORDER_TABLE:DATA_TABLE:ORDER_INDEX_PTR:OFFSET_PTR[:FLAGS[:STRIDE]] \
                 (flags: W = word offset, o = print final address, h = high byte first)"
            }
        }
    }
}

/// The outcome of one resolution pass: the decoded address plus a short
/// description of the inputs that produced it.
///
/// The description is returned alongside the address rather than kept in
/// the resolver, so the caller decides when to capture it. The monitor
/// prints post-factum: the info for tick N must be held until tick N+1's
/// address is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub address: u64,
    pub info: String,
}

/// A configured resolver strategy. Immutable after construction.
#[derive(Debug, Clone)]
pub enum Resolver {
    Word(WordResolver),
    Dword(WordResolver),
    HiLo(HiLoResolver),
    Table(TableResolver),
    Order(OrderTableResolver),
}

impl Resolver {
    /// Build a resolver from its kind and colon-delimited settings string.
    /// Malformed settings fail here, before any polling starts; no partial
    /// resolver is ever constructed.
    pub fn from_settings(kind: ResolverKind, settings: &str) -> Result<Self> {
        debug!(%kind, settings, "building resolver");
        match kind {
            ResolverKind::Word => Ok(Self::Word(WordResolver::from_settings(
                PointerWidth::Word,
                settings,
            )?)),
            ResolverKind::Dword => Ok(Self::Dword(WordResolver::from_settings(
                PointerWidth::Dword,
                settings,
            )?)),
            ResolverKind::HiLo => Ok(Self::HiLo(HiLoResolver::from_settings(settings)?)),
            ResolverKind::Table => Ok(Self::Table(TableResolver::from_settings(settings)?)),
            ResolverKind::Order => Ok(Self::Order(OrderTableResolver::from_settings(settings)?)),
        }
    }

    pub fn kind(&self) -> ResolverKind {
        match self {
            Self::Word(_) => ResolverKind::Word,
            Self::Dword(_) => ResolverKind::Dword,
            Self::HiLo(_) => ResolverKind::HiLo,
            Self::Table(_) => ResolverKind::Table,
            Self::Order(_) => ResolverKind::Order,
        }
    }

    /// Decode the current address from the code segment.
    pub fn resolve<R: ReadMemory>(&self, code: &R) -> Result<Resolved> {
        match self {
            Self::Word(r) | Self::Dword(r) => r.resolve(code),
            Self::HiLo(r) => r.resolve(code),
            Self::Table(r) => r.resolve(code),
            Self::Order(r) => r.resolve(code),
        }
    }
}
