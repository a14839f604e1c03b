//! # ptrwatch-core
//!
//! Core library for the ptrwatch driver-pointer monitor.
//!
//! ptrwatch repeatedly resolves the data pointer a music or script driver
//! keeps inside an emulated system's memory image, classifies each change
//! of that pointer as a kind of step, and prints the bytes the pointer
//! passed over. It is a reverse-engineering aid: watching how an unknown
//! driver consumes its sequence data is often the fastest way to learn the
//! command format.
//!
//! This crate provides:
//! - Memory access over raw image files ([`FileSource`], [`Snapshot`])
//! - Address resolvers for common pointer layouts ([`Resolver`])
//! - Step classification ([`classify`], [`StepKind`])
//! - Hex rendering with end-pattern truncation ([`HexRenderer`])
//! - The fixed-frequency polling loop ([`Monitor`])
//! - Profile persistence ([`Profile`])

pub mod error;
pub mod memory;
pub mod monitor;
pub mod profile;
pub mod render;
pub mod resolver;
pub mod step;

pub use error::{Error, Result};
pub use memory::{Endian, FileSource, ReadMemory, Snapshot};
pub use monitor::{Monitor, MonitorConfig};
pub use profile::{Profile, load_profile, save_profile};
pub use render::{EndPattern, HexRenderer, RenderResult, RenderStyle, parse_patterns};
pub use resolver::{
    CombineMode, HiLoResolver, OrderTableResolver, PointerWidth, Resolved, Resolver, ResolverKind,
    TableResolver, WordResolver,
};
pub use step::{Step, StepKind, classify};
