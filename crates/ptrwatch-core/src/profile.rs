//! Named monitor profiles.
//!
//! A profile captures everything needed to re-attach to a known target:
//! the resolver hypothesis, bases into the memory image, and the loop
//! tuning. Profiles persist *configuration*, never findings.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::monitor::MonitorConfig;
use crate::resolver::ResolverKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub method: ResolverKind,
    pub settings: String,
    /// File offset of the target's address 0 for the code segment.
    pub code_base: u64,
    /// Data segment base; the code base when absent.
    #[serde(default)]
    pub data_base: Option<u64>,
    #[serde(default)]
    pub shift: i64,
    #[serde(default = "default_jump_threshold")]
    pub jump_threshold: i64,
    #[serde(default = "default_preview")]
    pub preview: usize,
    #[serde(default)]
    pub end_patterns: Vec<String>,
    #[serde(default)]
    pub look_behind: bool,
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default)]
    pub update_mem: bool,
    #[serde(default = "default_frequency")]
    pub frequency: u32,
    #[serde(default = "default_snapshot_len")]
    pub snapshot_len: usize,
}

fn default_jump_threshold() -> i64 {
    0x10
}

fn default_preview() -> usize {
    4
}

fn default_width() -> usize {
    0x40
}

fn default_frequency() -> u32 {
    120
}

fn default_snapshot_len() -> usize {
    0x10000
}

impl Profile {
    pub fn monitor_config(&self, decorate: bool) -> MonitorConfig {
        MonitorConfig {
            shift: self.shift,
            jump_threshold: self.jump_threshold,
            preview: self.preview,
            look_behind: self.look_behind,
            update_mem: self.update_mem,
            frequency: self.frequency,
            width: self.width,
            decorate,
        }
    }
}

pub fn load_profile<P: AsRef<Path>>(path: P) -> Result<Profile> {
    let content = fs::read_to_string(&path)?;
    let profile = serde_json::from_str(&content)?;
    Ok(profile)
}

pub fn save_profile<P: AsRef<Path>>(path: P, profile: &Profile) -> Result<()> {
    let content = serde_json::to_string_pretty(profile)?;
    fs::write(path, content)?;
    Ok(())
}
