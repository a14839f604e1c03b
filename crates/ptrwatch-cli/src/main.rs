use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use ptrwatch_core::{
    FileSource, Monitor, Profile, Resolver, ResolverKind, Snapshot, load_profile, parse_patterns,
    save_profile,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod term;

fn resolver_help() -> String {
    let mut help = String::from("Resolver settings syntax:\n");
    for kind in [
        ResolverKind::Word,
        ResolverKind::Dword,
        ResolverKind::HiLo,
        ResolverKind::Table,
        ResolverKind::Order,
    ] {
        help.push_str(&format!("  {kind}: {}\n", kind.syntax()));
    }
    help.push_str("\nExample: ptrwatch /proc/1234/mem 0x7f0000000000 0x66ec:0xef:0xf3:d -M table");
    help
}

/// Dereference and monitor a RAM pointer for changes, then format the
/// bytes it consumed.
#[derive(Parser)]
#[command(name = "ptrwatch", version, about, after_help = resolver_help())]
struct Args {
    /// Memory image to read (e.g. /proc/PID/mem or an emulator save state)
    file: PathBuf,

    /// File offset of the target's internal address 0
    #[arg(value_parser = parse_u64)]
    ram_ptr: Option<u64>,

    /// Colon-delimited settings for the resolver
    settings: Option<String>,

    /// Pointer resolution method
    #[arg(short = 'M', long, default_value = "word")]
    method: String,

    /// Global offset applied to every resolved pointer
    #[arg(short = 'e', long, default_value = "0", value_parser = parse_i64, allow_hyphen_values = true)]
    shift: i64,

    /// Read the data segment from this file offset instead of RAM_PTR
    #[arg(short = 'r', long, value_parser = parse_u64)]
    data_ptr: Option<u64>,

    /// Forward steps above this threshold count as jumps
    #[arg(short = 'j', long, default_value = "0x10", value_parser = parse_i64)]
    jump_threshold: i64,

    /// Explore this many bytes when the step size is unknown
    #[arg(short = 'l', long, default_value = "4", value_parser = parse_usize)]
    preview: usize,

    /// Track-end byte pattern (hex tokens, `??` wildcard); repeatable
    #[arg(short = 'E', long = "end-pattern")]
    end_pattern: Vec<String>,

    /// After a jump, also print the bytes just before the new pointer
    #[arg(short = 'b', long)]
    look_behind: bool,

    /// Wrap hex output after this many bytes
    #[arg(short = 'w', long, default_value = "0x40", value_parser = parse_usize)]
    width: usize,

    /// Refresh the data snapshot on every jump
    #[arg(short = 'u', long)]
    update_mem: bool,

    /// Pointer sampling frequency in Hz
    #[arg(short = 'f', long, default_value = "120")]
    frequency: u32,

    /// Data segment snapshot size
    #[arg(short = 's', long, default_value = "0x10000", value_parser = parse_usize)]
    snapshot_len: usize,

    /// Load all monitor settings from a profile file
    #[arg(long, conflicts_with_all = ["ram_ptr", "settings"])]
    profile: Option<PathBuf>,

    /// Write the effective settings to a profile file and exit
    #[arg(long)]
    save_profile: Option<PathBuf>,

    /// Plain output: no colors, no in-place line rewriting
    #[arg(long)]
    no_color: bool,
}

fn parse_auto_base(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(oct) = s.strip_prefix("0o") {
        (oct, 8)
    } else if let Some(bin) = s.strip_prefix("0b") {
        (bin, 2)
    } else {
        (s, 10)
    };
    u64::from_str_radix(digits, radix).map_err(|e| format!("invalid number '{s}': {e}"))
}

fn parse_u64(s: &str) -> Result<u64, String> {
    parse_auto_base(s)
}

fn parse_usize(s: &str) -> Result<usize, String> {
    parse_auto_base(s).map(|v| v as usize)
}

fn parse_i64(s: &str) -> Result<i64, String> {
    if let Some(rest) = s.strip_prefix('-') {
        let value = parse_auto_base(rest)?;
        i64::try_from(value)
            .map(|v| -v)
            .map_err(|_| format!("number out of range: {s}"))
    } else {
        let value = parse_auto_base(s)?;
        i64::try_from(value).map_err(|_| format!("number out of range: {s}"))
    }
}

fn build_profile(args: &Args) -> Result<Profile> {
    if let Some(path) = &args.profile {
        let profile = load_profile(path)
            .with_context(|| format!("failed to load profile {}", path.display()))?;
        info!("Loaded profile '{}' from {}", profile.name, path.display());
        return Ok(profile);
    }

    let code_base = args
        .ram_ptr
        .context("RAM_PTR is required unless --profile is given")?;
    let settings = args
        .settings
        .clone()
        .context("SETTINGS is required unless --profile is given")?;
    let method = ResolverKind::from_str(&args.method)
        .map_err(|_| anyhow!("unknown resolve method '{}'", args.method))?;

    let name = args
        .file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_owned());

    Ok(Profile {
        name,
        method,
        settings,
        code_base,
        data_base: args.data_ptr,
        shift: args.shift,
        jump_threshold: args.jump_threshold,
        preview: args.preview,
        end_patterns: args.end_pattern.clone(),
        look_behind: args.look_behind,
        width: args.width,
        update_mem: args.update_mem,
        frequency: args.frequency,
        snapshot_len: args.snapshot_len,
    })
}

fn banner(profile: &Profile, decorate: bool) -> Result<()> {
    let width = if decorate {
        crossterm::terminal::size()
            .map(|(cols, _)| usize::from(cols))
            .unwrap_or(60)
    } else {
        60
    };

    let mut out = io::stdout();
    writeln!(out, "RAM:  {:x}", profile.code_base)?;
    writeln!(
        out,
        "ROM:  {:x}",
        profile.data_base.unwrap_or(profile.code_base)
    )?;
    writeln!(
        out,
        "{}: {}",
        profile.method.to_string().to_uppercase(),
        profile.settings
    )?;
    writeln!(out, "{}", "═".repeat(width))?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ptrwatch=info".parse()?))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let profile = build_profile(&args)?;

    if let Some(path) = &args.save_profile {
        save_profile(path, &profile)
            .with_context(|| format!("failed to save profile {}", path.display()))?;
        info!("Saved profile '{}' to {}", profile.name, path.display());
        return Ok(());
    }

    // Fail on configuration before touching the terminal.
    let resolver = Resolver::from_settings(profile.method, &profile.settings)?;
    let patterns = parse_patterns(&profile.end_patterns)?;

    let data_base = profile.data_base.unwrap_or(profile.code_base);
    let code = FileSource::open(&args.file, profile.code_base)
        .with_context(|| format!("failed to open {}", args.file.display()))?;
    let data_source = FileSource::open(&args.file, data_base)?;

    // Clamp the snapshot to what the image actually holds; short images
    // are common with small save states.
    let image_len = std::fs::metadata(&args.file)?.len();
    let available = image_len.saturating_sub(data_base) as usize;
    let snapshot_len = profile.snapshot_len.min(available);
    if snapshot_len == 0 {
        bail!(
            "data base {:#x} is past the end of {} ({} bytes)",
            data_base,
            args.file.display(),
            image_len
        );
    }
    let mut data = Snapshot::capture(&data_source, 0, snapshot_len)?;
    debug!(snapshot_len, "captured data snapshot");

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))?;

    let decorate = !args.no_color && io::stdout().is_terminal();
    let guard = if decorate {
        Some(term::TerminalGuard::setup()?)
    } else {
        None
    };

    banner(&profile, decorate)?;

    let monitor = Monitor::new(profile.monitor_config(decorate), patterns);
    let result = monitor.run(
        &resolver,
        &code,
        &data_source,
        &mut data,
        &mut io::stdout().lock(),
        &shutdown,
    );

    // Restore the terminal before reporting any loop error.
    drop(guard);
    result.context("monitor loop failed")?;
    info!("Shutdown complete");
    Ok(())
}
