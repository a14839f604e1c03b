//! The polling loop.
//!
//! Resolves the driver pointer at a fixed frequency, classifies each change
//! and prints the bytes the pointer passed over. Printing is post-factum:
//! a step is only understood once the *next* address is known, so the info
//! column always describes the previous resolution.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use owo_colors::OwoColorize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::{ReadMemory, Snapshot};
use crate::render::{EndPattern, HexRenderer, RenderStyle};
use crate::resolver::Resolver;
use crate::step::{StepKind, classify};

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Added to every resolved address before classification.
    pub shift: i64,
    /// Forward deltas above this count as jumps.
    pub jump_threshold: i64,
    /// Bytes to show when the step size is unknown (previews, jumps).
    pub preview: usize,
    /// After a jump, also show the bytes just behind the new address.
    pub look_behind: bool,
    /// Re-capture the data snapshot whenever a jump is detected.
    pub update_mem: bool,
    /// Sampling frequency in Hz.
    pub frequency: u32,
    /// Hex output wraps after this many bytes.
    pub width: usize,
    /// Colors and in-place line rewriting. Off for tests and pipes, where
    /// preview lines become ordinary newline-terminated output.
    pub decorate: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            shift: 0,
            jump_threshold: 0x10,
            preview: 4,
            look_behind: false,
            update_mem: false,
            frequency: 120,
            width: 0x40,
            decorate: true,
        }
    }
}

pub struct Monitor {
    config: MonitorConfig,
    renderer: HexRenderer,
}

impl Monitor {
    pub fn new(config: MonitorConfig, patterns: Vec<EndPattern>) -> Self {
        let style = RenderStyle {
            color: config.decorate,
        };
        let renderer = HexRenderer::new(config.width, patterns, style);
        Self { config, renderer }
    }

    /// Run until `shutdown` is set or a memory read fails.
    ///
    /// Pacing is drift-corrected: the deadline advances by exactly one
    /// period per sample (`deadline += period`, never `now + period`), and
    /// the wait is a yielding busy-loop so a change is picked up within a
    /// scheduler slice. When the address moved there is no wait at all;
    /// bursts of changes are processed back to back.
    pub fn run<C, S, W>(
        &self,
        resolver: &Resolver,
        code: &C,
        data_source: &S,
        data: &mut Snapshot,
        out: &mut W,
        shutdown: &AtomicBool,
    ) -> Result<()>
    where
        C: ReadMemory,
        S: ReadMemory,
        W: Write,
    {
        let hz = self.config.frequency.max(1);
        let period = Duration::from_secs_f64(1.0 / f64::from(hz));
        debug!(frequency = hz, "starting monitor loop");

        let resolved = resolver.resolve(code)?;
        let mut old_ptr = self.shifted(resolved.address)?;
        let mut old_info = resolved.info;
        // the info column plus 5 characters reserved for the signed delta
        let blanks = " ".repeat(old_info.len() + 5);

        self.emit_preview(&old_info, old_ptr, data, out)?;
        out.flush()?;

        let mut deadline = Instant::now();
        while !shutdown.load(Ordering::Relaxed) {
            let resolved = resolver.resolve(code)?;
            let ptr = self.shifted(resolved.address)?;
            let info = resolved.info;

            deadline += period;
            if ptr == old_ptr {
                while Instant::now() < deadline {
                    if shutdown.load(Ordering::Relaxed) {
                        return Ok(());
                    }
                    thread::yield_now();
                }
                continue;
            }

            let Some(step) = classify(old_ptr, ptr, self.config.jump_threshold) else {
                continue;
            };
            // a jump landing on address 0 is a reset: there is nothing
            // valid behind it to look at
            let kind = if step.kind.is_jump() && ptr == 0 {
                StepKind::Reset
            } else {
                step.kind
            };

            if kind.is_jump() && self.config.update_mem {
                data.refresh(data_source)?;
            }

            self.emit_change(&old_info, old_ptr, step.delta, kind, data, &blanks, out)?;

            if kind != StepKind::Reset && kind.is_jump() && self.config.look_behind {
                if let Some(start) = ptr.checked_sub(self.config.preview as u64) {
                    self.emit_lookup(start, data, &blanks, out)?;
                }
            }

            self.emit_preview(&info, ptr, data, out)?;
            out.flush()?;

            old_ptr = ptr;
            old_info = info;
        }

        Ok(())
    }

    fn shifted(&self, address: u64) -> Result<u64> {
        let shifted = address as i64 + self.config.shift;
        u64::try_from(shifted).map_err(|_| Error::AddressOutOfRange(shifted))
    }

    /// Print the rows for one classified change. The first row carries the
    /// previous tick's info and the delta; continuation rows are padded to
    /// the same column.
    fn emit_change<W: Write>(
        &self,
        old_info: &str,
        old_ptr: u64,
        delta: i64,
        kind: StepKind,
        data: &Snapshot,
        blanks: &str,
        out: &mut W,
    ) -> Result<()> {
        // a plain step consumed exactly `delta` bytes; a jump's extent is
        // unknown, show the preview window after the old position
        let len = if kind.is_jump() {
            self.config.preview
        } else {
            delta as usize
        };
        let bytes = data.read_available(old_ptr, len);
        let render = self.renderer.render(kind, bytes);

        if self.config.decorate {
            // erase the pending preview line
            write!(out, "\x1b[2K\r")?;
        }

        let head = self.head(old_info, delta);
        for (idx, row) in render.rows.iter().enumerate() {
            let lead = if idx == 0 { head.as_str() } else { blanks };
            writeln!(out, "{lead}│{}{row}{}", render.prefix, render.suffix)?;
        }
        Ok(())
    }

    /// Rows for the look-behind window just before the jump target.
    fn emit_lookup<W: Write>(
        &self,
        start: u64,
        data: &Snapshot,
        blanks: &str,
        out: &mut W,
    ) -> Result<()> {
        let bytes = data.read_available(start, self.config.preview);
        let render = self.renderer.render(StepKind::Lookup, bytes);
        for row in &render.rows {
            writeln!(out, "{blanks}│{}{row}{}", render.prefix, render.suffix)?;
        }
        Ok(())
    }

    /// The pending line showing bytes at the current position before the
    /// step size is known. Left unterminated in decorated mode so the next
    /// change overwrites it in place.
    fn emit_preview<W: Write>(
        &self,
        info: &str,
        ptr: u64,
        data: &Snapshot,
        out: &mut W,
    ) -> Result<()> {
        let bytes = data.read_available(ptr, self.config.preview);
        let render = self.renderer.render(StepKind::Preview, bytes);
        let row = render.rows.first().map(String::as_str).unwrap_or("");

        let label = format!("{info}   **");
        if self.config.decorate {
            write!(
                out,
                "{}│{}{row}{}",
                label.bright_black(),
                render.prefix,
                render.suffix
            )?;
        } else {
            writeln!(out, "{label}│{}{row}{}", render.prefix, render.suffix)?;
        }
        Ok(())
    }

    fn head(&self, old_info: &str, delta: i64) -> String {
        let delta = format_delta(delta);
        if self.config.decorate {
            format!("{}{}", old_info.yellow(), delta.bright_black())
        } else {
            format!("{old_info}{delta}")
        }
    }
}

/// Signed hex delta, right-aligned in 5 columns: `+2` becomes `"   +2"`,
/// `-0x36` becomes `"  -36"`.
fn format_delta(delta: i64) -> String {
    let signed = if delta < 0 {
        format!("-{:X}", delta.unsigned_abs())
    } else {
        format!("+{delta:X}")
    };
    format!("{signed:>5}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::parse_patterns;
    use crate::resolver::{Resolver, ResolverKind};

    fn monitor(config: MonitorConfig, patterns: &[&str]) -> Monitor {
        Monitor::new(config, parse_patterns(patterns).unwrap())
    }

    fn plain_config() -> MonitorConfig {
        MonitorConfig {
            decorate: false,
            preview: 4,
            width: 8,
            ..MonitorConfig::default()
        }
    }

    #[test]
    fn test_format_delta() {
        assert_eq!(format_delta(2), "   +2");
        assert_eq!(format_delta(-0x36), "  -36");
        assert_eq!(format_delta(0x1FF), " +1FF");
        assert_eq!(format_delta(-0xABCD), "-ABCD");
    }

    #[test]
    fn test_emit_forward_step_row() {
        let m = monitor(plain_config(), &[]);
        let mut bytes = vec![0u8; 0x10];
        bytes[4] = 0x0A;
        bytes[5] = 0x0B;
        let data = Snapshot::from_bytes(0x1230, bytes);

        let mut out = Vec::new();
        m.emit_change("1234", 0x1234, 2, StepKind::Forward, &data, "         ", &mut out)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1234   +2│• 0a 0b\n");
    }

    #[test]
    fn test_emit_jump_uses_preview_window_and_truncates() {
        let m = monitor(plain_config(), &["ff"]);
        let data = Snapshot::from_bytes(0x100, vec![0x01, 0xFF, 0x02, 0x03, 0x04]);

        let mut out = Vec::new();
        m.emit_change("0100", 0x100, 0x40, StepKind::ForwardJump, &data, "", &mut out)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0100  +40│► 01 ff~\n");
    }

    #[test]
    fn test_continuation_rows_align_under_blank_column() {
        let mut config = plain_config();
        config.width = 2;
        config.preview = 5;
        let m = monitor(config, &[]);
        let data = Snapshot::from_bytes(0, vec![0x10, 0x20, 0x30, 0x40, 0x50]);

        let mut out = Vec::new();
        m.emit_change("0000", 0, 0x40, StepKind::ForwardJump, &data, "  pad  ", &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "0000  +40│► 10 20");
        assert_eq!(lines[1], "  pad  │► 30 40");
        assert_eq!(lines[2], "  pad  │► 50");
    }

    #[test]
    fn test_lookup_rows() {
        let m = monitor(plain_config(), &[]);
        let data = Snapshot::from_bytes(0x200, vec![0xDE, 0xAD, 0xBE, 0xEF]);

        let mut out = Vec::new();
        m.emit_lookup(0x200, &data, "    ", &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "    │▲ de ad be ef\n");
    }

    #[test]
    fn test_preview_line_plain_mode() {
        let m = monitor(plain_config(), &[]);
        let data = Snapshot::from_bytes(0, vec![0xAA, 0xBB, 0xCC, 0xDD, 0xEE]);

        let mut out = Vec::new();
        m.emit_preview("1234", 1, &data, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1234   **│  bb cc dd ee\n");
    }

    #[test]
    fn test_shift_applies_and_guards_underflow() {
        let mut config = plain_config();
        config.shift = -0x100;
        let m = monitor(config, &[]);
        assert_eq!(m.shifted(0x1234).unwrap(), 0x1134);
        assert!(matches!(
            m.shifted(0x10),
            Err(Error::AddressOutOfRange(_))
        ));
    }

    #[test]
    fn test_run_stops_on_shutdown() {
        let m = monitor(plain_config(), &[]);
        let mut code = vec![0u8; 0x20];
        code[0x10] = 0x34;
        code[0x11] = 0x12;
        let code = Snapshot::from_bytes(0, code);
        let data_source = Snapshot::from_bytes(0, vec![0u8; 0x2000]);
        let mut data = Snapshot::from_bytes(0, vec![0u8; 0x2000]);
        let resolver = Resolver::from_settings(ResolverKind::Word, "0x10").unwrap();

        let shutdown = AtomicBool::new(true);
        let mut out = Vec::new();
        m.run(&resolver, &code, &data_source, &mut data, &mut out, &shutdown)
            .unwrap();

        // initial preview was emitted before the loop noticed the shutdown
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("1234   **│"));
    }

    // The end-to-end scenario: word resolver at 0x10 over little-endian
    // bytes 34 12, then the pointer moves +2, then jumps back to 0x1200.
    #[test]
    fn test_word_step_scenario() {
        let m = monitor(plain_config(), &[]);
        let resolver = Resolver::from_settings(ResolverKind::Word, "0x10").unwrap();

        let mut tick1 = vec![0u8; 0x20];
        tick1[0x10] = 0x34;
        tick1[0x11] = 0x12;
        let code1 = Snapshot::from_bytes(0, tick1.clone());
        let first = resolver.resolve(&code1).unwrap();
        assert_eq!(first.address, 0x1234);
        assert_eq!(first.info, "1234");

        let mut tick2 = tick1.clone();
        tick2[0x10] = 0x36;
        let code2 = Snapshot::from_bytes(0, tick2);
        let second = resolver.resolve(&code2).unwrap();
        assert_eq!(second.address, 0x1236);

        let step = classify(first.address, second.address, 0x8).unwrap();
        assert_eq!(step.kind, StepKind::Forward);
        assert_eq!(step.delta, 2);

        let mut payload = vec![0u8; 0x40];
        payload[0x34] = 0xA0;
        payload[0x35] = 0xA1;
        let data = Snapshot::from_bytes(0x1200, payload);
        let mut out = Vec::new();
        m.emit_change(&first.info, first.address, step.delta, step.kind, &data, "", &mut out)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1234   +2│• a0 a1\n");

        // backward move is a jump regardless of magnitude
        let back = classify(second.address, 0x1200, 0x8).unwrap();
        assert_eq!(back.kind, StepKind::BackwardJump);
        assert_eq!(back.delta, -0x36);
    }
}
