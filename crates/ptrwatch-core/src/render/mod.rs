//! Hex rendering of consumed byte ranges.
//!
//! The renderer turns the bytes implicated by a step into width-wrapped hex
//! rows with a kind-specific marker. On jumps it additionally looks for a
//! configured end pattern inside the range and truncates at it, since bytes
//! past a track terminator belong to whatever comes next in memory.

mod pattern;

pub use pattern::{EndPattern, parse_patterns};

use owo_colors::OwoColorize;

use crate::step::StepKind;
use pattern::{earliest_match, latest_match};

/// Output decoration switches. Colors are off in tests and when piping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderStyle {
    pub color: bool,
}

/// One render pass: a marker prefix, hex rows wrapped at the configured
/// width, and a suffix (`~` when the range was cut at an end pattern).
/// Purely derived; recomputed per call, never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    pub prefix: String,
    pub rows: Vec<String>,
    pub suffix: String,
}

pub struct HexRenderer {
    width: usize,
    patterns: Vec<EndPattern>,
    style: RenderStyle,
}

impl HexRenderer {
    pub fn new(width: usize, patterns: Vec<EndPattern>, style: RenderStyle) -> Self {
        Self {
            width: width.max(1),
            patterns,
            style,
        }
    }

    pub fn render(&self, kind: StepKind, bytes: &[u8]) -> RenderResult {
        let mut visible = bytes;
        let mut truncated = false;

        if !self.patterns.is_empty() {
            match kind {
                StepKind::ForwardJump => {
                    if let Some((start, len)) = earliest_match(&self.patterns, bytes) {
                        visible = &bytes[..start + len];
                        truncated = true;
                    }
                }
                StepKind::BackwardJump | StepKind::Backward | StepKind::Reset => {
                    if let Some((start, len)) = latest_match(&self.patterns, bytes) {
                        visible = &bytes[..start + len];
                        truncated = true;
                    }
                }
                // look-behind window: cut so the render *starts* at the
                // terminator, showing only the tail of the track
                StepKind::Lookup => {
                    if let Some((start, _)) = latest_match(&self.patterns, bytes) {
                        visible = &bytes[start..];
                    }
                }
                StepKind::Forward | StepKind::Preview => {}
            }
        }

        RenderResult {
            prefix: self.marker(kind),
            rows: self.format_rows(visible),
            suffix: if truncated { "~".to_owned() } else { String::new() },
        }
    }

    /// Space-separated hex pairs, wrapped at `width` bytes per row. An empty
    /// range still yields one (empty) row so callers can print the first row
    /// unconditionally.
    fn format_rows(&self, bytes: &[u8]) -> Vec<String> {
        if bytes.is_empty() {
            return vec![String::new()];
        }
        bytes
            .chunks(self.width)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|b| format!("{b:02x}"))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    fn marker(&self, kind: StepKind) -> String {
        let marker = match kind {
            StepKind::Forward => "• ",
            StepKind::ForwardJump => "► ",
            StepKind::Backward | StepKind::BackwardJump => "◄ ",
            StepKind::Reset => "↺ ",
            StepKind::Preview => "  ",
            StepKind::Lookup => "▲ ",
        };
        if !self.style.color {
            return marker.to_owned();
        }
        match kind {
            StepKind::ForwardJump => marker.bright_red().to_string(),
            StepKind::Backward | StepKind::BackwardJump => marker.bright_blue().to_string(),
            StepKind::Reset => marker.yellow().to_string(),
            StepKind::Lookup => marker.yellow().to_string(),
            StepKind::Forward | StepKind::Preview => marker.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(width: usize, patterns: &[&str]) -> HexRenderer {
        let patterns = parse_patterns(patterns).unwrap();
        HexRenderer::new(width, patterns, RenderStyle::default())
    }

    #[test]
    fn test_rows_wrap_at_width() {
        let renderer = plain(4, &[]);
        let result = renderer.render(StepKind::Forward, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(result.rows, vec!["01 02 03 04", "05 06"]);
        assert_eq!(result.prefix, "• ");
        assert_eq!(result.suffix, "");
    }

    #[test]
    fn test_hex_roundtrip() {
        let original: Vec<u8> = (0u8..=255).collect();
        let renderer = plain(16, &[]);
        let result = renderer.render(StepKind::Preview, &original);

        let reparsed: Vec<u8> = result
            .rows
            .iter()
            .flat_map(|row| row.split(' '))
            .map(|pair| u8::from_str_radix(pair, 16).unwrap())
            .collect();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn test_empty_range_renders_one_empty_row() {
        let renderer = plain(8, &[]);
        let result = renderer.render(StepKind::Preview, &[]);
        assert_eq!(result.rows, vec![String::new()]);
    }

    #[test]
    fn test_forward_jump_truncates_at_earliest_match() {
        let renderer = plain(8, &["ff"]);
        let result = renderer.render(StepKind::ForwardJump, &[0x01, 0xFF, 0x02, 0xFF, 0x03]);
        // cut after the first FF, inclusive
        assert_eq!(result.rows, vec!["01 ff"]);
        assert_eq!(result.suffix, "~");
    }

    #[test]
    fn test_backward_jump_truncates_at_latest_match() {
        let renderer = plain(8, &["ff"]);
        let result = renderer.render(StepKind::BackwardJump, &[0x01, 0xFF, 0x02, 0xFF, 0x03]);
        assert_eq!(result.rows, vec!["01 ff 02 ff"]);
        assert_eq!(result.suffix, "~");
    }

    #[test]
    fn test_multibyte_pattern_kept_whole() {
        let renderer = plain(8, &["d4 ?? 00"]);
        let result = renderer.render(StepKind::ForwardJump, &[0xAA, 0xD4, 0x7F, 0x00, 0xBB]);
        assert_eq!(result.rows, vec!["aa d4 7f 00"]);
        assert_eq!(result.suffix, "~");
    }

    #[test]
    fn test_lookup_truncates_to_start_at_match() {
        let renderer = plain(8, &["ff"]);
        let result = renderer.render(StepKind::Lookup, &[0x01, 0xFF, 0x02, 0x03]);
        // asymmetric from the jump case: the render starts at the terminator
        assert_eq!(result.rows, vec!["ff 02 03"]);
        assert_eq!(result.suffix, "");
        assert_eq!(result.prefix, "▲ ");
    }

    #[test]
    fn test_no_match_renders_full_range() {
        let renderer = plain(8, &["ee"]);
        let result = renderer.render(StepKind::ForwardJump, &[0x01, 0x02]);
        assert_eq!(result.rows, vec!["01 02"]);
        assert_eq!(result.suffix, "");
    }

    #[test]
    fn test_no_patterns_is_a_noop() {
        let renderer = plain(8, &[]);
        let result = renderer.render(StepKind::ForwardJump, &[0xFF, 0x01]);
        assert_eq!(result.rows, vec!["ff 01"]);
        assert_eq!(result.suffix, "");
    }

    #[test]
    fn test_forward_step_ignores_patterns() {
        let renderer = plain(8, &["ff"]);
        let result = renderer.render(StepKind::Forward, &[0xFF, 0x01]);
        assert_eq!(result.rows, vec!["ff 01"]);
        assert_eq!(result.suffix, "");
    }

    #[test]
    fn test_earliest_across_multiple_patterns() {
        let renderer = plain(8, &["ff", "d4 00"]);
        let result = renderer.render(StepKind::ForwardJump, &[0x01, 0xD4, 0x00, 0xFF]);
        assert_eq!(result.rows, vec!["01 d4 00"]);
    }

    #[test]
    fn test_markers_per_kind() {
        let renderer = plain(8, &[]);
        assert_eq!(renderer.render(StepKind::ForwardJump, &[]).prefix, "► ");
        assert_eq!(renderer.render(StepKind::BackwardJump, &[]).prefix, "◄ ");
        assert_eq!(renderer.render(StepKind::Reset, &[]).prefix, "↺ ");
        assert_eq!(renderer.render(StepKind::Preview, &[]).prefix, "  ");
        assert_eq!(renderer.render(StepKind::Lookup, &[]).prefix, "▲ ");
    }
}
