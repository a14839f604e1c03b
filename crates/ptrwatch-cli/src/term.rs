//! Terminal state for the monitor display.

use std::io::{self, Write};

use anyhow::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::terminal::{self, Clear, ClearType, DisableLineWrap, EnableLineWrap};
use crossterm::execute;

/// Puts the terminal into monitor mode (cleared screen, cursor parked at
/// the bottom row, line wrap and cursor off) and restores it on drop, so
/// the interrupt path cannot leave the cursor hidden.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn setup() -> Result<Self> {
        let (_, rows) = terminal::size()?;
        execute!(
            io::stdout(),
            Clear(ClearType::All),
            MoveTo(0, rows.saturating_sub(1)),
            DisableLineWrap,
            Hide
        )?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut out = io::stdout();
        let _ = execute!(out, Show, EnableLineWrap);
        let _ = writeln!(out);
    }
}
