// src/keyboard/terminal.rs

use std::fmt::Debug;
use std::io::{self, IsTerminal};

use tracing::debug;

/// Switching the controlling terminal in and out of raw input mode.
pub trait RawTerminal: Send + Debug {
    /// Disable line buffering and echo.
    fn enable_raw_input(&mut self) -> io::Result<()>;
    /// Put the terminal back the way it was before `enable_raw_input`.
    fn restore(&mut self) -> io::Result<()>;
}

/// `crossterm` backend; covers both the termios and the Windows console
/// implementations.
#[derive(Debug, Default)]
pub struct CrosstermTerminal {
    was_raw: Option<bool>,
}

impl CrosstermTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether stdin is attached to a terminal at all.
    pub fn is_available() -> bool {
        io::stdin().is_terminal()
    }
}

impl RawTerminal for CrosstermTerminal {
    fn enable_raw_input(&mut self) -> io::Result<()> {
        let was_raw = crossterm::terminal::is_raw_mode_enabled()?;
        crossterm::terminal::enable_raw_mode()?;
        self.was_raw = Some(was_raw);
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        match self.was_raw.take() {
            Some(false) => crossterm::terminal::disable_raw_mode(),
            Some(true) | None => Ok(()),
        }
    }
}

/// Holds a terminal in raw mode; restores it when dropped, including when
/// the owning task is aborted.
#[derive(Debug)]
pub struct RawModeGuard {
    terminal: Box<dyn RawTerminal>,
}

impl RawModeGuard {
    pub fn enable(mut terminal: Box<dyn RawTerminal>) -> io::Result<Self> {
        terminal.enable_raw_input()?;
        debug!("terminal switched to raw input");
        Ok(Self { terminal })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        match self.terminal.restore() {
            Ok(()) => debug!("terminal mode restored"),
            Err(err) => debug!(error = %err, "failed to restore terminal mode"),
        }
    }
}
