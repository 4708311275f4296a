#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Terminal output abstractions for user-facing messages.
//!
//! This crate provides an [`Output`] trait that abstracts over how results
//! and status messages are rendered. Implementations include:
//!
//! - [`Terminal`]: A color-capable terminal renderer for production use
//! - [`Quiet`]: A silent implementation that suppresses output (useful for tests)
//!
//! [`Spinner`] shows progress on stderr while a long-running git command runs.

use std::{
    io::{self, IsTerminal, Write},
    result::Result as StdResult,
    time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use thiserror::Error;

/// Spinner redraw interval.
const TICK: Duration = Duration::from_millis(100);

/// Errors produced by [`Output`] implementations when writing to the terminal.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Underlying I/O error while writing to the terminal.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience alias for output-related fallible operations.
pub type Result<T> = StdResult<T, OutputError>;

/// Abstraction over how user-facing messages are produced.
///
/// Implementations can render to a terminal, suppress output, or emit to other
/// formats (e.g. files or JSON) in the future.
pub trait Output: Send + Sync {
    /// Print a success message.
    fn success(&self, msg: &str) -> Result<()>;
    /// Print a warning message.
    fn warn(&self, msg: &str) -> Result<()>;
    /// Print an error/failure message.
    fn fail(&self, msg: &str) -> Result<()>;
    /// Print an uncolored line, suitable for piping into other tools.
    fn item(&self, line: &str) -> Result<()>;
    /// Flush any buffered output.
    fn finish(&self) -> Result<()>;
    /// Start a progress spinner, if this output shows progress at all.
    fn spinner(&self, msg: &str) -> Spinner;
}

/// Output implementation that suppresses all messages.
pub struct Quiet;

impl Output for Quiet {
    fn success(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn warn(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn fail(&self, _msg: &str) -> Result<()> {
        Ok(())
    }

    fn item(&self, _line: &str) -> Result<()> {
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        Ok(())
    }

    fn spinner(&self, _msg: &str) -> Spinner {
        Spinner::hidden()
    }
}

/// Color-capable terminal renderer for user messages.
pub struct Terminal {
    /// Whether to emit ANSI color sequences when writing to stdout.
    color_choice: ColorChoice,
}

impl Terminal {
    /// Create a new terminal output.
    ///
    /// - `color`: when `true`, always render colored output; when `false`,
    ///   disable ANSI colors.
    pub fn new(color: bool) -> Self {
        let color_choice = if color {
            ColorChoice::Always
        } else {
            ColorChoice::Never
        };
        Self { color_choice }
    }

    /// Write `msg` as one line in `color`.
    fn write_colored(&self, msg: &str, color: Color) -> Result<()> {
        let mut stdout = StandardStream::stdout(self.color_choice);
        stdout.set_color(ColorSpec::new().set_fg(Some(color)))?;
        writeln!(stdout, "{msg}")?;
        stdout.reset()?;
        stdout.flush()?;
        Ok(())
    }
}

impl Output for Terminal {
    fn success(&self, msg: &str) -> Result<()> {
        self.write_colored(msg, Color::Green)
    }

    fn warn(&self, msg: &str) -> Result<()> {
        self.write_colored(msg, Color::Rgb(255, 165, 0)) // Orange
    }

    fn fail(&self, msg: &str) -> Result<()> {
        self.write_colored(msg, Color::Red)
    }

    fn item(&self, line: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{line}")?;
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        io::stdout().flush()?;
        Ok(())
    }

    fn spinner(&self, msg: &str) -> Spinner {
        if io::stderr().is_terminal() {
            Spinner::start(msg)
        } else {
            Spinner::hidden()
        }
    }
}

/// Progress spinner drawn on stderr. Cleared when finished or dropped.
pub struct Spinner {
    /// Underlying progress bar; hidden bars draw nothing.
    bar: ProgressBar,
}

impl Spinner {
    /// Start a visible spinner with `msg`.
    pub fn start(msg: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(msg.to_string());
        bar.enable_steady_tick(TICK);
        Self { bar }
    }

    /// A spinner that never draws.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Stop and erase the spinner.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
