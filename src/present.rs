//! Console rendering of an [`Extraction`].
//!
//! Output goes to any `Write` so the binary can target stdout and tests can
//! target a buffer.

use std::io::{self, Write};

use colored::{Color, Colorize};

use crate::error::Error;
use crate::result::Extraction;

/// Line printed between the results and the summary.
pub const SEPARATOR: &str = "------------------------------------------";

/// Message printed when no line was retained.
pub const EMPTY_MESSAGE: &str = "The result is empty!";

#[derive(Debug, Clone, Copy)]
pub struct Presenter {
    color: bool,
}

impl Presenter {
    #[must_use]
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    /// Prints each non-blank line, then a separator and the occurrence count.
    pub fn render<W: Write>(&self, out: &mut W, extraction: &Extraction) -> io::Result<()> {
        if extraction.is_empty() {
            writeln!(out, "{}", self.paint(EMPTY_MESSAGE, Color::White))?;
            if extraction.dropped() > 0 {
                let note = format!("({} matching nodes contained no text)", extraction.dropped());
                writeln!(out, "{}", self.paint(&note, Color::BrightBlack))?;
            }
            return Ok(());
        }

        for line in extraction {
            // A rule can blank a line out; it still counts as an occurrence.
            if line.trim().is_empty() {
                continue;
            }
            writeln!(out, "{line}")?;
        }
        writeln!(out, "{}", self.paint(SEPARATOR, Color::Yellow))?;
        let summary = format!("Found {} occurrences.", extraction.len());
        writeln!(out, "{}", self.paint(&summary, Color::Yellow))
    }

    /// Prints the extraction as pretty JSON.
    pub fn render_json<W: Write>(&self, out: &mut W, extraction: &Extraction) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, extraction)?;
        writeln!(out)
    }

    pub fn render_error<W: Write>(&self, out: &mut W, error: &Error) -> io::Result<()> {
        writeln!(out, "{}", self.paint(&error.to_string(), Color::Red))
    }
}
