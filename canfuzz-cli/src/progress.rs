// canfuzz CLI - Terminal progress bar
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Terminal progress bar drawn on stderr.

use canfuzz::ProgressReporter;
use std::io::Write;

/// Redraws at most this many times per run.
const MAX_REDRAWS: u64 = 1000;

/// `description [#####-----] written/total` on a single line.
pub struct ProgressBar<W: Write> {
    out: W,
    description: String,
    width: usize,
    total: u64,
    step: u64,
    last_drawn: u64,
}

impl ProgressBar<std::io::Stderr> {
    /// Bar on stderr, 40 columns wide.
    pub fn stderr(description: &str) -> Self {
        Self::new(std::io::stderr(), description, 40)
    }
}

impl<W: Write> ProgressBar<W> {
    /// Create a bar writing to `out`.
    pub fn new(out: W, description: &str, width: usize) -> Self {
        Self {
            out,
            description: description.to_string(),
            width,
            total: 0,
            step: 1,
            last_drawn: 0,
        }
    }

    fn render(&self, written: u64) -> String {
        let filled = if self.total == 0 {
            self.width
        } else {
            (self.width as u64 * written.min(self.total) / self.total) as usize
        };
        format!(
            "\r{} [{}{}] {}/{}",
            self.description,
            "#".repeat(filled),
            "-".repeat(self.width - filled),
            written,
            self.total
        )
    }

    fn draw(&mut self, written: u64) {
        let line = self.render(written);
        // cosmetic output, write errors are ignored
        let _ = self.out.write_all(line.as_bytes());
        let _ = self.out.flush();
        self.last_drawn = written;
    }

    /// Consume the bar and return its output.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ProgressReporter for ProgressBar<W> {
    fn start(&mut self, total: u64) {
        self.total = total;
        self.step = (total / MAX_REDRAWS).max(1);
        self.draw(0);
    }

    fn advance(&mut self, written: u64) {
        if written - self.last_drawn >= self.step || written == self.total {
            self.draw(written);
        }
    }

    fn finish(&mut self) {
        let _ = self.out.write_all(b"\n");
        let _ = self.out.flush();
    }
}
