//! Progress reporting for the sequential scans.
//!
//! TTY mode: one indicatif bar per scan, accepted papers printed above it.
//! Non-TTY mode: plain lines on stderr.

use std::fmt;
use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressStyle};

use crate::arxiv::Paper;
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classification,
    Translation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Classification => f.write_str("classify"),
            Stage::Translation => f.write_str("translate"),
        }
    }
}

/// State after one item of a scan: counters plus the output sequence so far.
#[derive(Debug, Clone, Copy)]
pub struct ScanProgress<'a> {
    pub stage: Stage,
    pub processed: usize,
    pub total: usize,
    pub snapshot: &'a [Paper],
}

/// Receives progress between items. Called by the single writer after every
/// append, so each snapshot is a prefix of the final sequence.
pub trait ProgressSink {
    fn report(&mut self, progress: ScanProgress<'_>);

    fn warning(&mut self, _message: &str) {}
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:<10.cyan.bold} {bar:30.green/dim} {pos:>4}/{len:4} {wide_msg:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("--")
}

/// Terminal sink: progress bar plus each newly accepted paper as it lands.
pub struct TerminalProgress {
    bar: Option<ProgressBar>,
    shown: usize,
    is_tty: bool,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self {
            bar: None,
            shown: 0,
            is_tty: std::io::stderr().is_terminal(),
        }
    }

    fn bar(&mut self, stage: Stage, total: usize) -> &ProgressBar {
        let is_tty = self.is_tty;
        self.bar.get_or_insert_with(|| {
            if !is_tty {
                return ProgressBar::hidden();
            }
            let pb = ProgressBar::new(total as u64);
            pb.set_style(bar_style());
            pb.set_prefix(stage.to_string());
            pb
        })
    }

    fn println(&self, line: &str) {
        match &self.bar {
            Some(bar) if self.is_tty => bar.println(line),
            _ => eprintln!("{line}"),
        }
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalProgress {
    fn report(&mut self, progress: ScanProgress<'_>) {
        let bar = self.bar(progress.stage, progress.total).clone();
        bar.set_position(progress.processed as u64);
        bar.set_message(format!("{} kept", progress.snapshot.len()));

        for (index, paper) in progress.snapshot.iter().enumerate().skip(self.shown) {
            let line = match progress.stage {
                Stage::Classification => render::paper_line(index + 1, paper),
                Stage::Translation => render::translated_line(index + 1, paper),
            };
            self.println(&line);
        }
        self.shown = progress.snapshot.len();

        if !self.is_tty {
            eprintln!(
                "{}: {} of {} papers processed",
                progress.stage, progress.processed, progress.total
            );
        }
        if progress.processed == progress.total {
            bar.finish_and_clear();
        }
    }

    fn warning(&mut self, message: &str) {
        self.println(&format!("warning: {message}"));
    }
}
