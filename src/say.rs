//! User-facing console messages.

use crossterm::style::Stylize;

/// Sink for the messages shown to the user.
pub trait Say {
    fn info(&mut self, text: &str);
    fn warning(&mut self, text: &str);
    /// A suggestion for what to do next.
    fn hint(&mut self, text: &str);
}

const INFO: &str = "> ";
const WARNING: &str = "⚠ ";
const HINT: &str = "👉 ";

/// Prints to stdout, one prefixed line per message line.
#[derive(Debug, Default)]
pub struct Terminal;

impl Say for Terminal {
    fn info(&mut self, text: &str) {
        for line in lines(text) {
            println!("{INFO}{line}");
        }
    }

    fn warning(&mut self, text: &str) {
        for line in lines(text) {
            println!("{}", format!("{WARNING}{line}").yellow());
        }
    }

    fn hint(&mut self, text: &str) {
        for line in lines(text) {
            println!("{HINT}{line}");
        }
    }
}

/// Records messages instead of printing them.
#[derive(Debug, Default)]
pub struct Transcript {
    pub lines: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, prefix: &str, text: &str) {
        self.lines
            .extend(lines(text).map(|line| format!("{prefix}{line}")));
    }
}

impl Say for Transcript {
    fn info(&mut self, text: &str) {
        self.record(INFO, text);
    }

    fn warning(&mut self, text: &str) {
        self.record(WARNING, text);
    }

    fn hint(&mut self, text: &str) {
        self.record(HINT, text);
    }
}

fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.trim().lines().map(str::trim)
}
