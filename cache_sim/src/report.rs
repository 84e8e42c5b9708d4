//! Text and JSON renderings of a run

use std::{fmt, io};

use crate::{
    cache::Slot,
    sim::{RunResult, Snapshot},
};

const SEPARATOR: &str = "================";
const HEADER: &str = "IDX V ** ADDR **";

struct LineView(usize, Slot);

impl fmt::Display for LineView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            // all ones is reserved for empty lines in this format
            Slot::Resident(b) if !b.is_all_ones() => write!(f, "{:03} 1 {b}", self.0),
            _ => write!(f, "{:03} 0 0", self.0),
        }
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{SEPARATOR}")?;
        write!(f, "{HEADER}")?;
        for (i, slot) in self.iter().enumerate() {
            write!(f, "\n{}", LineView(i, *slot))?;
        }
        Ok(())
    }
}

/// per-access cache contents followed by the hit and miss counts.
pub struct Report<'a>(&'a RunResult);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for snapshot in &self.0.history {
            writeln!(f, "{snapshot}")?;
        }
        writeln!(f)?;
        writeln!(f, "#hits: {}", self.0.hits)?;
        writeln!(f, "#miss: {}", self.0.misses)
    }
}

impl RunResult {
    pub fn report(&self) -> Report<'_> {
        Report(self)
    }
    pub fn write_report(&self, mut w: impl io::Write) -> io::Result<()> {
        write!(w, "{}", self.report())?;
        w.flush()
    }
    pub fn write_json(&self, mut w: impl io::Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut w, self)?;
        w.flush()
    }
}
