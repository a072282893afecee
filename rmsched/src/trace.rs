/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Execution trace and its on-disk artifact.
//!
//! Text layout, one hyperperiod per row:
//!
//! ```text
//! 0 1 2 3 4 5 …              ← header: tick indices 0..hyperperiod-1
//! A A B B B C …              ← repetition 1
//! A A B B B C …              ← repetition 2
//! ```
//!
//! Idle ticks are written as [`IDLE_MARKER`].
//!
//! [`TraceArtifact`] guarantees callers never observe a half-written file: the
//! file is removed on drop unless [`TraceArtifact::commit`] succeeded.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// Placeholder token for ticks where no task ran.
pub const IDLE_MARKER: &str = "__";

// ── TraceEntry ────────────────────────────────────────────────────────────────

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEntry {
    Task(Arc<str>),
    Idle,
}

impl TraceEntry {
    pub fn as_str(&self) -> &str {
        match self {
            TraceEntry::Task(name) => name,
            TraceEntry::Idle => IDLE_MARKER,
        }
    }
}

// ── Trace ─────────────────────────────────────────────────────────────────────

/// Append-only trace, one row per simulated hyperperiod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    hyperperiod: u64,
    rows: Vec<Vec<TraceEntry>>,
}

impl Trace {
    pub fn new(hyperperiod: u64) -> Self {
        Self {
            hyperperiod,
            rows: Vec::new(),
        }
    }

    pub fn hyperperiod(&self) -> u64 {
        self.hyperperiod
    }

    /// Append one tick; starts a new row every `hyperperiod` entries.
    pub fn push(&mut self, entry: TraceEntry) {
        let row_full = self
            .rows
            .last()
            .map_or(true, |r| r.len() as u64 >= self.hyperperiod);
        if row_full {
            self.rows.push(Vec::with_capacity(self.hyperperiod as usize));
        }
        if let Some(row) = self.rows.last_mut() {
            row.push(entry);
        }
    }

    pub fn rows(&self) -> &[Vec<TraceEntry>] {
        &self.rows
    }

    /// Total number of ticks recorded.
    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header row: `0 1 2 … hyperperiod-1`.
    pub fn header(&self) -> String {
        let mut s = String::new();
        for t in 0..self.hyperperiod {
            if t > 0 {
                s.push(' ');
            }
            let _ = write!(s, "{t}");
        }
        s
    }

    /// Full text form: header then one line per row, newline-terminated.
    pub fn render(&self) -> String {
        let mut out = self.header();
        out.push('\n');
        for row in &self.rows {
            let line: Vec<&str> = row.iter().map(TraceEntry::as_str).collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out
    }

    /// Write [`render`](Self::render) output to `w`.
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(self.render().as_bytes())
    }
}

// ── TraceArtifact ─────────────────────────────────────────────────────────────

/// Output file that is removed unless the trace was fully written.
#[derive(Debug)]
pub struct TraceArtifact {
    path: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl TraceArtifact {
    /// Create (truncate) the trace file at `path`.
    ///
    /// Called before the simulation starts so an unwritable path is reported
    /// as a configuration error.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Cannot create trace file: {}", path.display()))?;
        debug!(path = %path.display(), "trace artifact created");
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `trace`, flush, and keep the file.
    pub fn commit(mut self, trace: &Trace) -> Result<()> {
        let file = self
            .file
            .take()
            .with_context(|| format!("Trace file already closed: {}", self.path.display()))?;
        let mut w = BufWriter::new(file);
        trace
            .write_to(&mut w)
            .and_then(|()| w.flush())
            .with_context(|| format!("Failed to write trace file: {}", self.path.display()))?;

        self.committed = true;
        info!(
            path = %self.path.display(),
            rows = trace.rows().len(),
            ticks = trace.len(),
            "trace written"
        );
        Ok(())
    }

    /// Remove the file now.  Equivalent to dropping without committing.
    pub fn discard(self) {}
}

impl Drop for TraceArtifact {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Close before removing
        self.file.take();
        match fs::remove_file(&self.path) {
            Ok(()) => info!(path = %self.path.display(), "partial trace discarded"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove partial trace"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(name: &str) -> TraceEntry {
        if name == IDLE_MARKER {
            TraceEntry::Idle
        } else {
            TraceEntry::Task(Arc::from(name))
        }
    }

    fn trace_of(hyperperiod: u64, ticks: &[&str]) -> Trace {
        let mut t = Trace::new(hyperperiod);
        for n in ticks {
            t.push(entry(n));
        }
        t
    }

    #[test]
    fn rows_split_at_hyperperiod_boundary() {
        let t = trace_of(3, &["A", "B", "__", "A", "B", "__"]);
        assert_eq!(t.rows().len(), 2);
        assert_eq!(t.len(), 6);
    }

    #[test]
    fn render_writes_header_then_rows() {
        let t = trace_of(4, &["A", "A", "B", "__", "A", "A", "B", "__"]);
        assert_eq!(t.render(), "0 1 2 3\nA A B __\nA A B __\n");
    }

    #[test]
    fn empty_trace_renders_header_only() {
        let t = Trace::new(2);
        assert!(t.is_empty());
        assert_eq!(t.render(), "0 1\n");
    }

    #[test]
    fn committed_artifact_keeps_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.trace");
        let artifact = TraceArtifact::create(&path).unwrap();
        artifact.commit(&trace_of(2, &["A", "__"])).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0 1\nA __\n");
    }

    #[test]
    fn uncommitted_artifact_is_removed_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.trace");
        {
            let _artifact = TraceArtifact::create(&path).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn discard_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.trace");
        TraceArtifact::create(&path).unwrap().discard();
        assert!(!path.exists());
    }

    #[test]
    fn create_in_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("out.trace");
        assert!(TraceArtifact::create(&path).is_err());
    }
}
