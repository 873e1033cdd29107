//! Instruction trace sources.
//!
//! The driver pulls one [`InstructionRecord`] at a time from a
//! [`TraceSource`]. `Ok(None)` marks the end of the trace; an error stops the
//! run and is surfaced to the caller.
//!
//! Two sources are provided:
//! - [`MemoryTrace`]: records held in memory, for tests and programmatic use.
//! - [`JsonLinesTrace`]: one JSON object per line, blank lines skipped.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::common::error::TraceError;
use crate::isa::InstructionRecord;

/// Pull-style supplier of trace records.
pub trait TraceSource {
    /// Returns the next record, or `None` at end of trace.
    ///
    /// # Errors
    ///
    /// Returns a [`TraceError`] if the record cannot be read or decoded.
    fn next_instruction(&mut self) -> Result<Option<InstructionRecord>, TraceError>;
}

/// Trace held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTrace {
    records: VecDeque<InstructionRecord>,
}

impl MemoryTrace {
    /// Creates a trace yielding `records` in order.
    pub fn new(records: impl IntoIterator<Item = InstructionRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    /// Records not yet consumed.
    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl FromIterator<InstructionRecord> for MemoryTrace {
    fn from_iter<I: IntoIterator<Item = InstructionRecord>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl TraceSource for MemoryTrace {
    fn next_instruction(&mut self) -> Result<Option<InstructionRecord>, TraceError> {
        Ok(self.records.pop_front())
    }
}

/// Trace stored as JSON lines.
///
/// # Examples
///
/// ```
/// use uarchsim_core::isa::Operation;
/// use uarchsim_core::sim::{JsonLinesTrace, TraceSource};
///
/// let text = r#"{"address": 4096, "size": 4, "operation": "Load", "read_address": 8192}
///
/// {"address": 4100, "size": 4}
/// "#;
/// let mut trace = JsonLinesTrace::new(text.as_bytes());
///
/// let first = trace.next_instruction().unwrap().unwrap();
/// assert_eq!(first.operation, Operation::Load);
/// assert_eq!(first.read_address, Some(8192));
/// assert_eq!(trace.next_instruction().unwrap().unwrap().address, 4100);
/// assert!(trace.next_instruction().unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct JsonLinesTrace<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> JsonLinesTrace<R> {
    /// Wraps a buffered reader.
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// 1-based number of the last line read.
    pub const fn line(&self) -> usize {
        self.line
    }
}

impl JsonLinesTrace<BufReader<File>> {
    /// Opens a trace file.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Io`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> TraceSource for JsonLinesTrace<R> {
    fn next_instruction(&mut self) -> Result<Option<InstructionRecord>, TraceError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            return serde_json::from_str(text)
                .map(Some)
                .map_err(|source| TraceError::Malformed {
                    line: self.line,
                    source,
                });
        }
    }
}
