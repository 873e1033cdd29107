//! Error definitions.
//!
//! The hardware model itself cannot fail: every table is sized at construction
//! and every index is masked into range. Errors come from its edges:
//! 1. **Configuration:** Table geometries that cannot be indexed with a bitmask.
//! 2. **Trace input:** I/O failures and malformed instruction records.
//! 3. **Simulation:** The umbrella type returned by the driver and run loop.

use std::io;

use thiserror::Error;

/// Rejected simulator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A table whose set count is not a non-zero power of two.
    #[error("{table}: {lines} lines / {ways} ways does not give a power-of-two set count")]
    InvalidGeometry {
        /// Name of the offending table.
        table: &'static str,
        /// Configured line count.
        lines: usize,
        /// Configured associativity.
        ways: usize,
    },

    /// A cache block size that is not a non-zero power of two.
    #[error("cache line size {0} is not a power of two")]
    InvalidLineSize(usize),

    /// The configuration file could not be read.
    #[error("failed to read configuration")]
    Io(#[from] io::Error),

    /// The configuration file is not valid JSON for [`Config`](crate::config::Config).
    #[error("failed to parse configuration")]
    Parse(#[from] serde_json::Error),
}

/// Failure while pulling instructions from a trace.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The underlying reader failed.
    #[error("failed to read trace")]
    Io(#[from] io::Error),

    /// A record could not be decoded.
    #[error("malformed trace record at line {line}")]
    Malformed {
        /// 1-based line number of the record.
        line: usize,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
}

/// Any failure that stops a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The trace source failed; the run stops at the failing record.
    #[error(transparent)]
    Trace(#[from] TraceError),
}
