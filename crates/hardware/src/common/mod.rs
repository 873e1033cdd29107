//! Common utilities and types used throughout the simulator.
//!
//! This module provides the building blocks shared by every hardware table. It includes:
//! 1. **Constants:** Geometry and penalty parameters of the reference machine.
//! 2. **Error Handling:** Configuration, trace, and simulation error types.

/// Hardware constants of the reference machine.
pub mod constants;

/// Error types.
pub mod error;

pub use error::{ConfigError, SimError, TraceError};
