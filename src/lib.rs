//! Call tracer
//!
//! Drives gdb in text mode through a program run, placing breakpoints,
//! stepping out of every hit with `finish`, and rebuilding the dynamic call
//! tree from the backtraces and return values gdb reports.

pub mod breakpoints;
pub mod cli;
pub mod commands;
pub mod common;
pub mod gdb;
pub mod report;
pub mod testing;
pub mod trace;

// Re-export commonly used types for tests
pub use common::{Error, Result};
