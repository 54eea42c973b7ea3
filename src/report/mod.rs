//! Report Emitter
//!
//! Receives each finalized root call as soon as it completes, then the whole
//! trace and summary tables when the session ends. Emitters only read the
//! trace; rendering the same trace twice produces the same output.

mod json;
mod summary;
mod text;

use crate::common::{Error, Result};
use crate::trace::{CallNode, Trace};

pub use json::JsonReport;
pub use summary::{Summary, SummaryRow};
pub use text::{render_summary, render_tree, TextReport};

/// Sink for a tracing session's results
pub trait Emitter {
    /// The debugger is up and the target is about to start
    fn session_started(&mut self, _cmdline: &str) -> Result<()> {
        Ok(())
    }

    /// A root call and its whole subtree are final
    fn root_finalized(&mut self, _root: &CallNode) -> Result<()> {
        Ok(())
    }

    /// The session is over; `error` is set if it ended on a fatal error
    fn session_finished(
        &mut self,
        trace: &Trace,
        summary: &Summary,
        error: Option<&Error>,
    ) -> Result<()>;
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    /// Indented call outline with summary tables
    #[default]
    Text,
    /// Whole trace as one JSON document
    Json,
}
