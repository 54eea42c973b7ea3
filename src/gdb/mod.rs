//! Session Adapter for a gdb process in interactive text mode
//!
//! All interaction is line-oriented: one command is written, then output is
//! collected until the prompt marker reappears. Exactly one command is ever
//! outstanding.

pub mod client;
pub mod codec;
pub mod transcript;

use async_trait::async_trait;

use crate::common::Result;

pub use client::GdbClient;
pub use transcript::Transcript;

/// Synchronous command/response channel to a debugger
///
/// The tracing session and the breakpoint registry only ever talk to the
/// debugger through this trait, so they can be driven by a scripted double.
#[async_trait]
pub trait DebuggerIo: Send {
    /// Send one command line and return everything printed before the next prompt
    async fn command(&mut self, text: &str) -> Result<String>;

    /// Start the target program; the response is the first stop event
    async fn start_target(&mut self) -> Result<String> {
        self.command("run").await
    }

    /// Command line the debugger was launched with, for reporting
    fn cmdline(&self) -> String;
}
