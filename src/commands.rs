//! CLI command definitions
//!
//! Defines the clap commands for the call tracer.

use clap::Subcommand;
use std::path::PathBuf;

use crate::report::ReportFormat;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a program under gdb and record its call tree
    Trace {
        /// Path to the executable to trace
        program: PathBuf,

        /// Arguments to pass to the program
        #[arg(last = true)]
        args: Vec<String>,

        /// Explicit breakpoints: `LOCATION` or `CMD;CMD@LOCATION`, comma separated.
        /// Can be specified multiple times: -b main -b 'p sum@loop.c:5'
        #[arg(long = "break", short = 'b')]
        breakpoints: Vec<String>,

        /// Set a breakpoint on every function matching this pattern
        /// (gdb `rbreak` syntax). Can be specified multiple times.
        #[arg(long, short = 'i')]
        include: Vec<String>,

        /// Disable wildcard matches whose function name matches this regex
        #[arg(long, short = 'x')]
        exclude: Option<String>,

        /// Record hits flatly and continue, without building a call tree
        #[arg(long)]
        simple: bool,

        /// Append every command and raw response to this file
        #[arg(long)]
        transcript: Option<PathBuf>,

        /// Write the report here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,

        /// Config file (default: the user config directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// gdb executable
        #[arg(long)]
        gdb: Option<PathBuf>,

        /// Prompt marker that ends every gdb response
        #[arg(long)]
        prompt: Option<String>,

        /// Seconds to wait for each gdb response
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Parse a breakpoint specifier and print its clauses
    CheckBreakpoints {
        /// Specifier to check
        spec: String,
    },
}
