//! Call tracer CLI
//!
//! Runs a program under gdb and prints the calls it makes between the
//! configured breakpoints as an indented tree.

use calltrace::common::logging;
use calltrace::{cli, commands};
use clap::Parser;
use colored::Colorize;
use commands::Commands;

#[derive(Parser)]
#[command(name = "calltrace", about = "Record a program's call tree through gdb")]
#[command(version, long_about = None)]
struct Cli {
    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::init_cli(cli.verbose);

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("{} {e}", "Error:".red().bold());
        std::process::exit(1);
    }
}
