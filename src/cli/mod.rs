//! CLI command handling
//!
//! Wires configuration, the gdb client, breakpoint registration and the
//! chosen report together, then runs one tracing session.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::breakpoints::{specifier, BreakpointClause, BreakpointRegistry};
use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::gdb::{GdbClient, Transcript};
use crate::report::{Emitter, JsonReport, ReportFormat, TextReport};
use crate::trace::TraceSession;

/// Options of one `trace` invocation
struct TraceOptions {
    program: PathBuf,
    args: Vec<String>,
    breakpoints: Vec<String>,
    include: Vec<String>,
    exclude: Option<String>,
    simple: bool,
    transcript: Option<PathBuf>,
    output: Option<PathBuf>,
    format: ReportFormat,
}

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Trace {
            program,
            args,
            breakpoints,
            include,
            exclude,
            simple,
            transcript,
            output,
            format,
            config,
            gdb,
            prompt,
            timeout,
        } => {
            let mut config = match config {
                Some(path) => Config::load_from(&path)?,
                None => Config::load()?,
            };
            if let Some(gdb) = gdb {
                config.debugger.path = gdb;
            }
            if let Some(prompt) = prompt {
                config.debugger.prompt = prompt;
            }
            if let Some(secs) = timeout {
                config.timeouts.prompt_secs = secs;
            }

            trace(
                &config,
                TraceOptions {
                    program,
                    args,
                    breakpoints,
                    include,
                    exclude,
                    simple,
                    transcript,
                    output,
                    format,
                },
            )
            .await
        }

        Commands::CheckBreakpoints { spec } => {
            let clauses = specifier::parse(&spec)?;
            for (index, clause) in clauses.iter().enumerate() {
                print_clause(index + 1, clause);
            }
            Ok(())
        }
    }
}

async fn trace(config: &Config, options: TraceOptions) -> Result<()> {
    // Everything that can be rejected offline is checked before gdb starts
    let mut clauses = Vec::new();
    for spec in &options.breakpoints {
        clauses.extend(specifier::parse(spec)?);
    }
    let exclude = options
        .exclude
        .as_deref()
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| Error::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()?;

    let transcript = options
        .transcript
        .as_deref()
        .map(Transcript::open)
        .transpose()?;

    let mut client = GdbClient::spawn(config, &options.program, &options.args, transcript).await?;

    let mut registry = BreakpointRegistry::new();
    if let Err(e) = register(&mut registry, &mut client, &clauses, &options.include, exclude.as_ref()).await {
        client.close().await;
        return Err(e);
    }

    if registry.is_empty() {
        tracing::warn!("No breakpoints set; the trace will be empty");
    }

    let mut emitter = open_emitter(options.output.as_deref(), options.format)?;

    let mut session = TraceSession::new(client, registry, &config.session);
    let result = if options.simple {
        session.run_simple(emitter.as_mut()).await
    } else {
        session.run(emitter.as_mut()).await
    };

    let (client, _, trace) = session.into_parts();
    tracing::info!(
        calls = trace.node_count(),
        roots = trace.roots.len(),
        hits = trace.flat_hits.len(),
        "Trace finished"
    );
    client.close().await;

    if let Err(e) = &result {
        if e.is_protocol_fatal() {
            tracing::warn!("Partial report written after protocol failure");
        }
    }
    result
}

async fn register(
    registry: &mut BreakpointRegistry,
    client: &mut GdbClient,
    clauses: &[BreakpointClause],
    include: &[String],
    exclude: Option<&Regex>,
) -> Result<()> {
    for clause in clauses {
        registry.register_explicit(client, clause).await?;
    }
    for pattern in include {
        registry.register_wildcard(client, pattern, exclude).await?;
    }
    Ok(())
}

fn open_emitter(output: Option<&Path>, format: ReportFormat) -> Result<Box<dyn Emitter>> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path).map_err(|e| {
            Error::FileRead {
                path: path.display().to_string(),
                error: e.to_string(),
            }
        })?)),
        None => Box::new(io::stdout()),
    };

    Ok(match format {
        ReportFormat::Text => Box::new(TextReport::new(writer)),
        ReportFormat::Json => Box::new(JsonReport::new(writer)),
    })
}

fn print_clause(index: usize, clause: &BreakpointClause) {
    println!("{index}: {}", clause.location);
    for command in &clause.commands {
        println!("     | {command}");
    }
}
