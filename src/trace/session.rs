//! Call Tree Builder
//!
//! Drives the debugger from one stop to the next and rebuilds the call tree
//! from what it reports. The only state is the stack of calls that have been
//! entered but not yet returned; the top of that stack is the current call
//! and the entry below a node is its parent.
//!
//! Each breakpoint hit is compared against the current call by backtrace
//! depth, not by breakpoint identity. A breakpoint in a loop body fires again
//! at the same depth while its enclosing call is still running; only a
//! strictly deeper hit is a new nested call. Tail-call-eliminated recursion
//! looks the same as such a replay and is recorded as a duplicate.

use crate::breakpoints::BreakpointRegistry;
use crate::common::config::SessionConfig;
use crate::common::{Error, Result};
use crate::gdb::DebuggerIo;
use crate::report::{Emitter, Summary};

use super::event::{self, BreakpointHit, Event, EventParser};
use super::tree::{CallNode, FlatHit, Inspection, NodeId, ReturnValue, Trace};

/// One tracing session, from `run` to program exit
pub struct TraceSession<D: DebuggerIo> {
    io: D,
    registry: BreakpointRegistry,
    parser: EventParser,
    locals_command: String,
    /// Calls entered but not yet returned, outermost first
    open: Vec<CallNode>,
    next_id: u64,
    trace: Trace,
}

impl<D: DebuggerIo> TraceSession<D> {
    pub fn new(io: D, registry: BreakpointRegistry, config: &SessionConfig) -> Self {
        Self {
            io,
            registry,
            parser: EventParser::new(config.backtrace_command.clone()),
            locals_command: config.locals_command.clone(),
            open: Vec::new(),
            next_id: 1,
            trace: Trace::default(),
        }
    }

    /// Hand back the debugger, e.g. to close it
    pub fn into_parts(self) -> (D, BreakpointRegistry, Trace) {
        (self.io, self.registry, self.trace)
    }

    /// Trace the program until it ends
    ///
    /// Whatever happens, calls still open are finalized and the emitter
    /// gets the trace, so a fatal error still produces a partial report.
    /// The first error encountered is returned.
    pub async fn run(&mut self, emitter: &mut dyn Emitter) -> Result<()> {
        let result = self.drive(emitter).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, open = self.open.len(), "Session failed");
        }
        let finalized = self.finalize_open(emitter);
        let summary = Summary::build(&self.trace, &self.registry);
        let reported = emitter.session_finished(&self.trace, &summary, result.as_ref().err());
        result.and(finalized).and(reported)
    }

    /// Record every hit flatly and keep going, without building a tree
    pub async fn run_simple(&mut self, emitter: &mut dyn Emitter) -> Result<()> {
        let result = self.drive_simple(emitter).await;
        let summary = Summary::build(&self.trace, &self.registry);
        let reported = emitter.session_finished(&self.trace, &summary, result.as_ref().err());
        result.and(reported)
    }

    async fn drive(&mut self, emitter: &mut dyn Emitter) -> Result<()> {
        self.trace.cmdline = self.io.cmdline();
        emitter.session_started(&self.trace.cmdline)?;

        let mut response = self.io.start_target().await?;
        loop {
            let event = self.parser.next_event(&mut self.io, &response).await?;
            response = match event {
                Event::BreakpointHit(hit) => self.on_hit(hit).await?,
                Event::ReturnValue(value) => self.on_return(value, emitter).await?,
                Event::OutermostFrame => {
                    tracing::debug!("Finish requested in outermost frame, continuing");
                    self.io.command("continue").await?
                }
                Event::ProgramEnded { message } => {
                    tracing::info!(message = %message, "Program ended");
                    self.trace.exit_message = Some(message);
                    return Ok(());
                }
                Event::Unrecognized { raw } => return Err(Error::UnrecognizedResponse(raw)),
            };
        }
    }

    async fn drive_simple(&mut self, emitter: &mut dyn Emitter) -> Result<()> {
        self.trace.cmdline = self.io.cmdline();
        emitter.session_started(&self.trace.cmdline)?;

        let mut response = self.io.start_target().await?;
        loop {
            match event::classify(&response) {
                Event::BreakpointHit(hit) => {
                    let id = self.next_node_id();
                    self.trace.hits.entry(hit.id).or_default().push(id);
                    self.trace.flat_hits.push(FlatHit {
                        id,
                        breakpoint: hit.id,
                        call_label: hit.call_label,
                        location: hit.location,
                    });
                }
                Event::ReturnValue(_) | Event::OutermostFrame => {}
                Event::ProgramEnded { message } => {
                    tracing::info!(message = %message, "Program ended");
                    self.trace.exit_message = Some(message);
                    return Ok(());
                }
                Event::Unrecognized { raw } => return Err(Error::UnrecognizedResponse(raw)),
            }
            response = self.io.command("continue").await?;
        }
    }

    fn next_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Run the locals listing and the breakpoint's own commands
    ///
    /// Results are appended as they arrive, so a failure part way through
    /// keeps the inspections already made.
    async fn inspect(&mut self, breakpoint: u32, inspections: &mut Vec<Inspection>) -> Result<()> {
        let commands: Vec<String> = std::iter::once(self.locals_command.clone())
            .chain(
                self.registry
                    .get(breakpoint)
                    .map(|bp| bp.extra_commands.clone())
                    .unwrap_or_default(),
            )
            .collect();

        for command in commands {
            let result = self.io.command(&command).await?;
            inspections.push(Inspection {
                command,
                result: result.trim_end().to_string(),
            });
        }
        Ok(())
    }

    async fn on_hit(&mut self, hit: BreakpointHit) -> Result<String> {
        let depth = hit.backtrace.len();
        let current_depth = self.open.last().map(CallNode::depth);
        let is_deeper = current_depth.map_or(true, |current| current < depth);
        let is_explicit = self.registry.is_explicit(hit.id);

        if is_deeper || is_explicit {
            let id = self.next_node_id();
            let mut node = CallNode::new(id, hit.id, hit.call_label, hit.backtrace);
            let inspected = if is_explicit {
                self.inspect(hit.id, &mut node.inspections).await
            } else {
                Ok(())
            };

            // Attached even if an inspection failed
            self.trace.hits.entry(hit.id).or_default().push(id);
            if is_deeper {
                tracing::debug!(node = %id, depth, "Entered call");
                self.open.push(node);
            } else if let Some(current) = self.open.last_mut() {
                tracing::debug!(node = %id, parent = %current.id, depth, "Repeated hit at same depth");
                node.return_value = Some(ReturnValue::Duplicate);
                current.children.push(node);
            }
            inspected?;
        } else if let Some(current) = self.open.last() {
            if current.depth() > depth {
                return Err(Error::InvalidBacktrace {
                    breakpoint: hit.id,
                    node: current.id.0,
                    current: current.depth(),
                    reported: depth,
                });
            }
            tracing::debug!(breakpoint = hit.id, depth, "Ignoring same-depth replay");
        }

        self.io.command("finish").await
    }

    async fn on_return(
        &mut self,
        value: Option<String>,
        emitter: &mut dyn Emitter,
    ) -> Result<String> {
        let mut node = self
            .open
            .pop()
            .ok_or_else(|| Error::UnexpectedReturn(value.clone().unwrap_or_else(|| "void".into())))?;
        node.return_value = Some(value.map_or(ReturnValue::Void, ReturnValue::Value));

        let Some(parent) = self.open.last_mut() else {
            tracing::info!(root = %node.id, calls = node.subtree_size(), "Call tree complete");
            emitter.root_finalized(&node)?;
            self.trace.roots.push(node);
            return self.io.command("continue").await;
        };

        let (node_id, depth) = (node.id, node.depth());
        parent.children.push(node);

        // Frames between the parent and the returned call that finish
        // stepped out into without a breakpoint of their own
        let skipped = depth
            .checked_sub(parent.depth() + 1)
            .ok_or(Error::InvalidNextFrame {
                node: node_id.0,
                parent: parent.id.0,
                depth,
                parent_depth: parent.depth(),
            })?;

        if skipped > 0 {
            tracing::debug!(node = %node_id, skipped, "Selecting caller frame");
            self.io.command(&format!("frame {skipped}")).await?;
        }
        self.io.command("finish").await
    }

    /// Fold every still-open call into its parent and emit the root
    fn finalize_open(&mut self, emitter: &mut dyn Emitter) -> Result<()> {
        let Some(mut node) = self.open.pop() else {
            return Ok(());
        };
        while let Some(mut parent) = self.open.pop() {
            parent.children.push(node);
            node = parent;
        }

        tracing::warn!(root = %node.id, "Finalizing calls left open at session end");
        emitter.root_finalized(&node)?;
        self.trace.roots.push(node);
        Ok(())
    }
}
