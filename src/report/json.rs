//! JSON report
//!
//! The call forest is written as a flat node list in pre-order. Each node
//! names its parent and children by id, so the document nests no deeper
//! than a single node however deep the target recursed.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use crate::common::{Error, Result};
use crate::trace::{CallNode, FlatHit, Inspection, NodeId, ReturnValue, Trace};

use super::{Emitter, Summary};

#[derive(Serialize)]
struct JsonError {
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct JsonNode<'a> {
    id: NodeId,
    parent: Option<NodeId>,
    /// Nesting level below the root, 0 for roots
    level: usize,
    breakpoint: u32,
    call_label: &'a str,
    backtrace: &'a [String],
    return_value: Option<&'a ReturnValue>,
    inspections: &'a [Inspection],
    children: Vec<NodeId>,
}

#[derive(Serialize)]
struct JsonTrace<'a> {
    cmdline: &'a str,
    exit_message: Option<&'a str>,
    roots: Vec<NodeId>,
    nodes: Vec<JsonNode<'a>>,
    hits: &'a BTreeMap<u32, Vec<NodeId>>,
    flat_hits: &'a [FlatHit],
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    trace: JsonTrace<'a>,
    summary: &'a Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
}

/// Flatten one tree in pre-order
fn flatten<'a>(root: &'a CallNode, nodes: &mut Vec<JsonNode<'a>>) {
    // Ids of the nodes on the path from the root to the current node
    let mut path: Vec<NodeId> = Vec::new();
    for (node, level) in root.walk() {
        path.truncate(level);
        nodes.push(JsonNode {
            id: node.id,
            parent: path.last().copied(),
            level,
            breakpoint: node.breakpoint,
            call_label: &node.call_label,
            backtrace: &node.backtrace,
            return_value: node.return_value.as_ref(),
            inspections: &node.inspections,
            children: node.children.iter().map(|child| child.id).collect(),
        });
        path.push(node.id);
    }
}

impl<'a> JsonTrace<'a> {
    fn new(trace: &'a Trace) -> Self {
        let mut nodes = Vec::with_capacity(trace.node_count());
        for root in &trace.roots {
            flatten(root, &mut nodes);
        }
        Self {
            cmdline: &trace.cmdline,
            exit_message: trace.exit_message.as_deref(),
            roots: trace.roots.iter().map(|root| root.id).collect(),
            nodes,
            hits: &trace.hits,
            flat_hits: &trace.flat_hits,
        }
    }
}

/// Writes the whole trace as one document when the session ends
pub struct JsonReport<W: Write> {
    writer: W,
}

impl<W: Write> JsonReport<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Emitter for JsonReport<W> {
    fn session_finished(
        &mut self,
        trace: &Trace,
        summary: &Summary,
        error: Option<&Error>,
    ) -> Result<()> {
        let document = JsonDocument {
            trace: JsonTrace::new(trace),
            summary,
            error: error.map(|e| JsonError {
                code: e.code(),
                message: e.to_string(),
            }),
        };
        serde_json::to_writer_pretty(&mut self.writer, &document)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
