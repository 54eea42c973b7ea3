//! Plain-text outline report

use std::fmt::Write as _;
use std::io::Write;

use crate::common::{Error, Result};
use crate::trace::{CallNode, Trace};

use super::{Emitter, Summary, SummaryRow};

/// Render one call tree as an indented outline
///
/// Calls cut off by program exit show `?` as their return value.
pub fn render_tree(root: &CallNode) -> String {
    let mut out = String::new();
    for (node, level) in root.walk() {
        let indent = "  ".repeat(level);
        let returned = node
            .return_value
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "?".to_string());
        let _ = writeln!(out, "{indent}{} {} => {}", node.id, node.call_label, returned);

        for inspection in &node.inspections {
            let _ = writeln!(out, "{indent}  | {}", inspection.command);
            for line in inspection.result.lines() {
                let _ = writeln!(out, "{indent}  |   {line}");
            }
        }
    }
    out
}

fn render_rows(out: &mut String, title: &str, rows: &[SummaryRow]) {
    if rows.is_empty() {
        return;
    }
    let _ = writeln!(out, "== {title}");
    for row in rows {
        let name = row.symbol.as_deref().unwrap_or("-");
        let disabled = if row.disabled { " (disabled)" } else { "" };
        let ids = row
            .hits
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(
            out,
            "  bp {:<4} hits {:<5} {} @ {}{}{}{}",
            row.breakpoint,
            row.hits.len(),
            name,
            row.location,
            disabled,
            if ids.is_empty() { "" } else { "  " },
            ids
        );
    }
}

/// Render both summary tables
pub fn render_summary(summary: &Summary) -> String {
    let mut out = String::new();
    render_rows(&mut out, "Explicit breakpoints", &summary.explicit);
    render_rows(&mut out, "Symbol breakpoints", &summary.symbols);
    out
}

/// Streams the outline to a writer, one root at a time
pub struct TextReport<W: Write> {
    writer: W,
}

impl<W: Write> TextReport<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> Emitter for TextReport<W> {
    fn session_started(&mut self, cmdline: &str) -> Result<()> {
        self.write(&format!("== Session: {cmdline}\n"))
    }

    fn root_finalized(&mut self, root: &CallNode) -> Result<()> {
        self.write(&render_tree(root))
    }

    fn session_finished(
        &mut self,
        trace: &Trace,
        summary: &Summary,
        error: Option<&Error>,
    ) -> Result<()> {
        let mut out = String::new();

        for hit in &trace.flat_hits {
            let _ = writeln!(
                out,
                "{} bp {} {} @ {}",
                hit.id,
                hit.breakpoint,
                hit.call_label,
                hit.location.as_deref().unwrap_or("?")
            );
        }

        if let Some(message) = &trace.exit_message {
            let _ = writeln!(out, "== Exit: {message}");
        }
        out.push_str(&render_summary(summary));

        if let Some(error) = error {
            let _ = writeln!(out, "!! ERROR [{}]", error.code());
            for line in error.to_string().lines() {
                let _ = writeln!(out, "!!   {line}");
            }
        }

        self.write(&out)
    }
}
