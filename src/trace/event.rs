//! Event Parser
//!
//! Classifies one debugger response into a typed [`Event`]. Classification is
//! a fixed, ordered table of pattern rules; the first rule that matches wins.
//! Changes in the debugger's message format should only ever touch the table.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::common::Result;
use crate::gdb::DebuggerIo;

/// A breakpoint stop, with the stack at that point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointHit {
    /// Debugger breakpoint id
    pub id: u32,
    /// Call text as shown by the debugger, e.g. `foo (n=3)`
    pub call_label: String,
    /// Function name alone
    pub symbol: String,
    /// `file:line` or shared library, when reported
    pub location: Option<String>,
    /// Frame descriptors in debugger order (innermost first)
    pub backtrace: Vec<String>,
}

/// One classified debugger response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    BreakpointHit(BreakpointHit),
    /// A finished frame returned; `None` means no value was reported (void)
    ReturnValue(Option<String>),
    /// `finish` was issued while already in the outermost frame
    OutermostFrame,
    ProgramEnded { message: String },
    Unrecognized { raw: String },
}

struct Rule {
    name: &'static str,
    pattern: Regex,
    build: fn(&Captures<'_>) -> Option<Event>,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, build: fn(&Captures<'_>) -> Option<Event>) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("valid regex"),
            build,
        }
    }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(
            "program-ended",
            r"(?m)^(\[Inferior \d+ \(process \d+\) exited[^\]]*\]|Program terminated with signal .*|Program received signal .*|The program is not being run\.)\s*$",
            |caps| {
                Some(Event::ProgramEnded {
                    message: caps[1].trim().to_string(),
                })
            },
        ),
        Rule::new(
            "breakpoint-hit",
            r#"(?m)^(?:Thread \d+ "[^"]*" hit )?Breakpoint (\d+), (?:0x[0-9a-fA-F]+ in )?((.+?) \(.*\))(?: (?:at|from) (\S+))?\s*$"#,
            |caps| {
                Some(Event::BreakpointHit(BreakpointHit {
                    id: caps[1].parse().ok()?,
                    call_label: caps[2].to_string(),
                    symbol: caps[3].to_string(),
                    location: caps.get(4).map(|m| m.as_str().to_string()),
                    backtrace: Vec::new(),
                }))
            },
        ),
        Rule::new(
            "value-returned",
            r"(?s)Value returned is \$\d+ = (.*)",
            |caps| Some(Event::ReturnValue(Some(caps[1].trim().to_string()))),
        ),
        Rule::new("run-till-exit", r"(?m)^Run till exit from ", |_| {
            Some(Event::ReturnValue(None))
        }),
        Rule::new(
            "outermost-frame",
            r#""finish" not meaningful in the outermost frame\."#,
            |_| Some(Event::OutermostFrame),
        ),
    ]
});

/// Classify a response without talking to the debugger
///
/// Breakpoint hits come back with an empty backtrace.
pub fn classify(raw: &str) -> Event {
    for rule in RULES.iter() {
        if let Some(event) = rule.pattern.captures(raw).and_then(|caps| (rule.build)(&caps)) {
            tracing::trace!(rule = rule.name, "Response classified");
            return event;
        }
    }
    Event::Unrecognized {
        raw: raw.to_string(),
    }
}

/// Split a backtrace listing into frame descriptors
///
/// Each frame starts with `#<n>`; wrapped continuation lines are folded into
/// the frame before them. The descriptors are only compared by count, so
/// they are kept as printed.
pub fn split_backtrace(text: &str) -> Vec<String> {
    let mut frames: Vec<String> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            frames.push(trimmed.to_string());
        } else if trimmed.is_empty() || trimmed.starts_with("(More stack frames follow") {
            continue;
        } else if let Some(last) = frames.last_mut() {
            last.push(' ');
            last.push_str(trimmed);
        }
    }
    frames
}

/// Turns raw responses into events, fetching a backtrace for every hit
#[derive(Debug, Clone)]
pub struct EventParser {
    backtrace_command: String,
}

impl EventParser {
    pub fn new(backtrace_command: impl Into<String>) -> Self {
        Self {
            backtrace_command: backtrace_command.into(),
        }
    }

    /// Classify `raw`; on a breakpoint hit, also capture the current backtrace
    pub async fn next_event<D: DebuggerIo + ?Sized>(&self, io: &mut D, raw: &str) -> Result<Event> {
        let mut event = classify(raw);
        if let Event::BreakpointHit(hit) = &mut event {
            let listing = io.command(&self.backtrace_command).await?;
            hit.backtrace = split_backtrace(&listing);
            tracing::debug!(
                breakpoint = hit.id,
                call = %hit.call_label,
                depth = hit.backtrace.len(),
                "Breakpoint hit"
            );
        }
        Ok(event)
    }
}

impl Default for EventParser {
    fn default() -> Self {
        Self::new("backtrace")
    }
}
