//! Breakpoint Registry
//!
//! Owns the breakpoint-id to metadata mapping. Ids are whatever the debugger
//! assigns; they are not assumed to be contiguous.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::common::{Error, Result};
use crate::gdb::DebuggerIo;

use super::specifier::BreakpointClause;

/// `Breakpoint 3 at 0x1149: file t.c, line 3.` or `Breakpoint 3 (foo) pending.`
///
/// Locations without debug info have no trailing period: `Breakpoint 3 at 0x1030`
static CONFIRMATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Breakpoint (\d+) (?:at (.+?)|\((.+)\) pending)\.?$").expect("valid regex")
});

/// `<function, no debug info> strlen;`
static NO_DEBUG_SYMBOL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<function, no debug info> ([^\s;]+);$").expect("valid regex")
});

/// The identifier right before the first `(` of a signature line
static SIGNATURE_SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z_][\w:~<>]*)\s*\(").expect("valid regex"));

/// A debugger breakpoint and what to do when it is hit
#[derive(Debug, Clone, Serialize)]
pub struct Breakpoint {
    /// Debugger-assigned id
    pub id: u32,
    /// Debugger-native location description
    pub location: String,
    /// Commands to run on every hit, after the locals listing
    pub extra_commands: Vec<String>,
    /// Set from an explicit specifier clause rather than a symbol pattern
    pub is_explicit: bool,
    /// Wildcard match that was excluded after creation
    pub is_disabled: bool,
    /// Matched symbol name (wildcard breakpoints only)
    pub display_name: Option<String>,
}

/// A confirmation line parsed out of a break command's response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub id: u32,
    pub location: String,
}

impl Confirmation {
    /// Parse a single line; `None` if it is not a confirmation
    pub fn parse(line: &str) -> Option<Self> {
        let caps = CONFIRMATION.captures(line.trim())?;
        let id = caps[1].parse().ok()?;
        let location = match (caps.get(2), caps.get(3)) {
            (Some(at), _) => at.as_str().to_string(),
            (None, Some(pending)) => format!("{} (pending)", pending.as_str()),
            (None, None) => return None,
        };
        Some(Self { id, location })
    }
}

/// Extract a symbol name from a signature line such as `int foo(int);`
pub fn symbol_from_signature(line: &str) -> Option<String> {
    NO_DEBUG_SYMBOL
        .captures(line.trim())
        .or_else(|| SIGNATURE_SYMBOL.captures(line))
        .map(|caps| caps[1].to_string())
}

/// All breakpoints registered for a session
#[derive(Debug, Default)]
pub struct BreakpointRegistry {
    breakpoints: BTreeMap<u32, Breakpoint>,
}

impl BreakpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a breakpoint for one explicit specifier clause
    pub async fn register_explicit<D: DebuggerIo + ?Sized>(
        &mut self,
        io: &mut D,
        clause: &BreakpointClause,
    ) -> Result<u32> {
        let response = io.command(&format!("break {}", clause.location)).await?;

        let confirmation = response
            .lines()
            .find_map(Confirmation::parse)
            .ok_or_else(|| Error::breakpoint_failed(&clause.location, &response))?;

        tracing::info!(
            id = confirmation.id,
            location = %confirmation.location,
            commands = clause.commands.len(),
            "Explicit breakpoint set"
        );

        self.breakpoints.insert(
            confirmation.id,
            Breakpoint {
                id: confirmation.id,
                location: confirmation.location,
                extra_commands: clause.commands.clone(),
                is_explicit: true,
                is_disabled: false,
                display_name: None,
            },
        );
        Ok(confirmation.id)
    }

    /// Set breakpoints on every function matching `pattern`
    ///
    /// The response interleaves a confirmation per match with the matched
    /// function's signature. Matches whose symbol matches `exclude` are
    /// disabled right away (there is no cheaper way to undo a match) but
    /// stay registered so they show up in the summary with zero hits.
    pub async fn register_wildcard<D: DebuggerIo + ?Sized>(
        &mut self,
        io: &mut D,
        pattern: &str,
        exclude: Option<&Regex>,
    ) -> Result<Vec<u32>> {
        let response = io.command(&format!("rbreak {pattern}")).await?;
        let lines: Vec<&str> = response.lines().collect();

        let mut ids = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            let Some(confirmation) = Confirmation::parse(line) else {
                continue;
            };

            let display_name = lines[index + 1..]
                .iter()
                .take_while(|l| Confirmation::parse(l).is_none())
                .find_map(|l| symbol_from_signature(l));

            let excluded = match (exclude, display_name.as_deref()) {
                (Some(re), Some(name)) => re.is_match(name),
                _ => false,
            };

            if excluded {
                io.command(&format!("disable {}", confirmation.id)).await?;
                tracing::warn!(
                    id = confirmation.id,
                    symbol = display_name.as_deref().unwrap_or("?"),
                    "Wildcard match excluded and disabled"
                );
            } else {
                tracing::debug!(
                    id = confirmation.id,
                    symbol = display_name.as_deref().unwrap_or("?"),
                    "Wildcard breakpoint set"
                );
            }

            self.breakpoints.insert(
                confirmation.id,
                Breakpoint {
                    id: confirmation.id,
                    location: confirmation.location,
                    extra_commands: Vec::new(),
                    is_explicit: false,
                    is_disabled: excluded,
                    display_name,
                },
            );
            ids.push(confirmation.id);
        }

        tracing::info!(pattern, matched = ids.len(), "Wildcard breakpoints set");
        Ok(ids)
    }

    pub fn get(&self, id: u32) -> Option<&Breakpoint> {
        self.breakpoints.get(&id)
    }

    /// Whether `id` was set from an explicit clause
    pub fn is_explicit(&self, id: u32) -> bool {
        self.breakpoints.get(&id).is_some_and(|bp| bp.is_explicit)
    }

    /// All breakpoints in id order
    pub fn iter(&self) -> impl Iterator<Item = &Breakpoint> {
        self.breakpoints.values()
    }

    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }
}
