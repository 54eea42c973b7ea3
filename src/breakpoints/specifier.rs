//! Breakpoint specifier grammar
//!
//! A specifier is a list of clauses separated by top-level commas. Each clause
//! is either a bare `LOCATION` or `CMD1;CMD2@LOCATION`, where the commands are
//! run whenever the breakpoint is hit.
//!
//! Commas inside parentheses belong to the clause (`p f(1,2)@baz.c:22`), and a
//! backslash makes the next character literal, including a comma or another
//! backslash.

use serde::Serialize;

use crate::common::{Error, Result};

/// One explicit breakpoint request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakpointClause {
    /// Debugger-native location (`file.c:22`, `foo`, `*0x1149`)
    pub location: String,
    /// Commands to run on every hit, in order
    pub commands: Vec<String>,
}

impl BreakpointClause {
    /// Interpret one already-unescaped clause
    ///
    /// The location follows the last `@`, so commands may use gdb's own
    /// `array@len` syntax.
    fn from_text(spec: &str, text: &str) -> Result<Self> {
        let (commands, location) = match text.rsplit_once('@') {
            Some((commands, location)) => (Some(commands), location),
            None => (None, text),
        };

        let location = location.trim();
        if location.is_empty() {
            return Err(Error::malformed(spec, &format!("clause '{text}' has no location")));
        }

        let commands = commands
            .map(|c| {
                c.split(';')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            location: location.to_string(),
            commands,
        })
    }
}

/// Split a specifier into raw clause strings
///
/// Escapes are resolved here; the returned strings contain no escape
/// backslashes.
pub fn split_clauses(spec: &str) -> Result<Vec<String>> {
    let mut clauses = Vec::new();
    let mut current = String::new();
    let mut depth: usize = 0;
    let mut escaped = false;

    for (position, ch) in spec.char_indices() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }

        match ch {
            '\\' => escaped = true,
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| Error::UnbalancedParentheses {
                    spec: spec.to_string(),
                    position,
                })?;
                current.push(ch);
            }
            ',' if depth == 0 => clauses.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }

    if depth != 0 {
        return Err(Error::UnbalancedParentheses {
            spec: spec.to_string(),
            position: spec.len(),
        });
    }
    if escaped {
        return Err(Error::malformed(spec, "trailing backslash"));
    }

    clauses.push(current);
    Ok(clauses)
}

/// Parse a full specifier into clauses
pub fn parse(spec: &str) -> Result<Vec<BreakpointClause>> {
    split_clauses(spec)?
        .iter()
        .map(|text| BreakpointClause::from_text(spec, text))
        .collect()
}
