//! Per-breakpoint hit tables

use serde::Serialize;

use crate::breakpoints::BreakpointRegistry;
use crate::trace::{NodeId, Trace};

/// One breakpoint's line in a summary table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub breakpoint: u32,
    pub location: String,
    /// Symbol name for wildcard breakpoints
    pub symbol: Option<String>,
    pub disabled: bool,
    /// Nodes created for this breakpoint, in hit order
    pub hits: Vec<NodeId>,
}

/// Hits grouped by breakpoint origin, busiest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub explicit: Vec<SummaryRow>,
    pub symbols: Vec<SummaryRow>,
}

impl Summary {
    /// Every registered breakpoint gets a row, including ones never hit
    pub fn build(trace: &Trace, registry: &BreakpointRegistry) -> Self {
        let mut summary = Self::default();

        for bp in registry.iter() {
            let row = SummaryRow {
                breakpoint: bp.id,
                location: bp.location.clone(),
                symbol: bp.display_name.clone(),
                disabled: bp.is_disabled,
                hits: trace.hits.get(&bp.id).cloned().unwrap_or_default(),
            };
            if bp.is_explicit {
                summary.explicit.push(row);
            } else {
                summary.symbols.push(row);
            }
        }

        // Hits on breakpoints gdb created behind our back
        for (&id, hits) in &trace.hits {
            if registry.get(id).is_none() {
                summary.symbols.push(SummaryRow {
                    breakpoint: id,
                    location: "?".to_string(),
                    symbol: None,
                    disabled: false,
                    hits: hits.clone(),
                });
            }
        }

        for rows in [&mut summary.explicit, &mut summary.symbols] {
            rows.sort_by(|a, b| {
                b.hits
                    .len()
                    .cmp(&a.hits.len())
                    .then(a.breakpoint.cmp(&b.breakpoint))
            });
        }
        summary
    }
}
