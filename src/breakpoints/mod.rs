//! Breakpoint specifiers and the per-session breakpoint registry

pub mod registry;
pub mod specifier;

pub use registry::{Breakpoint, BreakpointRegistry};
pub use specifier::BreakpointClause;
