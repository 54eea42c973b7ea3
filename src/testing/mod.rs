//! Scripted debugger doubles
//!
//! Lets the session, the registry and the full binary be exercised against
//! recorded gdb conversations instead of a live debugger.

mod script;
mod scripted;

pub use script::{Script, ScriptStep};
pub use scripted::ScriptedDebugger;
