//! Call tracing: response classification, the call tree and the session
//! state machine that builds it.

pub mod event;
mod session;
mod tree;

pub use event::{BreakpointHit, Event, EventParser};
pub use session::TraceSession;
pub use tree::{CallNode, FlatHit, Inspection, NodeId, ReturnValue, Trace, Walk};
