//! Call tree data model
//!
//! Children are owned top-down. The parent of an open node is the node
//! below it on the session's open-call stack, so no node ever holds a
//! reference to its parent.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Monotonic node id, assigned once at creation and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a call ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ReturnValue {
    Value(String),
    Void,
    /// Repeated hit at unchanged depth; never became the active frame
    Duplicate,
}

impl fmt::Display for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Void => write!(f, "void"),
            Self::Duplicate => write!(f, "(duplicate)"),
        }
    }
}

/// Output of one inspection command run at an explicit breakpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inspection {
    pub command: String,
    pub result: String,
}

/// One observed call
///
/// Not `Serialize`: nesting depth follows the target's recursion, so
/// serializers flatten the tree through [`CallNode::walk`] instead.
#[derive(Debug, Clone)]
pub struct CallNode {
    pub id: NodeId,
    /// Breakpoint that produced this node
    pub breakpoint: u32,
    pub call_label: String,
    /// Stack snapshot at the hit, innermost frame first
    pub backtrace: Vec<String>,
    pub children: Vec<CallNode>,
    /// Unset while the call is open, and for calls cut off by program exit
    pub return_value: Option<ReturnValue>,
    pub inspections: Vec<Inspection>,
}

impl CallNode {
    pub fn new(id: NodeId, breakpoint: u32, call_label: String, backtrace: Vec<String>) -> Self {
        Self {
            id,
            breakpoint,
            call_label,
            backtrace,
            children: Vec::new(),
            return_value: None,
            inspections: Vec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.backtrace.len()
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self.return_value, Some(ReturnValue::Duplicate))
    }

    /// Pre-order walk of this subtree with each node's nesting level
    ///
    /// Iterative, so pathological recursion in the target cannot overflow
    /// our own stack.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(self, 0)],
        }
    }

    /// Number of nodes in this subtree
    pub fn subtree_size(&self) -> usize {
        self.walk().count()
    }

    /// Check that every child is deeper than its parent, or a duplicate at
    /// exactly the parent's depth. Returns the first offending child.
    pub fn find_depth_violation(&self) -> Option<NodeId> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            for child in &node.children {
                let ok = if child.is_duplicate() {
                    child.depth() == node.depth()
                } else {
                    child.depth() > node.depth()
                };
                if !ok {
                    return Some(child.id);
                }
                stack.push(child);
            }
        }
        None
    }
}

impl Drop for CallNode {
    // The derived drop recurses once per nesting level
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Iterator returned by [`CallNode::walk`]
pub struct Walk<'a> {
    stack: Vec<(&'a CallNode, usize)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (&'a CallNode, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, level) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (child, level + 1)));
        Some((node, level))
    }
}

/// A hit recorded in simple mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatHit {
    pub id: NodeId,
    pub breakpoint: u32,
    pub call_label: String,
    pub location: Option<String>,
}

/// Everything a session observed
#[derive(Debug, Default)]
pub struct Trace {
    /// Debugger launch command line
    pub cmdline: String,
    /// Finalized root calls in program order
    pub roots: Vec<CallNode>,
    /// Node ids created for each breakpoint, in hit order
    pub hits: BTreeMap<u32, Vec<NodeId>>,
    /// Hits in simple mode, in program order
    pub flat_hits: Vec<FlatHit>,
    /// How the target ended, if it did
    pub exit_message: Option<String>,
}

impl Trace {
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(CallNode::subtree_size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64, depth: usize) -> CallNode {
        CallNode::new(
            NodeId(id),
            1,
            format!("f{id} ()"),
            (0..depth).map(|i| format!("#{i}")).collect(),
        )
    }

    #[test]
    fn test_walk_is_preorder_with_levels() {
        let mut root = node(1, 2);
        let mut mid = node(2, 3);
        mid.children.push(node(3, 4));
        root.children.push(mid);
        root.children.push(node(4, 3));

        let order: Vec<(u64, usize)> = root.walk().map(|(n, l)| (n.id.0, l)).collect();
        assert_eq!(order, vec![(1, 0), (2, 1), (3, 2), (4, 1)]);
        assert_eq!(root.subtree_size(), 4);
    }

    #[test]
    fn test_depth_violation() {
        let mut root = node(1, 2);
        let mut dup = node(2, 2);
        dup.return_value = Some(ReturnValue::Duplicate);
        root.children.push(dup);
        root.children.push(node(3, 5));
        assert_eq!(root.find_depth_violation(), None);

        root.children.push(node(4, 2));
        assert_eq!(root.find_depth_violation(), Some(NodeId(4)));
    }

    #[test]
    fn test_walk_handles_deep_chains() {
        let mut current = node(50_000, 0);
        for id in (1..50_000u64).rev() {
            let mut parent = node(id, 0);
            parent.children.push(current);
            current = parent;
        }
        assert_eq!(current.walk().count(), 50_000);
        assert_eq!(current.walk().last().map(|(_, level)| level), Some(49_999));
        drop(current);
    }
}
