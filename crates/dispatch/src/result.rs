//! Per-target result shapes.

use serde::Serialize;
use yardstick_core::node::NodeInfo;

/// Outcome of a health-check style worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckWorkResult {
    /// `true` tells the orchestrating caller to abort the run.
    pub exit: bool,
}

/// Value produced by one invocation of a worker.
///
/// The dispatchers move these into the result collection without
/// looking at them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkResult {
    #[default]
    Empty,
    Check(CheckWorkResult),
    Node(NodeInfo),
}

impl WorkResult {
    pub fn check(exit: bool) -> Self {
        Self::Check(CheckWorkResult { exit })
    }

    /// `true` only for a check result that asks the caller to abort.
    pub fn exit(&self) -> bool {
        matches!(self, Self::Check(CheckWorkResult { exit: true }))
    }

    pub fn as_node(&self) -> Option<&NodeInfo> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn into_node(self) -> Option<NodeInfo> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }
}

impl From<NodeInfo> for WorkResult {
    fn from(node: NodeInfo) -> Self {
        Self::Node(node)
    }
}

#[cfg(test)]
mod tests {
    use yardstick_core::node::NodeType;

    use super::*;

    #[test]
    fn exit_only_for_aborting_checks() {
        assert!(WorkResult::check(true).exit());
        assert!(!WorkResult::check(false).exit());
        assert!(!WorkResult::Empty.exit());
    }

    #[test]
    fn node_accessors() {
        let node = NodeInfo::new("h", NodeType::Server, "0");
        let res = WorkResult::from(node.clone());
        assert_eq!(res.as_node(), Some(&node));
        assert_eq!(res.into_node(), Some(node));
        assert_eq!(WorkResult::Empty.into_node(), None);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(WorkResult::check(true)).expect("serialize");
        assert_eq!(json["kind"], "check");
        assert_eq!(json["exit"], true);
    }
}
