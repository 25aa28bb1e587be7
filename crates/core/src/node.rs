//! Logical node descriptors.
//!
//! A [`NodeInfo`] identifies one benchmark process (server or driver)
//! bound to a physical host. The dispatch engine only reads
//! [`NodeInfo::host`]; every other field belongs to the worker that
//! mutates it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Category of a logical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Server,
    Driver,
}

impl NodeType {
    /// All node types in start order (servers before drivers).
    pub const ALL: [NodeType; 2] = [NodeType::Server, NodeType::Driver];

    /// Lowercase label, e.g. `"server"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Driver => "driver",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(Self::Server),
            "driver" => Ok(Self::Driver),
            other => Err(CoreError::Validation(format!("Unknown node type: {other}"))),
        }
    }
}

/// Lifecycle state of a node as last observed by a worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    NotStarted,
    Running,
    Stopped,
    Failed,
}

/// A logical node: one benchmark process on one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub host: String,
    pub node_type: NodeType,
    /// Unique within its node type.
    pub id: String,
    pub status: NodeStatus,
    /// Process id once discovered on the host.
    pub pid: Option<u32>,
    /// Docker container id once started.
    pub container_id: Option<String>,
    pub description: Option<String>,
}

impl NodeInfo {
    pub fn new(host: impl Into<String>, node_type: NodeType, id: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            node_type,
            id: id.into(),
            status: NodeStatus::NotStarted,
            pid: None,
            container_id: None,
            description: None,
        }
    }

    /// Docker container name for this node, e.g. `YARDSTICK_SERVER_0`.
    pub fn container_name(&self) -> String {
        format!(
            "YARDSTICK_{}_{}",
            self.node_type.as_str().to_ascii_uppercase(),
            self.id
        )
    }

    /// Short label used in log fields, e.g. `server-0@10.0.0.1`.
    pub fn label(&self) -> String {
        format!("{}-{}@{}", self.node_type, self.id, self.host)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn node_type_parses_case_insensitively() {
        assert_eq!("Server".parse::<NodeType>().unwrap(), NodeType::Server);
        assert_eq!(" driver ".parse::<NodeType>().unwrap(), NodeType::Driver);
        assert_matches!("client".parse::<NodeType>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn container_name_uses_uppercase_type() {
        let node = NodeInfo::new("10.0.0.1", NodeType::Driver, "3");
        assert_eq!(node.container_name(), "YARDSTICK_DRIVER_3");
        assert_eq!(node.label(), "driver-3@10.0.0.1");
    }

    #[test]
    fn new_node_has_no_runtime_state() {
        let node = NodeInfo::new("h", NodeType::Server, "0");
        assert_eq!(node.status, NodeStatus::NotStarted);
        assert!(node.pid.is_none());
        assert!(node.container_id.is_none());
    }

    #[test]
    fn node_serializes_with_lowercase_type() {
        let mut node = NodeInfo::new("h", NodeType::Server, "0");
        node.status = NodeStatus::Running;
        let json = serde_json::to_value(&node).expect("serialize");
        assert_eq!(json["node_type"], "server");
        assert_eq!(json["status"], "running");
        assert!(json["pid"].is_null());
    }
}
