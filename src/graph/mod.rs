pub mod memory;

#[cfg(test)]
pub mod testing;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::exchange::DumpRecord;
use crate::value::Literal;

pub use memory::MemoryGraph;

/// Store-assigned node identifier. Not stable across stores or sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type Properties = BTreeMap<String, Literal>;

/// Ordered, duplicate-free set of node labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Labels(Vec<String>);

impl Labels {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for label in labels {
            let label = label.into();
            if !out.contains(&label) {
                out.push(label);
            }
        }
        Labels(out)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Name used when these labels double as a relationship name.
    pub fn relation_name(&self) -> String {
        self.0.join("_")
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0.join(":"))
    }
}

impl From<&str> for Labels {
    fn from(label: &str) -> Self {
        Labels::new([label])
    }
}

impl From<String> for Labels {
    fn from(label: String) -> Self {
        Labels::new([label])
    }
}

impl From<Vec<String>> for Labels {
    fn from(labels: Vec<String>) -> Self {
        Labels::new(labels)
    }
}

impl From<Labels> for Vec<String> {
    fn from(labels: Labels) -> Self {
        labels.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// From the newly created node to the linked one.
    #[default]
    Out,
    /// From the linked node to the newly created one.
    In,
}

/// A relationship to an existing node, requested while creating a new node.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub node: NodeId,
    pub rel_name: String,
    pub direction: Direction,
    pub properties: Properties,
}

impl Link {
    pub fn out(node: NodeId, rel_name: impl Into<String>) -> Self {
        Link {
            node,
            rel_name: rel_name.into(),
            direction: Direction::Out,
            properties: Properties::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub labels: Labels,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub id: i64,
    pub from: NodeId,
    pub to: NodeId,
    pub rel_name: String,
    pub properties: Properties,
}

/// Node and relationship creation primitives consumed by the importers.
///
/// Every call is one independent round trip; implementations provide no
/// transaction spanning several calls.
pub trait GraphStore {
    fn create_node(&mut self, labels: &Labels, properties: &Properties) -> Result<NodeId>;

    /// Create a node and its relationships to existing nodes. If any linked
    /// node is missing, nothing is created.
    fn create_node_with_links(
        &mut self,
        labels: &Labels,
        properties: &Properties,
        links: &[Link],
    ) -> Result<NodeId>;

    /// Add `from -[rel_name]-> to` unless a relationship with that name
    /// already joins the pair.
    fn link_nodes_by_ids(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_name: &str,
        rel_props: &Properties,
    ) -> Result<()>;

    /// Set (create or overwrite) fields on a node. Returns the number set.
    fn set_fields(&mut self, id: NodeId, fields: &Properties) -> Result<usize>;
}

/// Read side used by export.
pub trait GraphSnapshot {
    /// Every node, then every relationship, each in id order.
    fn snapshot(&self) -> Result<Vec<DumpRecord>>;
}

pub(crate) fn check_rel_name(rel_name: &str) -> Result<()> {
    if rel_name.is_empty() {
        return Err(crate::error::NodeportError::Store(
            "relationship name must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_dedup_keeps_order() {
        let labels = Labels::new(["b", "a", "b", "c"]);
        assert_eq!(labels.as_slice(), &["b", "a", "c"]);
    }

    #[test]
    fn test_labels_relation_name() {
        assert_eq!(Labels::from("items").relation_name(), "items");
        assert_eq!(Labels::new(["A", "B"]).relation_name(), "A_B");
    }

    #[test]
    fn test_labels_display() {
        assert_eq!(Labels::new(["Person", "Admin"]).to_string(), ":Person:Admin");
    }

    #[test]
    fn test_labels_serde_as_list() {
        let labels: Labels = serde_json::from_str(r#"["X","Y","X"]"#).unwrap();
        assert_eq!(labels.as_slice(), &["X", "Y"]);
        assert_eq!(serde_json::to_string(&labels).unwrap(), r#"["X","Y"]"#);
    }
}
