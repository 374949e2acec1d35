use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::graph::{GraphEdge, GraphNode, Labels, Properties};

/// A node id as written in a dump. Exports of some stores write ids as
/// strings, so both `3` and `"3"` are accepted; output is always an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(pub i64);

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Int(i) => Ok(RecordId(i)),
            RawId::Text(s) => s.trim().parse().map(RecordId).map_err(|_| {
                de::Error::custom(format!("id value ({}) doesn't correspond to an integer", s))
            }),
        }
    }
}

/// One end of a relationship record. Extra fields (such as the end node's
/// labels) are ignored on input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: RecordId,
}

impl From<i64> for Endpoint {
    fn from(id: i64) -> Self {
        Endpoint { id: RecordId(id) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DumpRecord {
    Node {
        id: RecordId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        labels: Option<Labels>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        properties: Option<Properties>,
    },
    Relationship {
        /// Written on export only. Input relationship ids are ignored, since
        /// other stores may use ids that are not integers.
        #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
        id: Option<RecordId>,
        label: String,
        start: Endpoint,
        end: Endpoint,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        properties: Option<Properties>,
    },
}

impl DumpRecord {
    pub fn node_id(&self) -> Option<i64> {
        match self {
            DumpRecord::Node { id, .. } => Some(id.0),
            DumpRecord::Relationship { .. } => None,
        }
    }

    pub fn property_count(&self) -> usize {
        match self {
            DumpRecord::Node { properties, .. } | DumpRecord::Relationship { properties, .. } => {
                properties.as_ref().map_or(0, |p| p.len())
            }
        }
    }
}

impl From<GraphNode> for DumpRecord {
    fn from(node: GraphNode) -> Self {
        DumpRecord::Node {
            id: RecordId(node.id.0),
            labels: Some(node.labels),
            properties: Some(node.properties),
        }
    }
}

impl From<GraphEdge> for DumpRecord {
    fn from(edge: GraphEdge) -> Self {
        DumpRecord::Relationship {
            id: Some(RecordId(edge.id)),
            label: edge.rel_name,
            start: Endpoint::from(edge.from.0),
            end: Endpoint::from(edge.to.0),
            properties: if edge.properties.is_empty() {
                None
            } else {
                Some(edge.properties)
            },
        }
    }
}

/// Result of an export: counts plus the dump itself as a JSON array string.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportSummary {
    pub nodes: usize,
    pub relationships: usize,
    pub properties: usize,
    pub data: String,
}
