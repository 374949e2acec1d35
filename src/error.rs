use thiserror::Error;

use crate::graph::NodeId;

#[derive(Error, Debug)]
pub enum NodeportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Incorrectly-formatted JSON input: {0}")]
    MalformedInput(String),

    #[error("Item in list index {index} is invalid: {reason}. Nothing imported. Item: {record}")]
    Validation {
        index: usize,
        reason: String,
        record: String,
    },

    #[error("cannot add a relationship `{relation}`: no node with id {original_id} was imported")]
    DanglingReference { relation: String, original_id: i64 },

    #[error("Internal error: expected a single root node, got {count}")]
    MultipleRoots { count: usize },

    #[error("Node not found: {id}")]
    NodeNotFound { id: NodeId },

    #[error("Store error: {0}")]
    Store(String),

    #[error("JSON import failed after creating {} node(s): {source}", created.len())]
    PartialImport {
        created: Vec<NodeId>,
        source: Box<NodeportError>,
    },

    #[error(
        "the import process was INTERRUPTED after importing {nodes_imported} node(s) and {rels_imported} relationship(s). Reason: {source}"
    )]
    Interrupted {
        nodes_imported: usize,
        rels_imported: usize,
        created: Vec<NodeId>,
        source: Box<NodeportError>,
    },
}

impl NodeportError {
    /// The innermost error, looking through import/restore wrappers.
    pub fn root_cause(&self) -> &NodeportError {
        match self {
            NodeportError::PartialImport { source, .. }
            | NodeportError::Interrupted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, NodeportError>;
