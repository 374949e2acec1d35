use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{NodeportError, Result};
use crate::graph::{GraphEdge, GraphNode, Labels, NodeId, Properties};

/// Decode a JSON text column, reporting failures as a column conversion error.
fn json_column<T: serde::de::DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Map a row to GraphNode. Expects columns: id, labels, properties
fn map_row_to_node(row: &Row) -> rusqlite::Result<GraphNode> {
    Ok(GraphNode {
        id: NodeId(row.get(0)?),
        labels: json_column::<Labels>(row, 1)?,
        properties: json_column::<Properties>(row, 2)?,
    })
}

/// Map a row to GraphEdge. Expects columns: id, from_id, to_id, name, properties
fn map_row_to_edge(row: &Row) -> rusqlite::Result<GraphEdge> {
    Ok(GraphEdge {
        id: row.get(0)?,
        from: NodeId(row.get(1)?),
        to: NodeId(row.get(2)?),
        rel_name: row.get(3)?,
        properties: json_column::<Properties>(row, 4)?,
    })
}

pub struct Repository<'a> {
    conn: &'a Connection,
}

impl<'a> Repository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Repository { conn }
    }

    pub fn insert_node(&self, labels: &Labels, properties: &Properties) -> Result<NodeId> {
        self.conn.execute(
            "INSERT INTO nodes (labels, properties) VALUES (?1, ?2)",
            params![
                serde_json::to_string(labels)?,
                serde_json::to_string(properties)?
            ],
        )?;

        Ok(NodeId(self.conn.last_insert_rowid()))
    }

    pub fn insert_relationship(
        &self,
        from: NodeId,
        to: NodeId,
        name: &str,
        properties: &Properties,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO relationships (from_id, to_id, name, properties)
             VALUES (?1, ?2, ?3, ?4)",
            params![from.0, to.0, name, serde_json::to_string(properties)?],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    pub fn node_exists(&self, id: NodeId) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM nodes WHERE id = ?1)",
            params![id.0],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn relationship_exists(&self, from: NodeId, to: NodeId, name: &str) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM relationships WHERE from_id = ?1 AND to_id = ?2 AND name = ?3)",
            params![from.0, to.0, name],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Fail with `NodeNotFound` unless the node exists.
    pub fn require_node(&self, id: NodeId) -> Result<()> {
        if self.node_exists(id)? {
            Ok(())
        } else {
            Err(NodeportError::NodeNotFound { id })
        }
    }

    pub fn get_node_by_id(&self, id: NodeId) -> Result<Option<GraphNode>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, labels, properties FROM nodes WHERE id = ?1",
                params![id.0],
                map_row_to_node,
            )
            .optional()?;

        Ok(result)
    }

    pub fn load_all_nodes(&self) -> Result<Vec<GraphNode>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, labels, properties FROM nodes ORDER BY id")?;

        let rows = stmt.query_map([], map_row_to_node)?;

        let mut nodes = Vec::new();
        for row in rows {
            nodes.push(row?);
        }
        Ok(nodes)
    }

    pub fn load_all_relationships(&self) -> Result<Vec<GraphEdge>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, from_id, to_id, name, properties
             FROM relationships ORDER BY id",
        )?;

        let rows = stmt.query_map([], map_row_to_edge)?;

        let mut edges = Vec::new();
        for row in rows {
            edges.push(row?);
        }
        Ok(edges)
    }

    /// Relationships leaving a node, in creation order
    pub fn get_outgoing(&self, node_id: NodeId) -> Result<Vec<GraphEdge>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, from_id, to_id, name, properties
             FROM relationships WHERE from_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![node_id.0], map_row_to_edge)?;

        let mut edges = Vec::new();
        for row in rows {
            edges.push(row?);
        }
        Ok(edges)
    }

    pub fn count_nodes(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn count_relationships(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM relationships", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Replace the stored property map of a node
    pub fn update_properties(&self, node_id: NodeId, properties: &Properties) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE nodes SET properties = ?1 WHERE id = ?2",
            params![serde_json::to_string(properties)?, node_id.0],
        )?;
        if changed == 0 {
            return Err(NodeportError::NodeNotFound { id: node_id });
        }
        Ok(())
    }
}
