use rusqlite::Connection;
use std::collections::BTreeMap;

use crate::config::StorageConfig;
use crate::db::{Repository, run_migrations};
use crate::error::{NodeportError, Result};
use crate::exchange::DumpRecord;
use crate::graph::{
    Direction, GraphEdge, GraphNode, GraphSnapshot, GraphStore, Labels, Link, NodeId, Properties,
    check_rel_name,
};

/// Graph store persisted in SQLite. Node ids are SQLite rowids.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(config: &StorageConfig) -> Result<Self> {
        config.ensure_dirs_exist()?;

        let mut conn = Connection::open(&config.db_path)?;
        run_migrations(&mut conn)?;

        Ok(SqliteStore { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        run_migrations(&mut conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn get_node(&self, id: NodeId) -> Result<Option<GraphNode>> {
        Repository::new(&self.conn).get_node_by_id(id)
    }

    pub fn outgoing(&self, id: NodeId) -> Result<Vec<GraphEdge>> {
        Repository::new(&self.conn).get_outgoing(id)
    }

    pub fn node_count(&self) -> Result<usize> {
        Repository::new(&self.conn).count_nodes()
    }

    pub fn relationship_count(&self) -> Result<usize> {
        Repository::new(&self.conn).count_relationships()
    }

    /// Number of nodes carrying each label, sorted by label.
    pub fn label_counts(&self) -> Result<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        for node in Repository::new(&self.conn).load_all_nodes()? {
            for label in node.labels.as_slice() {
                *counts.entry(label.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

impl GraphStore for SqliteStore {
    fn create_node(&mut self, labels: &Labels, properties: &Properties) -> Result<NodeId> {
        Repository::new(&self.conn).insert_node(labels, properties)
    }

    fn create_node_with_links(
        &mut self,
        labels: &Labels,
        properties: &Properties,
        links: &[Link],
    ) -> Result<NodeId> {
        let tx = self.conn.transaction()?;
        let id = {
            let repo = Repository::new(&tx);
            for link in links {
                check_rel_name(&link.rel_name)?;
                repo.require_node(link.node)?;
            }

            let id = repo.insert_node(labels, properties)?;
            for link in links {
                let (from, to) = match link.direction {
                    Direction::Out => (id, link.node),
                    Direction::In => (link.node, id),
                };
                repo.insert_relationship(from, to, &link.rel_name, &link.properties)?;
            }
            id
        };
        tx.commit()?;
        Ok(id)
    }

    fn link_nodes_by_ids(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_name: &str,
        rel_props: &Properties,
    ) -> Result<()> {
        check_rel_name(rel_name)?;
        let repo = Repository::new(&self.conn);
        repo.require_node(from)?;
        repo.require_node(to)?;

        if !repo.relationship_exists(from, to, rel_name)? {
            repo.insert_relationship(from, to, rel_name, rel_props)?;
        }
        Ok(())
    }

    fn set_fields(&mut self, id: NodeId, fields: &Properties) -> Result<usize> {
        let repo = Repository::new(&self.conn);
        let mut node = repo
            .get_node_by_id(id)?
            .ok_or(NodeportError::NodeNotFound { id })?;

        if fields.is_empty() {
            return Ok(0);
        }
        for (key, value) in fields {
            node.properties.insert(key.clone(), value.clone());
        }
        repo.update_properties(id, &node.properties)?;
        Ok(fields.len())
    }
}

impl GraphSnapshot for SqliteStore {
    fn snapshot(&self) -> Result<Vec<DumpRecord>> {
        let repo = Repository::new(&self.conn);
        let mut records: Vec<DumpRecord> = repo
            .load_all_nodes()?
            .into_iter()
            .map(DumpRecord::from)
            .collect();
        records.extend(
            repo.load_all_relationships()?
                .into_iter()
                .map(DumpRecord::from),
        );
        Ok(records)
    }
}
