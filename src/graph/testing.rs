//! Store wrappers for exercising the importers' failure and ordering paths.

use crate::error::{NodeportError, Result};
use crate::graph::{GraphStore, Labels, Link, MemoryGraph, NodeId, Properties};

/// Fails the N-th node creation (1-based) and every link call after
/// `fail_links_after` successful ones, if set. With `fail_fields`, every
/// `set_fields` call fails.
pub struct FlakyStore {
    inner: MemoryGraph,
    fail_node_at: Option<usize>,
    fail_links_after: Option<usize>,
    fail_fields: bool,
    nodes_attempted: usize,
    links_done: usize,
}

impl FlakyStore {
    pub fn failing_at(n: usize) -> Self {
        FlakyStore {
            inner: MemoryGraph::starting_at(500),
            fail_node_at: Some(n),
            fail_links_after: None,
            fail_fields: false,
            nodes_attempted: 0,
            links_done: 0,
        }
    }

    pub fn failing_links_after(n: usize) -> Self {
        FlakyStore {
            inner: MemoryGraph::starting_at(500),
            fail_node_at: None,
            fail_links_after: Some(n),
            fail_fields: false,
            nodes_attempted: 0,
            links_done: 0,
        }
    }

    pub fn failing_fields() -> Self {
        FlakyStore {
            inner: MemoryGraph::starting_at(500),
            fail_node_at: None,
            fail_links_after: None,
            fail_fields: true,
            nodes_attempted: 0,
            links_done: 0,
        }
    }

    pub fn inner(&self) -> &MemoryGraph {
        &self.inner
    }

    fn check_node(&mut self) -> Result<()> {
        self.nodes_attempted += 1;
        if self.fail_node_at == Some(self.nodes_attempted) {
            return Err(NodeportError::Store(format!(
                "injected failure on node creation #{}",
                self.nodes_attempted
            )));
        }
        Ok(())
    }
}

impl GraphStore for FlakyStore {
    fn create_node(&mut self, labels: &Labels, properties: &Properties) -> Result<NodeId> {
        self.check_node()?;
        self.inner.create_node(labels, properties)
    }

    fn create_node_with_links(
        &mut self,
        labels: &Labels,
        properties: &Properties,
        links: &[Link],
    ) -> Result<NodeId> {
        self.check_node()?;
        self.inner.create_node_with_links(labels, properties, links)
    }

    fn link_nodes_by_ids(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_name: &str,
        rel_props: &Properties,
    ) -> Result<()> {
        if self.fail_links_after == Some(self.links_done) {
            return Err(NodeportError::Store("injected failure on link".to_string()));
        }
        self.inner.link_nodes_by_ids(from, to, rel_name, rel_props)?;
        self.links_done += 1;
        Ok(())
    }

    fn set_fields(&mut self, id: NodeId, fields: &Properties) -> Result<usize> {
        if self.fail_fields {
            return Err(NodeportError::Store("injected failure on set_fields".to_string()));
        }
        self.inner.set_fields(id, fields)
    }
}

#[derive(Debug, Clone)]
pub struct CreateCall {
    pub labels: Labels,
    pub properties: Properties,
    pub links: Vec<Link>,
    pub created: NodeId,
}

/// Records every node-creating call in order.
pub struct RecordingStore {
    inner: MemoryGraph,
    calls: Vec<CreateCall>,
}

impl RecordingStore {
    pub fn new() -> Self {
        RecordingStore {
            inner: MemoryGraph::new(),
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[CreateCall] {
        &self.calls
    }
}

impl GraphStore for RecordingStore {
    fn create_node(&mut self, labels: &Labels, properties: &Properties) -> Result<NodeId> {
        self.create_node_with_links(labels, properties, &[])
    }

    fn create_node_with_links(
        &mut self,
        labels: &Labels,
        properties: &Properties,
        links: &[Link],
    ) -> Result<NodeId> {
        let created = self.inner.create_node_with_links(labels, properties, links)?;
        self.calls.push(CreateCall {
            labels: labels.clone(),
            properties: properties.clone(),
            links: links.to_vec(),
            created,
        });
        Ok(created)
    }

    fn link_nodes_by_ids(
        &mut self,
        from: NodeId,
        to: NodeId,
        rel_name: &str,
        rel_props: &Properties,
    ) -> Result<()> {
        self.inner.link_nodes_by_ids(from, to, rel_name, rel_props)
    }

    fn set_fields(&mut self, id: NodeId, fields: &Properties) -> Result<usize> {
        self.inner.set_fields(id, fields)
    }
}
