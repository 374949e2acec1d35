use petgraph::Direction as EdgeDirection;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use crate::error::{NodeportError, Result};
use crate::exchange::DumpRecord;
use crate::graph::{
    Direction, GraphEdge, GraphNode, GraphSnapshot, GraphStore, Labels, Link, NodeId, Properties,
    check_rel_name,
};

#[derive(Debug, Clone)]
struct NodeData {
    id: NodeId,
    labels: Labels,
    properties: Properties,
}

#[derive(Debug, Clone)]
struct EdgeData {
    id: i64,
    rel_name: String,
    properties: Properties,
}

/// In-process graph store. Ids are handed out sequentially, starting from
/// `first_id`, and are never reused.
pub struct MemoryGraph {
    graph: StableGraph<NodeData, EdgeData>,
    id_to_node: HashMap<NodeId, NodeIndex>,
    next_node_id: i64,
    next_edge_id: i64,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// A store whose first node gets `first_id`.
    pub fn starting_at(first_id: i64) -> Self {
        MemoryGraph {
            graph: StableGraph::new(),
            id_to_node: HashMap::new(),
            next_node_id: first_id,
            next_edge_id: 1,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_to_node.contains_key(&id)
    }

    pub fn get_node(&self, id: NodeId) -> Option<GraphNode> {
        let idx = self.id_to_node.get(&id)?;
        self.graph.node_weight(*idx).map(to_graph_node)
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = GraphNode> + '_ {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph.node_weight(idx).map(to_graph_node))
    }

    pub fn iter_edges(&self) -> impl Iterator<Item = GraphEdge> + '_ {
        self.graph.edge_indices().filter_map(|idx| {
            let (source, target) = self.graph.edge_endpoints(idx)?;
            let edge = self.graph.edge_weight(idx)?;
            Some(GraphEdge {
                id: edge.id,
                from: self.graph.node_weight(source)?.id,
                to: self.graph.node_weight(target)?.id,
                rel_name: edge.rel_name.clone(),
                properties: edge.properties.clone(),
            })
        })
    }

    /// Outgoing relationships of a node, optionally restricted to one name.
    pub fn outgoing(&self, id: NodeId, rel_name: Option<&str>) -> Vec<GraphEdge> {
        let Some(&idx) = self.id_to_node.get(&id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, EdgeDirection::Outgoing)
            .filter(|e| rel_name.is_none_or(|name| e.weight().rel_name == name))
            .filter_map(|e| {
                Some(GraphEdge {
                    id: e.weight().id,
                    from: id,
                    to: self.graph.node_weight(e.target())?.id,
                    rel_name: e.weight().rel_name.clone(),
                    properties: e.weight().properties.clone(),
                })
            })
            .collect()
    }

    /// Nodes with no incoming relationship.
    pub fn roots(&self) -> Vec<NodeId> {
        let mut roots: Vec<NodeId> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, EdgeDirection::Incoming)
                    .next()
                    .is_none()
            })
            .filter_map(|idx| self.graph.node_weight(idx).map(|n| n.id))
            .collect();
        roots.sort();
        roots
    }

    fn index_of(&self, id: NodeId) -> Result<NodeIndex> {
        self.id_to_node
            .get(&id)
            .copied()
            .ok_or(NodeportError::NodeNotFound { id })
    }

    fn add_node(&mut self, labels: &Labels, properties: &Properties) -> (NodeId, NodeIndex) {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        let idx = self.graph.add_node(NodeData {
            id,
            labels: labels.clone(),
            properties: properties.clone(),
        });
        self.id_to_node.insert(id, idx);
        (id, idx)
    }

    fn add_edge(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
        rel_name: &str,
        properties: &Properties,
    ) {
        let id = self.next_edge_id;
        self.next_edge_id += 1;
        self.graph.add_edge(
            source,
            target,
            EdgeData {
                id,
                rel_name: rel_name.to_string(),
                properties: properties.clone(),
            },
        );
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn to_graph_node(data: &NodeData) -> GraphNode {
    GraphNode {
        id: data.id,
        labels: data.labels.clone(),
        properties: data.properties.clone(),
    }
}

impl GraphStore for MemoryGraph {
    fn create_node(&mut self, labels: &Labels, properties: &Properties) -> Result<NodeId> {
        let (id, _) = self.add_node(labels, properties);
        Ok(id)
    }

    fn create_node_with_links(
        &mut self,
        labels: &Labels,
        properties: &Properties,
        links: &[Link],
    ) -> Result<NodeId> {
        // Resolve everything before mutating so a bad link creates nothing
        let mut targets = Vec::with_capacity(links.len());
        for link in links {
            check_rel_name(&link.rel_name)?;
            targets.push(self.index_of(link.node)?);
        }

        let (id, idx) = self.add_node(labels, properties);
        for (link, target) in links.iter().zip(targets) {
            match link.direction {
                Direction::Out => self.add_edge(idx, target, &link.rel_name, &link.properties),
                Direction::In => self.add_edge(target, idx, &link.rel_name, &link.properties),
            }
        }
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
        let source = self.index_of(from)?;
        let target = self.index_of(to)?;

        let exists = self
            .graph
            .edges_connecting(source, target)
            .any(|e| e.weight().rel_name == rel_name);
        if !exists {
            self.add_edge(source, target, rel_name, rel_props);
        }
        Ok(())
    }

    fn set_fields(&mut self, id: NodeId, fields: &Properties) -> Result<usize> {
        let idx = self.index_of(id)?;
        let node = self
            .graph
            .node_weight_mut(idx)
            .ok_or(NodeportError::NodeNotFound { id })?;
        for (key, value) in fields {
            node.properties.insert(key.clone(), value.clone());
        }
        Ok(fields.len())
    }
}

impl GraphSnapshot for MemoryGraph {
    fn snapshot(&self) -> Result<Vec<DumpRecord>> {
        let mut nodes: Vec<GraphNode> = self.iter_nodes().collect();
        nodes.sort_by_key(|n| n.id);
        let mut edges: Vec<GraphEdge> = self.iter_edges().collect();
        edges.sort_by_key(|e| e.id);

        let mut records: Vec<DumpRecord> = nodes.into_iter().map(DumpRecord::from).collect();
        records.extend(edges.into_iter().map(DumpRecord::from));
        Ok(records)
    }
}
