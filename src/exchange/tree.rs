//! Decomposition of an arbitrary JSON value into a tree of graph nodes.
//!
//! Construction is postorder: every child node exists before the call that
//! creates its parent, since the parent's relationships are created together
//! with it and need the children's ids.

use tracing::{debug, info};

use crate::config::ImportOptions;
use crate::error::{NodeportError, Result};
use crate::graph::{GraphStore, Labels, Link, NodeId, Properties};
use crate::value::{JsonValue, Literal};

/// Key under which a bare literal is stored when it becomes a node.
pub const LITERAL_KEY: &str = "value";

/// Property set on the root node when a provenance tag is supplied.
pub const PROVENANCE_KEY: &str = "source";

pub struct TreeImporter<'s, S: GraphStore> {
    store: &'s mut S,
    created: Vec<NodeId>,
}

impl<'s, S: GraphStore> TreeImporter<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        TreeImporter {
            store,
            created: Vec::new(),
        }
    }

    /// Every node created so far, in creation order.
    pub fn created(&self) -> &[NodeId] {
        &self.created
    }

    /// Import `value` and return the ids of the root node(s) it produced.
    ///
    /// `level` is 1 for the top of a document. A top-level array yields one
    /// root per element; deeper arrays are gathered under a grouping node.
    ///
    /// On failure nothing is rolled back; the error is a
    /// [`NodeportError::PartialImport`] listing the nodes left behind.
    pub fn import(
        &mut self,
        value: &JsonValue,
        root_labels: &Labels,
        level: usize,
    ) -> Result<Vec<NodeId>> {
        self.import_value(value, root_labels, level)
            .map_err(|source| NodeportError::PartialImport {
                created: self.created.clone(),
                source: Box::new(source),
            })
    }

    fn import_value(
        &mut self,
        value: &JsonValue,
        labels: &Labels,
        level: usize,
    ) -> Result<Vec<NodeId>> {
        debug!(level, labels = %labels, kind = value.kind(), "importing value");

        match value {
            JsonValue::Null => Ok(Vec::new()),
            JsonValue::Literal(literal) => {
                let wrapped = [(LITERAL_KEY.to_string(), JsonValue::Literal(literal.clone()))];
                Ok(vec![self.import_object(&wrapped, labels, level)?])
            }
            JsonValue::Object(entries) => Ok(vec![self.import_object(entries, labels, level)?]),
            JsonValue::Array(items) => self.import_array(items, labels, level),
        }
    }

    /// Always produces exactly one node.
    fn import_object(
        &mut self,
        entries: &[(String, JsonValue)],
        labels: &Labels,
        level: usize,
    ) -> Result<NodeId> {
        let mut properties = Properties::new();
        let mut links = Vec::new();

        for (key, value) in entries {
            match value {
                JsonValue::Literal(literal) => {
                    properties.insert(key.clone(), literal.clone());
                }
                JsonValue::Object(child) => {
                    let child_id = self.import_object(child, &Labels::from(key.as_str()), level + 1)?;
                    links.push(Link::out(child_id, key.as_str()));
                }
                JsonValue::Array(items) => {
                    let child_ids = self.import_array(items, &Labels::from(key.as_str()), level + 1)?;
                    links.extend(child_ids.into_iter().map(|id| Link::out(id, key.as_str())));
                }
                JsonValue::Null => {
                    debug!(level, key = %key, "dropping null entry");
                }
            }
        }

        debug!(
            level,
            labels = %labels,
            properties = properties.len(),
            links = links.len(),
            "creating node"
        );
        let id = self.store.create_node_with_links(labels, &properties, &links)?;
        self.created.push(id);
        Ok(id)
    }

    fn import_array(
        &mut self,
        items: &[JsonValue],
        labels: &Labels,
        level: usize,
    ) -> Result<Vec<NodeId>> {
        if items.is_empty() {
            debug!(level, labels = %labels, "ignoring empty array");
            return Ok(Vec::new());
        }

        let mut child_ids = Vec::new();
        for item in items {
            child_ids.extend(self.import_value(item, labels, level + 1)?);
        }

        if level == 1 {
            return Ok(child_ids);
        }

        let rel_name = labels.relation_name();
        let links: Vec<Link> = child_ids
            .into_iter()
            .map(|id| Link::out(id, rel_name.as_str()))
            .collect();
        debug!(level, labels = %labels, elements = links.len(), "creating grouping node");
        let id = self
            .store
            .create_node_with_links(labels, &Properties::new(), &links)?;
        self.created.push(id);
        Ok(vec![id])
    }
}

/// Parse `json_text` and import it as a tree of nodes.
///
/// Returns the root node ids (empty for `null`, `[]`, or `parse_only`).
pub fn import_json<S: GraphStore>(
    store: &mut S,
    json_text: &str,
    options: &ImportOptions,
) -> Result<Vec<NodeId>> {
    let value = JsonValue::parse(json_text)
        .map_err(|e| NodeportError::MalformedInput(e.to_string()))?;

    if options.parse_only {
        debug!(kind = value.kind(), "parse only; nothing imported");
        return Ok(Vec::new());
    }

    let mut importer = TreeImporter::new(store);
    let roots = importer.import(&value, &options.root_labels, 1)?;
    let created = importer.created().to_vec();

    if let Some(provenance) = &options.provenance
        && value.is_object()
    {
        stamp_provenance(store, &roots, provenance).map_err(|source| {
            NodeportError::PartialImport {
                created: created.clone(),
                source: Box::new(source),
            }
        })?;
    }

    info!(roots = roots.len(), nodes = created.len(), "JSON import complete");
    Ok(roots)
}

fn stamp_provenance<S: GraphStore>(
    store: &mut S,
    roots: &[NodeId],
    provenance: &str,
) -> Result<()> {
    let root = match roots {
        [root] => *root,
        _ => return Err(NodeportError::MultipleRoots { count: roots.len() }),
    };
    debug!(root = %root, provenance = %provenance, "stamping provenance");
    let fields = Properties::from([(
        PROVENANCE_KEY.to_string(),
        Literal::String(provenance.to_string()),
    )]);
    store.set_fields(root, &fields)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use crate::graph::testing::{FlakyStore, RecordingStore};

    fn options(label: &str) -> ImportOptions {
        ImportOptions {
            root_labels: Labels::from(label),
            ..Default::default()
        }
    }

    #[test]
    fn test_null_and_empty_array_create_nothing() {
        let mut graph = MemoryGraph::new();

        assert!(import_json(&mut graph, "null", &options("N")).unwrap().is_empty());
        assert!(import_json(&mut graph, "[]", &options("N")).unwrap().is_empty());
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_literal_is_wrapped() {
        let mut graph = MemoryGraph::new();
        let roots = import_json(&mut graph, "42", &options("N")).unwrap();

        assert_eq!(roots.len(), 1);
        assert_eq!(graph.node_count(), 1);
        let node = graph.get_node(roots[0]).unwrap();
        assert_eq!(node.labels, Labels::from("N"));
        assert_eq!(node.properties.len(), 1);
        assert_eq!(node.properties[LITERAL_KEY], Literal::Int(42));
    }

    #[test]
    fn test_top_level_array_is_a_forest() {
        let mut graph = MemoryGraph::new();
        let roots = import_json(&mut graph, "[1, 2]", &options("N")).unwrap();

        assert_eq!(roots.len(), 2);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(
            graph.get_node(roots[0]).unwrap().properties[LITERAL_KEY],
            Literal::Int(1)
        );
        assert_eq!(
            graph.get_node(roots[1]).unwrap().properties[LITERAL_KEY],
            Literal::Int(2)
        );
        for root in &roots {
            assert_eq!(graph.get_node(*root).unwrap().labels, Labels::from("N"));
        }
    }

    #[test]
    fn test_nested_array_gets_grouping_node() {
        let mut graph = MemoryGraph::new();
        let roots = import_json(&mut graph, r#"{"items": [1, 2]}"#, &options("R")).unwrap();

        assert_eq!(roots.len(), 1);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);

        let root = graph.get_node(roots[0]).unwrap();
        assert_eq!(root.labels, Labels::from("R"));
        assert!(root.properties.is_empty());

        let to_group = graph.outgoing(roots[0], Some("items"));
        assert_eq!(to_group.len(), 1);
        let group = graph.get_node(to_group[0].to).unwrap();
        assert_eq!(group.labels, Labels::from("items"));
        assert!(group.properties.is_empty());

        let leaves = graph.outgoing(group.id, Some("items"));
        assert_eq!(leaves.len(), 2);
        let mut values: Vec<Literal> = leaves
            .iter()
            .map(|e| graph.get_node(e.to).unwrap().properties[LITERAL_KEY].clone())
            .collect();
        values.sort_by_key(|v| v.to_string());
        assert_eq!(values, vec![Literal::Int(1), Literal::Int(2)]);
    }

    #[test]
    fn test_nested_objects_and_properties() {
        let mut graph = MemoryGraph::new();
        let json = r#"{
            "name": "Julian",
            "age": 44,
            "address": {"city": "Berkeley", "zip": "94704"},
            "nickname": null
        }"#;
        let roots = import_json(&mut graph, json, &options("Person")).unwrap();

        assert_eq!(graph.node_count(), 2);
        let person = graph.get_node(roots[0]).unwrap();
        assert_eq!(person.labels, Labels::from("Person"));
        assert_eq!(person.properties["name"], Literal::from("Julian"));
        assert_eq!(person.properties["age"], Literal::Int(44));
        assert!(!person.properties.contains_key("address"));
        assert!(!person.properties.contains_key("nickname"));

        let address_edges = graph.outgoing(person.id, Some("address"));
        assert_eq!(address_edges.len(), 1);
        let address = graph.get_node(address_edges[0].to).unwrap();
        assert_eq!(address.labels, Labels::from("address"));
        assert_eq!(address.properties["city"], Literal::from("Berkeley"));
    }

    #[test]
    fn test_children_created_before_parents() {
        let mut store = RecordingStore::new();
        let json = r#"{"a": {"b": {"c": 1}}, "list": [{"x": 1}, [2, 3]], "d": 4}"#;
        import_json(&mut store, json, &options("Root")).unwrap();

        // Every link must point at a node created by an earlier call
        let mut seen = Vec::new();
        for call in store.calls() {
            for link in &call.links {
                assert!(seen.contains(&link.node), "link to {} before creation", link.node);
            }
            seen.push(call.created);
        }
        assert_eq!(store.calls().last().unwrap().labels, Labels::from("Root"));
    }

    #[test]
    fn test_array_in_array_groups_under_root_labels() {
        let mut graph = MemoryGraph::new();
        let roots = import_json(&mut graph, "[[1, 2], 3]", &options("N")).unwrap();

        assert_eq!(roots.len(), 2);
        let group = graph.get_node(roots[0]).unwrap();
        assert_eq!(group.labels, Labels::from("N"));
        assert!(group.properties.is_empty());
        assert_eq!(graph.outgoing(group.id, Some("N")).len(), 2);
        assert_eq!(
            graph.get_node(roots[1]).unwrap().properties[LITERAL_KEY],
            Literal::Int(3)
        );
    }

    #[test]
    fn test_nested_empty_array_and_null_are_dropped() {
        let mut graph = MemoryGraph::new();
        let roots = import_json(&mut graph, r#"{"tags": [], "x": null, "k": 1}"#, &options("R"))
            .unwrap();

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        let root = graph.get_node(roots[0]).unwrap();
        assert_eq!(root.properties.len(), 1);
    }

    #[test]
    fn test_multiple_root_labels() {
        let mut graph = MemoryGraph::new();
        let opts = ImportOptions {
            root_labels: Labels::new(["A", "B"]),
            ..Default::default()
        };
        let roots = import_json(&mut graph, r#"{"k": 1}"#, &opts).unwrap();
        assert_eq!(graph.get_node(roots[0]).unwrap().labels, Labels::new(["A", "B"]));
    }

    #[test]
    fn test_parse_only_creates_nothing() {
        let mut graph = MemoryGraph::new();
        let opts = ImportOptions {
            parse_only: true,
            ..options("N")
        };
        let roots = import_json(&mut graph, r#"{"a": [1, 2, 3]}"#, &opts).unwrap();
        assert!(roots.is_empty());
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_malformed_input() {
        let mut graph = MemoryGraph::new();
        let result = import_json(&mut graph, r#"{"a": "#, &options("N"));
        assert!(matches!(result, Err(NodeportError::MalformedInput(_))));
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_provenance_on_object_root() {
        let mut graph = MemoryGraph::new();
        let opts = ImportOptions {
            provenance: Some("feed.json".to_string()),
            ..options("R")
        };
        let roots = import_json(&mut graph, r#"{"a": 1}"#, &opts).unwrap();
        let root = graph.get_node(roots[0]).unwrap();
        assert_eq!(root.properties[PROVENANCE_KEY], Literal::from("feed.json"));
    }

    #[test]
    fn test_provenance_ignored_for_arrays() {
        let mut graph = MemoryGraph::new();
        let opts = ImportOptions {
            provenance: Some("feed.json".to_string()),
            ..options("R")
        };
        let roots = import_json(&mut graph, r#"[{"a": 1}]"#, &opts).unwrap();
        let root = graph.get_node(roots[0]).unwrap();
        assert!(!root.properties.contains_key(PROVENANCE_KEY));
    }

    #[test]
    fn test_failure_reports_created_nodes() {
        // Third node creation fails: the two leaves survive as fragments
        let mut store = FlakyStore::failing_at(3);
        let result = import_json(&mut store, r#"{"a": {"x": 1}, "b": {"y": 2}, "c": 3}"#, &options("R"));

        match result.unwrap_err() {
            NodeportError::PartialImport { created, source } => {
                assert_eq!(created.len(), 2);
                assert!(matches!(*source, NodeportError::Store(_)));
                for id in &created {
                    assert!(store.inner().contains(*id));
                }
            }
            e => panic!("Expected PartialImport, got {:?}", e),
        }
        assert_eq!(store.inner().node_count(), 2);
    }

    #[test]
    fn test_provenance_failure_reports_created_nodes() {
        let mut store = FlakyStore::failing_fields();
        let opts = ImportOptions {
            provenance: Some("feed.json".to_string()),
            ..options("R")
        };
        let result = import_json(&mut store, r#"{"a": {"x": 1}, "b": 2}"#, &opts);

        match result.unwrap_err() {
            NodeportError::PartialImport { created, source } => {
                assert_eq!(created, vec![NodeId(500), NodeId(501)]);
                assert!(matches!(*source, NodeportError::Store(_)));
            }
            e => panic!("Expected PartialImport, got {:?}", e),
        }
        assert_eq!(store.inner().node_count(), 2);
    }

    #[test]
    fn test_empty_key_fails_in_store() {
        let mut graph = MemoryGraph::new();
        let result = import_json(&mut graph, r#"{"": {"x": 1}}"#, &options("R"));
        let err = result.unwrap_err();
        assert!(matches!(err.root_cause(), NodeportError::Store(_)));
        // The child was created before the parent failed
        assert_eq!(graph.node_count(), 1);
    }
}
