//! Restoring a flat node/relationship dump into a store.
//!
//! Stores assign their own node ids, so the ids written in the dump are
//! remapped: Phase 1 creates every node and records `old id -> new id`,
//! Phase 2 creates every relationship through that map. Nothing is rolled
//! back on failure; the error says how far the restore got.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::RestoreOptions;
use crate::error::{NodeportError, Result};
use crate::graph::{GraphStore, Labels, NodeId, Properties};

use super::format::DumpRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreReport {
    pub nodes_imported: usize,
    pub rels_imported: usize,
}

impl fmt::Display for RestoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Successful import of {} node(s) and {} relationship(s)",
            self.nodes_imported, self.rels_imported
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    Node,
    Relationship,
}

/// A dump entry that could not be decoded, kept until its phase reaches it.
#[derive(Debug, Clone)]
struct RejectedRecord {
    index: usize,
    kind: Option<RecordKind>,
    reason: String,
    record: String,
}

impl RejectedRecord {
    fn new(index: usize, kind: Option<RecordKind>, reason: impl Into<String>, value: &Value) -> Self {
        RejectedRecord {
            index,
            kind,
            reason: reason.into(),
            record: value.to_string(),
        }
    }

    fn to_error(&self) -> NodeportError {
        NodeportError::Validation {
            index: self.index,
            reason: self.reason.clone(),
            record: self.record.clone(),
        }
    }
}

type Entry = std::result::Result<Option<DumpRecord>, RejectedRecord>;

/// Decode one raw dump entry. `Ok(None)` means a `type` the restorer does
/// not know, which is skipped.
fn decode_record(index: usize, value: &Value) -> Entry {
    let Some(object) = value.as_object() else {
        return Err(RejectedRecord::new(index, None, "should be an object", value));
    };

    let kind = match object.get("type") {
        Some(Value::String(t)) if t == "node" => RecordKind::Node,
        Some(Value::String(t)) if t == "relationship" => RecordKind::Relationship,
        Some(_) => return Ok(None),
        None => {
            return Err(RejectedRecord::new(
                index,
                None,
                "must have a 'type' key whose value is either 'node' or 'relationship'",
                value,
            ));
        }
    };

    let missing = match kind {
        RecordKind::Node => (!object.contains_key("id")).then_some("is marked as 'node' but it lacks an 'id'"),
        RecordKind::Relationship => {
            if !object.contains_key("label") {
                Some("is marked as 'relationship' but lacks a 'label'")
            } else if !object.contains_key("start") {
                Some("is marked as 'relationship' but lacks a 'start' value")
            } else if !object.contains_key("end") {
                Some("is marked as 'relationship' but lacks an 'end' value")
            } else if object["start"].get("id").is_none() {
                Some("is marked as 'relationship' but its 'start' value lacks an 'id'")
            } else if object["end"].get("id").is_none() {
                Some("is marked as 'relationship' but its 'end' value lacks an 'id'")
            } else {
                None
            }
        }
    };
    if let Some(reason) = missing {
        return Err(RejectedRecord::new(index, Some(kind), reason, value));
    }

    serde_json::from_value::<DumpRecord>(value.clone())
        .map(Some)
        .map_err(|e| RejectedRecord::new(index, Some(kind), e.to_string(), value))
}

/// Check every entry up front, before anything is created.
pub fn validate_records(records: &[Value]) -> Result<Vec<DumpRecord>> {
    let mut decoded = Vec::with_capacity(records.len());
    for (index, value) in records.iter().enumerate() {
        match decode_record(index, value) {
            Ok(Some(record)) => decoded.push(record),
            Ok(None) => {
                return Err(RejectedRecord::new(
                    index,
                    None,
                    "must have a 'type' key whose value is either 'node' or 'relationship'",
                    value,
                )
                .to_error());
            }
            Err(rejected) => return Err(rejected.to_error()),
        }
    }
    Ok(decoded)
}

/// Restore progress, turned into the error value if a phase fails.
#[derive(Default)]
struct Progress {
    created: Vec<NodeId>,
    rels_imported: usize,
}

impl Progress {
    fn interrupted(self, source: NodeportError) -> NodeportError {
        warn!(
            nodes = self.created.len(),
            relationships = self.rels_imported,
            error = %source,
            "restore interrupted"
        );
        NodeportError::Interrupted {
            nodes_imported: self.created.len(),
            rels_imported: self.rels_imported,
            created: self.created,
            source: Box::new(source),
        }
    }
}

pub struct DumpRestorer<'s, S: GraphStore> {
    store: &'s mut S,
}

impl<'s, S: GraphStore> DumpRestorer<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        DumpRestorer { store }
    }

    /// Restore raw dump entries.
    ///
    /// With `validate`, every entry is checked before the first mutation and
    /// a bad one fails with [`NodeportError::Validation`]. Without it, a bad
    /// entry is only found when its phase reaches it, leaving a partial
    /// restore behind.
    pub fn restore(&mut self, records: &[Value], validate: bool) -> Result<RestoreReport> {
        if validate {
            let decoded = validate_records(records)?;
            debug!(records = decoded.len(), "dump validated");
            return self.restore_records(&decoded);
        }

        let entries: Vec<Entry> = records
            .iter()
            .enumerate()
            .map(|(index, value)| decode_record(index, value))
            .collect();
        self.run(&entries)
    }

    /// Restore already-decoded records.
    pub fn restore_records(&mut self, records: &[DumpRecord]) -> Result<RestoreReport> {
        let entries: Vec<Entry> = records.iter().cloned().map(|r| Ok(Some(r))).collect();
        self.run(&entries)
    }

    fn run(&mut self, entries: &[Entry]) -> Result<RestoreReport> {
        let mut progress = Progress::default();
        let mut id_shift: HashMap<i64, NodeId> = HashMap::new();

        // Phase 1: nodes
        for (index, entry) in entries.iter().enumerate() {
            let outcome = match entry {
                Ok(Some(DumpRecord::Node {
                    id,
                    labels,
                    properties,
                })) => self.restore_node(labels.as_ref(), properties.as_ref()).map(|new_id| {
                    debug!(index, original = id.0, new = %new_id, "node restored");
                    id_shift.insert(id.0, new_id);
                    new_id
                }),
                Ok(Some(DumpRecord::Relationship { .. })) => continue,
                Ok(None) => {
                    warn!(index, "skipping dump entry of unknown type");
                    continue;
                }
                Err(rejected) if rejected.kind == Some(RecordKind::Relationship) => continue,
                Err(rejected) => Err(rejected.to_error()),
            };
            match outcome {
                Ok(new_id) => progress.created.push(new_id),
                Err(e) => return Err(progress.interrupted(e)),
            }
        }
        info!(nodes = progress.created.len(), "dump nodes restored");

        // Phase 2: relationships, endpoints remapped
        for (index, entry) in entries.iter().enumerate() {
            let outcome = match entry {
                Ok(Some(DumpRecord::Relationship {
                    label,
                    start,
                    end,
                    properties,
                    ..
                })) => self.restore_relationship(
                    &id_shift,
                    label,
                    start.id.0,
                    end.id.0,
                    properties.as_ref(),
                ),
                Err(rejected) if rejected.kind == Some(RecordKind::Relationship) => {
                    Err(rejected.to_error())
                }
                _ => continue,
            };
            match outcome {
                Ok(()) => {
                    debug!(index, "relationship restored");
                    progress.rels_imported += 1;
                }
                Err(e) => return Err(progress.interrupted(e)),
            }
        }

        let report = RestoreReport {
            nodes_imported: progress.created.len(),
            rels_imported: progress.rels_imported,
        };
        info!(
            nodes = report.nodes_imported,
            relationships = report.rels_imported,
            "dump restore complete"
        );
        Ok(report)
    }

    fn restore_node(
        &mut self,
        labels: Option<&Labels>,
        properties: Option<&Properties>,
    ) -> Result<NodeId> {
        let no_labels = Labels::default();
        let no_properties = Properties::new();
        self.store.create_node(
            labels.unwrap_or(&no_labels),
            properties.unwrap_or(&no_properties),
        )
    }

    fn restore_relationship(
        &mut self,
        id_shift: &HashMap<i64, NodeId>,
        label: &str,
        start: i64,
        end: i64,
        properties: Option<&Properties>,
    ) -> Result<()> {
        let shift = |original_id: i64| {
            id_shift
                .get(&original_id)
                .copied()
                .ok_or_else(|| NodeportError::DanglingReference {
                    relation: label.to_string(),
                    original_id,
                })
        };
        let from = shift(start)?;
        let to = shift(end)?;

        let no_properties = Properties::new();
        self.store
            .link_nodes_by_ids(from, to, label, properties.unwrap_or(&no_properties))
    }
}

/// Parse a dump (a JSON array of node and relationship records) and restore it.
pub fn import_json_dump<S: GraphStore>(
    store: &mut S,
    json_text: &str,
    options: &RestoreOptions,
) -> Result<RestoreReport> {
    let value: Value = serde_json::from_str(json_text)
        .map_err(|e| NodeportError::MalformedInput(e.to_string()))?;
    let Value::Array(records) = value else {
        return Err(NodeportError::MalformedInput(
            "the JSON string does not represent a list".to_string(),
        ));
    };

    DumpRestorer::new(store).restore(&records, options.validate)
}
