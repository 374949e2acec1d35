use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::graph::GraphSnapshot;

use super::format::{DumpRecord, ExportSummary};

pub enum OverwriteAction {
    Overwrite,
    Abort,
}

/// Export every node and relationship of `store` as a dump that
/// `import_json_dump` can restore.
pub fn export_dump<G: GraphSnapshot>(store: &G) -> Result<ExportSummary> {
    let records = store.snapshot()?;

    let nodes = records
        .iter()
        .filter(|r| matches!(r, DumpRecord::Node { .. }))
        .count();
    let relationships = records.len() - nodes;
    let properties: usize = records.iter().map(DumpRecord::property_count).sum();
    let data = serde_json::to_string_pretty(&records)?;

    info!(nodes, relationships, properties, "graph exported");
    Ok(ExportSummary {
        nodes,
        relationships,
        properties,
        data,
    })
}

/// Write the dump to `path`, calling `on_conflict` if the file already
/// exists. Returns false if the caller chose to abort.
pub fn write_dump(
    path: &Path,
    summary: &ExportSummary,
    on_conflict: &mut impl FnMut(&Path) -> Result<OverwriteAction>,
) -> Result<bool> {
    if path.exists() && matches!(on_conflict(path)?, OverwriteAction::Abort) {
        return Ok(false);
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, summary.data.as_bytes())?;
    Ok(true)
}
