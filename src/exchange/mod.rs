pub mod dump;
pub mod export;
pub mod format;
pub mod tree;

pub use dump::{DumpRestorer, RestoreReport, import_json_dump, validate_records};
pub use export::{OverwriteAction, export_dump, write_dump};
pub use format::{DumpRecord, Endpoint, ExportSummary, RecordId};
pub use tree::{TreeImporter, import_json};
