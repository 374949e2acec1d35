use directories::ProjectDirs;
use std::path::PathBuf;

use crate::graph::Labels;

/// Labels given to root nodes when the caller names none.
pub const DEFAULT_ROOT_LABEL: &str = "import_root_label";

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub db_path: PathBuf,
}

impl StorageConfig {
    pub fn default_paths() -> Option<StorageConfig> {
        let proj_dirs = ProjectDirs::from("", "", "nodeport")?;
        let data_dir = proj_dirs.data_dir();

        Some(StorageConfig {
            db_path: data_dir.join("nodeport.db"),
        })
    }

    pub fn with_db_path(db_path: impl Into<PathBuf>) -> StorageConfig {
        StorageConfig {
            db_path: db_path.into(),
        }
    }

    pub fn ensure_dirs_exist(&self) -> std::io::Result<()> {
        if let Some(parent) = self.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// Options for importing an arbitrary JSON document.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub root_labels: Labels,
    /// Parse and check the input, but create nothing.
    pub parse_only: bool,
    /// Stored in the `source` property of the root node when the document
    /// is a JSON object.
    pub provenance: Option<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            root_labels: Labels::from(DEFAULT_ROOT_LABEL),
            parse_only: false,
            provenance: None,
        }
    }
}

/// Options for restoring a dump.
#[derive(Debug, Clone, Copy)]
pub struct RestoreOptions {
    /// Check every record before creating anything.
    pub validate: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        RestoreOptions { validate: true }
    }
}
