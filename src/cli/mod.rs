pub mod theme;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{ImportOptions, RestoreOptions, StorageConfig};
use crate::graph::Labels;

#[derive(Parser, Debug)]
#[command(name = "nodeport")]
#[command(version, about = "Import JSON documents and graph dumps into a property graph")]
pub struct Cli {
    /// Database file (defaults to the per-user data directory)
    #[arg(long, global = true, env = "NODEPORT_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import an arbitrary JSON document as a tree of nodes
    Import {
        file: PathBuf,

        /// Label for the root node(s); repeat for several labels
        #[arg(short, long = "label")]
        labels: Vec<String>,

        /// Recorded in the `source` property of the root node
        #[arg(long)]
        provenance: Option<String>,

        /// Parse and check the document without creating anything
        #[arg(long)]
        parse_only: bool,
    },

    /// Restore a node/relationship dump
    Restore {
        file: PathBuf,

        /// Skip checking every record before creating anything
        #[arg(long)]
        no_validate: bool,
    },

    /// Export the whole graph as a dump
    Export {
        file: PathBuf,

        /// Overwrite the file if it exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show node, relationship and label counts
    List,
}

impl Cli {
    /// Storage location from `--db`, falling back to the default data directory.
    pub fn storage_config(&self) -> Option<StorageConfig> {
        match &self.db {
            Some(path) => Some(StorageConfig::with_db_path(path.clone())),
            None => StorageConfig::default_paths(),
        }
    }
}

/// Build import options from the `import` flags. No labels means the default root label.
pub fn import_options(
    labels: &[String],
    provenance: Option<&str>,
    parse_only: bool,
) -> ImportOptions {
    let mut options = ImportOptions {
        parse_only,
        provenance: provenance.map(str::to_string),
        ..Default::default()
    };
    if !labels.is_empty() {
        options.root_labels = Labels::new(labels.iter().map(String::as_str));
    }
    options
}

pub fn restore_options(no_validate: bool) -> RestoreOptions {
    RestoreOptions {
        validate: !no_validate,
    }
}
