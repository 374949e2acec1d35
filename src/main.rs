use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use nodeport::NodeportError;
use nodeport::cli::{self, Cli, Commands, theme};
use nodeport::exchange::{OverwriteAction, export_dump, import_json, import_json_dump, write_dump};
use nodeport::graph::NodeId;
use nodeport::storage::SqliteStore;

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    theme::init();

    if let Err(e) = run(cli) {
        report_error(&e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn report_error(e: &NodeportError) {
    eprintln!("{} {}", theme::error("Error:"), e);

    let created = match e {
        NodeportError::PartialImport { created, .. } | NodeportError::Interrupted { created, .. } => {
            created
        }
        _ => return,
    };
    if !created.is_empty() {
        eprintln!(
            "{} {}",
            theme::warning("Nodes left in the database:"),
            format_ids(created)
        );
    }
}

fn format_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(|id| theme::meta(&id.to_string()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn open_store(cli: &Cli) -> nodeport::Result<SqliteStore> {
    let config = cli.storage_config().ok_or_else(|| {
        NodeportError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine data directory",
        ))
    })?;
    SqliteStore::open(&config)
}

fn run(cli: Cli) -> nodeport::Result<()> {
    let mut store = open_store(&cli)?;

    match cli.command {
        Commands::Import {
            file,
            labels,
            provenance,
            parse_only,
        } => {
            let text = std::fs::read_to_string(&file)?;
            let options = cli::import_options(&labels, provenance.as_deref(), parse_only);
            let roots = import_json(&mut store, &text, &options)?;

            if parse_only {
                println!("{} {}", theme::success("Valid JSON:"), file.display());
            } else if roots.is_empty() {
                println!("{}", theme::dim("Nothing to import."));
            } else {
                println!(
                    "{} {} root node(s) labelled {}: {}",
                    theme::success("Imported"),
                    roots.len(),
                    theme::label(&options.root_labels.to_string()),
                    format_ids(&roots)
                );
            }
            Ok(())
        }

        Commands::Restore { file, no_validate } => {
            let text = std::fs::read_to_string(&file)?;
            let report = import_json_dump(&mut store, &text, &cli::restore_options(no_validate))?;
            println!("{}", theme::success(&report.to_string()));
            Ok(())
        }

        Commands::Export { file, force } => {
            let summary = export_dump(&store)?;
            let written = write_dump(&file, &summary, &mut |path| {
                if force {
                    Ok(OverwriteAction::Overwrite)
                } else {
                    eprintln!(
                        "{} {} exists; use --force to overwrite",
                        theme::warning("Warning:"),
                        path.display()
                    );
                    Ok(OverwriteAction::Abort)
                }
            })?;

            if written {
                println!(
                    "{} {} node(s), {} relationship(s) and {} property value(s) to {}",
                    theme::success("Exported"),
                    summary.nodes,
                    summary.relationships,
                    summary.properties,
                    theme::info(&file.display().to_string())
                );
            }
            Ok(())
        }

        Commands::List => {
            let nodes = store.node_count()?;
            if nodes == 0 {
                println!("No nodes in database.");
                return Ok(());
            }

            println!("{}", theme::header(&format!("Nodes ({}):", nodes)));
            for (label, count) in store.label_counts()? {
                println!("  {} {}", theme::label(&label), theme::meta(&count.to_string()));
            }
            println!(
                "{}",
                theme::header(&format!("Relationships ({})", store.relationship_count()?))
            );
            Ok(())
        }
    }
}
