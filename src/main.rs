//! # Source Shelf CLI (`shelf`)
//!
//! The `shelf` binary manages a local source library and runs chat turns
//! against it.
//!
//! ## Usage
//!
//! ```bash
//! shelf --config ./config/shelf.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shelf init` | Create the blob database and seed the metadata document |
//! | `shelf sources` | List every group and its sources |
//! | `shelf add-url <url>` | Add a remote URL source |
//! | `shelf add-file <path>` | Upload a PDF document |
//! | `shelf remove <id>` | Remove a source (and its stored content) |
//! | `shelf rename <id> <title>` | Change a source's title |
//! | `shelf ask "<prompt>"` | Run one chat turn with the active group's context |
//!
//! ## Examples
//!
//! ```bash
//! shelf init
//! shelf add-url https://example.com/act.pdf
//! shelf add-file ./reg.pdf
//! shelf sources
//! shelf ask "Summarize the filing requirements."
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use source_shelf::chat;
use source_shelf::config::{self, Config};
use source_shelf::generation::HttpGenerationClient;
use source_shelf::library::LibraryManager;
use source_shelf::metadata::MetadataStore;
use source_shelf::models::{Attachment, SourceKind};
use source_shelf::reconcile::DEFAULT_GROUP_ID;
use source_shelf::store::sqlite::SqliteBlobStore;
use source_shelf::store::BlobStore;

/// Source Shelf — a local-first source library and context assembly layer
/// for chat assistants.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/shelf.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "shelf",
    about = "Source Shelf — a local-first source library for chat assistants",
    version,
    long_about = "Source Shelf keeps reference sources (remote URLs and uploaded PDF documents) \
    in named groups, persisted across runs in a metadata document plus a SQLite blob store, and \
    assembles the active group's content into the payload sent to a generation backend."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/shelf.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize storage.
    ///
    /// Creates the SQLite blob database, runs schema migrations, and seeds
    /// the metadata document with the default group. Idempotent.
    Init,

    /// List every group and its sources.
    Sources,

    /// Add a remote URL source.
    AddUrl {
        /// Absolute URL of the source.
        url: String,

        /// Group to add the source to.
        #[arg(long, default_value = DEFAULT_GROUP_ID)]
        group: String,
    },

    /// Upload a PDF document into the library.
    ///
    /// The file content is stored in the blob database; only a lightweight
    /// descriptor enters the metadata document.
    AddFile {
        /// Path to the document (must be a PDF).
        path: PathBuf,

        /// Group to add the source to.
        #[arg(long, default_value = DEFAULT_GROUP_ID)]
        group: String,

        /// Title for the new source (defaults to the filename).
        #[arg(long)]
        title: Option<String>,
    },

    /// Remove a source by id, deleting its stored content if any.
    Remove {
        /// Source id (as shown by `shelf sources`).
        id: String,
    },

    /// Change a source's user-visible title.
    Rename {
        /// Source id.
        id: String,

        /// New title (must not be blank).
        title: String,
    },

    /// Run one chat turn with the active group's context.
    Ask {
        /// The prompt to send.
        prompt: String,

        /// Group whose sources to assemble (defaults to the first group).
        #[arg(long)]
        group: Option<String>,

        /// Attach a file for this turn only (repeatable). Not added to the
        /// library.
        #[arg(long = "attach")]
        attach: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let manager = open_library(&cfg).await?;
            println!(
                "Library initialized: {} group(s), {} source(s).",
                manager.groups().len(),
                manager.groups().iter().map(|g| g.sources.len()).sum::<usize>()
            );
        }
        Commands::Sources => {
            let manager = open_library(&cfg).await?;
            for group in manager.groups() {
                println!("{} ({})", group.name, group.id);
                if group.sources.is_empty() {
                    println!("  (empty)");
                }
                for source in &group.sources {
                    let kind = match source.kind {
                        SourceKind::Url => "url ",
                        SourceKind::File => "file",
                    };
                    println!("  {}  {}  {}", kind, source.id, source.title);
                }
            }
        }
        Commands::AddUrl { url, group } => {
            let mut manager = open_library(&cfg).await?;
            let descriptor = manager.add_url_source(&group, &url)?;
            println!("added url source {}", descriptor.id);
        }
        Commands::AddFile { path, group, title } => {
            let mut manager = open_library(&cfg).await?;
            let bytes = std::fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let name = file_name(&path);
            let descriptor = manager
                .add_file_source(&group, &name, &mime_for_path(&path), &bytes)
                .await?;
            if let Some(title) = title {
                manager.rename_source(&descriptor.id, &title)?;
            }
            println!("added file source {}", descriptor.id);
        }
        Commands::Remove { id } => {
            let mut manager = open_library(&cfg).await?;
            manager.remove_source(&id).await?;
            println!("removed {}", id);
        }
        Commands::Rename { id, title } => {
            let mut manager = open_library(&cfg).await?;
            manager.rename_source(&id, &title)?;
            println!("renamed {}", id);
        }
        Commands::Ask {
            prompt,
            group,
            attach,
        } => {
            let mut manager = open_library(&cfg).await?;
            if let Some(group) = group {
                manager.set_active_group(&group)?;
            }

            let mut extra = Vec::new();
            for path in &attach {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                extra.push(Attachment {
                    name: file_name(path),
                    mime_type: mime_for_path(path),
                    data: STANDARD.encode(&bytes),
                });
            }

            let client = HttpGenerationClient::new(&cfg.generation)?;
            let outcome = chat::run_turn(&manager, &client, &prompt, extra).await;

            println!("{}", outcome.text);
            if !outcome.retrieval.is_empty() {
                println!();
                for retrieved in &outcome.retrieval {
                    println!("  [{}] {}", retrieved.status, retrieved.url);
                }
            }
        }
    }

    Ok(())
}

async fn open_library(cfg: &Config) -> Result<LibraryManager> {
    let store: Arc<dyn BlobStore> =
        Arc::new(SqliteBlobStore::open(&cfg.storage.blob_db_path).await?);
    let metadata = MetadataStore::new(cfg.storage.metadata_path.clone());
    LibraryManager::open(metadata, store, cfg.library.max_sources_per_group).await
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn mime_for_path(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf".to_string(),
        _ => "application/octet-stream".to_string(),
    }
}
