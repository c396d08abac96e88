//! Docucite CLI
//!
//! Usage:
//!   docucite create <name>
//!   docucite add <name> <files...>
//!   docucite ask <name> <question>
//!   docucite info <name>

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use docucite_core::AppConfig;
use docucite_db::DatabaseService;
use docucite_rag::{create_llm_client, LlmClient, RagService};
use docucite_vector::{create_embedding_client, EmbeddingClient, LocalStoreOpener};

mod loader;

#[derive(Parser)]
#[command(name = "docucite")]
#[command(about = "Document question answering with page citations")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (environment variables take precedence)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new document database
    Create {
        /// Database name
        name: String,
    },
    /// Add documents to an existing database
    Add {
        /// Database name
        name: String,
        /// Text or markdown files to ingest
        files: Vec<PathBuf>,
    },
    /// Ask a question against a database
    Ask {
        /// Database name
        name: String,
        /// Question to answer
        question: String,
        /// Number of passages to retrieve
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Show database record count and titles
    Info {
        /// Database name
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    let embedding: Arc<dyn EmbeddingClient> = Arc::from(create_embedding_client(&config.llm)?);
    let opener = Arc::new(LocalStoreOpener::new(embedding));

    match cli.command {
        Commands::Create { name } => {
            let mut service =
                DatabaseService::new(&config.storage.base_dir, Some(&name), opener);
            service.create_database().await?;
            println!("Created database `{name}`.");
        }
        Commands::Add { name, files } => {
            if files.is_empty() {
                anyhow::bail!("No files given.");
            }
            let mut service =
                DatabaseService::new(&config.storage.base_dir, Some(&name), opener);
            service.load_database().await?;

            let documents = loader::load_documents(&files)?;
            service.add_documents(&documents).await?;

            let total = service.store()?.count().await?;
            println!(
                "Added {} documents to `{name}` ({total} records total).",
                documents.len()
            );
        }
        Commands::Ask {
            name,
            question,
            top_k,
        } => {
            let mut service =
                DatabaseService::new(&config.storage.base_dir, Some(&name), opener);
            service.load_database().await?;

            let llm: Arc<dyn LlmClient> = Arc::from(create_llm_client(&config.llm)?);
            let mut rag_config = config.rag.clone();
            if let Some(k) = top_k {
                rag_config.top_k = k;
            }

            let rag = RagService::new(service.store()?, llm, rag_config);
            let result = rag.answer(&question).await?;

            println!("{}", result.answer);
            if !result.sources.is_empty() {
                println!("\nSources:");
                for source in &result.sources {
                    match &source.page {
                        Some(page) => println!("  - {} (page {page})", source.title),
                        None => println!("  - {}", source.title),
                    }
                }
            }
        }
        Commands::Info { name } => {
            let mut service =
                DatabaseService::new(&config.storage.base_dir, Some(&name), opener);
            service.load_database().await?;

            let contents = service.store()?.get().await?;
            println!("Database `{name}`: {} records", contents.len());

            let mut titles: Vec<String> = contents.lowercase_titles();
            titles.sort();
            titles.dedup();
            for title in titles {
                println!("  - {title}");
            }
        }
    }

    Ok(())
}
