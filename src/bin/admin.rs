use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};

use corq_core::{CorpusCatalog, StorageUri};
use corq_corpus::{CorpusAdmin, CorpusConfig, StorageClient};
use corq_vertex::VertexConfig;

#[derive(Parser)]
#[command(name = "corq-admin")]
#[command(about = "Manage the RAG corpus: create, upload, import, list", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new corpus and print its resource name
    Create {
        /// Display name for the corpus
        display_name: String,
    },
    /// Upload a local file to the configured bucket
    Upload {
        /// Local file to upload
        file: PathBuf,
        /// Object name in the bucket; the file name is used when omitted
        #[arg(long)]
        object: Option<String>,
    },
    /// Import an uploaded object into the corpus index
    Import {
        /// gs:// URI of the object to import
        uri: String,
    },
    /// Upload a local file and import it in one step
    Add {
        /// Local file to upload and import
        file: PathBuf,
    },
    /// List files registered in the corpus
    Ls,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let vertex = VertexConfig::from_env()?;
    let corpus_config = CorpusConfig::from_env()?;

    match cli.command {
        Command::Create { display_name } => {
            let mut admin = CorpusAdmin::new(vertex)?;
            admin.connect().await?;

            let corpus = admin.create_corpus(&display_name).await?;
            println!("{} {corpus}", "Created corpus:".green());
            println!("Set RAG_CORPUS to this value to query it.");
        }
        Command::Upload { file, object } => {
            let bucket = corpus_config.require_bucket()?;
            let uri = upload(&vertex, bucket, &file, object).await?;
            println!("{} {uri}", "Uploaded:".green());
        }
        Command::Import { uri } => {
            let corpus = corpus_config.require_corpus()?;
            let mut admin = CorpusAdmin::new(vertex)?;
            admin.connect().await?;

            let outcome = admin
                .import_file(corpus, &StorageUri::from_raw(uri), &corpus_config.chunking)
                .await?;
            println!("{} {}", "Import accepted:".green(), outcome.operation);
            println!("Indexing completes asynchronously; the file may not be queryable yet.");
        }
        Command::Add { file } => {
            let bucket = corpus_config.require_bucket()?;
            let corpus = corpus_config.require_corpus()?;

            let uri = upload(&vertex, bucket, &file, None).await?;
            println!("{} {uri}", "Uploaded:".green());

            let mut admin = CorpusAdmin::new(vertex)?;
            admin.connect().await?;

            let outcome = admin
                .import_file(corpus, &uri, &corpus_config.chunking)
                .await?;
            println!("{} {}", "Import accepted:".green(), outcome.operation);
            println!("Indexing completes asynchronously; the file may not be queryable yet.");
        }
        Command::Ls => {
            let corpus = corpus_config.require_corpus()?;
            let mut admin = CorpusAdmin::new(vertex)?;
            admin.connect().await?;

            let files = admin.list_files(corpus).await?;
            if files.is_empty() {
                println!("No files in {corpus}");
                return Ok(());
            }

            for file in files {
                let updated = file
                    .update_time
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "N/A".to_string());
                println!(
                    "{} ({}) => {} updated {}",
                    file.display_name.bold(),
                    file.state,
                    file.uri.as_deref().unwrap_or("N/A"),
                    updated
                );
            }
        }
    }

    Ok(())
}

async fn upload(
    vertex: &VertexConfig,
    bucket: &str,
    file: &Path,
    object: Option<String>,
) -> Result<StorageUri> {
    let object = match object {
        Some(object) => object,
        None => file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow::anyhow!("no file name in path: {}", file.display()))?,
    };

    let mut storage = StorageClient::new(vertex.credentials_path.clone())?;
    storage.connect().await?;

    Ok(storage.upload_object(file, bucket, &object).await?)
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}
