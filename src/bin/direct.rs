use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

use corq_core::{LanguageModel, Question};
use corq_pipeline::DirectContextPipeline;
use corq_vertex::{GeminiClient, VertexConfig};

const DEFAULT_QUESTION: &str = "What was the Runway Length of the airport? What page is this on?";

#[derive(Parser)]
#[command(name = "corq-direct")]
#[command(about = "Ask a question about a local document sent directly as model context", long_about = None)]
struct Cli {
    /// Path to the document sent as model context
    #[arg(short, long, default_value = "files_to_upload/20071229X02007.pdf")]
    file: PathBuf,

    /// Question to ask; a demo question is used when omitted
    question: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let vertex = VertexConfig::from_env()?;

    let mut model = GeminiClient::new(vertex.clone())?;
    model.connect().await?;
    let model = Arc::new(model);

    let pipeline = DirectContextPipeline::new(model, vertex.generation_config());

    let question = Question::new(cli.question.unwrap_or_else(|| DEFAULT_QUESTION.to_string()));
    println!("{} {}", "Document:".bold(), cli.file.display());
    println!("{} {}", "Question:".bold(), question);
    println!();

    match pipeline.ask(&question, &cli.file).await {
        Ok(result) => {
            println!("{}", result.text);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {e}", "Request failed:".red());
            std::process::exit(1);
        }
    }
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
