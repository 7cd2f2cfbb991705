use anyhow::Result;
use clap::Parser;
use colored::*;
use std::sync::Arc;

use corq_core::{LanguageModel, Question};
use corq_corpus::{CorpusAdmin, CorpusConfig, VertexRetriever};
use corq_pipeline::Pipeline;
use corq_vertex::{GeminiClient, VertexConfig};

const DEFAULT_QUESTION: &str =
    "What are the differences between the crashes described in 20071229X02007.pdf and 20071231X02009.pdf?";

#[derive(Parser)]
#[command(name = "corq")]
#[command(about = "Ask a question over a managed RAG corpus", long_about = None)]
struct Cli {
    /// Question to ask; a demo question is used when omitted
    question: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let vertex = VertexConfig::from_env()?;
    let corpus_config = CorpusConfig::from_env()?;
    let corpus = corpus_config.require_corpus()?.clone();

    let mut model = GeminiClient::new(vertex.clone())?;
    model.connect().await?;
    let model = Arc::new(model);

    let mut retriever = VertexRetriever::new(vertex.clone())?;
    retriever.connect().await?;

    let mut catalog = CorpusAdmin::new(vertex.clone())?;
    catalog.connect().await?;

    let pipeline = Pipeline::new(
        model,
        retriever,
        corpus,
        corpus_config.top_k,
        vertex.generation_config(),
    )
    .with_catalog(catalog);

    let question = Question::new(cli.question.unwrap_or_else(|| DEFAULT_QUESTION.to_string()));
    println!("{} {}", "Question:".bold(), question);

    match pipeline.run(question).await {
        Ok(outcome) => {
            println!("{} {}", "Kind:".bold(), outcome.kind.as_label());
            println!();
            println!("{}", outcome.answer.text);

            if outcome.answer.citations.is_empty() {
                println!();
                println!("{}", "(no supporting citations)".yellow());
            } else {
                println!();
                println!("{}", "Sources:".bold());
                for citation in &outcome.answer.citations {
                    println!("  - {citation}");
                }
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {e}", "Pipeline failed:".red());
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
