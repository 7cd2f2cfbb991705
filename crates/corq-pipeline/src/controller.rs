//! Pipeline controller: classify, conditionally retrieve, answer

use std::sync::Arc;
use tracing::{info, warn};

use corq_core::{
    Answer, CorpusCatalog, CorpusFile, CorpusName, Error, GenerationConfig, LanguageModel,
    Passage, PassageRetriever, PipelineState, Question, QuestionKind, Result, RetrievalQuery,
};

use crate::classifier::QuestionClassifier;
use crate::generator::AnswerGenerator;

/// Terminal report of a pipeline run. `trace` records the states the run
/// moved through, ending in `Answered`; unrecovered failures surface as an
/// error instead (state `Failed`, with the originating error kind).
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub kind: QuestionKind,
    pub passages: Vec<Passage>,
    pub answer: Answer,
    pub trace: Vec<PipelineState>,
}

impl PipelineOutcome {
    pub fn state(&self) -> PipelineState {
        self.trace
            .last()
            .copied()
            .unwrap_or(PipelineState::Received)
    }
}

/// The classify-then-retrieve pipeline.
///
/// Each run is independent: one classification call, at most one retrieval
/// call (only for specific questions), one generation call. Classification
/// failures fall back to treating the question as specific; retrieval
/// failures degrade to answering without passages.
pub struct Pipeline<M: LanguageModel, R: PassageRetriever, C: CorpusCatalog> {
    classifier: QuestionClassifier<M>,
    generator: AnswerGenerator<M>,
    retriever: R,
    catalog: Option<C>,
    corpus: CorpusName,
    top_k: usize,
}

impl<M, R, C> Pipeline<M, R, C>
where
    M: LanguageModel,
    R: PassageRetriever,
    C: CorpusCatalog,
{
    pub fn new(
        model: Arc<M>,
        retriever: R,
        corpus: CorpusName,
        top_k: usize,
        config: GenerationConfig,
    ) -> Self {
        Self {
            classifier: QuestionClassifier::new(model.clone(), config.clone()),
            generator: AnswerGenerator::new(model, config),
            retriever,
            catalog: None,
            corpus,
            top_k,
        }
    }

    /// Attach a corpus catalog so overview questions can be answered with
    /// the file inventory as context.
    pub fn with_catalog(mut self, catalog: C) -> Self {
        self.catalog = Some(catalog);
        self
    }

    async fn classify_with_default(&self, question: &Question) -> Result<QuestionKind> {
        match self.classifier.classify(question).await {
            Ok(kind) => Ok(kind),
            Err(Error::Classification(msg)) => {
                // Attempting retrieval beats silently skipping it.
                warn!(%msg, "classification failed, treating question as specific");
                Ok(QuestionKind::Specific)
            }
            Err(e) => Err(e),
        }
    }

    async fn retrieve_or_empty(&self, question: &Question) -> Result<Vec<Passage>> {
        let query = RetrievalQuery {
            text: question.as_str().to_string(),
            corpus: self.corpus.clone(),
            top_k: self.top_k,
        };

        match self.retriever.retrieve(&query).await {
            Ok(passages) => Ok(passages),
            Err(Error::Retrieval(msg)) => {
                warn!(%msg, "retrieval failed, answering without passages");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn overview_inventory(&self) -> Option<String> {
        let catalog = self.catalog.as_ref()?;
        match catalog.list_files(&self.corpus).await {
            Ok(files) if files.is_empty() => None,
            Ok(files) => Some(render_inventory(&files)),
            Err(e) => {
                warn!(error = %e, "corpus listing failed, answering without inventory");
                None
            }
        }
    }

    /// Run the pipeline to a terminal state for one question.
    pub async fn run(&self, question: Question) -> Result<PipelineOutcome> {
        let mut trace = vec![PipelineState::Received];

        let kind = self.classify_with_default(&question).await?;
        trace.push(PipelineState::Classified);
        info!(kind = kind.as_label(), "question classified");

        let (passages, answer) = match kind {
            QuestionKind::Specific => {
                let passages = self.retrieve_or_empty(&question).await?;
                trace.push(PipelineState::Retrieved);
                info!(count = passages.len(), "passages retrieved");

                let answer = self.generator.generate(&question, &passages).await?;
                (passages, answer)
            }
            QuestionKind::Overview => {
                let inventory = self.overview_inventory().await;
                let answer = self
                    .generator
                    .generate_overview(&question, inventory.as_deref())
                    .await?;
                (Vec::new(), answer)
            }
        };

        trace.push(PipelineState::Answered);
        Ok(PipelineOutcome {
            kind,
            passages,
            answer,
            trace,
        })
    }
}

/// Render the corpus file inventory as answer context.
fn render_inventory(files: &[CorpusFile]) -> String {
    let mut rendered = String::new();
    for file in files {
        rendered.push_str(&format!("- {} ({})", file.display_name, file.state));
        if let Some(uri) = &file.uri {
            rendered.push_str(&format!(" from {uri}"));
        }
        rendered.push('\n');
    }
    rendered
}
