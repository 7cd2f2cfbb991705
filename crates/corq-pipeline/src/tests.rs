//! Pipeline behavior tests with mock collaborators

pub(crate) mod mocks {
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use corq_core::{
        CorpusCatalog, CorpusFile, CorpusName, Error, GenerationConfig, GenerationResult,
        LanguageModel, Passage, PassageRetriever, PromptPart, Result, RetrievalQuery,
    };

    /// A model that replays queued structured responses and records what it
    /// was asked.
    #[derive(Default)]
    pub struct ScriptedModel {
        structured: Mutex<VecDeque<Result<Value>>>,
        prompts: Mutex<Vec<String>>,
        parts_log: Mutex<Vec<Vec<PromptPart>>>,
        generate_calls: AtomicUsize,
    }

    impl ScriptedModel {
        pub fn with_structured(responses: Vec<Result<Value>>) -> Self {
            Self {
                structured: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        pub fn generate_calls(&self) -> usize {
            self.generate_calls.load(Ordering::SeqCst)
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }

        pub fn last_parts(&self) -> Vec<PromptPart> {
            self.parts_log.lock().unwrap().last().cloned().unwrap_or_default()
        }

        fn canned_result(&self) -> GenerationResult {
            GenerationResult {
                text: "scripted answer".to_string(),
                model_id: "scripted".to_string(),
                tokens_used: None,
            }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn connect(&mut self) -> Result<()> {
            Ok(())
        }

        async fn generate(&self, _prompt: &str) -> Result<GenerationResult> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.canned_result())
        }

        async fn generate_with_config(
            &self,
            _prompt: &str,
            _config: &GenerationConfig,
        ) -> Result<GenerationResult> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.canned_result())
        }

        async fn generate_parts(
            &self,
            parts: &[PromptPart],
            _config: &GenerationConfig,
        ) -> Result<GenerationResult> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            self.parts_log.lock().unwrap().push(parts.to_vec());
            Ok(self.canned_result())
        }

        async fn generate_structured(
            &self,
            prompt: &str,
            _schema: &Value,
            _config: &GenerationConfig,
        ) -> Result<Value> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.structured
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted structured response left")
        }

        fn model_id(&self) -> &str {
            "scripted"
        }
    }

    pub enum RetrieverMode {
        Passages(Vec<Passage>),
        FailRetrieval,
        FailAuthentication,
    }

    pub struct MockRetriever {
        mode: RetrieverMode,
        pub calls: Arc<AtomicUsize>,
    }

    impl MockRetriever {
        pub fn with_passages(passages: Vec<Passage>) -> Self {
            Self {
                mode: RetrieverMode::Passages(passages),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn failing() -> Self {
            Self {
                mode: RetrieverMode::FailRetrieval,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn failing_auth() -> Self {
            Self {
                mode: RetrieverMode::FailAuthentication,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl PassageRetriever for MockRetriever {
        async fn retrieve(&self, _query: &RetrievalQuery) -> Result<Vec<Passage>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.mode {
                RetrieverMode::Passages(passages) => Ok(passages.clone()),
                RetrieverMode::FailRetrieval => {
                    Err(Error::Retrieval("service unavailable".to_string()))
                }
                RetrieverMode::FailAuthentication => {
                    Err(Error::Authentication("token expired".to_string()))
                }
            }
        }
    }

    pub struct MockCatalog {
        files: Vec<CorpusFile>,
        pub calls: Arc<AtomicUsize>,
    }

    impl MockCatalog {
        pub fn with_files(files: Vec<CorpusFile>) -> Self {
            Self {
                files,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl CorpusCatalog for MockCatalog {
        async fn list_files(&self, _corpus: &CorpusName) -> Result<Vec<CorpusFile>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.files.clone())
        }
    }

    pub fn passage(source_id: &str, text: &str, score: f32) -> Passage {
        Passage {
            source_id: source_id.to_string(),
            text: text.to_string(),
            score,
        }
    }

    pub fn corpus_file(display_name: &str) -> CorpusFile {
        CorpusFile {
            display_name: display_name.to_string(),
            resource_name: format!("projects/p/locations/l/ragCorpora/1/ragFiles/{display_name}"),
            uri: Some(format!("gs://bucket/{display_name}")),
            state: "ACTIVE".to_string(),
            create_time: None,
            update_time: None,
        }
    }
}

mod pipeline_tests {
    use super::mocks::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use corq_core::{
        CorpusName, Error, GenerationConfig, Grounding, PipelineState, Question, QuestionKind,
    };

    use crate::Pipeline;

    fn label(kind: &str) -> serde_json::Value {
        json!({"question_type": kind})
    }

    fn answer(text: &str, citations: &[&str]) -> serde_json::Value {
        json!({"answer": text, "citations": citations})
    }

    fn pipeline(
        model: Arc<ScriptedModel>,
        retriever: MockRetriever,
    ) -> Pipeline<ScriptedModel, MockRetriever, MockCatalog> {
        Pipeline::new(
            model,
            retriever,
            CorpusName::new("projects/p/locations/l/ragCorpora/1"),
            5,
            GenerationConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_overview_never_invokes_retrieval() {
        let model = Arc::new(ScriptedModel::with_structured(vec![
            Ok(label("corpus_overview")),
            Ok(answer("The corpus covers aviation incident reports.", &[])),
        ]));
        let retriever = MockRetriever::with_passages(vec![passage("a.pdf", "text", 0.9)]);
        let retriever_calls = retriever.calls.clone();

        let outcome = pipeline(model, retriever)
            .run(Question::from("What topics does this corpus cover?"))
            .await
            .unwrap();

        assert_eq!(retriever_calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.kind, QuestionKind::Overview);
        assert_eq!(outcome.state(), PipelineState::Answered);
        assert!(outcome.answer.citations.is_empty());
        assert!(!outcome.trace.contains(&PipelineState::Retrieved));
    }

    #[tokio::test]
    async fn test_specific_invokes_retrieval_exactly_once() {
        let model = Arc::new(ScriptedModel::with_structured(vec![
            Ok(label("specific_query")),
            Ok(answer("Section 3.2 allows a 200ms budget.", &["a.pdf"])),
        ]));
        let retriever = MockRetriever::with_passages(vec![
            passage("a.pdf", "latency budget is 200ms", 0.9),
            passage("b.pdf", "unrelated", 0.2),
        ]);
        let retriever_calls = retriever.calls.clone();

        let outcome = pipeline(model.clone(), retriever)
            .run(Question::from(
                "What does section 3.2 of document X say about latency budgets?",
            ))
            .await
            .unwrap();

        assert_eq!(retriever_calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.kind, QuestionKind::Specific);
        assert_eq!(outcome.state(), PipelineState::Answered);
        assert!(outcome.trace.contains(&PipelineState::Retrieved));
        assert_eq!(outcome.passages.len(), 2);
        assert_eq!(outcome.answer.citations, vec!["a.pdf".to_string()]);
        assert_eq!(outcome.answer.grounding, Grounding::Cited);

        // the generator saw the retrieved passages as tagged context
        let prompts = model.prompts();
        assert!(prompts.last().unwrap().contains("[a.pdf]"));
    }

    #[tokio::test]
    async fn test_retrieval_failure_still_reaches_answered() {
        let model = Arc::new(ScriptedModel::with_structured(vec![
            Ok(label("specific_query")),
            // the model still tries to cite; nothing was supplied, so the
            // citations must be stripped
            Ok(answer("Best effort without sources.", &["a.pdf"])),
        ]));
        let retriever = MockRetriever::failing();
        let retriever_calls = retriever.calls.clone();

        let outcome = pipeline(model, retriever)
            .run(Question::from("What does the report say?"))
            .await
            .unwrap();

        assert_eq!(retriever_calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.state(), PipelineState::Answered);
        assert!(outcome.passages.is_empty());
        assert!(outcome.answer.citations.is_empty());
        assert_eq!(outcome.answer.grounding, Grounding::Uncited);
    }

    #[tokio::test]
    async fn test_unrecognized_label_defaults_to_specific() {
        let model = Arc::new(ScriptedModel::with_structured(vec![
            Ok(json!({"question_type": "banana"})),
            Ok(answer("Answered anyway.", &[])),
        ]));
        let retriever = MockRetriever::with_passages(vec![]);
        let retriever_calls = retriever.calls.clone();

        let outcome = pipeline(model, retriever)
            .run(Question::from("Anything at all"))
            .await
            .unwrap();

        assert_eq!(outcome.kind, QuestionKind::Specific);
        assert_eq!(retriever_calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.state(), PipelineState::Answered);
    }

    #[tokio::test]
    async fn test_unconstrained_classifier_output_defaults_to_specific() {
        let model = Arc::new(ScriptedModel::with_structured(vec![
            Err(Error::SchemaValidation(
                "model did not return valid JSON".to_string(),
            )),
            Ok(answer("Answered anyway.", &[])),
        ]));
        let retriever = MockRetriever::with_passages(vec![]);
        let retriever_calls = retriever.calls.clone();

        let outcome = pipeline(model, retriever)
            .run(Question::from("Anything at all"))
            .await
            .unwrap();

        assert_eq!(outcome.kind, QuestionKind::Specific);
        assert_eq!(retriever_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_model_failure_during_classification_propagates() {
        let model = Arc::new(ScriptedModel::with_structured(vec![Err(Error::Model(
            "provider returned status 500".to_string(),
        ))]));
        let retriever = MockRetriever::with_passages(vec![]);
        let retriever_calls = retriever.calls.clone();

        let err = pipeline(model, retriever)
            .run(Question::from("Anything"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Model(_)));
        assert_eq!(retriever_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_authentication_failure_during_retrieval_propagates() {
        let model = Arc::new(ScriptedModel::with_structured(vec![Ok(label(
            "specific_query",
        ))]));
        let retriever = MockRetriever::failing_auth();

        let err = pipeline(model, retriever)
            .run(Question::from("Anything"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Authentication(_)));
    }

    #[tokio::test]
    async fn test_overview_with_catalog_feeds_inventory() {
        let model = Arc::new(ScriptedModel::with_structured(vec![
            Ok(label("corpus_overview")),
            Ok(answer("The corpus holds two incident reports.", &[])),
        ]));
        let retriever = MockRetriever::with_passages(vec![]);
        let retriever_calls = retriever.calls.clone();
        let catalog = MockCatalog::with_files(vec![corpus_file("a.pdf"), corpus_file("b.pdf")]);
        let catalog_calls = catalog.calls.clone();

        let outcome = pipeline(model.clone(), retriever)
            .with_catalog(catalog)
            .run(Question::from("What files are in the knowledge base?"))
            .await
            .unwrap();

        assert_eq!(catalog_calls.load(Ordering::SeqCst), 1);
        assert_eq!(retriever_calls.load(Ordering::SeqCst), 0);
        assert!(outcome.answer.citations.is_empty());

        let prompts = model.prompts();
        assert!(prompts.last().unwrap().contains("a.pdf"));
        assert!(prompts.last().unwrap().contains("b.pdf"));
    }
}
