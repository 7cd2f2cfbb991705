//! Question-answering pipelines for corq
//!
//! The classify-then-retrieve pipeline (classifier, conditional retrieval,
//! answer generation, controller) and the direct-context pipeline that sends
//! a local document straight to the model.

mod classifier;
mod controller;
mod direct;
mod generator;

#[cfg(test)]
mod tests;

pub use classifier::QuestionClassifier;
pub use controller::{Pipeline, PipelineOutcome};
pub use direct::DirectContextPipeline;
pub use generator::AnswerGenerator;

// Re-export core types for convenience
pub use corq_core::{
    Answer, Error, Grounding, PipelineState, Question, QuestionKind, Result,
};
