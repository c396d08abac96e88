//! Docucite RAG - Retrieval and answer generation
//!
//! Retrieves the passages most similar to a question from the vector store,
//! assembles them into a citation-aware prompt, and asks an LLM for the
//! answer. Retrieval and generation are both delegated to the narrow
//! interfaces defined in `docucite-vector` and [`llm`], so the pipeline can
//! be tested with in-memory fakes.

use std::sync::Arc;
use std::time::Instant;

use docucite_core::{RagConfig, Result, ScoredText, TITLE_KEY};
use docucite_vector::VectorStore;

pub mod llm;
pub mod prompt;

pub use llm::{create_llm_client, LlmClient, OllamaClient, OpenAiClient};
pub use prompt::PromptBuilder;

/// One source consulted for an answer
#[derive(Debug, Clone)]
pub struct SourceRef {
    pub title: String,
    pub page: Option<String>,
    pub score: f32,
}

/// Answer with the sources that informed it
#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub processing_time_ms: u64,
}

/// Question-answering pipeline over one document collection
pub struct RagService {
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmClient>,
    config: RagConfig,
}

impl RagService {
    pub fn new(store: Arc<dyn VectorStore>, llm: Arc<dyn LlmClient>, config: RagConfig) -> Self {
        Self { store, llm, config }
    }

    /// Answer a question from the stored documents.
    pub async fn answer(&self, question: &str) -> Result<RagAnswer> {
        let start_time = Instant::now();

        tracing::info!("RAG query started");

        let results = self
            .store
            .similarity_search(question, self.config.top_k)
            .await?;
        tracing::debug!(retrieved = results.len(), "Similarity search completed");

        let selected = self.select_within_budget(&results);

        let mut builder = PromptBuilder::new().question(question);
        for passage in &selected {
            builder = builder.add_context(format_passage(passage));
        }
        let prompt = builder.build();

        let answer = self.llm.generate(&prompt).await?;
        tracing::debug!(chars = answer.len(), "Answer generated");

        let sources = selected
            .iter()
            .map(|p| SourceRef {
                title: p
                    .metadata
                    .get(TITLE_KEY)
                    .cloned()
                    .unwrap_or_else(|| "<untitled>".to_string()),
                page: p.page().map(str::to_string),
                score: p.score,
            })
            .collect();

        Ok(RagAnswer {
            answer,
            sources,
            processing_time_ms: start_time.elapsed().as_millis() as u64,
        })
    }

    /// Keep passages in rank order until the context budget is spent.
    fn select_within_budget<'a>(&self, results: &'a [ScoredText]) -> Vec<&'a ScoredText> {
        let mut selected = Vec::new();
        let mut total_length = 0;
        for result in results {
            if total_length + result.text.len() > self.config.max_context_length {
                break;
            }
            total_length += result.text.len();
            selected.push(result);
        }
        selected
    }
}

/// Label a passage with its title and page so the model can cite it.
fn format_passage(passage: &ScoredText) -> String {
    let title = passage
        .metadata
        .get(TITLE_KEY)
        .map(String::as_str)
        .unwrap_or("<untitled>");

    match passage.page() {
        Some(page) => format!("[{title}, page {page}] {}", passage.text),
        None => format!("[{title}] {}", passage.text),
    }
}

// ============================================================================
// Tests
// ============================================================================
