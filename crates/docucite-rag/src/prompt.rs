//! Prompt construction for question answering
//!
//! The page-citation convention lives here: when retrieved metadata carries
//! a `page` field, the model is instructed to cite page numbers in square
//! brackets after each sentence or paragraph. This is a prompt convention,
//! not something the database layer enforces.

/// Builds the QA prompt from retrieved context and a question
#[derive(Debug, Default)]
pub struct PromptBuilder {
    contexts: Vec<String>,
    question: String,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one retrieved passage, already labeled with its source
    pub fn add_context(mut self, context: impl Into<String>) -> Self {
        self.contexts.push(context.into());
        self
    }

    /// Set the user's question
    pub fn question(mut self, question: impl Into<String>) -> Self {
        self.question = question.into();
        self
    }

    /// Render the final prompt
    pub fn build(self) -> String {
        let context_str = self.contexts.join("\n\n");

        format!(
            "Use the following pieces of context, provided in the triple backticks, \
to answer the question at the end.\n\
If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\
If you have the information available from the metadata of the context under the field \"page\", \
cite your answers with page numbers in square brackets after each sentence or paragraph.\n\
Context: ```{context_str}```\n\
Question: ```{question}```\n\
Helpful Answer:",
            question = self.question
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_context_and_question() {
        let prompt = PromptBuilder::new()
            .add_context("[Alpha, page 1] alpha text")
            .add_context("[Beta, page 2] beta text")
            .question("What is alpha?")
            .build();

        assert!(prompt.contains("alpha text"));
        assert!(prompt.contains("beta text"));
        assert!(prompt.contains("What is alpha?"));
    }

    #[test]
    fn test_prompt_carries_citation_instruction() {
        let prompt = PromptBuilder::new().question("q").build();
        assert!(prompt.contains("page numbers in square brackets"));
        assert!(prompt.contains("don't try to make up an answer"));
    }
}
