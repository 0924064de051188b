//! Free-form reasoning tool.
//!
//! One templated model call that answers the question directly, step by
//! step, with no sub-tool use.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Tool, ToolError};
use crate::llm::CompletionClient;

const REASONING_TEMPLATE: &str = "You are an agent responsible for solving the user's mathematical \
and logical questions. Logically arrive at the solution, provide a detailed explanation and \
present it as numbered steps.\n\nQuestion: {question}\nAnswer:";

/// Answer a question with a single step-by-step model completion.
pub struct Reasoning {
    llm: Arc<dyn CompletionClient>,
}

impl Reasoning {
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Tool for Reasoning {
    fn name(&self) -> &str {
        "reasoning"
    }

    fn description(&self) -> &str {
        "Answer logic and reasoning questions directly with a step-by-step explanation. Input: the question to reason about."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let prompt = REASONING_TEMPLATE.replace("{question}", input.trim());

        let answer = self
            .llm
            .complete(&prompt, None)
            .await
            .map_err(|e| ToolError::transport(e.to_string()))?;

        Ok(answer.trim().to_string())
    }
}
