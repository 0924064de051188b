//! The tool-using agent loop.
//!
//! One run turns a question into zero or more tool invocations and a final
//! answer: build a prompt from the question, the tool descriptors and the
//! turns so far, call the model, parse its reply for an intent, and either
//! invoke the chosen tool (feeding the output back as an observation) or
//! finish. Strictly sequential - one model call per thinking step, one tool
//! call per acting step, nothing concurrent.
//!
//! Tool failures become observations the next thinking step can react to.
//! Model failures end the run. A step ceiling and a bounded tolerance for
//! unparseable replies keep every run finite.

mod intent;
mod prompt;

pub use intent::{extract_thought, parse_intent, strip_thought_label, Intent, MalformedReply};
pub use prompt::build_prompt;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::config::AgentLimits;
use crate::llm::{CompletionClient, LlmError};
use crate::tools::ToolRegistry;

/// One tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolUse {
    pub tool: String,
    pub input: String,
}

/// Record of one reasoning step. Ephemeral: it exists for the duration of
/// a run and is surfaced to the caller as the run's step log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentTurn {
    /// The model's reasoning before acting
    pub thought: String,
    /// The tool invocation, if this step acted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ToolUse>,
    /// The tool output or synthetic feedback fed back to the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
}

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The step ceiling was reached without a final answer. The partial
    /// transcript is carried so the caller can surface a best-effort answer.
    #[error("step ceiling of {max_steps} reached without a final answer")]
    MaxStepsExceeded {
        max_steps: usize,
        transcript: Vec<AgentTurn>,
    },

    /// The model kept producing replies matching neither intent.
    #[error("model reply could not be parsed after {attempts} attempts")]
    UnparseableOutput {
        attempts: usize,
        transcript: Vec<AgentTurn>,
    },

    /// The model call itself failed; shown to the user verbatim.
    #[error(transparent)]
    Model(#[from] LlmError),
}

/// A completed run: the final answer and the turns that produced it.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub answer: String,
    pub turns: Vec<AgentTurn>,
}

/// The agent: a model client, an immutable tool set, and run bounds.
pub struct Agent {
    llm: Arc<dyn CompletionClient>,
    tools: Arc<ToolRegistry>,
    limits: AgentLimits,
}

impl Agent {
    pub fn new(llm: Arc<dyn CompletionClient>, tools: Arc<ToolRegistry>, limits: AgentLimits) -> Self {
        Self { llm, tools, limits }
    }

    /// Run the loop for one question.
    pub async fn run(&self, question: &str) -> Result<AgentOutcome, AgentError> {
        let mut turns: Vec<AgentTurn> = Vec::new();
        let mut parse_failures = 0usize;
        let stop = ["Observation:".to_string()];

        for step in 0..self.limits.max_steps {
            let prompt = build_prompt(question, &self.tools, &turns);
            tracing::debug!(step = step + 1, "thinking");

            let reply = self.llm.complete(&prompt, Some(&stop)).await?;

            match parse_intent(&reply) {
                Ok(Intent::FinalAnswer(answer)) => {
                    tracing::info!(steps = step + 1, "run finished with a final answer");
                    return Ok(AgentOutcome { answer, turns });
                }
                Ok(Intent::UseTool { name, input }) => {
                    parse_failures = 0;
                    let thought = extract_thought(&reply);

                    let observation = match self.tools.get(&name) {
                        Some(tool) => {
                            tracing::info!(tool = %name, "acting");
                            match tool.invoke(&input).await {
                                Ok(output) => output,
                                Err(e) => {
                                    // Tool failure is data for the next
                                    // thinking step, not the end of the run.
                                    tracing::warn!(tool = %name, error = %e, "tool invocation failed");
                                    format!("Error: {}", e)
                                }
                            }
                        }
                        None => {
                            tracing::warn!(tool = %name, "model chose an invalid tool name");
                            format!(
                                "Error: invalid tool name {:?}. Valid tools: {}. Tool names are case-sensitive.",
                                name,
                                self.tools.names().join(", ")
                            )
                        }
                    };

                    turns.push(AgentTurn {
                        thought,
                        action: Some(ToolUse { tool: name, input }),
                        observation: Some(observation),
                    });
                }
                Err(err) => {
                    parse_failures += 1;
                    tracing::warn!(attempt = parse_failures, error = %err, "unparseable model reply");

                    if parse_failures >= self.limits.max_parse_retries {
                        return Err(AgentError::UnparseableOutput {
                            attempts: parse_failures,
                            transcript: turns,
                        });
                    }

                    turns.push(AgentTurn {
                        thought: strip_thought_label(&reply),
                        action: None,
                        observation: Some(format!(
                            "Error: could not parse the reply ({}). Use `Action:` and `Action Input:` to call a tool, or `Final Answer:` to answer.",
                            err.reason
                        )),
                    });
                }
            }
        }

        Err(AgentError::MaxStepsExceeded {
            max_steps: self.limits.max_steps,
            transcript: turns,
        })
    }
}

/// Best-effort answer assembled from a partial transcript when a run hit
/// its step ceiling.
pub fn partial_answer(turns: &[AgentTurn]) -> String {
    let last_observation = turns
        .iter()
        .rev()
        .find_map(|t| t.observation.as_deref())
        .filter(|o| !o.trim().is_empty());

    match last_observation {
        Some(obs) => format!(
            "I ran out of reasoning steps before reaching a final answer. The last thing I found:\n{}",
            obs
        ),
        None => "I ran out of reasoning steps before reaching a final answer.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmErrorKind;
    use crate::tools::{Tool, ToolError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Deterministic model stub: pops scripted replies in order.
    struct Scripted {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for Scripted {
        async fn complete(
            &self,
            prompt: &str,
            _stop: Option<&[String]>,
        ) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| LlmError::transport("script exhausted".to_string()))
        }
    }

    /// Model stub that always asks for the same tool.
    struct AlwaysActing;

    #[async_trait]
    impl CompletionClient for AlwaysActing {
        async fn complete(
            &self,
            _prompt: &str,
            _stop: Option<&[String]>,
        ) -> Result<String, LlmError> {
            Ok("Thought: keep going\nAction: echo\nAction Input: again".to_string())
        }
    }

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo the input back."
        }
        async fn invoke(&self, input: &str) -> Result<String, ToolError> {
            Ok(format!("echo: {}", input))
        }
    }

    struct Failing;

    #[async_trait]
    impl Tool for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn description(&self) -> &str {
            "Always fails."
        }
        async fn invoke(&self, _input: &str) -> Result<String, ToolError> {
            Err(ToolError::evaluation_failed("cannot parse expression"))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        Arc::new(ToolRegistry::from_tools(vec![
            Arc::new(Echo),
            Arc::new(Failing),
        ]))
    }

    fn agent(llm: Arc<dyn CompletionClient>) -> Agent {
        Agent::new(llm, registry(), AgentLimits::default())
    }

    #[tokio::test]
    async fn test_pure_reasoning_question_finishes_in_one_step() {
        let llm = Scripted::new(&["Thought: easy.\nFinal Answer: four"]);
        let outcome = agent(llm.clone()).run("What is 2 + 2?").await.unwrap();
        assert_eq!(outcome.answer, "four");
        assert!(outcome.turns.is_empty());
        assert_eq!(llm.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let llm = Scripted::new(&[
            "Thought: let me try the tool.\nAction: echo\nAction Input: hello",
            "Thought: I now know the final answer.\nFinal Answer: it said hello",
        ]);
        let outcome = agent(llm.clone()).run("say hello").await.unwrap();

        assert_eq!(outcome.answer, "it said hello");
        assert_eq!(outcome.turns.len(), 1);
        let turn = &outcome.turns[0];
        assert_eq!(turn.action.as_ref().unwrap().tool, "echo");
        assert_eq!(turn.observation.as_deref(), Some("echo: hello"));

        // The observation must be fed back in the second prompt.
        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[1].contains("Observation: echo: hello"));
    }

    #[tokio::test]
    async fn test_tool_failure_becomes_observation() {
        let llm = Scripted::new(&[
            "Thought: evaluate.\nAction: failing\nAction Input: 2 +* 3",
            "Thought: that failed.\nFinal Answer: I could not compute it",
        ]);
        let outcome = agent(llm).run("compute").await.unwrap();
        assert_eq!(outcome.turns.len(), 1);
        let obs = outcome.turns[0].observation.as_deref().unwrap();
        assert!(obs.starts_with("Error: Evaluation failed"));
    }

    #[tokio::test]
    async fn test_invalid_tool_name_records_observation_and_retries() {
        // Case mismatch: "Echo" is not "echo". Resolution is exact-match.
        let llm = Scripted::new(&[
            "Thought: use the tool.\nAction: Echo\nAction Input: hi",
            "Thought: fix the name.\nAction: echo\nAction Input: hi",
            "Thought: done.\nFinal Answer: ok",
        ]);
        let outcome = agent(llm).run("say hi").await.unwrap();

        assert_eq!(outcome.turns.len(), 2);
        let first_obs = outcome.turns[0].observation.as_deref().unwrap();
        assert!(first_obs.contains("invalid tool name"));
        assert!(first_obs.contains("echo"));
        assert_eq!(outcome.turns[1].observation.as_deref(), Some("echo: hi"));
    }

    #[tokio::test]
    async fn test_max_steps_exceeded_at_exact_ceiling() {
        let limits = AgentLimits {
            max_steps: 4,
            max_parse_retries: 3,
        };
        let agent = Agent::new(Arc::new(AlwaysActing), registry(), limits);
        let err = agent.run("loop forever").await.unwrap_err();

        match err {
            AgentError::MaxStepsExceeded {
                max_steps,
                transcript,
            } => {
                assert_eq!(max_steps, 4);
                assert_eq!(transcript.len(), 4);
            }
            other => panic!("expected MaxStepsExceeded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparseable_output_after_bounded_retries() {
        let llm = Scripted::new(&["rambling", "more rambling", "still rambling"]);
        let err = agent(llm.clone()).run("q").await.unwrap_err();

        match err {
            AgentError::UnparseableOutput { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected UnparseableOutput, got {:?}", other),
        }
        // Exactly max_parse_retries model calls were made.
        assert_eq!(llm.prompts.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_well_formed_reply_resets_parse_failure_count() {
        let llm = Scripted::new(&[
            "rambling",
            "rambling again",
            "Thought: recovered.\nAction: echo\nAction Input: a",
            "rambling",
            "rambling again",
            "Thought: done.\nFinal Answer: fine",
        ]);
        let limits = AgentLimits {
            max_steps: 10,
            max_parse_retries: 3,
        };
        let agent = Agent::new(llm, registry(), limits);
        let outcome = agent.run("q").await.unwrap();
        assert_eq!(outcome.answer, "fine");
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let llm = Scripted::new(&[]);
        let err = agent(llm).run("q").await.unwrap_err();
        match err {
            AgentError::Model(e) => assert_eq!(e.kind, LlmErrorKind::TransportError),
            other => panic!("expected Model error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_identical_runs_yield_identical_turns() {
        let script = [
            "Thought: try the tool.\nAction: echo\nAction Input: same",
            "Thought: done.\nFinal Answer: same answer",
        ];
        let first = agent(Scripted::new(&script)).run("q").await.unwrap();
        let second = agent(Scripted::new(&script)).run("q").await.unwrap();

        assert_eq!(first.answer, second.answer);
        assert_eq!(first.turns, second.turns);
    }

    #[tokio::test]
    async fn test_proportional_work_question_uses_calculator() {
        use crate::tools::Calculator;

        // The translation path is never hit: the model supplies a symbolic
        // expression, so the calculator's model client can be inert.
        let inert = Scripted::new(&[]);
        let tools = Arc::new(ToolRegistry::from_tools(vec![Arc::new(Calculator::new(
            inert,
        ))]));

        let llm = Scripted::new(&[
            "Thought: total work is 18 * 35 man-days; divide by 15 days.\nAction: calculator\nAction Input: (18 * 35) / 15",
            "Thought: I now know the final answer.\nFinal Answer: 42 men are required to reap the field in 15 days.",
        ]);
        let agent = Agent::new(llm, tools, AgentLimits::default());

        let outcome = agent
            .run("18 men can reap a field in 35 days. For reaping the same field in 15 days, how many men are required?")
            .await
            .unwrap();

        assert_eq!(outcome.turns.len(), 1);
        assert_eq!(outcome.turns[0].action.as_ref().unwrap().tool, "calculator");
        assert_eq!(outcome.turns[0].observation.as_deref(), Some("42"));
        assert!(outcome.answer.contains("42"));
    }

    #[tokio::test]
    async fn test_knowledge_question_uses_lookup_tool() {
        struct FakeLookup;

        #[async_trait]
        impl Tool for FakeLookup {
            fn name(&self) -> &str {
                "wikipedia"
            }
            fn description(&self) -> &str {
                "Look up factual information."
            }
            async fn invoke(&self, _input: &str) -> Result<String, ToolError> {
                Ok("Page: President of France\nSummary: Emmanuel Macron has served as \
                    President of France since 2017."
                    .to_string())
            }
        }

        let tools = Arc::new(ToolRegistry::from_tools(vec![Arc::new(FakeLookup)]));
        let llm = Scripted::new(&[
            "Thought: this needs a lookup.\nAction: wikipedia\nAction Input: current president of France",
            "Thought: the lookup answered it.\nFinal Answer: The current president of France is Emmanuel Macron.",
        ]);
        let agent = Agent::new(llm, tools, AgentLimits::default());

        let outcome = agent
            .run("Who is the current president of France?")
            .await
            .unwrap();

        assert_eq!(outcome.turns.len(), 1);
        assert_eq!(outcome.turns[0].action.as_ref().unwrap().tool, "wikipedia");
        assert!(outcome.answer.contains("Macron"));
    }

    #[test]
    fn test_partial_answer_uses_last_observation() {
        let turns = vec![
            AgentTurn {
                thought: "a".to_string(),
                action: None,
                observation: Some("first".to_string()),
            },
            AgentTurn {
                thought: "b".to_string(),
                action: None,
                observation: Some("latest finding".to_string()),
            },
        ];
        let answer = partial_answer(&turns);
        assert!(answer.contains("latest finding"));
        assert!(!answer.contains("first"));

        assert!(partial_answer(&[]).contains("ran out of reasoning steps"));
    }
}
