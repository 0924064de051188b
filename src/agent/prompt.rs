//! Prompt construction for the agent loop.

use super::AgentTurn;
use crate::tools::ToolRegistry;

/// Build the full prompt for one thinking step: the question, the tool
/// descriptors, and the transcript of prior turns in this run.
pub fn build_prompt(question: &str, tools: &ToolRegistry, turns: &[AgentTurn]) -> String {
    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("- {}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    let tool_names = tools.names().join(", ");

    let mut prompt = format!(
        r#"Answer the following question as best you can. You have access to the following tools:

{tool_descriptions}

Use this exact format:

Question: the input question
Thought: reason about what to do next
Action: the tool to use, exactly one of [{tool_names}]
Action Input: the input to the tool
Observation: the tool result
... (Thought/Action/Action Input/Observation can repeat)
Thought: I now know the final answer
Final Answer: the answer to the original question

When you can answer directly, go straight from Thought to Final Answer without any Action.

Begin!

Question: {question}
"#,
        tool_descriptions = tool_descriptions,
        tool_names = tool_names,
        question = question
    );

    for turn in turns {
        prompt.push_str(&render_turn(turn));
    }

    prompt.push_str("Thought:");
    prompt
}

/// Render one prior turn back into the scratchpad.
fn render_turn(turn: &AgentTurn) -> String {
    let mut out = format!("Thought: {}\n", turn.thought);

    if let Some(action) = &turn.action {
        out.push_str(&format!(
            "Action: {}\nAction Input: {}\n",
            action.tool, action.input
        ));
    }

    if let Some(observation) = &turn.observation {
        out.push_str(&format!("Observation: {}\n", observation));
    }

    out
}
