//! Best-effort structured extraction from model replies.
//!
//! The model is steered toward a `Thought:` / `Action:` / `Action Input:` /
//! `Final Answer:` layout but its output is free text and not guaranteed
//! well-formed. Parsing is pure (no I/O) and pattern-based; anything that
//! cannot be resolved to exactly one intent is `MalformedReply`.

use regex::Regex;

/// A structured intent extracted from one model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Invoke the named tool with the given input.
    UseTool { name: String, input: String },
    /// The reply carries the final answer to the question.
    FinalAnswer(String),
}

/// A reply that matched neither intent, or matched both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedReply {
    pub reason: String,
}

impl MalformedReply {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for MalformedReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed model reply: {}", self.reason)
    }
}

impl std::error::Error for MalformedReply {}

fn action_re() -> Regex {
    Regex::new(r"(?im)^[ \t]*action[ \t]*:[ \t]*(.+)$").expect("static regex")
}

fn action_input_re() -> Regex {
    Regex::new(r"(?is)action[ \t]*input[ \t]*:[ \t]*(.*)").expect("static regex")
}

fn final_answer_re() -> Regex {
    Regex::new(r"(?i)final[ \t]+answer[ \t]*:").expect("static regex")
}

/// Markers at which a captured action input ends (the model kept talking).
fn continuation_re() -> Regex {
    Regex::new(r"(?im)^[ \t]*(observation|thought|action)[ \t]*:").expect("static regex")
}

/// Parse one model reply into exactly one intent.
pub fn parse_intent(reply: &str) -> Result<Intent, MalformedReply> {
    let action = action_re().captures(reply);
    let has_final = final_answer_re().is_match(reply);

    match (action, has_final) {
        (Some(_), true) => Err(MalformedReply::new(
            "reply contains both an action and a final answer",
        )),
        (Some(caps), false) => {
            let name = clean_tool_name(&caps[1]);
            if name.is_empty() {
                return Err(MalformedReply::new("action line names no tool"));
            }

            let input_caps = action_input_re()
                .captures(reply)
                .ok_or_else(|| MalformedReply::new("action without an action input"))?;
            let input = clean_action_input(&input_caps[1]);

            Ok(Intent::UseTool { name, input })
        }
        (None, true) => {
            // Take the text after the last marker; models sometimes restate
            // the label while thinking out loud before committing.
            let last = final_answer_re()
                .find_iter(reply)
                .last()
                .expect("is_match guaranteed a marker");
            let answer = reply[last.end()..].trim();
            if answer.is_empty() {
                return Err(MalformedReply::new("final answer is empty"));
            }
            Ok(Intent::FinalAnswer(answer.to_string()))
        }
        (None, false) => Err(MalformedReply::new(
            "no Action or Final Answer found in reply",
        )),
    }
}

/// The free-text reasoning preceding the first intent marker, with the
/// `Thought:` label stripped.
pub fn extract_thought(reply: &str) -> String {
    let boundary = action_re()
        .find(reply)
        .map(|m| m.start())
        .into_iter()
        .chain(final_answer_re().find(reply).map(|m| m.start()))
        .min()
        .unwrap_or(reply.len());

    strip_thought_label(&reply[..boundary])
}

/// Strip a leading `Thought:` label and trim.
pub fn strip_thought_label(text: &str) -> String {
    let re = Regex::new(r"(?i)^[ \t]*thought[ \t]*:[ \t]*").expect("static regex");
    re.replace(text.trim(), "").trim().to_string()
}

/// Remove decoration from a captured tool name: backticks, quotes,
/// brackets, trailing punctuation.
fn clean_tool_name(raw: &str) -> String {
    let mut name = raw.trim();
    loop {
        let stripped = name
            .trim_matches(|c| matches!(c, '`' | '"' | '\'' | '[' | ']' | '*'))
            .trim_end_matches(|c| matches!(c, '.' | ','))
            .trim();
        if stripped == name {
            return name.to_string();
        }
        name = stripped;
    }
}

/// Trim a captured action input: stop at any continuation marker, then
/// strip code fences and wrapping quotes.
fn clean_action_input(raw: &str) -> String {
    let cut = continuation_re()
        .find(raw)
        .map(|m| m.start())
        .unwrap_or(raw.len());

    let mut input = raw[..cut].trim();

    if input.starts_with("```") {
        input = input.trim_start_matches("```");
        // Drop a language tag on the opening fence.
        if let Some(idx) = input.find('\n') {
            if !input[..idx].trim().contains(' ') && input[..idx].len() < 20 {
                input = &input[idx + 1..];
            }
        }
        input = input.trim_end_matches("```").trim();
    }

    input.trim_matches('`').trim_matches('"').trim().to_string()
}
