//! API request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentTurn;
use crate::session::Message;

/// Request to ask a question within a session.
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    /// The user's question
    pub question: String,
}

/// How an agent run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The run produced a final answer
    Completed,
    /// The step ceiling was hit; the answer is best-effort
    MaxStepsExceeded,
    /// The model kept producing unparseable replies
    UnparseableOutput,
}

/// Response to a question: the answer and the steps that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub status: RunStatus,
    /// Intermediate reasoning steps, in order
    pub steps: Vec<AgentTurn>,
}

/// Response after creating a session.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionResponse {
    pub id: Uuid,
}

/// A session's transcript.
#[derive(Debug, Clone, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
    pub max_steps: usize,
}
