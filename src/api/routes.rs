//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::agent::{partial_answer, Agent, AgentError};
use crate::config::Config;
use crate::llm::{GroqClient, LlmErrorKind};
use crate::session::{Message, SessionStore};
use crate::tools::ToolRegistry;

use super::types::*;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// The agent shared across sessions; holds the model client and the
    /// immutable tool registry built once at startup.
    pub agent: Agent,
    /// Live sessions, each with its own conversation
    pub sessions: SessionStore,
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let llm = Arc::new(GroqClient::new(config.api_key.clone(), config.model.clone()));
    let tools = Arc::new(ToolRegistry::new(llm.clone()));
    let agent = Agent::new(llm, tools, config.limits);

    let state = Arc::new(AppState {
        config: config.clone(),
        agent,
        sessions: SessionStore::new(),
    });

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id/messages", get(get_messages))
        .route("/api/sessions/:id/ask", post(ask))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.config.model.clone(),
        max_steps: state.config.limits.max_steps,
    })
}

async fn create_session(State(state): State<Arc<AppState>>) -> Json<CreateSessionResponse> {
    let id = state.sessions.create().await;
    Json(CreateSessionResponse { id })
}

async fn get_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessagesResponse>, (StatusCode, String)> {
    let messages = state
        .sessions
        .messages(id)
        .await
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Session {} not found", id)))?;

    Ok(Json(MessagesResponse { messages }))
}

/// Run one agent loop for a question and append the exchange to the
/// session transcript.
async fn ask(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, String)> {
    let question = request.question.trim().to_string();
    if question.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Question is empty".to_string()));
    }

    if !state.sessions.append(id, Message::user(question.as_str())).await {
        return Err((StatusCode::NOT_FOUND, format!("Session {} not found", id)));
    }

    tracing::info!(session = %id, "running agent for question");

    let response = match state.agent.run(&question).await {
        Ok(outcome) => AskResponse {
            answer: outcome.answer,
            status: RunStatus::Completed,
            steps: outcome.turns,
        },
        Err(AgentError::MaxStepsExceeded { transcript, .. }) => AskResponse {
            answer: partial_answer(&transcript),
            status: RunStatus::MaxStepsExceeded,
            steps: transcript,
        },
        Err(AgentError::UnparseableOutput {
            attempts,
            transcript,
        }) => AskResponse {
            answer: format!(
                "I could not produce a well-formed answer after {} attempts. Please try rephrasing the question.",
                attempts
            ),
            status: RunStatus::UnparseableOutput,
            steps: transcript,
        },
        Err(AgentError::Model(e)) => {
            // Model failures are shown verbatim; an auth failure means the
            // credential is bad and the session cannot continue.
            tracing::error!(session = %id, error = %e, "model call failed");
            let status = if e.kind == LlmErrorKind::AuthFailure {
                StatusCode::UNAUTHORIZED
            } else {
                StatusCode::BAD_GATEWAY
            };
            return Err((status, e.to_string()));
        }
    };

    state
        .sessions
        .append(id, Message::assistant(response.answer.as_str()))
        .await;

    Ok(Json(response))
}
