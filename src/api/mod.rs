//! HTTP API.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check
//! - `POST /api/sessions` - Create a chat session
//! - `GET /api/sessions/{id}/messages` - Get the session transcript
//! - `POST /api/sessions/{id}/ask` - Ask a question (runs one agent loop)

mod routes;
pub mod types;

pub use routes::{serve, AppState};
