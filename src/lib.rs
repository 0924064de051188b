//! # reckoner
//!
//! Math problem solver and knowledge lookup assistant driven by a
//! tool-using LLM agent.
//!
//! A question goes through one agent loop: the model is prompted with the
//! question and the available tools, and each reply either invokes a tool
//! (whose output is fed back as an observation) or carries the final
//! answer. Three tools are registered at startup:
//!
//! - `wikipedia` - knowledge lookup against the public Wikipedia API
//! - `calculator` - arithmetic evaluation, with model-assisted translation
//!   of word problems into expressions
//! - `reasoning` - a single step-by-step model completion
//!
//! ```text
//!   question ──► Agent loop ──► answer
//!                 │    ▲
//!          Action │    │ Observation
//!                 ▼    │
//!              ToolRegistry ──► wikipedia / calculator / reasoning
//! ```
//!
//! ## Modules
//! - `agent`: the loop, intent parsing and prompt construction
//! - `llm`: model client trait and the Groq implementation
//! - `tools`: capability tools and their registry
//! - `session`: per-session append-only conversation logs
//! - `api`: thin HTTP surface for a chat frontend

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod session;
pub mod tools;

pub use config::Config;
