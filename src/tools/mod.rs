//! Capability tools for the agent.
//!
//! Each tool wraps one external capability behind a uniform contract:
//! a unique name, a description shown to the model, and
//! `invoke(input) -> text`. Tool failures are data for the agent loop -
//! they become observations, never abort a run, and no tool retries its
//! own calls.

mod calculator;
mod reasoning;
mod wikipedia;

pub use calculator::Calculator;
pub use reasoning::Reasoning;
pub use wikipedia::Wikipedia;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::CompletionClient;

/// Error from a tool invocation.
#[derive(Debug, Clone)]
pub struct ToolError {
    /// The kind of failure
    pub kind: ToolErrorKind,
    /// Error message
    pub message: String,
}

impl ToolError {
    /// Input could not be parsed or evaluated.
    pub fn evaluation_failed(message: impl Into<String>) -> Self {
        Self {
            kind: ToolErrorKind::EvaluationFailed,
            message: message.into(),
        }
    }

    /// External lookup failed (bad response, unusable data).
    pub fn lookup_failed(message: impl Into<String>) -> Self {
        Self {
            kind: ToolErrorKind::LookupFailed,
            message: message.into(),
        }
    }

    /// The underlying network or model call failed.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ToolErrorKind::TransportError,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ToolError {}

/// Classification of tool failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// Expression could not be parsed or evaluated
    EvaluationFailed,
    /// Reference lookup returned an unusable response
    LookupFailed,
    /// Network or model call failed
    TransportError,
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolErrorKind::EvaluationFailed => write!(f, "Evaluation failed"),
            ToolErrorKind::LookupFailed => write!(f, "Lookup failed"),
            ToolErrorKind::TransportError => write!(f, "Transport error"),
        }
    }
}

/// Information about a tool for prompts and display.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Trait for implementing tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool.
    fn name(&self) -> &str;

    /// A description of what this tool does, shown to the model.
    fn description(&self) -> &str;

    /// Invoke the tool with free-text input, returning free-text output.
    async fn invoke(&self, input: &str) -> Result<String, ToolError>;
}

/// Registry of available tools.
///
/// Built once at startup and immutable afterwards; the agent loop resolves
/// a chosen tool by exact name match. Shared by reference across runs.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a registry with the three default tools.
    ///
    /// The calculator and reasoning tools hold a reference to the model
    /// client; the registry itself never calls the model.
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        let mut tools: HashMap<String, Arc<dyn Tool>> = HashMap::new();

        let wikipedia = Arc::new(Wikipedia::new());
        tools.insert(wikipedia.name().to_string(), wikipedia);

        let calculator = Arc::new(Calculator::new(Arc::clone(&llm)));
        tools.insert(calculator.name().to_string(), calculator);

        let reasoning = Arc::new(Reasoning::new(llm));
        tools.insert(reasoning.name().to_string(), reasoning);

        tracing::info!(count = tools.len(), "tool registry initialized");
        Self { tools }
    }

    /// Create a registry from an explicit tool set (useful for testing).
    pub fn from_tools(list: Vec<Arc<dyn Tool>>) -> Self {
        let mut tools: HashMap<String, Arc<dyn Tool>> = HashMap::new();
        for tool in list {
            tools.insert(tool.name().to_string(), tool);
        }
        Self { tools }
    }

    /// Look up a tool by exact name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists by name.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List all tools, sorted by name for stable prompt construction.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        let mut infos: Vec<ToolInfo> = self
            .tools
            .values()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Tool names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
            Ok(input.to_string())
        }
    }

    #[test]
    fn test_exact_name_resolution() {
        let registry = ToolRegistry::from_tools(vec![Arc::new(Echo)]);
        assert!(registry.has_tool("echo"));
        assert!(!registry.has_tool("Echo"));
        assert!(registry.get("ECHO").is_none());
    }

    #[test]
    fn test_listing_is_sorted() {
        struct Named(&'static str);

        #[async_trait]
        impl Tool for Named {
            fn name(&self) -> &str {
                self.0
            }
            fn description(&self) -> &str {
                "test tool"
            }
            async fn invoke(&self, _input: &str) -> Result<String, ToolError> {
                Ok(String::new())
            }
        }

        let registry = ToolRegistry::from_tools(vec![
            Arc::new(Named("zeta")),
            Arc::new(Named("alpha")),
            Arc::new(Named("mid")),
        ]);
        let names = registry.names();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
        let listed: Vec<String> = registry.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(listed, names);
    }

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::evaluation_failed("bad expression");
        assert_eq!(err.to_string(), "Evaluation failed: bad expression");
    }
}
