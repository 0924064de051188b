//! Knowledge lookup tool backed by the public Wikipedia API.
//!
//! Two calls per lookup: a full-text search for matching page titles, then
//! an intro-extract fetch for the top hits. "Nothing found" is a normal
//! answer for the agent to reason about, not an error.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{Tool, ToolError};

const WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const MAX_RESULTS: usize = 3;
const MAX_SUMMARY_CHARS: usize = 800;

/// Search Wikipedia and return short page summaries.
pub struct Wikipedia {
    client: reqwest::Client,
}

impl Wikipedia {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent("reckoner/0.1 (https://github.com/reckoner)")
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }

    /// Run the search query, returning matching page titles.
    async fn search_titles(&self, query: &str) -> Result<Vec<String>, ToolError> {
        let url = format!(
            "{}?action=query&list=search&format=json&srlimit={}&srsearch={}",
            WIKIPEDIA_API_URL,
            MAX_RESULTS,
            urlencoding::encode(query)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ToolError::transport(format!("Wikipedia search failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::lookup_failed(format!(
                "Wikipedia search returned HTTP {}",
                status
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ToolError::lookup_failed(format!("Unexpected search response: {}", e)))?;

        Ok(parsed
            .query
            .search
            .into_iter()
            .map(|hit| hit.title)
            .collect())
    }

    /// Fetch plain-text intro extracts for the given page titles.
    async fn fetch_extracts(&self, titles: &[String]) -> Result<Vec<PageExtract>, ToolError> {
        let url = format!(
            "{}?action=query&prop=extracts&exintro&explaintext&format=json&titles={}",
            WIKIPEDIA_API_URL,
            urlencoding::encode(&titles.join("|"))
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ToolError::transport(format!("Wikipedia extract fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::lookup_failed(format!(
                "Wikipedia extracts returned HTTP {}",
                status
            )));
        }

        let parsed: ExtractResponse = response
            .json()
            .await
            .map_err(|e| ToolError::lookup_failed(format!("Unexpected extract response: {}", e)))?;

        // Preserve the search ranking, not the response map order.
        let mut by_title: HashMap<String, PageExtract> = parsed
            .query
            .pages
            .into_values()
            .map(|p| (p.title.clone(), p))
            .collect();

        Ok(titles
            .iter()
            .filter_map(|t| by_title.remove(t))
            .collect())
    }
}

impl Default for Wikipedia {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for Wikipedia {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "Look up factual information on Wikipedia. Use for questions about people, places, events, dates, and other world knowledge. Input: a search query."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let query = input.trim();
        if query.is_empty() {
            return Ok("No search query was given.".to_string());
        }

        let titles = self.search_titles(query).await?;
        if titles.is_empty() {
            return Ok(format!("No Wikipedia results found for: {}", query));
        }

        let extracts = self.fetch_extracts(&titles).await?;
        if extracts.is_empty() {
            return Ok(format!("No Wikipedia results found for: {}", query));
        }

        let summaries: Vec<String> = extracts
            .iter()
            .filter(|p| !p.extract.trim().is_empty())
            .map(|p| {
                format!(
                    "Page: {}\nSummary: {}",
                    p.title,
                    truncate_chars(p.extract.trim(), MAX_SUMMARY_CHARS)
                )
            })
            .collect();

        if summaries.is_empty() {
            return Ok(format!("No Wikipedia results found for: {}", query));
        }

        Ok(summaries.join("\n\n"))
    }
}

/// Truncate on a character boundary, appending an ellipsis when cut.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: SearchQuery,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: ExtractQuery,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, PageExtract>,
}

#[derive(Debug, Deserialize)]
struct PageExtract {
    title: String,
    #[serde(default)]
    extract: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_parsing() {
        let body = r#"{"query":{"search":[{"ns":0,"title":"France","pageid":5843419}]}}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.query.search[0].title, "France");
    }

    #[test]
    fn test_extract_response_parsing() {
        let body = r#"{"query":{"pages":{"5843419":{"pageid":5843419,"title":"France","extract":"France is a country in Western Europe."}}}}"#;
        let parsed: ExtractResponse = serde_json::from_str(body).unwrap();
        let page = parsed.query.pages.get("5843419").unwrap();
        assert_eq!(page.title, "France");
        assert!(page.extract.starts_with("France is"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        // Multi-byte characters must not be split.
        let s = "日本語のテキスト";
        assert_eq!(truncate_chars(s, 3), "日本語...");
    }

    #[tokio::test]
    async fn test_empty_query_is_not_an_error() {
        let wiki = Wikipedia::new();
        let out = wiki.invoke("   ").await.unwrap();
        assert!(out.contains("No search query"));
    }
}
