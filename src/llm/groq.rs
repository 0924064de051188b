//! Groq API client (OpenAI-compatible chat completions endpoint).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::{classify_http_status, LlmError, LlmErrorKind};
use super::CompletionClient;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Groq chat completions client.
///
/// Stateless: each `complete` call is one HTTP request carrying the full
/// prompt. Failures are classified but never retried here.
pub struct GroqClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GroqClient {
    /// Create a new client for the given credential and model.
    pub fn new(api_key: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            model,
        }
    }

    /// Parse Retry-After header if present.
    fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
        headers
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok().map(Duration::from_secs))
    }

    /// Create an LlmError from HTTP response status and body.
    fn create_error(
        status: reqwest::StatusCode,
        body: &str,
        retry_after: Option<Duration>,
    ) -> LlmError {
        let status_code = status.as_u16();

        match classify_http_status(status_code) {
            LlmErrorKind::AuthFailure => LlmError::auth_failure(status_code, body.to_string()),
            LlmErrorKind::RateLimited => LlmError::rate_limited(body.to_string(), retry_after),
            _ => LlmError::transport_status(status_code, body.to_string()),
        }
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, prompt: &str, stop: Option<&[String]>) -> Result<String, LlmError> {
        let request = GroqRequest {
            model: self.model.clone(),
            messages: vec![GroqMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            stop: stop.map(|s| s.to_vec()),
            temperature: Some(0.0),
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "sending completion request");

        let response = match self
            .client
            .post(GROQ_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                if e.is_timeout() {
                    return Err(LlmError::transport(format!("Request timeout: {}", e)));
                } else if e.is_connect() {
                    return Err(LlmError::transport(format!("Connection failed: {}", e)));
                } else {
                    return Err(LlmError::transport(format!("Request failed: {}", e)));
                }
            }
        };

        let status = response.status();
        let retry_after = Self::parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(Self::create_error(status, &body, retry_after));
        }

        let parsed: GroqResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::parse_error(format!("Failed to parse response: {}, body: {}", e, body))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::parse_error("No choices in response".to_string()))?;

        choice
            .message
            .content
            .ok_or_else(|| LlmError::parse_error("Empty completion content".to_string()))
    }
}

/// Chat completions request body.
#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct GroqMessage {
    role: &'static str,
    content: String,
}

/// Chat completions response body.
#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
}

#[derive(Debug, Deserialize)]
struct GroqResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping_from_status() {
        let err = GroqClient::create_error(
            reqwest::StatusCode::UNAUTHORIZED,
            "invalid api key",
            None,
        );
        assert_eq!(err.kind, LlmErrorKind::AuthFailure);

        let err = GroqClient::create_error(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            "rate limit reached",
            Some(Duration::from_secs(10)),
        );
        assert_eq!(err.kind, LlmErrorKind::RateLimited);
        assert_eq!(err.retry_after, Some(Duration::from_secs(10)));

        let err = GroqClient::create_error(
            reqwest::StatusCode::BAD_GATEWAY,
            "upstream down",
            None,
        );
        assert_eq!(err.kind, LlmErrorKind::TransportError);
    }

    #[test]
    fn test_request_serialization_omits_empty_fields() {
        let request = GroqRequest {
            model: "gemma2-9b-it".to_string(),
            messages: vec![GroqMessage {
                role: "user",
                content: "hello".to_string(),
            }],
            stop: None,
            temperature: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("stop"));
        assert!(!json.contains("temperature"));
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"42"}}]}"#;
        let parsed: GroqResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("42")
        );
    }
}
