use mentions_core::{CompletionProvider, CoreError, LlmError};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const PROVIDER: &str = "anthropic";

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Clone, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Unsupported,
}

impl ChatResponse {
    fn first_text(self) -> Option<String> {
        self.content.into_iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Unsupported => None,
        })
    }
}

/// Anthropic Messages API client. Sends the whole prompt as a single user
/// message and returns the first text block of the reply.
#[derive(Debug, Clone)]
pub struct ClaudeProvider {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl ClaudeProvider {
    pub fn new(api_key: String, model: impl Into<String>, timeout: Duration) -> Result<Self, CoreError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            http,
            base_url: ANTHROPIC_API_URL.to_string(),
            model: model.into(),
            max_tokens: 1024,
            timeout,
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap, CoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key).map_err(|_| LlmError::InvalidApiKey {
                provider: PROVIDER.to_string(),
            })?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn status_error(&self, status: reqwest::StatusCode, body: String) -> LlmError {
        match status.as_u16() {
            401 | 403 => LlmError::InvalidApiKey {
                provider: PROVIDER.to_string(),
            },
            404 => LlmError::ModelNotAvailable {
                model: self.model.clone(),
            },
            429 => LlmError::RateLimitExceeded {
                provider: PROVIDER.to_string(),
            },
            code if status.is_server_error() || code == 529 => LlmError::ServiceUnavailable {
                provider: PROVIDER.to_string(),
                status_code: code,
            },
            code => LlmError::RequestRejected {
                provider: PROVIDER.to_string(),
                status_code: code,
                message: body,
            },
        }
    }
}

impl CompletionProvider for ClaudeProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, prompt: &str) -> Result<String, CoreError> {
        let url = format!("{}/messages", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![WireMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(model = %self.model, "Claude chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CoreError::Llm(LlmError::RequestTimeout {
                        provider: PROVIDER.to_string(),
                        seconds: self.timeout.as_secs(),
                    })
                } else {
                    CoreError::Network(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(self.status_error(status, error_text).into());
        }

        let body: ChatResponse = response.json().await.map_err(|e| LlmError::InvalidResponseFormat {
            provider: PROVIDER.to_string(),
            details: e.to_string(),
        })?;

        body.first_text().ok_or_else(|| {
            LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
                details: "response contained no text block".to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ClaudeProvider {
        ClaudeProvider::new(
            "test-key".to_string(),
            "claude-sonnet-4-20250514",
            Duration::from_secs(30),
        )
        .unwrap()
    }

    #[test]
    fn request_serializes_single_user_message() {
        let request = ChatRequest {
            model: "claude-sonnet-4-20250514",
            max_tokens: 1024,
            messages: vec![WireMessage {
                role: "user",
                content: "Prompt\n\nTitle: x",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-sonnet-4-20250514");
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Prompt\n\nTitle: x");
    }

    #[test]
    fn response_takes_first_text_block() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"id":"msg_1","content":[
                {"type":"thinking","thinking":"..."},
                {"type":"text","text":"Bug Report\nThanks"},
                {"type":"text","text":"ignored"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(body.first_text().as_deref(), Some("Bug Report\nThanks"));

        let empty: ChatResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(empty.first_text().is_none());
    }

    #[test]
    fn status_codes_map_to_llm_errors() {
        let p = provider();
        assert!(matches!(
            p.status_error(reqwest::StatusCode::UNAUTHORIZED, String::new()),
            LlmError::InvalidApiKey { .. }
        ));
        assert!(matches!(
            p.status_error(reqwest::StatusCode::TOO_MANY_REQUESTS, String::new()),
            LlmError::RateLimitExceeded { .. }
        ));
        assert!(matches!(
            p.status_error(reqwest::StatusCode::BAD_GATEWAY, String::new()),
            LlmError::ServiceUnavailable { status_code: 502, .. }
        ));
        match p.status_error(reqwest::StatusCode::BAD_REQUEST, "max_tokens too large".to_string()) {
            LlmError::RequestRejected { message, .. } => assert_eq!(message, "max_tokens too large"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let p = provider().with_base_url("http://127.0.0.1:9");
        assert_eq!(p.name(), "anthropic");
        assert!(p.complete("hello").await.is_err());
    }
}
