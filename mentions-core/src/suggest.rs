use crate::classify::classify;
use crate::error::{CoreError, LlmError};
use crate::source::CompletionProvider;
use crate::types::{ActivePrompt, Category, SuggestionResult};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Wraps a completion provider with the active prompt. One attempt per
/// item; failures come back as placeholder text instead of an error.
pub struct Suggester<'a, P> {
    provider: &'a P,
    prompt: &'a ActivePrompt,
    timeout: Duration,
}

impl<'a, P: CompletionProvider> Suggester<'a, P> {
    pub fn new(provider: &'a P, prompt: &'a ActivePrompt) -> Self {
        Self {
            provider,
            prompt,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build_request(&self, title: &str, body: &str) -> String {
        let content = if body.is_empty() {
            format!("Title: {}", title)
        } else {
            format!("Title: {}\n\n{}", title, body)
        };
        format!("{}\n\n{}", self.prompt.text, content)
    }

    pub async fn suggest(&self, title: &str, body: &str) -> SuggestionResult {
        let request = self.build_request(title, body);
        debug!(
            provider = self.provider.name(),
            chars = request.len(),
            "Requesting suggestion"
        );

        let outcome = match tokio::time::timeout(self.timeout, self.provider.complete(&request)).await
        {
            Ok(result) => result,
            Err(_) => Err(CoreError::Llm(LlmError::RequestTimeout {
                provider: self.provider.name().to_string(),
                seconds: self.timeout.as_secs(),
            })),
        };

        match outcome {
            Ok(text) => SuggestionResult {
                text,
                succeeded: true,
            },
            Err(e) => {
                warn!("Suggestion failed: {}", e);
                SuggestionResult {
                    text: format!("Error generating suggestion: {}", e),
                    succeeded: false,
                }
            }
        }
    }

    pub async fn suggest_and_classify(&self, title: &str, body: &str) -> (SuggestionResult, Category) {
        let suggestion = self.suggest(title, body).await;
        let category = classify(&suggestion.text);
        (suggestion, category)
    }
}
