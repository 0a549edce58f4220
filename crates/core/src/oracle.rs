//! Text Oracle Boundary
//!
//! Every participant in the classroom speaks through a [`TextOracle`]: a prompt
//! goes in, one piece of generated text comes out. The engine never talks to a
//! model provider directly, so tests and offline runs can swap in a
//! [`CannedOracle`] while production wires an [`OpenAICompatibleOracle`].

use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Failures raised while asking the oracle for text.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("Oracle request failed: {0}")]
    Api(#[from] OpenAIError),
    #[error("Oracle returned no content")]
    EmptyResponse,
    #[error("Oracle did not answer within {0:?}")]
    Timeout(Duration),
}

/// A black-box text generator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextOracle: Send + Sync {
    /// Generates one reply for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String, OracleError>;
}

/// An oracle backed by any OpenAI-compatible chat-completions endpoint.
pub struct OpenAICompatibleOracle {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleOracle {
    /// Creates a new oracle.
    ///
    /// # Arguments
    ///
    /// * `config` - API key and base URL of the provider.
    /// * `model` - Model identifier used for every completion (e.g., "llama3-8b-8192").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

#[async_trait]
impl TextOracle for OpenAICompatibleOracle {
    async fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(OracleError::EmptyResponse)
    }
}

/// Wraps another oracle and fails any call that outlives `limit`.
pub struct TimeoutOracle {
    inner: Arc<dyn TextOracle>,
    limit: Duration,
}

impl TimeoutOracle {
    pub fn new(inner: Arc<dyn TextOracle>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl TextOracle for TimeoutOracle {
    async fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        tokio::time::timeout(self.limit, self.inner.generate(prompt))
            .await
            .map_err(|_| OracleError::Timeout(self.limit))?
    }
}

/// A deterministic oracle for offline runs and tests.
///
/// Replies are chosen by the first rule whose needle occurs in the prompt,
/// falling back to a default reply. Every prompt received is recorded.
pub struct CannedOracle {
    default_reply: String,
    rules: Vec<(String, String)>,
    prompts: Mutex<Vec<String>>,
}

impl CannedOracle {
    /// Creates an oracle that answers every prompt with `default_reply`.
    pub fn new(default_reply: impl Into<String>) -> Self {
        Self {
            default_reply: default_reply.into(),
            rules: Vec::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answers with `reply` whenever the prompt contains `needle`.
    pub fn when_prompt_contains(
        mut self,
        needle: impl Into<String>,
        reply: impl Into<String>,
    ) -> Self {
        self.rules.push((needle.into(), reply.into()));
        self
    }

    /// The prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextOracle for CannedOracle {
    async fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default_reply.clone());
        debug!(%reply, "Canned oracle reply");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowOracle;

    #[async_trait]
    impl TextOracle for SlowOracle {
        async fn generate(&self, _prompt: &str) -> Result<String, OracleError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }
    }

    #[tokio::test]
    async fn test_canned_oracle_uses_first_matching_rule() {
        let oracle = CannedOracle::new("ok")
            .when_prompt_contains("index number", "1")
            .when_prompt_contains("index", "never");

        assert_eq!(oracle.generate("Return only the index number.").await.unwrap(), "1");
        assert_eq!(oracle.generate("Say something").await.unwrap(), "ok");
        assert_eq!(
            oracle.prompts(),
            vec!["Return only the index number.".to_string(), "Say something".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_oracle_reports_timeout() {
        let oracle = TimeoutOracle::new(Arc::new(SlowOracle), Duration::from_millis(10));
        let err = oracle.generate("hello").await.unwrap_err();
        assert!(matches!(err, OracleError::Timeout(limit) if limit == Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn test_timeout_oracle_passes_through_fast_replies() {
        let oracle = TimeoutOracle::new(Arc::new(CannedOracle::new("fine")), Duration::from_secs(1));
        assert_eq!(oracle.generate("hello").await.unwrap(), "fine");
    }

    #[tokio::test]
    async fn test_timeout_oracle_propagates_inner_errors() {
        let mut inner = MockTextOracle::new();
        inner
            .expect_generate()
            .returning(|_| Err(OracleError::EmptyResponse));
        let oracle = TimeoutOracle::new(Arc::new(inner), Duration::from_secs(1));
        assert!(matches!(
            oracle.generate("hello").await,
            Err(OracleError::EmptyResponse)
        ));
    }
}
