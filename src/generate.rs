//! Generation collaborator: turns a prompt plus conversation history
//! into answer text.
//!
//! The aggregator treats generated output purely as raw text possibly
//! containing a thinking delimiter and an answer marker. Blank output
//! is [`AggregatorError::EmptyGeneration`] and must leave conversation
//! history untouched.

use crate::error::AggregatorError;
use crate::session::{ChatMessage, Role};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options forwarded to the generation collaborator.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Context window size in tokens.
    pub context_tokens: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            model: "mistral-small:24b-instruct-2501-q4_K_M".into(),
            temperature: 0.15,
            context_tokens: 16384,
        }
    }
}

/// A text generation collaborator.
///
/// Implementations must be `Send + Sync`; the aggregator is generic
/// over the concrete generator so tests can substitute a scripted one.
pub trait Generator: Send + Sync {
    /// Generate answer text for `prompt` given prior conversation.
    ///
    /// # Errors
    ///
    /// Returns [`AggregatorError::EmptyGeneration`] when the
    /// collaborator produced blank text, or
    /// [`AggregatorError::Network`] / [`AggregatorError::RateLimited`]
    /// for transport failures.
    fn generate(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        options: &GenerateOptions,
    ) -> impl std::future::Future<Output = Result<String, AggregatorError>> + Send;
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_ctx: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    message: Option<OllamaMessage>,
}

/// Ollama chat API client (`POST {base}/api/chat`, non-streaming).
pub struct OllamaGenerator {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaGenerator {
    /// Create a client for the Ollama instance at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`AggregatorError::Network`] if the HTTP client cannot
    /// be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AggregatorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AggregatorError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn role_name(role: Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl Generator for OllamaGenerator {
    async fn generate(
        &self,
        prompt: &str,
        history: &[ChatMessage],
        options: &GenerateOptions,
    ) -> Result<String, AggregatorError> {
        let mut messages: Vec<OllamaMessage> = history
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| OllamaMessage {
                role: Self::role_name(m.role).to_string(),
                content: m.content.clone(),
            })
            .collect();
        messages.push(OllamaMessage {
            role: "user".into(),
            content: prompt.to_string(),
        });

        let request = OllamaRequest {
            model: &options.model,
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
                num_ctx: options.context_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AggregatorError::Network(format!("generation request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AggregatorError::RateLimited(format!(
                "generation: HTTP {status}"
            )));
        }
        if !status.is_success() {
            return Err(AggregatorError::Network(format!("generation: HTTP {status}")));
        }

        let body: OllamaResponse = response
            .json()
            .await
            .map_err(|e| AggregatorError::Network(format!("generation response: {e}")))?;

        let text = body.message.map(|m| m.content).unwrap_or_default();
        if text.trim().is_empty() {
            return Err(AggregatorError::EmptyGeneration);
        }
        Ok(text)
    }
}
