//! Anthropic API oracle implementation.
//!
//! Makes direct, non-streaming HTTP calls to the Anthropic Messages API for
//! both review generation and persona replies.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{OracleConfig, Speaker, TURN_LIMIT};
use crate::domain::ports::{
    PersonaOracle, PersonaTurn, PromptRole, ReviewOracle, ReviewPrompt,
};

/// Configuration for the Anthropic API oracle.
#[derive(Debug, Clone)]
pub struct AnthropicApiConfig {
    /// API key (will be read from ANTHROPIC_API_KEY env if not set).
    pub api_key: Option<String>,
    /// API base URL.
    pub base_url: String,
    /// Model used for reviews; must accept images.
    pub review_model: String,
    /// Model used for persona replies.
    pub persona_model: String,
    /// API version header.
    pub api_version: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Max tokens to generate for a review.
    pub max_tokens: u32,
    /// Max tokens to generate for a persona reply.
    pub persona_max_tokens: u32,
}

impl Default for AnthropicApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.anthropic.com".to_string(),
            review_model: "claude-sonnet-4-5".to_string(),
            persona_model: "claude-haiku-4-5".to_string(),
            api_version: "2023-06-01".to_string(),
            timeout_secs: 180,
            max_tokens: 8192,
            persona_max_tokens: 256,
        }
    }
}

impl AnthropicApiConfig {
    /// Get API key from config or environment.
    pub fn get_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
    }

    /// Create config with explicit API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl From<&OracleConfig> for AnthropicApiConfig {
    fn from(config: &OracleConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            review_model: config.review_model.clone(),
            persona_model: config.persona_model.clone(),
            timeout_secs: config.request_timeout_secs,
            max_tokens: config.max_tokens,
            ..Self::default()
        }
    }
}

/// Message role in Anthropic API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl From<PromptRole> for MessageRole {
    fn from(role: PromptRole) -> Self {
        match role {
            PromptRole::User => Self::User,
            PromptRole::Assistant => Self::Assistant,
        }
    }
}

/// Cache control marker for Anthropic prompt caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheControl {
    #[serde(rename = "type")]
    pub control_type: String,
}

impl CacheControl {
    pub fn ephemeral() -> Self {
        Self {
            control_type: "ephemeral".to_string(),
        }
    }
}

/// System prompt content block with optional cache_control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

impl SystemContentBlock {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            block_type: "text".to_string(),
            text: content.into(),
            cache_control: None,
        }
    }

    /// Text block marked for prompt caching; the review rules never change.
    pub fn cached_text(content: impl Into<String>) -> Self {
        Self {
            cache_control: Some(CacheControl::ephemeral()),
            ..Self::text(content)
        }
    }
}

/// Inline image payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub media_type: String,
    pub data: String,
}

/// Content block in a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image { source: ImageSource },
    /// Blocks this client does not use (tool calls, thinking, ...)
    #[serde(other)]
    Other,
}

/// A message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: Vec<ContentBlock>,
}

/// Request to the Anthropic Messages API.
#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<Vec<SystemContentBlock>>,
    pub messages: Vec<Message>,
}

/// Usage information from the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
}

/// Response from the Anthropic Messages API.
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub model: String,
    pub stop_reason: Option<String>,
    pub usage: Usage,
}

/// Anthropic API oracle.
pub struct AnthropicApiOracle {
    config: AnthropicApiConfig,
    client: Client,
}

impl AnthropicApiOracle {
    /// Create a new Anthropic API oracle.
    pub fn new(config: AnthropicApiConfig) -> DomainResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                DomainError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &AnthropicApiConfig {
        &self.config
    }

    /// Build the Messages API request for a review prompt.
    pub fn build_review_request(&self, prompt: &ReviewPrompt) -> MessagesRequest {
        let messages = prompt
            .turns
            .iter()
            .map(|turn| {
                let mut content = Vec::with_capacity(2);
                if let Some(image) = &turn.image {
                    content.push(ContentBlock::Image {
                        source: ImageSource {
                            source_type: "base64".to_string(),
                            media_type: image.media_type().to_string(),
                            data: image.base64_data.clone(),
                        },
                    });
                }
                content.push(ContentBlock::Text {
                    text: turn.text.clone(),
                });
                Message {
                    role: turn.role.into(),
                    content,
                }
            })
            .collect();

        MessagesRequest {
            model: self.config.review_model.clone(),
            max_tokens: self.config.max_tokens,
            system: Some(vec![SystemContentBlock::cached_text(&prompt.system)]),
            messages,
        }
    }

    /// Build the Messages API request for a persona reply.
    ///
    /// The user's side maps to `user`, the persona's to `assistant`.
    /// Consecutive messages from one side are merged because the API requires
    /// alternating roles.
    pub fn build_persona_request(&self, turn: PersonaTurn<'_>) -> MessagesRequest {
        let mut messages: Vec<Message> = Vec::new();
        let lines = turn
            .transcript
            .iter()
            .map(|m| {
                let role = if m.speaker == Speaker::You {
                    MessageRole::User
                } else {
                    MessageRole::Assistant
                };
                (role, m.text.as_str())
            })
            .chain(std::iter::once((MessageRole::User, turn.user_message)));

        for (role, text) in lines {
            match messages.last_mut() {
                Some(last) if last.role == role => last.content.push(ContentBlock::Text {
                    text: text.to_string(),
                }),
                _ => messages.push(Message {
                    role,
                    content: vec![ContentBlock::Text {
                        text: text.to_string(),
                    }],
                }),
            }
        }

        MessagesRequest {
            model: self.config.persona_model.clone(),
            max_tokens: self.config.persona_max_tokens,
            system: Some(vec![SystemContentBlock::text(
                turn.persona.system_prompt(turn.turn, TURN_LIMIT),
            )]),
            messages,
        }
    }

    /// Execute a request and return the concatenated text blocks.
    async fn execute(&self, request: &MessagesRequest) -> DomainResult<String> {
        let api_key = self
            .config
            .get_api_key()
            .ok_or_else(|| DomainError::oracle_permanent("ANTHROPIC_API_KEY not set"))?;

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-api-key", &api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DomainError::Timeout {
                        operation: "anthropic request".to_string(),
                        after_ms: self.config.timeout_secs.saturating_mul(1000),
                    }
                } else {
                    DomainError::oracle_transient(format!("API request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = format!("API error {status}: {body}");
            return Err(if is_transient_status(status) {
                DomainError::oracle_transient(message)
            } else {
                DomainError::oracle_permanent(message)
            });
        }

        let result: MessagesResponse = response.json().await.map_err(|e| {
            DomainError::oracle_permanent(format!("Failed to parse response: {e}"))
        })?;

        debug!(
            model = %result.model,
            input_tokens = result.usage.input_tokens,
            output_tokens = result.usage.output_tokens,
            cache_read_tokens = result.usage.cache_read_input_tokens,
            stop_reason = ?result.stop_reason,
            "Anthropic response received"
        );

        // Extract text from content blocks
        let text = result
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(DomainError::oracle_permanent("API response contained no text"));
        }
        Ok(text)
    }
}

/// Rate limits, server errors and overload are worth retrying.
fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() || status.as_u16() == 529
}

#[async_trait]
impl ReviewOracle for AnthropicApiOracle {
    fn name(&self) -> &'static str {
        "anthropic_api"
    }

    async fn generate_review(&self, prompt: &ReviewPrompt) -> DomainResult<String> {
        let request = self.build_review_request(prompt);
        self.execute(&request).await
    }
}

#[async_trait]
impl PersonaOracle for AnthropicApiOracle {
    fn name(&self) -> &'static str {
        "anthropic_api"
    }

    async fn respond(&self, turn: PersonaTurn<'_>) -> DomainResult<String> {
        let request = self.build_persona_request(turn);
        let reply = self.execute(&request).await?;
        Ok(reply.trim().to_string())
    }
}
