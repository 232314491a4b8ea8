//! Chat completion request and response types
//!
//! The request body follows the gateway's OpenAI-compatible schema with two
//! extensions: a `models` chain for gateway-side fallback and an optional
//! `reasoning` directive.

use crate::error::{GatewayError, GatewayResult};
use crate::models::{Mode, Selection};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Temperature sent when the caller does not set one
pub const DEFAULT_TEMPERATURE: f64 = 0.2;

/// Message role in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: MessageRole,
    content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Optional sampling parameters for a completion
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompletionOptions {
    /// Sampling temperature in `[0.0, 2.0]`; `DEFAULT_TEMPERATURE` when unset
    pub temperature: Option<f64>,
    /// Upper bound on generated tokens; omitted from the request when unset
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// Reject values the gateway would refuse
    pub fn validate(&self) -> GatewayResult<()> {
        if let Some(temp) = self.temperature {
            if temp.is_nan() || temp.is_infinite() {
                return Err(GatewayError::Validation(
                    "temperature must be a finite number".to_string(),
                ));
            }
            if !(0.0..=2.0).contains(&temp) {
                return Err(GatewayError::Validation(
                    "temperature must be between 0.0 and 2.0".to_string(),
                ));
            }
        }

        if let Some(max) = self.max_tokens
            && max == 0
        {
            return Err(GatewayError::Validation(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Reasoning effort level understood by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReasoningDirective {
    pub effort: ReasoningEffort,
}

/// Body of `POST /chat/completions`
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionBody<'a> {
    pub model: &'a str,
    /// `model` followed by the fallbacks, for the gateway's retry chain
    pub models: Vec<&'a str>,
    pub messages: &'a [ChatMessage],
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningDirective>,
}

impl<'a> ChatCompletionBody<'a> {
    pub fn new(
        selection: &'a Selection,
        mode: Mode,
        messages: &'a [ChatMessage],
        options: &CompletionOptions,
    ) -> Self {
        Self {
            model: selection.primary(),
            models: selection.models(),
            messages,
            temperature: options.temperature(),
            max_tokens: options.max_tokens,
            reasoning: (mode == Mode::Reasoning).then_some(ReasoningDirective {
                effort: ReasoningEffort::High,
            }),
        }
    }
}

/// Result of a completion
///
/// `model_requested` is the primary the request named. The gateway may have
/// served the answer from any model in the chain and does not say which.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub model_requested: String,
    pub fallbacks_requested: Vec<String>,
}

/// Pull `choices[0].message.content` out of a completion response
pub fn extract_content(response: &Value) -> GatewayResult<String> {
    response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GatewayError::Protocol("missing completion content".to_string()))
}
