//! Chat client: catalog-aware completions against the gateway

use crate::chat::types::{ChatCompletionBody, ChatMessage, Completion, CompletionOptions, extract_content};
use crate::config::Config;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::GatewayClient;
use crate::models::{ModelCatalog, ModelSelector, Mode};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// System prompt used by [`ChatClient::reason`]
pub const REASONING_SYSTEM_PROMPT: &str =
    "You are a rigorous reasoning assistant. Provide clear steps and conclusions.";
/// User prompt used by [`ChatClient::reason`] when none is given
pub const DEFAULT_REASONING_PROMPT: &str =
    "Explain why we must fetch /models before picking a reasoning model.";

/// Completion entry point for the route layer
///
/// Cheap to clone; clones share the catalog.
#[derive(Debug, Clone)]
pub struct ChatClient {
    gateway: GatewayClient,
    catalog: Arc<ModelCatalog>,
    selector: ModelSelector,
}

impl ChatClient {
    /// Build a client, its gateway connection and an unloaded catalog from configuration
    pub fn new(config: &Config) -> GatewayResult<Self> {
        let gateway = GatewayClient::new(config)?;
        let catalog = Arc::new(ModelCatalog::new(gateway.clone()));
        Ok(Self::from_parts(
            catalog,
            ModelSelector::new(config.models.clone()),
        ))
    }

    /// Assemble a client around an existing catalog
    ///
    /// Completions are sent through the catalog's gateway connection.
    pub fn from_parts(catalog: Arc<ModelCatalog>, selector: ModelSelector) -> Self {
        Self {
            gateway: catalog.gateway().clone(),
            catalog,
            selector,
        }
    }

    pub fn catalog(&self) -> &Arc<ModelCatalog> {
        &self.catalog
    }

    pub fn selector(&self) -> &ModelSelector {
        &self.selector
    }

    /// Startup hook: load the catalog and report how many models it holds
    pub async fn prewarm(&self) -> GatewayResult<usize> {
        let snapshot = self.catalog.ensure_loaded().await?;
        Ok(snapshot.len())
    }

    /// Request a completion for `mode`
    ///
    /// Loads the catalog if needed, selects a primary model and fallbacks,
    /// and sends one `POST /chat/completions`. No retry happens here; the
    /// `models` chain lets the gateway fall back on its side.
    ///
    /// # Errors
    ///
    /// - `GatewayError::Validation` for empty `messages` or out-of-range options
    /// - any catalog load failure, unchanged
    /// - `GatewayError::Upstream` on non-success status, transport failure or timeout
    /// - `GatewayError::Protocol` when the response has no text content
    pub async fn complete(
        &self,
        mode: Mode,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> GatewayResult<Completion> {
        let span = tracing::info_span!(
            "completion",
            request_id = %Uuid::new_v4(),
            mode = %mode,
        );
        self.complete_inner(mode, messages, options)
            .instrument(span)
            .await
    }

    async fn complete_inner(
        &self,
        mode: Mode,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> GatewayResult<Completion> {
        if messages.is_empty() {
            return Err(GatewayError::Validation(
                "messages cannot be empty".to_string(),
            ));
        }
        options.validate()?;

        let catalog = self.catalog.ensure_loaded().await?;
        let selection = self.selector.pick(&catalog, mode);
        let body = ChatCompletionBody::new(&selection, mode, messages, &options);

        tracing::info!(
            model = %selection.primary(),
            fallbacks = ?selection.fallbacks(),
            messages = messages.len(),
            "Sending completion request"
        );

        let response = self.gateway.create_completion(&body).await?;
        let content = extract_content(&response).inspect_err(|_| {
            tracing::warn!(
                model = %selection.primary(),
                "Completion response has no text content"
            );
        })?;

        tracing::info!(
            model = %selection.primary(),
            content_chars = content.chars().count(),
            "Completion received"
        );

        let (model_requested, fallbacks_requested) = selection.into_parts();
        Ok(Completion {
            content,
            model_requested,
            fallbacks_requested,
        })
    }

    /// Reasoning-mode completion with a fixed rigorous-reasoning system prompt
    pub async fn reason(&self, prompt: Option<&str>) -> GatewayResult<Completion> {
        let prompt = prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_REASONING_PROMPT);
        let messages = [
            ChatMessage::system(REASONING_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        self.complete(Mode::Reasoning, &messages, CompletionOptions::default())
            .await
    }
}
