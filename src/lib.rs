//! modelgate - catalog-aware chat completions for multi-model inference gateways
//!
//! This library discovers which models a gateway currently offers, selects a
//! primary model and fallback chain for a task mode, and sends completion
//! requests using that selection.

pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod telemetry;

pub use chat::{ChatClient, ChatMessage, Completion, CompletionOptions, MessageRole};
pub use config::Config;
pub use error::{AppError, AppResult, GatewayError, GatewayResult, UpstreamFailure};
pub use models::{CatalogSnapshot, ModelCatalog, ModelDescriptor, ModelSelector, Mode, Selection};
