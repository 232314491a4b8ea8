//! Chat completions routed through the model catalog and selector

pub mod client;
pub mod types;

pub use client::ChatClient;
pub use types::{ChatMessage, Completion, CompletionOptions, MessageRole};
