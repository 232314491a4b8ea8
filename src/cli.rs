//! Command-line interface for modelgate
//!
//! Provides argument parsing and output formatting for the modelgate binary.

use crate::chat::ChatMessage;
use crate::models::{CatalogSnapshot, Mode, Selection, is_reasoning_capable};
use clap::{Parser, Subcommand};
use std::fmt::Write;

/// Catalog-aware chat completions for multi-model inference gateways
#[derive(Parser)]
#[command(name = "modelgate")]
#[command(version)]
#[command(about = "Catalog-aware chat completions for multi-model inference gateways")]
#[command(
    long_about = "modelgate discovers the models a gateway currently offers, picks a primary \
    model and fallback chain for the requested mode, and sends chat completions with that selection."
)]
pub struct Cli {
    /// Path to configuration file (defaults plus environment when missing)
    #[arg(short, long, default_value = "modelgate.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the gateway's models and show the selection for a mode
    Models {
        #[arg(short, long, default_value_t = Mode::Default)]
        mode: Mode,
    },
    /// Send one prompt and print the completion
    Ask {
        #[arg(short, long, default_value_t = Mode::Default)]
        mode: Mode,
        /// Optional system prompt sent before the user prompt
        #[arg(short, long)]
        system: Option<String>,
        #[arg(short, long)]
        temperature: Option<f64>,
        #[arg(long)]
        max_tokens: Option<u32>,
        prompt: String,
    },
    /// Reasoning-mode completion with the built-in reasoning system prompt
    Reason { prompt: Option<String> },
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Conversation for a single prompt, with an optional system message first
pub fn build_messages(system: Option<&str>, prompt: &str) -> Vec<ChatMessage> {
    system
        .filter(|s| !s.trim().is_empty())
        .map(ChatMessage::system)
        .into_iter()
        .chain(std::iter::once(ChatMessage::user(prompt)))
        .collect()
}

/// Tab-separated catalog listing followed by the selection summary
pub fn render_catalog(snapshot: &CatalogSnapshot, mode: Mode, selection: &Selection) -> String {
    let mut out = String::new();
    for descriptor in snapshot {
        let context = descriptor
            .context_length()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let reasoning = if is_reasoning_capable(descriptor) {
            "reasoning"
        } else {
            "-"
        };
        let _ = writeln!(out, "{}\t{}\t{}", descriptor.id(), reasoning, context);
    }
    let _ = writeln!(
        out,
        "{} models; mode={} primary={} fallbacks=[{}]",
        snapshot.len(),
        mode,
        selection.primary(),
        selection.fallbacks().join(", ")
    );
    out
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# modelgate Configuration
# ========================
#
# Every section is optional. Environment variables override file values:
#   OPENROUTER_BASE_URL, OPENROUTER_API_KEY, APP_URL, APP_NAME,
#   OPENROUTER_REASONING_MODEL, OPENROUTER_DEFAULT_MODEL

# ─────────────────────────────────────────────────────────────────────────────
# GATEWAY
# ─────────────────────────────────────────────────────────────────────────────

[gateway]
# Gateway endpoint root; /models and /chat/completions are appended
base_url = "https://openrouter.ai/api/v1"

# Prefer OPENROUTER_API_KEY over storing the key in this file
# api_key = "sk-or-..."

# Sent upstream as HTTP-Referer and X-Title
referer = "http://localhost"
app_name = "modelgate"

# ─────────────────────────────────────────────────────────────────────────────
# PINNED MODELS (Optional)
# ─────────────────────────────────────────────────────────────────────────────
#
# A pinned model becomes primary whenever the gateway's catalog lists it.
# Fallbacks are still chosen from the catalog.

[models]
# reasoning = "openai/o1"
# default = "openai/gpt-4o-mini"

# ─────────────────────────────────────────────────────────────────────────────
# TIMEOUTS
# ─────────────────────────────────────────────────────────────────────────────
#
# Seconds, each in (0, 600].

[timeouts]
catalog = 30
completion = 60

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::MessageRole;
    use crate::config::Config;
    use crate::models::{ModelDescriptor, ModelSelector};
    use clap::CommandFactory;
    use std::str::FromStr;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_config_path() {
        let cli = Cli::parse_from(["modelgate", "models"]);
        assert_eq!(cli.config, "modelgate.toml");
        assert!(matches!(cli.command, Command::Models { mode: Mode::Default }));
    }

    #[test]
    fn models_with_reasoning_mode() {
        let cli = Cli::parse_from(["modelgate", "models", "--mode", "reasoning"]);
        assert!(matches!(cli.command, Command::Models { mode: Mode::Reasoning }));
    }

    #[test]
    fn ask_parses_all_options() {
        let cli = Cli::parse_from([
            "modelgate",
            "--config",
            "custom.toml",
            "ask",
            "-m",
            "reasoning",
            "--system",
            "be terse",
            "-t",
            "0.5",
            "--max-tokens",
            "128",
            "why?",
        ]);
        assert_eq!(cli.config, "custom.toml");
        match cli.command {
            Command::Ask {
                mode,
                system,
                temperature,
                max_tokens,
                prompt,
            } => {
                assert_eq!(mode, Mode::Reasoning);
                assert_eq!(system.as_deref(), Some("be terse"));
                assert_eq!(temperature, Some(0.5));
                assert_eq!(max_tokens, Some(128));
                assert_eq!(prompt, "why?");
            }
            _ => panic!("expected ask command"),
        }
    }

    #[test]
    fn ask_rejects_unknown_mode() {
        let result = Cli::try_parse_from(["modelgate", "ask", "--mode", "deep", "hi"]);
        assert!(result.is_err());
    }

    #[test]
    fn reason_prompt_is_optional() {
        let cli = Cli::parse_from(["modelgate", "reason"]);
        assert!(matches!(cli.command, Command::Reason { prompt: None }));
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["modelgate", "config", "-o", "my-config.toml"]);
        assert!(matches!(
            cli.command,
            Command::Config { output: Some(ref path) } if path == "my-config.toml"
        ));
    }

    #[test]
    fn build_messages_orders_system_first() {
        let messages = build_messages(Some("rules"), "question");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role(), MessageRole::System);
        assert_eq!(messages[1].role(), MessageRole::User);
        assert_eq!(messages[1].content(), "question");

        assert_eq!(build_messages(Some("  "), "question").len(), 1);
        assert_eq!(build_messages(None, "question").len(), 1);
    }

    #[test]
    fn render_catalog_lists_models_and_selection() {
        let snapshot = CatalogSnapshot::new(vec![
            ModelDescriptor::new("openai/o1").with_context_length(200_000),
            ModelDescriptor::new("openai/gpt-4o"),
        ]);
        let selection = ModelSelector::default().pick(&snapshot, Mode::Reasoning);
        let rendered = render_catalog(&snapshot, Mode::Reasoning, &selection);

        assert!(rendered.contains("openai/o1\treasoning\t200000\n"));
        assert!(rendered.contains("openai/gpt-4o\t-\t-\n"));
        assert!(rendered.ends_with("2 models; mode=reasoning primary=openai/o1 fallbacks=[]\n"));
    }

    #[test]
    fn template_is_valid_config() {
        let config = Config::from_str(generate_config_template());
        assert!(config.is_ok(), "Template should be a valid config: {:?}", config.err());
    }

    #[test]
    fn template_has_all_sections() {
        let template = generate_config_template();
        assert!(template.contains("[gateway]"));
        assert!(template.contains("[models]"));
        assert!(template.contains("[timeouts]"));
        assert!(template.contains("[observability]"));
    }
}
