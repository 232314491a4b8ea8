//! modelgate command-line entry point
//!
//! Loads configuration, initializes telemetry and runs one subcommand against
//! the configured gateway.

use clap::Parser;
use modelgate::chat::{ChatClient, CompletionOptions};
use modelgate::cli::{self, Cli, Command};
use modelgate::{Completion, config::Config, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    match args.command {
        Command::Config { output } => {
            let template = cli::generate_config_template();
            match output {
                Some(path) => {
                    std::fs::write(&path, template)?;
                    eprintln!("Wrote configuration template to {}", path);
                }
                None => print!("{}", template),
            }
        }
        Command::Models { mode } => {
            let client = connect(&args.config)?;
            let snapshot = client.catalog().ensure_loaded().await?;
            let selection = client.selector().pick(&snapshot, mode);
            print!("{}", cli::render_catalog(&snapshot, mode, &selection));
        }
        Command::Ask {
            mode,
            system,
            temperature,
            max_tokens,
            prompt,
        } => {
            let client = connect(&args.config)?;
            let messages = cli::build_messages(system.as_deref(), &prompt);
            let options = CompletionOptions {
                temperature,
                max_tokens,
            };
            let completion = client.complete(mode, &messages, options).await?;
            report(&completion);
        }
        Command::Reason { prompt } => {
            let client = connect(&args.config)?;
            let completion = client.reason(prompt.as_deref()).await?;
            report(&completion);
        }
    }

    Ok(())
}

/// Load configuration, initialize telemetry and build the client
fn connect(config_path: &str) -> Result<ChatClient, Box<dyn std::error::Error>> {
    let config = Config::load(config_path)?;
    telemetry::init(&config.observability.log_level);
    tracing::debug!(base_url = %config.gateway.base_url(), "Configuration loaded");
    Ok(ChatClient::new(&config)?)
}

fn report(completion: &Completion) {
    tracing::info!(
        model_requested = %completion.model_requested,
        fallbacks_requested = ?completion.fallbacks_requested,
        "Completion finished"
    );
    println!("{}", completion.content);
}
