//! Concierge CLI
//!
//! Terminal REPL front-end for the assistant, plus configuration checks.

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use concierge::agent::{
    run_agent_loop, system_prompt, AgentLoopInput, Conversation, GeminiClient, GenerationOptions,
    LoopCallback, LoopConfig, LoopOutcome, ToolObservation,
};
use concierge::agent::types::Message;
use concierge::config::{validate_config, Config};
use concierge::tools::build_registry;
use concierge::{Error, Result, VERSION};
use console::style;
use dialoguer::{theme::ColorfulTheme, Input};
use std::io::{self, Write};

#[derive(Parser)]
#[command(
    name = "concierge",
    author = "Concierge Contributors",
    version = VERSION,
    about = "Concierge - a web + email assistant in your terminal",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (the default)
    Chat,

    /// List the registered tools
    Tools,

    /// Validate configuration and test the model connection
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; keep the REPL quiet unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "concierge=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Tools) => list_tools(),
        Some(Commands::Check) => check().await,
        Some(Commands::Chat) | None => interactive_chat().await,
    }?;

    Ok(())
}

fn theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

/// List registered tools with their descriptions
fn list_tools() -> Result<()> {
    let config = Config::from_env()?;
    let registry = build_registry(&config)?;

    println!();
    for def in registry.definitions() {
        println!(
            "  {}  {}",
            style(&def.function.name).cyan().bold(),
            def.function.description
        );
    }
    println!();
    Ok(())
}

/// Validate configuration and ping the model
async fn check() -> Result<()> {
    let config = Config::from_env()?;
    let result = validate_config(&config);

    for warning in &result.warnings {
        println!(
            "  {} {}: {}",
            style("⚠").yellow(),
            warning.path,
            warning.message
        );
        if let Some(ref suggestion) = warning.suggestion {
            println!("    {}", style(suggestion).dim());
        }
    }
    for error in &result.errors {
        println!("  {} {}: {}", style("✗").red(), error.path, error.message);
        if let Some(ref suggestion) = error.suggestion {
            println!("    {}", style(suggestion).dim());
        }
    }

    if !result.valid {
        return Err(Error::Config("Configuration is not usable.".into()));
    }

    println!("  {} Configuration OK", style("✓").green());

    let client = GeminiClient::new(config.provider.clone())?;
    let response = client
        .chat(
            vec![
                Message::system("You are a helpful assistant. Keep responses brief."),
                Message::user("Reply with the single word: ready"),
            ],
            GenerationOptions::precise(),
        )
        .await?;

    if let Some(choice) = response.choices.first() {
        println!(
            "  {} Model {} responded: {}",
            style("✓").green(),
            style(client.default_model()).cyan(),
            choice.message.content.trim()
        );
    }

    Ok(())
}

/// Prints tool activity as the loop runs
struct TerminalCallback;

#[async_trait]
impl LoopCallback for TerminalCallback {
    async fn on_tool_executed(&self, tool_name: &str, observation: &ToolObservation) {
        let marker = if observation.success {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!(
            "   {} {} {}",
            marker,
            style(tool_name).cyan(),
            style(format!("({} ms)", observation.duration_ms)).dim()
        );
    }
}

/// Interactive REPL
async fn interactive_chat() -> Result<()> {
    let config = Config::from_env()?;
    let client = GeminiClient::new(config.provider.clone())?;
    let registry = build_registry(&config)?;
    let tool_definitions = registry.definitions();
    let loop_config = LoopConfig::cli().with_limits(&config.agent);

    println!();
    println!("{}", style("Welcome to Concierge!").cyan().bold());
    println!(
        "{}",
        style("Type 'exit' or 'quit' to end the conversation, /clear to reset history.").dim()
    );
    println!();

    let prompt = system_prompt(&registry.names())?;
    let mut conversation = Conversation::new("cli").with_system_prompt(&prompt);

    loop {
        let user_input: String = match Input::with_theme(&theme())
            .with_prompt(style("You").green().bold().to_string())
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            // Ctrl-D / closed stdin ends the session like 'exit'
            Err(dialoguer::Error::IO(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                println!("\nGoodbye!");
                break;
            }
            Err(e) => return Err(Error::Internal(format!("Input error: {}", e))),
        };

        let input = user_input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("\nGoodbye!");
            break;
        }

        if input == "/clear" {
            conversation.clear();
            println!("   {} Conversation cleared.\n", style("✓").green());
            continue;
        }

        conversation.add_user_message(input);
        conversation.truncate_to_chars(config.agent.max_history_chars);

        print!("   {} ", style("thinking…").dim());
        io::stdout().flush()?;
        println!();

        let output = run_agent_loop(AgentLoopInput {
            messages: conversation.get_api_messages(),
            llm_client: &client,
            tools: &registry,
            tool_definitions: tool_definitions.clone(),
            config: loop_config.clone(),
            callback: TerminalCallback,
        })
        .await?;

        if let LoopOutcome::LlmError(ref e) = output.trace.outcome {
            println!("\n   {} Error: {}\n", style("✗").red(), e);
        }

        conversation.add_assistant_message(&output.response);
        conversation.add_usage(output.total_usage.total_tokens);

        println!(
            "\n{}: {}\n",
            style("Agent").cyan().bold(),
            output.response
        );
    }

    Ok(())
}
