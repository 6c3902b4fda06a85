//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod model_list;
pub mod say;


use std::error::Error;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cli::chat::run_chat;
use crate::cli::model_list::list_models;
use crate::cli::say::run_say;
use crate::core::config::Config;
use crate::core::session::ChatSession;
use crate::utils::logging::LoggingState;

#[derive(Parser)]
#[command(name = "streamchat")]
#[command(version)]
#[command(about = "Chat with a local or remote LLM server, streaming replies as they arrive")]
#[command(
    long_about = "streamchat talks to an Ollama-compatible inference server over its streaming \
chat endpoint and prints the reply as it is generated.\n\n\
Environment Variables:\n\
  STREAMCHAT_BASE_URL   Server root (defaults to http://localhost:11434)\n\
  RUST_LOG              Diagnostic filter, overrides -v\n\n\
Controls:\n\
  Enter                 Send the message\n\
  Ctrl+C                Stop the reply being generated\n\
  Ctrl+C / Ctrl+D       Quit at the prompt\n\n\
Commands:\n\
  /help                 List chat commands"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to chat with
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Server root URL
    #[arg(short = 'u', long = "base-url", global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Enable logging to specified file
    #[arg(short = 'l', long, global = true)]
    pub log: Option<String>,

    /// Increase diagnostic output (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat (default)
    Chat,
    /// Send one prompt and print the reply
    Say {
        /// The prompt; multiple words are joined with spaces
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// List models available on the server
    Models,
    /// Set a configuration value (default-model, base-url, idle-timeout,
    /// max-malformed, stopped-marker, error-placeholder)
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset a configuration value
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command.unwrap_or(Commands::Chat) {
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            if value.is_empty() {
                config.print_all();
                return Ok(());
            }
            let value = value.join(" ");
            config.set_value(&key, &value)?;
            config.save()?;
            println!("✅ Set {key} to: {value}");
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            config.unset_value(&key)?;
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
        Commands::Models => {
            let config = Config::load()?;
            let base_url = config.resolve_base_url(args.base_url.as_deref());
            let default_model = args.model.as_deref().or(config.default_model.as_deref());
            list_models(&reqwest::Client::new(), &base_url, default_model).await
        }
        Commands::Say { prompt } => {
            let config = Config::load()?;
            let session = build_session(&config, &args.model, &args.base_url).await?;
            run_say(session, LoggingState::new(args.log), prompt).await
        }
        Commands::Chat => {
            let config = Config::load()?;
            let session = build_session(&config, &args.model, &args.base_url).await?;
            run_chat(session, LoggingState::new(args.log)).await
        }
    }
}

async fn build_session(
    config: &Config,
    model: &Option<String>,
    base_url: &Option<String>,
) -> Result<ChatSession, Box<dyn Error>> {
    let base_url = config.resolve_base_url(base_url.as_deref());
    let mut session = ChatSession::new(reqwest::Client::new(), base_url)
        .with_options(config.session_options());
    session.set_model(model.clone().or_else(|| config.default_model.clone()));

    let discovery = session.ensure_model().await.map(|_| ());
    if let Err(err) = discovery {
        eprintln!("⚠️  {err}");
        eprintln!(
            "Is the server running at {}? Pass -m <model> to skip model discovery.",
            session.base_url()
        );
    }
    if session.model().is_none() {
        eprintln!("⚠️  No model selected; messages will not be sent until one is set with /model.");
    }
    Ok(session)
}
