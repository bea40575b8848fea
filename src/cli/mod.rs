//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod format;
pub mod hierarchy;
pub mod settings;

use std::error::Error;
use std::sync::{Arc, LazyLock};

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::api::http::HttpRemoteClient;
use crate::auth::ui::prompt_access_token;
use crate::auth::{TokenSource, TokenStore};
use crate::cli::chat::{run_chat, run_send, show_conversation};
use crate::cli::format::{format_agents, format_conversations};
use crate::cli::hierarchy::{run_models, run_providers, ModelCommand, ProviderCommand};
use crate::cli::settings::{run_set, run_unset};
use crate::core::app::App;
use crate::core::config::defaults::SERVER_URL_ENV;
use crate::core::config::{Config, ConfigOrchestrator};
use crate::utils::logging::init_tracing;

static LONG_VERSION: LazyLock<String> = LazyLock::new(|| {
    format!(
        "{}\ncommit: {}\nbuilt: {}",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("unknown"),
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown"),
    )
});

#[derive(Parser)]
#[command(name = "chatdeck")]
#[command(version, long_version = LONG_VERSION.as_str())]
#[command(about = "A line-oriented client for an agent chat backend")]
#[command(
    long_about = "Chatdeck talks to an agent chat backend over HTTP. It keeps a local cache \
of conversations, agents and model configuration, and refetches whatever a change on the \
server made stale.\n\n\
Setup:\n\
  chatdeck set server-url https://host/api/v1\n\
  chatdeck auth\n\n\
Environment Variables:\n\
  CHATDECK_SERVER_URL   Backend base URL (overrides the config file)\n\
  CHATDECK_TOKEN        Access token (overrides the keyring)\n\
  CHATDECK_LOG          Log filter, e.g. chatdeck=debug (logs go to stderr)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store an access token for the configured backend
    Auth,
    /// Remove the stored access token
    Deauth,
    /// Interactive chat (default)
    Chat {
        /// Agent to start new conversations with
        #[arg(short, long)]
        agent: Option<String>,
    },
    /// Send one message and print the reply
    Send {
        #[arg(short, long)]
        agent: Option<String>,
        /// Continue this conversation instead of starting a new one
        #[arg(short, long)]
        conversation: Option<String>,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        message: Vec<String>,
    },
    /// Print a conversation transcript
    Show { conversation: String },
    /// List recent conversations
    Conversations,
    /// List available agents
    Agents,
    /// Manage providers
    #[command(subcommand)]
    Providers(ProviderCommand),
    /// Manage models
    #[command(subcommand)]
    Models(ModelCommand),
    /// Show or set configuration values
    Set {
        key: Option<String>,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset a configuration value
    Unset { key: String },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let orchestrator = ConfigOrchestrator::from_default_path()?;
    let config = orchestrator.load_with_cache()?;
    init_tracing(config.log_filter.as_deref());
    debug!(path = %orchestrator.path().display(), "configuration loaded");

    match args.command.unwrap_or(Commands::Chat { agent: None }) {
        Commands::Set { key, value } => run_set(&orchestrator, key, value),
        Commands::Unset { key } => run_unset(&orchestrator, &key),
        Commands::Auth => authenticate(&config),
        Commands::Deauth => deauthenticate(&config),
        Commands::Chat { agent } => {
            let app = connect(&config)?;
            if let Some(agent) = agent {
                app.session().select_agent(agent);
            }
            run_chat(&app, &TokenStore::new(), &require_server_url(&config)?).await
        }
        Commands::Send {
            agent,
            conversation,
            message,
        } => {
            let app = connect(&config)?;
            run_send(&app, &message.join(" "), agent, conversation).await
        }
        Commands::Show { conversation } => {
            let app = connect(&config)?;
            show_conversation(&app, &conversation).await
        }
        Commands::Conversations => {
            let app = connect(&config)?;
            print!("{}", format_conversations(&app.recent_conversations().await?));
            Ok(())
        }
        Commands::Agents => {
            let app = connect(&config)?;
            let selected = app.session().selected_agent();
            print!("{}", format_agents(&app.agents().await?, selected.as_deref()));
            Ok(())
        }
        Commands::Providers(command) => {
            let app = connect(&config)?;
            run_providers(&app, command, args.yes).await
        }
        Commands::Models(command) => {
            let app = connect(&config)?;
            run_models(&app, command, args.yes).await
        }
    }
}

fn require_server_url(config: &Config) -> Result<String, Box<dyn Error>> {
    config.server_url().ok_or_else(|| {
        format!(
            "No backend configured. Run `chatdeck set server-url <url>` or set {SERVER_URL_ENV}."
        )
        .into()
    })
}

fn connect(config: &Config) -> Result<App, Box<dyn Error>> {
    let server_url = require_server_url(config)?;
    let token = match TokenStore::new().resolve(&server_url)? {
        Some((token, source)) => {
            debug!(?source, "using access token");
            Some(token)
        }
        None => {
            eprintln!("⚠️  No access token for {server_url}; run `chatdeck auth` if requests fail.");
            None
        }
    };

    let client = HttpRemoteClient::new(&server_url, token, config.request_timeout())?;
    Ok(App::new(Arc::new(client), config.app_settings()))
}

fn authenticate(config: &Config) -> Result<(), Box<dyn Error>> {
    let server_url = require_server_url(config)?;
    let store = TokenStore::new();
    if let Ok(Some((_, TokenSource::Environment))) = store.resolve(&server_url) {
        eprintln!("⚠️  CHATDECK_TOKEN is set and will keep overriding the stored token.");
    }

    let token = prompt_access_token(&server_url)?;
    store.store(&server_url, &token)?;
    println!("✅ Token stored for {server_url}");
    Ok(())
}

fn deauthenticate(config: &Config) -> Result<(), Box<dyn Error>> {
    let server_url = require_server_url(config)?;
    if TokenStore::new().remove(&server_url)? {
        println!("✅ Removed stored token for {server_url}");
    } else {
        println!("No stored token for {server_url}");
    }
    Ok(())
}
