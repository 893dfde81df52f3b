//! Chatbase CLI - send messages and events to Chatbase from the terminal

use anyhow::{bail, Context, Result};
use chatbase::{
    ApiResponse, ChatMessage, ChatbaseClient, ClickEvent, Config, CustomEvent,
    CustomEventProperty, Message, MessageType,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chatbase-cli")]
#[command(about = "Send messages and events to the Chatbase APIs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the JSON body instead of sending it
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store defaults in the config file
    Configure {
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Send a generic message
    Message {
        /// Message text
        text: String,

        #[arg(short, long, default_value = "")]
        intent: String,

        /// Overrides the configured user id
        #[arg(short, long)]
        user_id: Option<String>,

        #[arg(short, long, default_value = "")]
        session_id: String,

        /// Mark as sent by the bot instead of the user
        #[arg(long)]
        agent: bool,

        /// Flag the message as not handled by the bot
        #[arg(long)]
        not_handled: bool,

        /// Flag the message as user feedback
        #[arg(long)]
        feedback: bool,
    },

    /// Record a link click
    Click {
        url: String,

        #[arg(short, long)]
        user_id: Option<String>,
    },

    /// Send a custom event
    Event {
        intent: String,

        #[arg(short, long)]
        user_id: Option<String>,

        /// Event property as name=value (repeatable)
        #[arg(short, long = "property")]
        properties: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::load()?;

    match cli.command {
        Commands::Configure {
            api_key,
            platform,
            version,
            user_id,
        } => {
            // Start from disk so an env-provided key is never persisted
            let mut stored = Config::load_file()?;
            stored.merge(Config {
                api_key,
                platform,
                version,
                user_id,
                ..Default::default()
            });
            stored.save()?;
            println!("Config saved to {}", Config::config_path()?.display());
        }
        Commands::Message {
            text,
            intent,
            user_id,
            session_id,
            agent,
            not_handled,
            feedback,
        } => {
            let mut msg = Message::new()
                .api_key(require_api_key(&config, cli.dry_run)?)
                .platform(config.platform())
                .version(config.version())
                .user_id(user_id.as_deref().unwrap_or(config.user_id()))
                .session_id(session_id)
                .intent(intent)
                .message(text);
            if agent {
                msg = msg.msg_type(MessageType::Agent);
            }
            if not_handled {
                msg.set_as_not_handled()?;
            }
            if feedback {
                msg.set_as_feedback()?;
            }

            if cli.dry_run {
                println!("{}", msg.to_json()?);
            } else {
                tracing::info!("Sending message...");
                let client = ChatbaseClient::from_config(&config)?;
                report(msg.send(&client)?);
            }
        }
        Commands::Click { url, user_id } => {
            let mut click = ClickEvent::new(require_api_key(&config, cli.dry_run)?, url, config.platform());
            click.user_id = user_id.unwrap_or_else(|| config.user_id().to_string());
            click.version = config.version().to_string();

            if cli.dry_run {
                println!("{}", click.to_json()?);
            } else {
                tracing::info!("Sending click...");
                let client = ChatbaseClient::from_config(&config)?;
                report(click.send(&client)?);
            }
        }
        Commands::Event {
            intent,
            user_id,
            properties,
        } => {
            let mut event = CustomEvent::new(
                require_api_key(&config, cli.dry_run)?,
                user_id.as_deref().unwrap_or(config.user_id()),
                intent,
                config.platform(),
            )
            .with_version(config.version());
            for raw in &properties {
                let property: CustomEventProperty = raw
                    .parse()
                    .with_context(|| format!("Invalid property '{}'", raw))?;
                event.add_property(property)?;
            }

            if cli.dry_run {
                println!("{}", event.to_json()?);
            } else {
                tracing::info!("Sending event...");
                let client = ChatbaseClient::from_config(&config)?;
                report(event.send(&client)?);
            }
        }
    }

    Ok(())
}

/// Configured API key. A dry run only prints the body, so an empty key is
/// allowed there.
fn require_api_key(config: &Config, dry_run: bool) -> Result<String> {
    match config.api_key.as_deref() {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ if dry_run => Ok(String::new()),
        _ => bail!(
            "No API key. Run 'chatbase-cli configure --api-key <KEY>' or set {}.",
            chatbase::config::API_KEY_ENV
        ),
    }
}

fn report(resp: ApiResponse) {
    if !resp.is_success() {
        tracing::warn!("Chatbase returned HTTP {}", resp.status);
    }
    println!("{} {}", resp.status, resp.body);
}
