//! Terminal front-end for the interaction gateway
//!
//! Joins one presentation channel as one audience member and turns stdin
//! lines into interactions:
//!
//! - `/react <kind>` sends a reaction (`thumbs_up`, `mindblown`, `love_it`)
//! - `/quit` closes the session
//! - any other line is sent as a comment

use anyhow::{Context, Result};
use clap::Parser;
use reactions_core::common::{profile_redirect_path, Identity};
use reactions_core::domains::interactions::{ErrorCategory, InteractionGateway, Reaction};
use reactions_core::kernel::{Channel, GatewayDeps, StaticIdentityProvider};
use reactions_core::Config;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "reactions_console")]
#[command(about = "Send live reactions and comments to a presentation")]
struct Cli {
    /// Presentation channel to join (e.g. a presentation identifier)
    #[arg(long)]
    channel: String,

    /// Display name shown to the presenter
    #[arg(long, env = "REACTIONS_USERNAME")]
    username: Option<String>,
}

enum Command {
    React(String),
    Quit,
    Comment(String),
}

fn parse_line(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed == "/quit" {
        Command::Quit
    } else if let Some(kind) = trimmed.strip_prefix("/react") {
        Command::React(kind.trim().to_string())
    } else {
        Command::Comment(line.to_string())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reactions_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(namespace = %config.channel_namespace, "Configuration loaded");

    let identity = cli.username.as_deref().and_then(Identity::new);
    let deps = GatewayDeps::from_config(&config, Arc::new(StaticIdentityProvider(identity)))?;
    let channel = Channel::new(config.channel_namespace.clone(), cli.channel.clone())
        .context("Invalid channel")?;

    let gateway = match InteractionGateway::start(&deps, channel).await {
        Ok(gateway) => gateway,
        Err(e) if e.category() == ErrorCategory::Fatal => {
            eprintln!("{}", e.user_message());
            eprintln!(
                "Set a username first: {}",
                profile_redirect_path(&format!("/{}/react", cli.channel))
            );
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("Failed to start interaction gateway"),
    };

    println!(
        "Connected as {}. Reactions: {}. Type a comment and press Enter.",
        gateway.identity(),
        Reaction::ALL
            .iter()
            .map(|r| r.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let result = match parse_line(&line) {
            Command::Quit => break,
            Command::React(kind) => match kind.parse::<Reaction>() {
                Ok(reaction) => gateway.send_reaction(reaction).await,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            },
            Command::Comment(text) => gateway.send_comment(&text).await,
        };

        if let Err(e) = result {
            println!("{}", e.user_message());
            if e.category() == ErrorCategory::Fatal {
                break;
            }
        }
    }

    gateway.close().await;
    Ok(())
}
