use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod members;
pub mod team;
pub mod timezone;

use crate::core::AppConfig;
use team::TeamArgs;

#[derive(Subcommand)]
enum Command {
    /// Show events for all members of a Google Group
    Team(TeamArgs),
    /// List members of a Google Group
    Members {
        /// Group email, e.g. engineering@company.com
        group: String,
        #[arg(long, default_value = "100")]
        max: u32,
        /// Page token from a previous listing
        #[arg(long)]
        page: Option<String>,
    },
    /// Show the timezone of the primary calendar
    Timezone {},
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output JSON instead of tables
    #[arg(long, global = true, action, default_value = "false")]
    json: bool,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true, action, default_value = "false")]
    verbose: bool,

    /// OAuth access token (overrides GOG_ACCESS_TOKEN)
    #[arg(long, global = true)]
    access_token: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}={}", env!("CARGO_CRATE_NAME"), level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let mut config = AppConfig::default();
    if let Some(token) = args.access_token.filter(|t| !t.trim().is_empty()) {
        config.access_token = Some(token.trim().to_string());
    }

    // Handle each sub command
    match args.command {
        Some(Command::Team(team_args)) => {
            team::run(&config, team_args, args.json).await?;
        }
        Some(Command::Members { group, max, page }) => {
            members::run(&config, group, max, page, args.json).await?;
        }
        Some(Command::Timezone {}) => {
            timezone::run(&config, args.json).await?;
        }
        None => {}
    }

    Ok(())
}
