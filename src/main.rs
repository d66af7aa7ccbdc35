mod api;
mod cli;
mod config;
mod db;
mod error;
mod models;
mod services;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::services::LeagueService;

#[derive(Parser)]
#[command(name = "prize-league")]
#[command(about = "Head-to-head football leagues with prize money between two players")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Overrides PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Initialize the database
    InitDb,
    /// Create the default players
    Seed {
        /// Also create a demo league with a few games
        #[arg(long)]
        demo: bool,
        /// Delete all existing data first
        #[arg(long)]
        reset: bool,
    },
    /// List players and leagues
    Players,
    /// Show a league table
    Table {
        #[arg(short, long)]
        league: String,
    },
    /// Show a player's career stats
    Career {
        #[arg(short, long)]
        player: String,
    },
    /// Check stored balances against the games that produced them
    Audit,
    /// Export a league's games to CSV
    Export {
        #[arg(short, long)]
        league: String,
        #[arg(short, long, default_value = "games.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("prize_league=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let pool = db::init_database(&config.database_url).await?;
    let service = LeagueService::new(pool, config.prize_calculator());

    match cli.command {
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(config.port);
            tracing::info!("Starting Prize League API server on port {}", port);
            api::serve(service, port).await?;
        }
        Some(Commands::InitDb) => {
            tracing::info!("Database ready at {}", config.database_url);
        }
        Some(Commands::Seed { demo, reset }) => {
            cli::seed(&service, demo, reset).await?;
        }
        Some(Commands::Players) => {
            cli::list_players(&service).await?;
        }
        Some(Commands::Table { league }) => {
            cli::show_table(&service, &league).await?;
        }
        Some(Commands::Career { player }) => {
            cli::show_career(&service, &player).await?;
        }
        Some(Commands::Audit) => {
            cli::audit(&service).await?;
        }
        Some(Commands::Export { league, output }) => {
            cli::export_games(&service, &league, &output).await?;
        }
        None => {
            // Default to serving
            tracing::info!("Starting Prize League API server on port {}", config.port);
            api::serve(service, config.port).await?;
        }
    }

    Ok(())
}
