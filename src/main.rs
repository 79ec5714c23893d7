use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use craic::config::StoreBackend;
use craic::logging::{self, LogFormat};

mod cmd;

#[derive(Parser)]
#[command(name = "craic")]
#[command(version, about = "Where's the craic: nearby pubs, crowd levels and check-ins")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to craic.toml. Defaults to ./craic.toml, then the user config dir
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Check-in store backend: memory, sqlite, firestore. Overrides CRAIC_STORE
    #[arg(long, global = true)]
    pub store: Option<StoreBackend>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List pubs near a position with their crowd levels
    Nearby {
        /// Latitude (defaults to the configured location)
        #[arg(long, allow_negative_numbers = true, requires = "lng")]
        lat: Option<f64>,
        /// Longitude (defaults to the configured location)
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lng: Option<f64>,
        /// Search radius in metres (overrides places.radius_m)
        #[arg(short, long)]
        radius: Option<u32>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show provider details for a place
    Details {
        place_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Show the stored check-in aggregate for a place
    Show {
        place_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Check in to a place, optionally tagging it
    Checkin {
        place_id: String,
        /// Tag to attach (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
    /// Replace the current tags of a place (no tags clears them)
    Tags {
        place_id: String,
        /// Tag to attach (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
    /// Show the crowd tier thresholds
    Tiers,
    /// List the suggested tags by category
    Catalogue,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default craic.toml file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose, LogFormat::from_env());

    match &cli.command {
        Commands::Nearby {
            lat,
            lng,
            radius,
            json,
        } => {
            let position = lat.zip(*lng);
            cmd::cmd_nearby(&cli, position, *radius, *json).await?
        }
        Commands::Details { place_id, json } => cmd::cmd_details(&cli, place_id, *json).await?,
        Commands::Show { place_id, json } => cmd::cmd_show(&cli, place_id, *json).await?,
        Commands::Checkin { place_id, tags } => cmd::cmd_checkin(&cli, place_id, tags).await?,
        Commands::Tags { place_id, tags } => cmd::cmd_tags(&cli, place_id, tags).await?,
        Commands::Tiers => cmd::cmd_tiers(),
        Commands::Catalogue => cmd::cmd_catalogue(),
        Commands::Config { command } => cmd::cmd_config(&cli, command.clone())?,
    }

    Ok(())
}
