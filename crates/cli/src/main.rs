//! Technical Store CLI - location codes and master data from the terminal.
//!
//! The CLI works on a JSON snapshot of the store (`STORE_DATA_FILE`,
//! default `store-data.json`). A missing file means a fresh store whose
//! settings come from the environment.
//!
//! # Usage
//!
//! ```bash
//! # Seed the bundled demo catalogue, and remove it again
//! ts-cli seed
//! ts-cli seed remove
//!
//! # Create a warehouse, then a zone inside it
//! ts-cli location add --type Warehouse
//! ts-cli location add --type Zone --parent WH-1
//!
//! # Preview the next rack code in a zone
//! ts-cli location next --type Rack --parent WH-1-Z-A
//!
//! # Roman numerals
//! ts-cli roman to 1994
//! ts-cli roman from MCMXCIV
//! ```
//!
//! # Commands
//!
//! - `seed [remove]` - Seed demo master data into an empty store, or remove it
//! - `location add|list|next|update` - Manage locations
//! - `roman to|from` - Convert Roman numerals
//! - `stats` - Show system statistics
//! - `status` - Classify the stored data (empty, demo, real)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use tech_store_core::{LocationCode, LocationType};
use tech_store_registry::config::RegistryConfig;

mod commands;

#[derive(Parser)]
#[command(name = "ts-cli")]
#[command(author, version, about = "Technical Store CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed demo master data into an empty store
    Seed {
        #[command(subcommand)]
        action: Option<SeedAction>,

        /// Catalogue YAML file (defaults to the bundled catalogue)
        #[arg(short, long, global = true)]
        file: Option<PathBuf>,
    },
    /// Manage locations
    Location {
        #[command(subcommand)]
        action: LocationAction,
    },
    /// Convert Roman numerals
    Roman {
        #[command(subcommand)]
        action: RomanAction,
    },
    /// Show system statistics
    Stats,
    /// Classify the stored data as empty, demo or real
    Status,
}

#[derive(Subcommand)]
enum SeedAction {
    /// Remove demo data; refused unless the store holds exactly the catalogue
    Remove,
}

#[derive(Subcommand)]
enum LocationAction {
    /// Create a location with a generated code
    Add {
        /// Location type (Warehouse, Zone, Rack, Shelf, Bin, Transit, Staging, Other)
        #[arg(short = 't', long = "type")]
        location_type: LocationType,

        /// Code of the immediate parent
        #[arg(short, long)]
        parent: Option<LocationCode>,

        /// Explicit segment name instead of the next allocated one
        #[arg(short, long)]
        segment: Option<String>,

        /// Manual code (kept only when manual override is allowed)
        #[arg(short, long)]
        code: Option<LocationCode>,

        /// Free-text description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List locations
    List {
        /// Only locations of this type
        #[arg(short = 't', long = "type")]
        location_type: Option<LocationType>,

        /// Only children of this parent
        #[arg(short, long)]
        parent: Option<LocationCode>,
    },
    /// Preview the next segment and code without creating anything
    Next {
        #[arg(short = 't', long = "type")]
        location_type: LocationType,

        #[arg(short, long)]
        parent: Option<LocationCode>,
    },
    /// Update the mutable fields of a location
    Update {
        /// Code of the location to update
        code: LocationCode,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        enabled: Option<bool>,
    },
}

#[derive(Subcommand)]
enum RomanAction {
    /// Integer to Roman numeral
    To {
        /// Value between 1 and 3999
        value: u32,
    },
    /// Roman numeral to integer
    From {
        /// Numeral such as MCMXCIV
        numeral: String,
    },
}

#[tokio::main]
async fn main() {
    let config = match RegistryConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(false);
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(config.log_json);

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tech_store_registry=info,ts_cli=info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run(cli: Cli, config: &RegistryConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Seed { action, file } => match action {
            None => commands::seed::demo_data(config, file.as_deref()).await?,
            Some(SeedAction::Remove) => commands::seed::remove(config, file.as_deref()).await?,
        },
        Commands::Location { action } => match action {
            LocationAction::Add {
                location_type,
                parent,
                segment,
                code,
                description,
            } => {
                let args = commands::location::AddArgs {
                    location_type,
                    parent,
                    segment,
                    code,
                    description,
                };
                commands::location::add(config, args).await?;
            }
            LocationAction::List {
                location_type,
                parent,
            } => commands::location::list(config, location_type, parent).await?,
            LocationAction::Next {
                location_type,
                parent,
            } => commands::location::next(config, location_type, parent.as_ref()).await?,
            LocationAction::Update {
                code,
                description,
                enabled,
            } => commands::location::update(config, &code, description, enabled).await?,
        },
        Commands::Roman { action } => match action {
            RomanAction::To { value } => commands::roman::to_roman(value)?,
            RomanAction::From { numeral } => commands::roman::from_roman(&numeral)?,
        },
        Commands::Stats => commands::stats::stats(config).await?,
        Commands::Status => commands::stats::status(config).await?,
    }
    Ok(())
}
