//! DNC console CLI
//!
//! Command-line interface for the inventory and sensor-reading console.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dnc_console::cli::{parse_assignment, TerminalConfirmer};
use dnc_console::entity::EntityProfile;
use dnc_console::gate::{AutoConfirmer, Confirmer};
use dnc_console::{load_config, Config, Console};
use tracing::Level;

#[derive(Parser)]
#[command(name = "dnc-console")]
#[command(about = "Inventory and sensor-reading console for the DNC backend")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: Level,

    /// Answer every confirmation prompt affirmatively
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// SSU tracking records
    Ssu {
        #[command(subcommand)]
        command: SsuCommands,
    },

    /// Hardware tracking records
    Hw {
        #[command(subcommand)]
        command: HwCommands,
    },

    /// Brix readings per location
    Brix {
        #[command(subcommand)]
        command: BrixCommands,
    },

    /// List organisations
    Orgs,

    /// List locations of an organisation
    Spots { org: String },

    /// User administration
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Print configured devices as GeoJSON
    Devices,
}

#[derive(Subcommand)]
enum SsuCommands {
    /// Show the tracking history of an SSU
    Track {
        ssuid: String,

        /// Export the rows to <NAME>.csv in the export directory
        #[arg(long)]
        export: Option<String>,
    },

    /// Edit one row and save it as an update or a new record
    Edit {
        ssuid: String,

        /// Display id of the row to edit
        #[arg(long)]
        row: u32,

        /// Field assignment, repeatable (e.g. --set status=Moved)
        #[arg(long = "set", value_parser = parse_assignment)]
        changes: Vec<(String, String)>,

        /// Move the unit to another organisation
        #[arg(long)]
        org: Option<String>,

        /// Create a new record from the edited row instead of updating it
        #[arg(long)]
        append: bool,
    },
}

#[derive(Subcommand)]
enum HwCommands {
    /// Show the tracking history of a hardware board
    Track {
        hwsl: String,

        /// Export the rows to <NAME>.csv in the export directory
        #[arg(long)]
        export: Option<String>,
    },
}

#[derive(Subcommand)]
enum BrixCommands {
    /// Show readings for a location
    List {
        /// Location (default: first configured location)
        #[arg(long)]
        location: Option<String>,

        /// Export the rows to <NAME>.csv in the export directory
        #[arg(long)]
        export: Option<String>,
    },

    /// Change one reading
    Edit {
        #[arg(long)]
        location: String,

        #[arg(long)]
        row: u32,

        /// New brix value
        #[arg(long)]
        brix: Option<String>,

        /// New reading time
        #[arg(long)]
        date: Option<String>,
    },

    /// Delete one reading (asks for a challenge code)
    Delete {
        #[arg(long)]
        location: String,

        #[arg(long)]
        row: u32,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Change a user's role and status
    Role {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        /// Org-User, Org-Admin, App-User or App-Admin
        #[arg(long)]
        role: String,

        #[arg(long)]
        status: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, log_level={:?}, yes={}",
        args.config,
        args.log_level,
        args.yes
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.resolve_secrets()?;

    let confirmer: Arc<dyn Confirmer> = if args.yes {
        Arc::new(AutoConfirmer)
    } else {
        Arc::new(TerminalConfirmer::default())
    };
    let console = Console::new(config, confirmer)?;

    let cancel = console.cancel_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        tracing::info!("Interrupted, abandoning outstanding requests");
        cancel.cancel();
    });

    match args.command {
        Commands::Ssu { command } => match command {
            SsuCommands::Track { ssuid, export } => {
                console
                    .show(EntityProfile::ssu(), &ssuid, export.as_deref())
                    .await?;
            }
            SsuCommands::Edit {
                ssuid,
                row,
                changes,
                org,
                append,
            } => {
                console
                    .edit(
                        EntityProfile::ssu(),
                        &ssuid,
                        row,
                        org.as_deref(),
                        &changes,
                        append,
                    )
                    .await?;
            }
        },
        Commands::Hw { command } => match command {
            HwCommands::Track { hwsl, export } => {
                console
                    .show(EntityProfile::hardware(), &hwsl, export.as_deref())
                    .await?;
            }
        },
        Commands::Brix { command } => match command {
            BrixCommands::List { location, export } => {
                let location = match location {
                    Some(location) => location,
                    None => console.default_location()?,
                };
                console
                    .show(EntityProfile::brix(), &location, export.as_deref())
                    .await?;
            }
            BrixCommands::Edit {
                location,
                row,
                brix,
                date,
            } => {
                let mut changes = Vec::new();
                if let Some(brix) = brix {
                    changes.push(("brix".to_string(), brix));
                }
                if let Some(date) = date {
                    changes.push(("date".to_string(), date));
                }
                console
                    .edit(EntityProfile::brix(), &location, row, None, &changes, false)
                    .await?;
            }
            BrixCommands::Delete { location, row } => {
                console.delete(EntityProfile::brix(), &location, row).await?;
            }
        },
        Commands::Orgs => console.organizations().await?,
        Commands::Spots { org } => console.locations(&org).await?,
        Commands::User { command } => match command {
            UserCommands::Role {
                email,
                name,
                role,
                status,
            } => {
                console.change_role(&email, &name, &role, status).await?;
            }
        },
        Commands::Devices => console.devices()?,
    }

    Ok(())
}
