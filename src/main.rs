use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tarmac::scheduler::DepartureFilter;
use tarmac::service::AirportClient;

mod commands;

use commands::{RunwayAction, ServeParams};

#[derive(Parser)]
#[command(
    name = "tarmac",
    version,
    about = "Airport runway scheduler with live flight tracking",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    /// Airport server URL used by the client commands
    #[arg(
        long,
        global = true,
        env = "TARMAC_SERVER",
        default_value = "http://127.0.0.1:7070"
    )]
    server: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the airport server
    Serve {
        /// TOML configuration file (defaults to TARMAC_* environment)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the bind address
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Enable or disable CORS
        #[arg(long)]
        cors: Option<bool>,

        /// Enable or disable HTTP request logging
        #[arg(long)]
        request_logging: Option<bool>,
    },

    /// Manage runways
    Runway {
        /// Action to perform
        #[arg(value_enum)]
        action: RunwayArg,

        /// Runway name
        #[arg(short, long)]
        name: String,

        /// Runway category, A (largest) to F, required by `add`
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Issue one departure on every open runway
    Takeoff,

    /// Rearrange every waiting flight across the open runways
    Reorder,

    /// Submit runway requests from a `;` separated file
    Request {
        /// Input file (FlightCode;DestinyAirport;AirlineName;MinimumCategory)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Follow a flight until it departs
    Track {
        /// Flight code
        #[arg(short, long)]
        flight: String,

        /// Airline operating the flight
        #[arg(short, long)]
        airline: String,
    },

    /// Write departed flights to a `;` separated file
    Query {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Only departures from this runway
        #[arg(long, conflicts_with = "airline")]
        runway: Option<String>,

        /// Only departures of this airline
        #[arg(long)]
        airline: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RunwayArg {
    Add,
    Open,
    Close,
    Status,
}

impl From<RunwayArg> for RunwayAction {
    fn from(arg: RunwayArg) -> Self {
        match arg {
            RunwayArg::Add => Self::Add,
            RunwayArg::Open => Self::Open,
            RunwayArg::Close => Self::Close,
            RunwayArg::Status => Self::Status,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    setup_tracing(&cli.log_format, cli.verbose)?;

    match cli.command {
        Commands::Serve {
            config,
            bind,
            cors,
            request_logging,
        } => {
            tracing::info!(config = ?config, bind = ?bind, "Starting serve command");
            commands::serve(ServeParams {
                config,
                bind,
                enable_cors: cors,
                enable_logging: request_logging,
            })
            .await?;
        }

        Commands::Runway {
            action,
            name,
            category,
        } => {
            let client = AirportClient::connect(&cli.server)?;
            commands::runway(&client, action.into(), &name, category.as_deref()).await?;
        }

        Commands::Takeoff => {
            let client = AirportClient::connect(&cli.server)?;
            commands::takeoff(&client).await?;
        }

        Commands::Reorder => {
            let client = AirportClient::connect(&cli.server)?;
            commands::reorder(&client).await?;
        }

        Commands::Request { input } => {
            tracing::info!(input = %input.display(), server = %cli.server, "Starting request command");
            let client = AirportClient::connect(&cli.server)?;
            commands::request(&client, &input).await?;
        }

        Commands::Track { flight, airline } => {
            tracing::info!(flight = %flight, airline = %airline, "Starting track command");
            let client = AirportClient::connect(&cli.server)?;
            commands::track(&client, &flight, &airline).await?;
        }

        Commands::Query {
            output,
            runway,
            airline,
        } => {
            let filter = match (runway, airline) {
                (Some(runway), _) => DepartureFilter::Runway(runway),
                (None, Some(airline)) => DepartureFilter::Airline(airline),
                (None, None) => DepartureFilter::All,
            };

            tracing::info!(output = %output.display(), filter = ?filter, "Starting query command");
            let client = AirportClient::connect(&cli.server)?;
            commands::query(&client, &output, filter).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("tarmac=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("tarmac=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
