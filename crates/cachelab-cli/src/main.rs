//! Cachelab CLI - probe a Cachelab node's caching disciplines.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Client, Mode};

/// Cachelab - watch HTTP cache revalidation from the client side
#[derive(Parser, Debug)]
#[command(name = "cachelab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Base URL of the node
    #[arg(long, env = "CACHELAB_URL", default_value = "http://127.0.0.1:3100")]
    base_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a discipline, then revalidate with its validator
    Probe {
        /// Discipline to probe
        #[arg(value_enum)]
        mode: Mode,
    },

    /// Replace the resource content
    Update {
        /// New content (a timestamped placeholder when omitted)
        content: Option<String>,
    },

    /// Show the current resource state
    Status,

    /// Show version information
    Version,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Version = cli.command {
        println!("cachelab {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let client = Client::new(&cli.base_url)?;
    match cli.command {
        Commands::Probe { mode } => {
            let report = client.probe(mode).await?;
            commands::print_report(&report);
        }
        Commands::Update { content } => {
            let response = client.update(content.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Status => {
            let status = client.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Version => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("cachelab={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
