use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod console;
mod error;

use commands::{donate::SandboxDonor, export::ExportFormat, DonationArgs};
use config::DonationConfig;
use error::CliResult;

#[derive(Parser)]
#[command(name = "donate")]
#[command(about = "Donation desk - take Razorpay and PayPal donations and report on them")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ledger database (overrides ledger_path from the config)
    #[arg(short, long, global = true)]
    ledger: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the donation form validation without taking a payment
    Validate {
        #[command(flatten)]
        donation: DonationArgs,
    },

    /// Take a donation and record it in the ledger
    Donate {
        #[command(flatten)]
        donation: DonationArgs,

        /// Use the in-memory sandbox backend with a simulated donor
        #[arg(long, value_enum, num_args = 0..=1, default_missing_value = "approve")]
        sandbox: Option<SandboxDonor>,
    },

    /// Show aggregate donation statistics
    Stats {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List a donor's donations, newest first
    History {
        /// Donor email (case-insensitive)
        email: String,
    },

    /// Mark a completed donation as refunded
    Refund {
        /// Donation id or receipt number
        reference: String,
    },

    /// Export the ledger
    Export {
        /// Output file path
        #[arg(short, long, default_value = "donations.json")]
        output: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,
    },

    /// Import donations from a JSON array export
    Import {
        /// Input JSON file
        input: PathBuf,
    },
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let config = DonationConfig::load(cli.config.as_deref())?;
    let ledger_path = cli.ledger.unwrap_or_else(|| config.ledger_path.clone());

    match cli.command {
        Commands::Validate { donation } => commands::validate::execute(&config, &donation),

        Commands::Donate { donation, sandbox } => {
            commands::donate::execute(&config, &ledger_path, &donation, sandbox).await
        }

        Commands::Stats { json } => commands::stats::execute(&ledger_path, json),

        Commands::History { email } => commands::history::execute(&ledger_path, &email),

        Commands::Refund { reference } => commands::refund::execute(&ledger_path, &reference),

        Commands::Export { output, format } => {
            commands::export::execute(&ledger_path, &output, format)
        }

        Commands::Import { input } => commands::import::execute(&ledger_path, &input),
    }
}
