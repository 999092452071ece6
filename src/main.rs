use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fintrack::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fintrack::AppCommand {
    fn from(cmd: Commands) -> fintrack::AppCommand {
        match cmd {
            Commands::Convert { amount, currency } => {
                fintrack::AppCommand::Convert { amount, currency }
            }
            Commands::Custom {
                amount,
                currency,
                rate,
            } => fintrack::AppCommand::Custom {
                amount,
                currency,
                rate,
            },
            Commands::Rates { refresh } => fintrack::AppCommand::Rates { refresh },
            Commands::Menu => fintrack::AppCommand::Menu,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount from the base currency at the market rate
    Convert {
        /// Amount in the base currency, e.g. 100 or $25.50
        amount: String,
        /// Target currency code, e.g. USD
        currency: String,
    },
    /// Convert an amount using your own quoted rate
    Custom {
        amount: String,
        currency: String,
        /// Quoted rate for 1 unit of the base currency
        rate: String,
    },
    /// Display known exchange rates for the base currency
    Rates {
        /// Fetch fresh rates before displaying
        #[arg(short, long)]
        refresh: bool,
    },
    /// Interactive currency conversion menu
    Menu,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => fintrack::cli::setup::setup_at_path(path),
            None => fintrack::cli::setup::setup(),
        },
        Some(cmd) => fintrack::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
