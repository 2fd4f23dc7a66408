use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use ratewatch::core::conversion::{CryptoDirection, FiatDirection};
use ratewatch::core::log::init_logging;
use ratewatch::core::rates::{CryptoAsset, RateKind};

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

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    /// Foreign amount to local currency
    ToLocal,
    /// Local currency amount to foreign currency
    FromLocal,
}

impl From<Direction> for FiatDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::ToLocal => FiatDirection::ToLocal,
            Direction::FromLocal => FiatDirection::FromLocal,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CryptoDirectionArg {
    /// Stablecoin amount to crypto
    StablecoinToCrypto,
    /// Crypto amount to stablecoin
    CryptoToStablecoin,
    /// Local currency amount to crypto
    LocalToCrypto,
    /// Crypto amount to local currency
    CryptoToLocal,
}

impl From<CryptoDirectionArg> for CryptoDirection {
    fn from(direction: CryptoDirectionArg) -> Self {
        match direction {
            CryptoDirectionArg::StablecoinToCrypto => CryptoDirection::StablecoinToCrypto,
            CryptoDirectionArg::CryptoToStablecoin => CryptoDirection::CryptoToStablecoin,
            CryptoDirectionArg::LocalToCrypto => CryptoDirection::LocalToCrypto,
            CryptoDirectionArg::CryptoToLocal => CryptoDirection::CryptoToLocal,
        }
    }
}

impl From<Commands> for ratewatch::AppCommand {
    fn from(cmd: Commands) -> ratewatch::AppCommand {
        match cmd {
            Commands::Rates => ratewatch::AppCommand::Rates,
            Commands::Crypto => ratewatch::AppCommand::Crypto,
            Commands::Convert {
                rate,
                direction,
                amount,
            } => ratewatch::AppCommand::Convert {
                rate,
                direction: direction.into(),
                amount,
            },
            Commands::Compare {
                first,
                second,
                direction,
                amount,
            } => ratewatch::AppCommand::Compare {
                first,
                second,
                direction: direction.into(),
                amount,
            },
            Commands::CryptoConvert {
                asset,
                direction,
                amount,
                subunit,
            } => ratewatch::AppCommand::CryptoConvert {
                asset,
                direction: direction.into(),
                amount,
                subunit,
            },
            Commands::Watch => ratewatch::AppCommand::Watch,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Refresh and display exchange rates
    Rates,
    /// Refresh and display crypto prices
    Crypto,
    /// Convert an amount with one rate (usd, eur, usdt)
    Convert {
        #[arg(short, long, default_value = "usd")]
        rate: RateKind,
        #[arg(short, long, value_enum, default_value = "to-local")]
        direction: Direction,
        amount: f64,
    },
    /// Convert an amount with two rates and show their difference
    Compare {
        #[arg(long, default_value = "usd")]
        first: RateKind,
        #[arg(long, default_value = "usdt")]
        second: RateKind,
        #[arg(short, long, value_enum, default_value = "from-local")]
        direction: Direction,
        amount: f64,
    },
    /// Convert between crypto assets, the stablecoin and local currency
    CryptoConvert {
        #[arg(short, long, default_value = "BTC")]
        asset: CryptoAsset,
        #[arg(short, long, value_enum, default_value = "stablecoin-to-crypto")]
        direction: CryptoDirectionArg,
        /// Show BTC in satoshis and ETH in gwei
        #[arg(short, long)]
        subunit: bool,
        amount: f64,
    },
    /// Keep refreshing rates and prices on a schedule
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => ratewatch::cli::setup::setup(),
        Some(cmd) => ratewatch::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
