//! nad.fun trader CLI
//!
//! Command-line interface for quoting, buying and selling bonding-curve tokens.

use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, U256};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};
use nadfun_trader::chain::RpcChainClient;
use nadfun_trader::ledger::ether_string;
use nadfun_trader::trading::Execution;
use nadfun_trader::wallet::SecureWallet;
use nadfun_trader::{
    Config, Error, JsonFileLedger, LedgerStore, Result, RpcConfig, SellResult, TradeDirection,
    TradeExecutor, TradeStatus, PRIVATE_KEY_ENV,
};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "nadfun-trader")]
#[command(about = "Trade nad.fun bonding-curve tokens on Monad")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Buy,
    Sell,
}

impl From<Side> for TradeDirection {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => TradeDirection::Buy,
            Side::Sell => TradeDirection::Sell,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Quote a trade without submitting anything
    Quote {
        /// Token address
        token: Address,

        /// Input amount in whole units (MON for buy, tokens for sell)
        amount: String,

        /// Trade direction to price
        #[arg(long, value_enum, default_value = "buy")]
        side: Side,
    },

    /// Buy a token with MON
    Buy {
        /// Token address
        token: Address,

        /// MON to spend
        amount: String,
    },

    /// Sell the wallet's entire balance of a token
    Sell {
        /// Token address
        token: Address,
    },

    /// Print the transaction ledger
    Ledger,

    /// Resolve trades recorded with unknown status
    Reconcile,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = match parse_cli(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_error_exit(e.kind()));
        }
    };

    init_logging(cli.verbose, cli.log_json);

    match run(cli, |name| std::env::var(name).ok()).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_cli<I, T>(args: I) -> std::result::Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Help and version output are successful runs; every other parse failure is not
fn parse_error_exit(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
        _ => 1,
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// First Ctrl-C stops anything new from being broadcast; a second one exits
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("Interrupt received, nothing further will be broadcast (Ctrl-C again to exit)");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

async fn run<F>(cli: Cli, lookup: F) -> Result<u8>
where
    F: Fn(&str) -> Option<String>,
{
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let ledger = Arc::new(JsonFileLedger::new(&config.ledger_path));

    if let Commands::Ledger = cli.command {
        let entries = ledger.read_all().await?;
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(0);
    }

    // Credential first: nothing touches the network without it
    let wallet = SecureWallet::from_lookup(PRIVATE_KEY_ENV, &lookup)?;
    let rpc = RpcConfig::resolve_with(&config.network, &lookup)?;
    tracing::info!(wallet = %wallet.address(), rpc_url = %rpc.url(), "Loaded wallet");

    let chain = Arc::new(RpcChainClient::new(
        &rpc,
        &wallet,
        config.trade.receipt_poll_interval(),
    ));

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let executor = TradeExecutor::new(
        chain,
        config.contracts.lens,
        ledger,
        config.trade.clone(),
        cancel,
    );
    let explorer = config.network.explorer_tx_url.as_str();

    match cli.command {
        Commands::Quote {
            token,
            amount,
            side,
        } => {
            let direction = TradeDirection::from(side);
            let amount_in = parse_amount(&amount)?;
            let quote = executor.quote(token, amount_in, direction).await?;
            let (unit_in, unit_out) = units(direction);
            println!(
                "Quote: {} {} -> {} {}",
                ether_string(amount_in),
                unit_in,
                ether_string(quote.amount_out),
                unit_out
            );
            println!("Router: {}", quote.router);
            Ok(0)
        }
        Commands::Buy { token, amount } => {
            let amount_in = parse_amount(&amount)?;
            let execution = executor.buy(token, amount_in).await?;
            Ok(emit(trade_report(&execution, explorer)))
        }
        Commands::Sell { token } => {
            let result = executor.sell(token).await?;
            Ok(emit(sell_report(&result, explorer)))
        }
        Commands::Reconcile => {
            let resolved = executor.reconcile().await?;
            if resolved.is_empty() {
                println!("Nothing to reconcile");
            }
            for entry in &resolved {
                println!(
                    "{} {} -> {} (block {})",
                    entry.action,
                    entry.hash,
                    entry.status,
                    entry.block_number.unwrap_or_default()
                );
            }
            Ok(0)
        }
        Commands::Ledger => Ok(0),
    }
}

fn parse_amount(raw: &str) -> Result<U256> {
    if raw.trim().starts_with('-') {
        return Err(Error::InvalidArgument(format!(
            "Invalid amount '{}': must not be negative",
            raw
        )));
    }
    let amount = parse_ether(raw.trim())
        .map_err(|e| Error::InvalidArgument(format!("Invalid amount '{}': {}", raw, e)))?;
    if amount.is_zero() {
        return Err(Error::InvalidArgument(
            "Amount must be greater than zero".to_string(),
        ));
    }
    Ok(amount)
}

fn units(direction: TradeDirection) -> (&'static str, &'static str) {
    match direction {
        TradeDirection::Buy => ("MON", "tokens"),
        TradeDirection::Sell => ("tokens", "MON"),
    }
}

/// Operator-facing text and exit code for a finished command
struct Report {
    text: String,
    code: u8,
}

fn emit(report: Report) -> u8 {
    println!("{}", report.text);
    report.code
}

fn sell_report(result: &SellResult, explorer: &str) -> Report {
    match result {
        SellResult::NothingToSell => Report {
            text: "No tokens to sell".to_string(),
            code: 0,
        },
        SellResult::Executed(execution) => trade_report(execution, explorer),
    }
}

fn trade_report(execution: &Execution, explorer: &str) -> Report {
    let outcome = &execution.outcome;
    let (unit_in, unit_out) = units(outcome.direction);

    let mut text = format!(
        "{}: {} {} -> expected {} {} (min {})\nTX hash: {}\nExplorer: {}{}\nStatus: {}",
        outcome.direction,
        ether_string(outcome.amount_in),
        unit_in,
        ether_string(outcome.amount_out),
        unit_out,
        ether_string(outcome.amount_out_min),
        outcome.tx_hash,
        explorer,
        outcome.tx_hash,
        outcome.status
    );

    let code = match outcome.status {
        TradeStatus::Success => 0,
        TradeStatus::Reverted => 1,
        TradeStatus::Unknown => {
            text.push_str("\nSettlement unknown; run `nadfun-trader reconcile` later");
            1
        }
    };
    Report { text, code }
}
