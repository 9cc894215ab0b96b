//! Token ledger command-line driver
//!
//! Deploys an in-process ledger, replays an operations file through the
//! actor and reports balances, much like the deploy / inspect / transfer
//! scripts a wallet team would run against a live token.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use token_ledger::{
    config::LoggingConfig, format_units, parse_units, spawn_token_actor, Address, Amount, Config,
    Metrics, Token, TokenHandle, UNLIMITED_ALLOWANCE,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "token-ledger-cli", version, about = "BJIT token ledger driver")]
struct Cli {
    /// TOML configuration file (defaults to environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Account that receives the supply at deployment
    #[arg(long, global = true)]
    holder: Option<Address>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print name, symbol, decimals and total supply
    Details,

    /// Deploy, replay an operations file and print the resulting balances
    Run {
        /// JSON array of operations
        ops: PathBuf,

        /// Also print the event journal as JSON lines
        #[arg(long)]
        events: bool,

        /// Also print metrics in the Prometheus text format
        #[arg(long)]
        metrics: bool,
    },
}

/// One entry of the operations file; amounts are in whole-token units
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Operation {
    Transfer {
        caller: Address,
        to: Address,
        amount: String,
    },
    Approve {
        caller: Address,
        spender: Address,
        amount: String,
    },
    TransferFrom {
        caller: Address,
        from: Address,
        to: Address,
        amount: String,
    },
}

impl Operation {
    fn accounts(&self) -> Vec<Address> {
        match self {
            Operation::Transfer { caller, to, .. } => vec![*caller, *to],
            Operation::Approve { caller, spender, .. } => vec![*caller, *spender],
            Operation::TransferFrom {
                caller, from, to, ..
            } => vec![*caller, *from, *to],
        }
    }
}

fn parse_amount(value: &str, decimals: u8) -> anyhow::Result<Amount> {
    if value.eq_ignore_ascii_case("unlimited") {
        return Ok(UNLIMITED_ALLOWANCE);
    }
    Ok(parse_units(value, decimals)?)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn apply(handle: &TokenHandle, op: &Operation, decimals: u8) -> anyhow::Result<()> {
    match op {
        Operation::Transfer { caller, to, amount } => {
            handle
                .transfer(*caller, *to, parse_amount(amount, decimals)?)
                .await?;
        }
        Operation::Approve {
            caller,
            spender,
            amount,
        } => {
            handle
                .approve(*caller, *spender, parse_amount(amount, decimals)?)
                .await?;
        }
        Operation::TransferFrom {
            caller,
            from,
            to,
            amount,
        } => {
            handle
                .transfer_from(*caller, *from, *to, parse_amount(amount, decimals)?)
                .await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::from_env().context("loading config from environment")?,
    };
    if let Some(holder) = cli.holder {
        config.initial_holder = Some(holder);
    }

    init_tracing(&config.logging);

    let Some(holder) = config.initial_holder else {
        bail!("no initial holder: pass --holder or set initial_holder in the config");
    };

    let token = Token::deploy_with_capacity(holder, config.actor.event_channel_capacity)
        .context("deployment failed")?;
    tracing::info!(holder = %holder, service = %config.service_name, "Token deployed");

    match cli.command {
        Command::Details => {
            let metadata = token.metadata();
            println!("Token Name: {}", metadata.name);
            println!("Token Symbol: {}", metadata.symbol);
            println!("Decimals: {}", metadata.decimals);
            println!(
                "Total Supply: {}",
                format_units(token.total_supply(), metadata.decimals)
            );
        }

        Command::Run {
            ops,
            events,
            metrics,
        } => {
            let content = std::fs::read_to_string(&ops)
                .with_context(|| format!("reading {}", ops.display()))?;
            let operations: Vec<Operation> = serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", ops.display()))?;

            let decimals = token.decimals();
            let collector = if config.metrics.enabled {
                Some(Metrics::new(&config.metrics.namespace)?)
            } else {
                None
            };
            let handle = spawn_token_actor(token, &config.actor, collector.clone());

            let mut touched = BTreeSet::from([holder]);
            let mut rejected = 0usize;
            for (index, op) in operations.iter().enumerate() {
                touched.extend(op.accounts().into_iter().filter(|a| !a.is_null()));
                if let Err(err) = apply(&handle, op, decimals).await {
                    rejected += 1;
                    println!("#{index} rejected: {err}");
                }
            }

            let token = handle.shutdown().await?;
            token.check_conservation()?;

            println!(
                "Applied {} of {} operations",
                operations.len() - rejected,
                operations.len()
            );
            for account in &touched {
                println!(
                    "{}: {}",
                    account,
                    format_units(token.balance_of(account), decimals)
                );
            }
            println!("State root: {}", token.snapshot()?.state_root_hex());

            if events {
                for record in token.events() {
                    println!("{}", serde_json::to_string(record)?);
                }
            }

            if metrics {
                match &collector {
                    Some(collector) => print!("{}", collector.gather_text()?),
                    None => println!("metrics disabled in configuration"),
                }
            }
        }
    }

    Ok(())
}
