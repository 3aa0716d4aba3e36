use clap::{Parser, Subcommand};
use cryptocoin::{
    describe, inspect, CoinError, MinerBuilder, Outcome, ParallelMiner, TracingProgress,
    GENERIC_ERROR_CODE, MAX_ITERATIONS, NONCE_LEN,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::{fs, process};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about, version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mine a new coin
    Mine {
        #[arg(long, help = "Required trailing zero bits in the coin hash")]
        bits: u32,

        #[arg(long, default_value_t = MAX_ITERATIONS, help = "Attempt budget per worker")]
        max_iterations: u64,

        #[arg(long, default_value_t = 1, help = "Number of independent mining workers")]
        workers: usize,

        #[arg(long, default_value_t = NONCE_LEN)]
        nonce_len: usize,

        #[arg(long, default_value_t = 65536, help = "Log progress every N attempts")]
        progress_every: u64,

        #[arg(long, value_name = "FILE", help = "Write the raw coin here instead of hex to stdout")]
        out: Option<PathBuf>,

        #[arg(long, help = "Print a JSON report")]
        json: bool,
    },
    /// Check an existing coin
    Check {
        #[arg(long)]
        bits: u32,

        #[arg(
            long = "in",
            value_name = "FILE",
            conflicts_with = "hex",
            required_unless_present = "hex"
        )]
        input: Option<PathBuf>,

        #[arg(long, value_name = "HEX")]
        hex: Option<String>,

        #[arg(long, help = "Print a JSON report")]
        json: bool,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Coin(#[from] CoinError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    fn code(&self) -> i32 {
        match self {
            CliError::Coin(err) => err.code(),
            _ => GENERIC_ERROR_CODE,
        }
    }
}

#[derive(Serialize)]
struct MineReport {
    bits: u32,
    outcome: Outcome,
    attempts: u64,
    zero_bits: u32,
    size: usize,
    coin: String,
}

fn init_log() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_log();

    let args = Args::parse();

    let code = match run(args.command) {
        Ok(outcome) => {
            info!("{}", describe(outcome.code()));
            outcome.code()
        }
        Err(err) => {
            error!("{} ({})", err, describe(err.code()));
            err.code()
        }
    };
    process::exit(code);
}

fn run(command: Command) -> Result<Outcome, CliError> {
    match command {
        Command::Mine {
            bits,
            max_iterations,
            workers,
            nonce_len,
            progress_every,
            out,
            json,
        } => {
            let miner = MinerBuilder::default()
                .bits(bits)
                .max_iterations(max_iterations)
                .nonce_len(nonce_len)
                .observer(Arc::new(TracingProgress::new(progress_every)))
                .build_validated()?;
            info!(bits, workers, max_iterations, "Mining starting...");
            let mined = ParallelMiner::new(miner, workers)?.mine()?;
            info!(
                attempts = mined.attempts,
                zero_bits = mined.zero_bits(),
                outcome = %mined.outcome,
                "Mining finished"
            );

            if let Some(path) = &out {
                fs::write(path, &mined.bytes)?;
                info!("coin written to {}", path.display());
            }
            if json {
                let report = MineReport {
                    bits,
                    outcome: mined.outcome,
                    attempts: mined.attempts,
                    zero_bits: mined.zero_bits(),
                    size: mined.bytes.len(),
                    coin: mined.hex(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if out.is_none() {
                println!("{}", mined.hex());
            }
            Ok(mined.outcome)
        }
        Command::Check {
            bits,
            input,
            hex,
            json,
        } => {
            let bytes = match input {
                Some(path) => fs::read(path)?,
                None => hex::decode(hex.unwrap_or_default().trim())?,
            };
            let report = inspect(bits, &bytes)?;
            info!(
                zero_bits = report.zero_bits,
                meets_difficulty = report.meets_difficulty,
                signature_valid = report.signature_valid,
                "coin checked"
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(report.outcome)
        }
    }
}
