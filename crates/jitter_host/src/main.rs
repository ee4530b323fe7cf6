mod bench;
mod console;
mod interactive;
mod signal;
mod stats;

use anyhow::Result;
use clap::{Parser, Subcommand};
use jitter_common::config::PROGRESS_INTERVAL;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Host simulator for the period histogram firmware")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Operator loop on stdin/stdout against a simulated input signal.
    Run {
        /// Nominal signal period in timer ticks (1 tick = 1 us).
        #[arg(long, default_value_t = 1000)]
        period: u16,
        /// Maximum deviation of each period from nominal, in ticks.
        #[arg(long, default_value_t = 2)]
        jitter: u16,
        #[arg(long, default_value_t = 12345)]
        seed: u64,
        /// Wall-clock spacing of simulated edges; 0 delivers them back to back.
        #[arg(long, default_value_t = 0)]
        edge_interval_us: u64,
        /// Busy-wait iterations between progress dots.
        #[arg(long, default_value_t = PROGRESS_INTERVAL)]
        progress_interval: u32,
    },
    /// Headless sessions in parallel with a merged report.
    Bench {
        #[arg(short, long, default_value_t = 64)]
        sessions: usize,
        #[arg(long, default_value_t = 1000)]
        period: u16,
        #[arg(long, default_value_t = 2)]
        jitter: u16,
        #[arg(long, default_value_t = 12345)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            period,
            jitter,
            seed,
            edge_interval_us,
            progress_interval,
        } => {
            interactive::run_interactive(
                period,
                jitter,
                seed,
                edge_interval_us,
                progress_interval,
            )?;
        }
        Commands::Bench {
            sessions,
            period,
            jitter,
            seed,
        } => {
            bench::run_bench(sessions, period, jitter, seed)?;
        }
    }
    Ok(())
}
