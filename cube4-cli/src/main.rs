//! Cube4 CLI - Command-line interface
//!
//! Commands:
//! - search: Analyse one position
//! - bench: Time searches over seeded random openings

mod bench_cmd;
mod search_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cube4")]
#[command(about = "4x4x4 gravity connect-four search engine")]
struct Cli {
    /// Random seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a position and report the best move
    Search(search_cmd::SearchArgs),
    /// Benchmark search speed on random openings
    Bench(bench_cmd::BenchArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize logging (RUST_LOG overrides the default level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => search_cmd::run(args),
        Commands::Bench(args) => bench_cmd::run(args, cli.seed),
    }
}
