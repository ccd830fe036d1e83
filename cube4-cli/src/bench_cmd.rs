//! Bench command - time searches over seeded random openings
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: generate_openings(), search_all(), report_results()
//! - Level 3: search_opening()
//! - Level 4: timing utilities, formatting
//!
//! With `--parallel` every rayon worker builds its own board and its own
//! engine; only the read-only Zobrist keys are shared.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;

use cube4_core::{AlphaBetaAI, Cube, GameStatus, SearchConfig, ZobristKeys};

/// Seed used when none is given on the command line
const DEFAULT_SEED: u64 = 42;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct BenchArgs {
    /// Search depth in half-moves
    #[arg(long, default_value = "5")]
    pub depth: u8,

    /// Number of random openings to search
    #[arg(long, default_value = "16")]
    pub positions: usize,

    /// Random moves played to build each opening
    #[arg(long, default_value = "8")]
    pub opening_plies: usize,

    /// Transposition table size per engine in MiB
    #[arg(long, default_value = "4")]
    pub table_mb: usize,

    /// Search openings concurrently, one engine per worker
    #[arg(long)]
    pub parallel: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of searching one opening
#[derive(Clone, Debug, Serialize)]
pub struct PositionResult {
    pub moves: Vec<u8>,
    pub best_column: Option<u8>,
    pub score: i32,
    pub nodes: u64,
    pub collisions: u64,
    pub time_ms: f64,
}

/// Aggregated bench results
#[derive(Clone, Debug, Serialize)]
struct BenchSummary {
    depth: u8,
    parallel: bool,
    positions: Vec<PositionResult>,
    total_nodes: u64,
    wall_time_ms: f64,
    nodes_per_second: f64,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run bench command
pub fn run(args: BenchArgs, seed: Option<u64>) -> Result<()> {
    let config = SearchConfig::with_depth(args.depth).with_table_mb(args.table_mb);
    config.validate()?;

    let seed = seed.unwrap_or(DEFAULT_SEED);
    let openings = generate_openings(args.positions, args.opening_plies, seed);

    tracing::info!(
        "Benchmarking {} openings (depth={}, seed={}, parallel={})",
        openings.len(),
        args.depth,
        seed,
        args.parallel
    );

    let start = Instant::now();
    let positions = search_all(&openings, &config, args.parallel)?;
    let wall_time = start.elapsed();

    let total_nodes: u64 = positions.iter().map(|p| p.nodes).sum();
    let summary = BenchSummary {
        depth: args.depth,
        parallel: args.parallel,
        positions,
        total_nodes,
        wall_time_ms: wall_time.as_secs_f64() * 1000.0,
        nodes_per_second: total_nodes as f64 / wall_time.as_secs_f64().max(1e-9),
    };

    report_results(&summary, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Random openings that are still undecided after `plies` moves
pub fn generate_openings(count: usize, plies: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let keys = Arc::new(ZobristKeys::new());
    (0..count)
        .map(|_| random_opening(&mut rng, &keys, plies))
        .collect()
}

/// Search every opening, each with a fresh board and engine
pub fn search_all(openings: &[Vec<u8>], config: &SearchConfig, parallel: bool) -> Result<Vec<PositionResult>> {
    let keys = Arc::new(ZobristKeys::new());
    if parallel {
        openings
            .par_iter()
            .map(|moves| search_opening(&keys, moves, config.clone()))
            .collect()
    } else {
        openings
            .iter()
            .map(|moves| search_opening(&keys, moves, config.clone()))
            .collect()
    }
}

fn report_results(summary: &BenchSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        print_text_results(summary);
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - SEARCH
// ============================================================================

/// Build the opening and search it with a private engine
fn search_opening(keys: &Arc<ZobristKeys>, moves: &[u8], config: SearchConfig) -> Result<PositionResult> {
    let mut cube = Cube::from_moves(Arc::clone(keys), moves)
        .with_context(|| format!("Invalid opening: {:?}", moves))?;
    let mut ai = AlphaBetaAI::new(config);

    let start = Instant::now();
    let outcome = ai.search(&mut cube);
    let elapsed = start.elapsed();

    Ok(PositionResult {
        moves: moves.to_vec(),
        best_column: outcome.best_move.map(|m| m.column),
        score: outcome.score,
        nodes: outcome.stats.nodes,
        collisions: outcome.stats.collisions,
        time_ms: elapsed.as_secs_f64() * 1000.0,
    })
}

/// Random moves that never end the game. Stops short of `plies` when the
/// board fills or every open column would win for the side to move.
fn random_opening(rng: &mut ChaCha8Rng, keys: &Arc<ZobristKeys>, plies: usize) -> Vec<u8> {
    let mut cube = Cube::new(Arc::clone(keys));
    let mut moves = Vec::with_capacity(plies);
    while moves.len() < plies {
        let candidates: Vec<u8> = (0..16u8)
            .filter(|&column| cube.is_open(column) && !wins_immediately(&mut cube, column))
            .collect();
        if candidates.is_empty() {
            tracing::debug!("Opening stopped after {} plies", moves.len());
            break;
        }
        let column = candidates[rng.gen_range(0..candidates.len())];
        cube.apply(column);
        moves.push(column);
    }
    debug_assert!(!matches!(cube.status(), GameStatus::Won(_)));
    moves
}

fn wins_immediately(cube: &mut Cube, column: u8) -> bool {
    let layer = cube.apply(column);
    let won = cube.winner_at(cube4_core::cell_index(layer, column)).is_some();
    cube.undo(column);
    won
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Format duration for display
fn format_duration(d: Duration) -> String {
    if d.as_secs() >= 1 {
        format!("{:.2}s", d.as_secs_f64())
    } else if d.as_millis() >= 1 {
        format!("{:.1}ms", d.as_secs_f64() * 1000.0)
    } else {
        format!("{:.1}us", d.as_secs_f64() * 1_000_000.0)
    }
}

fn format_moves(moves: &[u8]) -> String {
    moves.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(",")
}

/// Print results as text table
fn print_text_results(summary: &BenchSummary) {
    println!("\n=== Cube4 Search Benchmark (depth {}) ===\n", summary.depth);
    println!(
        "{:<28} {:>6} {:>10} {:>12} {:>10}",
        "Opening", "Best", "Score", "Nodes", "Time"
    );
    println!("{}", "-".repeat(70));

    for p in &summary.positions {
        let best = p.best_column.map_or("-".to_string(), |c| c.to_string());
        println!(
            "{:<28} {:>6} {:>10} {:>12} {:>10}",
            format_moves(&p.moves),
            best,
            p.score,
            p.nodes,
            format_duration(Duration::from_secs_f64(p.time_ms / 1000.0))
        );
    }

    println!("{}", "-".repeat(70));
    println!(
        "Total: {} nodes in {} ({:.0} nodes/s{})",
        summary.total_nodes,
        format_duration(Duration::from_secs_f64(summary.wall_time_ms / 1000.0)),
        summary.nodes_per_second,
        if summary.parallel { ", parallel" } else { "" }
    );
}

// ============================================================================
// TESTS
// ============================================================================
