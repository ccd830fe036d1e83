//! Search command - analyse a single position
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_config(), build_position(), report()
//! - Level 3: describe_move()
//! - Level 4: formatting utilities

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use cube4_core::{
    AlphaBetaAI, Cube, GameStatus, Move, Player, SearchConfig, SearchStats, TableStats, ZobristKeys,
};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct SearchArgs {
    /// Comma-separated drop columns (0-15) played from the empty board
    #[arg(long, value_delimiter = ',')]
    pub moves: Vec<u8>,

    /// Search depth in half-moves (overrides the config file)
    #[arg(long)]
    pub depth: Option<u8>,

    /// Transposition table size in MiB (0 disables it)
    #[arg(long)]
    pub table_mb: Option<usize>,

    /// Plain minimax without alpha-beta cutoffs
    #[arg(long)]
    pub no_pruning: bool,

    /// Search config JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// A move as shown to the user
#[derive(Clone, Debug, Serialize)]
struct MoveReport {
    column: u8,
    row: u8,
    col: u8,
    layer: u8,
    player: Player,
}

/// Everything the command prints
#[derive(Clone, Debug, Serialize)]
struct SearchReport {
    moves: Vec<u8>,
    status: GameStatus,
    side_to_move: Player,
    depth: u8,
    best_move: Option<MoveReport>,
    score: i32,
    normalized: f64,
    forced_win: Option<(Player, u32)>,
    stats: SearchStats,
    table: TableStats,
    time_ms: f64,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run search command
pub fn run(args: SearchArgs) -> Result<()> {
    let config = build_config(&args)?;
    let mut cube = build_position(&args.moves)?;

    tracing::info!(
        "Searching after {} moves (depth={}, table={} bytes, pruning={})",
        args.moves.len(),
        config.depth,
        config.table_bytes,
        config.pruning
    );

    let report = analyse(&mut cube, &args.moves, config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text_report(&cube, &report);
    }

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Config file (or defaults) with command-line overrides applied
fn build_config(args: &SearchArgs) -> Result<SearchConfig> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::load(path)?,
        None => SearchConfig::default(),
    };
    if let Some(depth) = args.depth {
        config.depth = depth;
    }
    if let Some(mb) = args.table_mb {
        config = config.with_table_mb(mb);
    }
    if args.no_pruning {
        config = config.with_pruning(false);
    }
    config.validate()?;
    Ok(config)
}

/// Replay the move list from the empty board
fn build_position(moves: &[u8]) -> Result<Cube> {
    let keys = Arc::new(ZobristKeys::new());
    Cube::from_moves(keys, moves).with_context(|| format!("Invalid move list: {:?}", moves))
}

/// Search the position unless the game is already decided
fn analyse(cube: &mut Cube, moves: &[u8], config: SearchConfig) -> SearchReport {
    let status = cube.status();
    let depth = config.depth;
    let mut ai = AlphaBetaAI::new(config);

    let start = Instant::now();
    let outcome = if status == GameStatus::Ongoing {
        Some(ai.search(cube))
    } else {
        None
    };
    let elapsed = start.elapsed();

    SearchReport {
        moves: moves.to_vec(),
        status,
        side_to_move: cube.side_to_move(),
        depth,
        best_move: outcome.and_then(|o| o.best_move).map(|mv| describe_move(cube, mv)),
        score: outcome.map_or(0, |o| o.score),
        normalized: outcome.map_or(0.0, |o| o.normalized()),
        forced_win: outcome.and_then(|o| o.forced_win_in()),
        stats: outcome.map(|o| o.stats).unwrap_or_default(),
        table: ai.table_stats(),
        time_ms: elapsed.as_secs_f64() * 1000.0,
    }
}

// ============================================================================
// LEVEL 3 - HELPERS
// ============================================================================

/// Grid position and landing layer of a move on `cube`
fn describe_move(cube: &Cube, mv: Move) -> MoveReport {
    MoveReport {
        column: mv.column,
        row: mv.row(),
        col: mv.col(),
        layer: cube.height(mv.column),
        player: mv.player,
    }
}

// ============================================================================
// LEVEL 4 - FORMATTING
// ============================================================================

fn format_status(status: GameStatus) -> String {
    match status {
        GameStatus::Ongoing => "ongoing".to_string(),
        GameStatus::Won(p) => format!("win_{}", p),
        GameStatus::Draw => "draw".to_string(),
    }
}

fn print_text_report(cube: &Cube, report: &SearchReport) {
    println!("{}\n", cube);
    println!("Status:      {}", format_status(report.status));
    println!("To move:     {}", report.side_to_move);
    println!("Depth:       {}", report.depth);

    match &report.best_move {
        Some(m) => println!(
            "Best move:   column {} (row {}, col {}) lands on layer {}",
            m.column, m.row, m.col, m.layer
        ),
        None => println!("Best move:   none"),
    }

    let verdict = match report.forced_win {
        Some((winner, plies)) => format!(" ({} wins in {} plies)", winner, plies),
        None => String::new(),
    };
    println!("Score:       {} [{:+.3}]{}", report.score, report.normalized, verdict);
    println!("Nodes:       {}", report.stats.nodes);
    println!("Collisions:  {}", report.stats.collisions);
    println!(
        "Table:       {}/{} slots used, {} cutoffs",
        report.table.used, report.table.capacity, report.stats.table_cutoffs
    );
    println!("Time:        {:.1}ms", report.time_ms);
}

// ============================================================================
// TESTS
// ============================================================================
