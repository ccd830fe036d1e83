//! Search configuration

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::eval::MAX_PLY;

/// Default look-ahead in half-moves
pub const DEFAULT_DEPTH: u8 = 6;

/// Default transposition table size (4 MiB)
pub const DEFAULT_TABLE_BYTES: usize = 4 << 20;

/// How candidate moves are ordered before searching
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingMode {
    /// Heuristic gain, deterministic
    #[default]
    Heuristic,
    /// Heuristic gain with equally ranked moves shuffled (weaker, varied play)
    Shuffled { seed: u64 },
}

/// What a depth-limited leaf is worth
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafScore {
    /// Static line evaluation
    #[default]
    Heuristic,
    /// Zero; only proven wins and losses separate moves
    Neutral,
}

/// Alpha-beta search configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Half-moves of look-ahead
    pub depth: u8,
    /// Transposition table budget in bytes (0 disables the table)
    pub table_bytes: usize,
    /// Alpha-beta cutoffs; disabling gives plain minimax
    pub pruning: bool,
    pub ordering: OrderingMode,
    pub leaf_score: LeafScore,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            table_bytes: DEFAULT_TABLE_BYTES,
            pruning: true,
            ordering: OrderingMode::Heuristic,
            leaf_score: LeafScore::Heuristic,
        }
    }
}

impl SearchConfig {
    /// Default config searching `depth` half-moves
    pub fn with_depth(depth: u8) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }

    pub fn with_table_bytes(mut self, bytes: usize) -> Self {
        self.table_bytes = bytes;
        self
    }

    /// Set the table size in MiB
    pub fn with_table_mb(self, mb: usize) -> Self {
        self.with_table_bytes(mb << 20)
    }

    pub fn without_table(self) -> Self {
        self.with_table_bytes(0)
    }

    pub fn with_pruning(mut self, pruning: bool) -> Self {
        self.pruning = pruning;
        self
    }

    pub fn with_ordering(mut self, ordering: OrderingMode) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_leaf_score(mut self, leaf_score: LeafScore) -> Self {
        self.leaf_score = leaf_score;
        self
    }

    /// Check the values are usable
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (self.depth as u32) <= MAX_PLY,
            "search depth {} exceeds the {} plies a game can last",
            self.depth,
            MAX_PLY
        );
        Ok(())
    }

    /// Load and validate a config from a JSON file; missing fields take defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading search config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("parsing search config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}
