//! Momentum ordering: partitioned bitonic sort/merge, the whole-array reference
//! sort, and top-K truncation.
//!
//! The partitioned path sorts `block_count` contiguous blocks independently and
//! then merges them pairwise over `log2(block_count)` stages. Both paths yield a
//! non-increasing permutation of the input. They agree exactly unless two
//! distinct candidates share a momentum, in which case the network may order the
//! tie differently from the reference (ties by original index).

use crate::bitonic::{self, Direction};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use w3pi_core::{Candidate, Result, Selected, W3piError, NPUPPI_MAX, NPUPPI_SEL};

/// Block partition of the sort network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    /// Number of independently sorted blocks (power of two)
    pub block_count: usize,
    /// Candidates per block
    pub block_size: usize,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        // 8 × 27 covers every slot
        Self {
            block_count: 8,
            block_size: 27,
        }
    }
}

impl OrderingConfig {
    pub fn new(block_count: usize, block_size: usize) -> Result<Self> {
        let config = Self {
            block_count,
            block_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// 16 blocks of 13 (208 slots).
    pub fn preset_16x13() -> Self {
        Self {
            block_count: 16,
            block_size: 13,
        }
    }

    /// 8 blocks of 26 (208 slots).
    pub fn preset_8x26() -> Self {
        Self {
            block_count: 8,
            block_size: 26,
        }
    }

    /// Number of leading slots covered by the network.
    pub fn sort_width(&self) -> usize {
        self.block_count * self.block_size
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_count == 0 || !self.block_count.is_power_of_two() {
            return Err(W3piError::config(format!(
                "block_count must be a power of two, got {}",
                self.block_count
            )));
        }
        if self.block_size == 0 {
            return Err(W3piError::config("block_size must be at least 1"));
        }
        if self.sort_width() > NPUPPI_MAX {
            return Err(W3piError::config(format!(
                "sort width {} × {} = {} exceeds {} slots",
                self.block_count,
                self.block_size,
                self.sort_width(),
                NPUPPI_MAX
            )));
        }
        Ok(())
    }

    /// Sort each block of `data` descending by momentum.
    pub fn order_blocks(&self, data: &mut [Candidate]) {
        assert_eq!(data.len(), self.sort_width(), "slice must span the sort width");
        for block in data.chunks_mut(self.block_size) {
            bitonic::sort_by_key(block, Direction::Descending, Candidate::hw_pt);
        }
    }

    /// Merge sorted blocks pairwise until one sorted run spans `data`.
    pub fn merge_blocks(&self, data: &mut [Candidate]) {
        assert_eq!(data.len(), self.sort_width(), "slice must span the sort width");
        let mut run = self.block_size;
        while run < data.len() {
            for pair in data.chunks_mut(2 * run) {
                let split = run.min(pair.len());
                bitonic::merge_sorted_runs(pair, split, Direction::Descending, Candidate::hw_pt);
            }
            run *= 2;
        }
    }

    /// Partitioned sort of the leading `sort_width()` slots.
    ///
    /// Slots past the sort width are copied through untouched; callers keep them
    /// filled with [`Candidate::EMPTY`] so the output stays ordered.
    pub fn sort(&self, input: &[Candidate; NPUPPI_MAX]) -> [Candidate; NPUPPI_MAX] {
        let width = self.sort_width();
        assert!(width <= NPUPPI_MAX, "sort width {} exceeds {}", width, NPUPPI_MAX);
        let mut sorted = *input;
        self.order_blocks(&mut sorted[..width]);
        self.merge_blocks(&mut sorted[..width]);
        sorted
    }
}

/// Whole-array stable sort, descending by momentum, ties by original index.
pub fn sort_reference(input: &[Candidate; NPUPPI_MAX]) -> [Candidate; NPUPPI_MAX] {
    let mut sorted = *input;
    sorted.sort_by_key(|c| Reverse(c.hw_pt()));
    sorted
}

/// The first K sorted candidates.
pub fn truncate_top_k(sorted: &[Candidate; NPUPPI_MAX]) -> Selected {
    let mut selected = [Candidate::EMPTY; NPUPPI_SEL];
    selected.copy_from_slice(&sorted[..NPUPPI_SEL]);
    selected
}

/// True when two different candidates share a momentum, the only case in which
/// the partitioned and reference orders may disagree.
pub fn has_ambiguous_ties(candidates: &[Candidate]) -> bool {
    let mut keyed: Vec<(u16, u64)> = candidates.iter().map(|c| (c.hw_pt(), c.pack())).collect();
    keyed.sort_unstable();
    keyed.dedup();
    keyed.windows(2).any(|w| w[0].0 == w[1].0)
}
