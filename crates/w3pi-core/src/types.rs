//! Fixed sizes and per-event containers.

use crate::candidate::Candidate;
use crate::errors::{Result, W3piError};
use serde::{Deserialize, Serialize};

/// Candidate slots per event.
pub const NPUPPI_MAX: usize = 216;
/// Highest-momentum candidates kept after sorting.
pub const NPUPPI_SEL: usize = 7;
/// Triplets scored per event.
pub const NTRIPLETS: usize = 8;
/// Features per triplet.
pub const N_FEATURES: usize = 11;
/// Upper bound on isolated seeds reported per event.
pub const NISO_MAX: usize = 12;

/// Ordered features of one triplet, in hardware units.
pub type FeatureVector = [i64; N_FEATURES];

/// The K highest-momentum candidates of an event.
pub type Selected = [Candidate; NPUPPI_SEL];

const MASK_WORDS: usize = NPUPPI_MAX.div_ceil(64);

/// One bit per input slot; `true` means rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CandidateMask {
    words: [u64; MASK_WORDS],
}

impl CandidateMask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: usize) -> bool {
        assert!(slot < NPUPPI_MAX, "mask slot {} out of range", slot);
        self.words[slot / 64] >> (slot % 64) & 1 == 1
    }

    pub fn set(&mut self, slot: usize, value: bool) {
        assert!(slot < NPUPPI_MAX, "mask slot {} out of range", slot);
        let bit = 1u64 << (slot % 64);
        if value {
            self.words[slot / 64] |= bit;
        } else {
            self.words[slot / 64] &= !bit;
        }
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Slots whose bit is set, ascending.
    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        (0..NPUPPI_MAX).filter(move |&slot| self.get(slot))
    }
}

/// One event: a fixed-width candidate array plus the number of valid leading slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    candidates: [Candidate; NPUPPI_MAX],
    len: usize,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            candidates: [Candidate::EMPTY; NPUPPI_MAX],
            len: 0,
        }
    }
}

impl Event {
    /// Copy `candidates` into the leading slots; the remainder holds fillers.
    pub fn from_candidates(candidates: &[Candidate]) -> Result<Self> {
        if candidates.len() > NPUPPI_MAX {
            return Err(W3piError::capacity(candidates.len(), NPUPPI_MAX));
        }
        let mut event = Self::default();
        event.candidates[..candidates.len()].copy_from_slice(candidates);
        event.len = candidates.len();
        Ok(event)
    }

    /// Unpack raw 64-bit candidate words.
    pub fn from_words(words: &[u64]) -> Result<Self> {
        if words.len() > NPUPPI_MAX {
            return Err(W3piError::capacity(words.len(), NPUPPI_MAX));
        }
        let mut event = Self::default();
        for (slot, &word) in event.candidates.iter_mut().zip(words) {
            *slot = Candidate::unpack(word);
        }
        event.len = words.len();
        Ok(event)
    }

    /// All slots, fillers included.
    pub fn candidates(&self) -> &[Candidate; NPUPPI_MAX] {
        &self.candidates
    }

    /// Only the valid leading slots.
    pub fn valid(&self) -> &[Candidate] {
        &self.candidates[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
