//! Selector filter ("masker/slimmer").
//!
//! Rejected slots are demoted to [`Candidate::EMPTY`] instead of removed, so the
//! array keeps its fixed shape and slot indices.

use serde::{Deserialize, Serialize};
use w3pi_core::{Candidate, CandidateMask, NPUPPI_MAX};

/// |η| ≤ 2.4 in hardware units.
pub const ETA_CUT: i32 = 550;

/// Admission cuts applied to every input slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionCuts {
    /// Maximum |hw_eta| admitted (inclusive)
    pub eta_cut: i32,
    /// Lowest admitted particle-id code (inclusive)
    pub min_id: u8,
    /// Highest admitted particle-id code (inclusive)
    pub max_id: u8,
}

impl Default for SelectionCuts {
    fn default() -> Self {
        Self {
            eta_cut: ETA_CUT,
            min_id: 2, // h-
            max_id: 5, // e+
        }
    }
}

impl SelectionCuts {
    pub fn admits(&self, candidate: &Candidate) -> bool {
        let id = candidate.hw_id();
        (candidate.hw_eta() as i32).abs() <= self.eta_cut && id >= self.min_id && id <= self.max_id
    }

    /// Rejection bit per slot (`true` = rejected).
    pub fn mask(&self, candidates: &[Candidate; NPUPPI_MAX]) -> CandidateMask {
        let mut masked = CandidateMask::new();
        for (slot, candidate) in candidates.iter().enumerate() {
            masked.set(slot, !self.admits(candidate));
        }
        masked
    }

    /// Replace every rejected slot by the filler, copying the rest unchanged.
    pub fn slim(
        candidates: &[Candidate; NPUPPI_MAX],
        masked: &CandidateMask,
    ) -> [Candidate; NPUPPI_MAX] {
        let mut slimmed = *candidates;
        for slot in masked.iter_set() {
            slimmed[slot] = Candidate::EMPTY;
        }
        slimmed
    }

    /// Mask and slim in one pass.
    pub fn select(
        &self,
        candidates: &[Candidate; NPUPPI_MAX],
    ) -> (CandidateMask, [Candidate; NPUPPI_MAX]) {
        let masked = self.mask(candidates);
        let slimmed = Self::slim(candidates, &masked);
        (masked, slimmed)
    }
}
