//! Seed / isolation engine.
//!
//! Runs a fixed number of iterations over the unsorted candidate array. Each
//! iteration picks the highest-momentum unmasked candidate as a seed, sums the
//! momentum in the ring `dr2_veto < ΔR² < dr2_max` around it, masks the seed's
//! neighbourhood and keeps the seed if its ring sum passes the cut.
//!
//! With [`MaskPolicy::Cone`] the whole cone is masked while only the ring is
//! summed. Both the ring sum and the mask update look at every slot, masked or
//! not.

use crate::kinematics::{delta_r2, dr_to_hw_dr2};
use serde::{Deserialize, Serialize};
use w3pi_core::{
    Candidate, CandidateMask, Result, Selected, W3piError, NISO_MAX, NPUPPI_MAX, NPUPPI_SEL,
};

/// Which slots an iteration removes from later seed searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskPolicy {
    /// Every slot with ΔR² < dr2_max, the seed included
    #[default]
    Cone,
    /// Only slots bitwise equal to the seed
    SeedOnly,
}

/// Acceptance test applied to each seed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IsolationCut {
    /// iso < pT
    #[default]
    SelfPt,
    /// iso < factor · pT
    Scaled { factor: f64 },
    /// Every seed is reported
    Disabled,
}

impl IsolationCut {
    pub fn accepts(&self, seed: &Candidate, abs_iso: u32) -> bool {
        match *self {
            IsolationCut::SelfPt => abs_iso < seed.hw_pt() as u32,
            IsolationCut::Scaled { factor } => (abs_iso as f64) < factor * seed.hw_pt() as f64,
            IsolationCut::Disabled => true,
        }
    }
}

/// Isolation engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolationConfig {
    /// Outer cone radius ΔR
    pub dr_max: f64,
    /// Inner veto radius ΔR
    pub dr_veto: f64,
    /// Seed iterations per event (1..=12)
    pub max_seeds: usize,
    pub mask_policy: MaskPolicy,
    pub cut: IsolationCut,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            dr_max: 0.4,
            dr_veto: 0.1,
            max_seeds: NISO_MAX,
            mask_policy: MaskPolicy::Cone,
            cut: IsolationCut::SelfPt,
        }
    }
}

impl IsolationConfig {
    pub fn thresholds(&self) -> IsolationThresholds {
        IsolationThresholds {
            dr2_max: dr_to_hw_dr2(self.dr_max),
            dr2_veto: dr_to_hw_dr2(self.dr_veto),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.dr_veto >= 0.0 && self.dr_veto < self.dr_max) {
            return Err(W3piError::config(format!(
                "isolation radii must satisfy 0 <= dr_veto < dr_max, got veto {} max {}",
                self.dr_veto, self.dr_max
            )));
        }
        if self.max_seeds == 0 || self.max_seeds > NISO_MAX {
            return Err(W3piError::config(format!(
                "max_seeds must be in 1..={}, got {}",
                NISO_MAX, self.max_seeds
            )));
        }
        if let IsolationCut::Scaled { factor } = self.cut {
            if !(factor > 0.0 && factor.is_finite()) {
                return Err(W3piError::config(format!(
                    "scaled isolation cut needs a positive factor, got {}",
                    factor
                )));
            }
        }
        Ok(())
    }
}

/// Hardware ΔR² bounds of the isolation ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsolationThresholds {
    pub dr2_max: i32,
    pub dr2_veto: i32,
}

impl Default for IsolationThresholds {
    fn default() -> Self {
        IsolationConfig::default().thresholds()
    }
}

/// Isolated seeds in discovery order; slots past `count` are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolationOutput {
    pub seeds: [Candidate; NISO_MAX],
    pub abs_iso: [u32; NISO_MAX],
    pub count: usize,
}

impl Default for IsolationOutput {
    fn default() -> Self {
        Self {
            seeds: [Candidate::EMPTY; NISO_MAX],
            abs_iso: [0; NISO_MAX],
            count: 0,
        }
    }
}

impl IsolationOutput {
    pub fn isolated(&self) -> impl Iterator<Item = (&Candidate, u32)> + '_ {
        self.seeds[..self.count]
            .iter()
            .zip(self.abs_iso[..self.count].iter().copied())
    }
}

/// Slot of the highest-momentum unmasked candidate, `None` when every slot is
/// masked.
///
/// Pairwise tournament over a fixed tree: ties go to the earlier operand and an
/// odd element at the end of a round is carried to the next.
pub fn find_seed(candidates: &[Candidate], masked: &CandidateMask) -> Option<usize> {
    let mut round: Vec<(usize, bool)> = (0..candidates.len())
        .map(|slot| (slot, masked.get(slot)))
        .collect();
    if round.is_empty() {
        return None;
    }
    while round.len() > 1 {
        round = round
            .chunks(2)
            .map(|pair| match *pair {
                [(a, a_masked), (b, b_masked)] => {
                    let take_a = !a_masked
                        && (candidates[a].hw_pt() >= candidates[b].hw_pt() || b_masked);
                    (if take_a { a } else { b }, a_masked && b_masked)
                }
                [carry] => carry,
                _ => unreachable!("chunks(2) yields one or two elements"),
            })
            .collect();
    }
    let (slot, all_masked) = round[0];
    (!all_masked).then_some(slot)
}

/// Momentum sum in the ring `dr2_veto < ΔR² < dr2_max` around `seed`.
///
/// The seed's own slot sits at ΔR² = 0 and never contributes.
pub fn isolation_of(seed: &Candidate, particles: &[Candidate], thresholds: &IsolationThresholds) -> u32 {
    particles
        .iter()
        .filter(|p| {
            let dr2 = delta_r2(seed, p);
            dr2 > thresholds.dr2_veto && dr2 < thresholds.dr2_max
        })
        .map(|p| p.hw_pt() as u32)
        .sum()
}

/// Ring sum of each selected candidate against `particles`.
pub fn isolation_of_selected(
    selected: &Selected,
    particles: &[Candidate],
    thresholds: &IsolationThresholds,
) -> [u32; NPUPPI_SEL] {
    let mut iso = [0u32; NPUPPI_SEL];
    for (out, candidate) in iso.iter_mut().zip(selected) {
        *out = isolation_of(candidate, particles, thresholds);
    }
    iso
}

/// Run the seed loop over `input`.
pub fn compute_isolated(input: &[Candidate; NPUPPI_MAX], config: &IsolationConfig) -> IsolationOutput {
    let thresholds = config.thresholds();
    let iterations = config.max_seeds.min(NISO_MAX);

    let mut masked = CandidateMask::new();
    for (slot, candidate) in input.iter().enumerate() {
        masked.set(slot, candidate.is_neutral());
    }

    let mut output = IsolationOutput::default();
    for iteration in 0..iterations {
        let (seed, abs_iso) = match find_seed(input, &masked) {
            Some(slot) => {
                let seed = input[slot];
                let abs_iso = isolation_of(&seed, input, &thresholds);
                for (i, candidate) in input.iter().enumerate() {
                    let consumed = match config.mask_policy {
                        MaskPolicy::Cone => delta_r2(&seed, candidate) < thresholds.dr2_max,
                        MaskPolicy::SeedOnly => *candidate == seed,
                    };
                    if consumed {
                        masked.set(i, true);
                    }
                }
                (seed, abs_iso)
            }
            // Every slot masked: report the filler with a zero sum, mask untouched.
            None => (Candidate::EMPTY, 0),
        };

        if config.cut.accepts(&seed, abs_iso) {
            log::trace!("isolation iteration {}: seed {} iso {}", iteration, seed, abs_iso);
            output.seeds[output.count] = seed;
            output.abs_iso[output.count] = abs_iso;
            output.count += 1;
        }
    }
    output
}
