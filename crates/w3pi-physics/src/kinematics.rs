//! Angular separation and pair mass in hardware units.

use crate::trig_lut::TrigMode;
use w3pi_core::{Candidate, ETAPHI_LSB, INT_2PI, INT_PI};

/// Normalise an azimuth difference into (-π, π].
pub fn wrap_delta_phi(dphi: i32) -> i32 {
    (dphi + INT_PI - 1).rem_euclid(INT_2PI) - (INT_PI - 1)
}

/// ΔR² = Δη² + Δφ², with Δφ taken along the shorter arc.
pub fn delta_r2(a: &Candidate, b: &Candidate) -> i32 {
    let deta = a.hw_eta() as i32 - b.hw_eta() as i32;
    let dphi = wrap_delta_phi(a.hw_phi() as i32 - b.hw_phi() as i32);
    deta * deta + dphi * dphi
}

/// Convert a physical ΔR into a hardware ΔR² threshold.
pub fn dr_to_hw_dr2(dr: f64) -> i32 {
    (dr / ETAPHI_LSB).powi(2).round() as i32
}

/// Squared invariant mass of a pair, `2·pT₁·pT₂·(cosh Δη − cos Δφ)`, in units of
/// `hw_pt² / 128`.
///
/// Table rounding can make this slightly negative for nearly collinear pairs;
/// the value is returned as is.
pub fn pair_mass(a: &Candidate, b: &Candidate, trig: TrigMode) -> i64 {
    let deta = a.hw_eta() as i32 - b.hw_eta() as i32;
    let dphi = wrap_delta_phi(a.hw_phi() as i32 - b.hw_phi() as i32);
    2 * a.hw_pt() as i64 * b.hw_pt() as i64 * (trig.cosh(deta) - trig.cos(dphi))
}
