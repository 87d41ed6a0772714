//! Triplet enumeration and per-triplet feature vectors.

use crate::kinematics::{delta_r2, pair_mass};
use crate::trig_lut::TrigMode;
use w3pi_core::{Candidate, FeatureVector, Selected, NTRIPLETS, N_FEATURES};

/// Index triplets into the top-K array, in score order: five around the (0, 1)
/// pivot, two around (0, 2), then (1, 2, 3).
pub const TRIPLETS: [(usize, usize, usize); NTRIPLETS] = [
    (0, 1, 2),
    (0, 1, 3),
    (0, 1, 4),
    (0, 1, 5),
    (0, 1, 6),
    (0, 2, 3),
    (0, 2, 4),
    (1, 2, 3),
];

/// Feature names in vector order.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "pi2_pt",
    "pi1_pt",
    "m_01",
    "triplet_charge",
    "dz_02",
    "pi0_pt",
    "triplet_pt",
    "m_02",
    "triplet_max_dz",
    "triplet_min_dr2",
    "pi2_eta",
];

/// Largest of the three signed differences z0−z1, z0−z2, z1−z2.
fn max_signed_dz(z0: i64, z1: i64, z2: i64) -> i64 {
    (z0 - z1).max(z0 - z2).max(z1 - z2)
}

/// Features of one triplet `(i0, i1, i2)` of the selected set.
pub fn triplet_features(
    selected: &Selected,
    (i0, i1, i2): (usize, usize, usize),
    trig: TrigMode,
) -> FeatureVector {
    let (p0, p1, p2) = (&selected[i0], &selected[i1], &selected[i2]);
    let pt = |c: &Candidate| c.hw_pt() as i64;
    let z = |c: &Candidate| c.hw_z0() as i64;

    let min_dr2 = delta_r2(p0, p1).min(delta_r2(p0, p2)).min(delta_r2(p1, p2));

    [
        pt(p2),
        pt(p1),
        pair_mass(p0, p1, trig),
        (p0.charge() + p1.charge() + p2.charge()) as i64,
        z(p0) - z(p2),
        pt(p0),
        pt(p0) + pt(p1) + pt(p2),
        pair_mass(p0, p2, trig),
        max_signed_dz(z(p0), z(p1), z(p2)),
        min_dr2 as i64,
        p2.hw_eta() as i64,
    ]
}

/// Feature vectors for all [`TRIPLETS`], in table order.
pub fn event_features(selected: &Selected, trig: TrigMode) -> [FeatureVector; NTRIPLETS] {
    let mut features = [[0i64; N_FEATURES]; NTRIPLETS];
    for (out, &triplet) in features.iter_mut().zip(TRIPLETS.iter()) {
        *out = triplet_features(selected, triplet, trig);
    }
    features
}
