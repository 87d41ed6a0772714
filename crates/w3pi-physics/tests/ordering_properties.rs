//! Randomised ordering properties of the partitioned network.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use w3pi_core::{Candidate, NPUPPI_MAX};
use w3pi_physics::{has_ambiguous_ties, sort_reference, OrderingConfig, SelectionCuts};

fn random_candidate(rng: &mut StdRng, pt: u32) -> Candidate {
    Candidate::new(
        pt,
        rng.gen_range(-700..=700),
        rng.gen_range(-720..=720),
        rng.gen_range(0..8),
        rng.gen_range(-512..512),
    )
}

/// Event with `n` valid slots and pairwise distinct momenta.
fn distinct_event(rng: &mut StdRng, n: usize) -> [Candidate; NPUPPI_MAX] {
    let mut pts: Vec<u32> = (1..16_000).collect();
    pts.shuffle(rng);
    let mut out = [Candidate::EMPTY; NPUPPI_MAX];
    for (slot, &pt) in out.iter_mut().zip(pts.iter()).take(n) {
        *slot = random_candidate(rng, pt);
    }
    out
}

/// Event whose momenta come from a tiny range, so ties are common.
fn tied_event(rng: &mut StdRng, n: usize) -> [Candidate; NPUPPI_MAX] {
    let mut out = [Candidate::EMPTY; NPUPPI_MAX];
    for slot in out.iter_mut().take(n) {
        let pt = rng.gen_range(1..6);
        *slot = random_candidate(rng, pt);
    }
    out
}

fn is_non_increasing(sorted: &[Candidate]) -> bool {
    sorted.windows(2).all(|w| w[0].hw_pt() >= w[1].hw_pt())
}

fn packed_multiset(cands: &[Candidate]) -> Vec<u64> {
    let mut words: Vec<u64> = cands.iter().map(Candidate::pack).collect();
    words.sort_unstable();
    words
}

fn configs() -> Vec<(OrderingConfig, usize)> {
    vec![
        (OrderingConfig::default(), NPUPPI_MAX),
        (OrderingConfig::preset_16x13(), 208),
        (OrderingConfig::preset_8x26(), 208),
        (OrderingConfig::new(2, 100).expect("valid config"), 200),
    ]
}

#[test]
fn test_sorted_output_is_ordered_permutation() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut rng = StdRng::seed_from_u64(0x3_91);
    let cuts = SelectionCuts::default();

    for _ in 0..50 {
        for (config, width) in configs() {
            let n = rng.gen_range(0..=width);
            let (_, slimmed) = cuts.select(&tied_event(&mut rng, n));
            let sorted = config.sort(&slimmed);
            assert!(is_non_increasing(&sorted), "{:?}", config);
            assert_eq!(packed_multiset(&sorted), packed_multiset(&slimmed));
        }
    }
}

#[test]
fn test_distinct_momenta_match_reference() {
    let mut rng = StdRng::seed_from_u64(20_240_601);

    for _ in 0..50 {
        for (config, width) in configs() {
            let n = rng.gen_range(0..=width);
            let input = distinct_event(&mut rng, n);
            assert!(!has_ambiguous_ties(&input));
            assert_eq!(config.sort(&input), sort_reference(&input), "{:?} n={}", config, n);
        }
    }
}

#[test]
fn test_filter_then_sort_matches_reference() {
    // the filter only introduces identical fillers, which never make a tie ambiguous
    let mut rng = StdRng::seed_from_u64(7);
    let cuts = SelectionCuts::default();
    for _ in 0..50 {
        let (_, slimmed) = cuts.select(&distinct_event(&mut rng, NPUPPI_MAX));
        assert_eq!(OrderingConfig::default().sort(&slimmed), sort_reference(&slimmed));
    }
}

#[test]
fn test_equal_momenta_may_reorder() {
    let a = Candidate::new(40, 10, 10, 2, 0);
    let b = Candidate::new(40, -10, 300, 3, 0);
    let mut input = [Candidate::EMPTY; NPUPPI_MAX];
    // different blocks under the default 8 × 27 partition
    input[3] = a;
    input[200] = b;

    let reference = sort_reference(&input);
    assert_eq!(&reference[..2], &[a, b]);

    let partitioned = OrderingConfig::default().sort(&input);
    assert_eq!(packed_multiset(&partitioned[..2]), packed_multiset(&[a, b]));
    assert!(is_non_increasing(&partitioned));
}
