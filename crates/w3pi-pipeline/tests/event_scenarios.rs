//! End-to-end event scenarios through the processor.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use w3pi_bdt::{DecisionTree, FnModel, ScoreModel, TreeEnsemble};
use w3pi_core::{Candidate, Event, FeatureVector, NISO_MAX, NPUPPI_MAX, NTRIPLETS, N_FEATURES};
use w3pi_physics::{IsolationConfig, OrderingConfig, TrigMode, TRIPLETS};
use w3pi_pipeline::{cross_check, EventProcessor, ProcessorConfig, SortMode};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn diagnostic_processor(model: Arc<dyn ScoreModel>) -> EventProcessor {
    let config = ProcessorConfig::builder()
        .isolation(IsolationConfig::default())
        .diagnostics(true)
        .build()
        .expect("valid config");
    EventProcessor::new(config, model).expect("processor")
}

fn small_ensemble() -> Arc<dyn ScoreModel> {
    let model = TreeEnsemble::new(
        0.1,
        1.0,
        vec![
            DecisionTree::stump(6, 150.5, -0.5, 0.5),
            DecisionTree::stump(9, 20_000.0, -0.2, 0.3),
            DecisionTree::stump(3, 0.5, 0.1, -0.1),
        ],
    )
    .expect("valid ensemble");
    Arc::new(model)
}

fn random_event(rng: &mut StdRng) -> Event {
    let n = rng.gen_range(0..=NPUPPI_MAX);
    let cands: Vec<Candidate> = (0..n)
        .map(|_| {
            Candidate::new(
                rng.gen_range(0..400),
                rng.gen_range(-700..=700),
                rng.gen_range(-720..=720),
                rng.gen_range(0..8),
                rng.gen_range(-300..300),
            )
        })
        .collect();
    Event::from_candidates(&cands).expect("within capacity")
}

#[test]
fn three_well_separated_candidates() {
    init_logging();
    let event = Event::from_candidates(&[
        Candidate::new(30, 100, 200, 2, 5),
        Candidate::new(50, -100, -300, 3, -5),
        Candidate::new(10, 400, 600, 3, 0),
    ])
    .unwrap();

    let processor = diagnostic_processor(small_ensemble());
    let outcome = processor.process(&event).unwrap();

    let pts: Vec<u16> = outcome.selected.iter().map(Candidate::hw_pt).collect();
    assert_eq!(pts, vec![50, 30, 10, 0, 0, 0, 0]);

    let features = &outcome.diagnostics.as_ref().unwrap().features;
    let first = &features[0];
    assert_eq!(first[6], 90);
    assert!(first[9] >= 0);
    assert_eq!(first[3], 1);

    // all three are isolated from each other
    let iso = outcome.isolation.as_ref().unwrap();
    assert_eq!(iso.isolated.count, 3);
    assert!(iso.selected_iso[..3].iter().all(|&s| s == 0));
}

#[test]
fn all_filler_event_scores_zero_vector() {
    init_logging();
    let model = small_ensemble();
    let processor = diagnostic_processor(model.clone());
    let outcome = processor.process(&Event::default()).unwrap();

    let zero = [0i64; N_FEATURES];
    assert_eq!(outcome.max_score, model.score(&zero));
    let features = &outcome.diagnostics.as_ref().unwrap().features;
    assert_eq!(features.len(), NTRIPLETS);
    assert!(features.iter().all(|f| f == &zero));
    assert!(outcome.selected.iter().all(Candidate::is_empty));
    assert_eq!(outcome.isolation.as_ref().unwrap().isolated.count, 0);
}

#[test]
fn equal_momenta_order_is_not_asserted() {
    init_logging();
    let a = Candidate::new(60, 10, 10, 2, 0);
    let b = Candidate::new(60, -200, 500, 3, 0);
    let mut cands = vec![Candidate::new(5, 0, 0, 0, 0); 100];
    cands[1] = a;
    cands[90] = b;
    let event = Event::from_candidates(&cands).unwrap();

    let model: Arc<dyn ScoreModel> =
        Arc::new(FnModel::new("pt-sum", |x: &FeatureVector| x[6] as f64));
    let reference = EventProcessor::new(
        ProcessorConfig::builder()
            .sort_mode(SortMode::Reference)
            .build()
            .unwrap(),
        model.clone(),
    )
    .unwrap();
    let outcome = reference.process(&event).unwrap();
    assert_eq!(outcome.selected[0], a);
    assert_eq!(outcome.selected[1], b);

    let partitioned = EventProcessor::new(ProcessorConfig::default(), model).unwrap();
    let outcome = partitioned.process(&event).unwrap();
    let mut top_two = [outcome.selected[0], outcome.selected[1]];
    top_two.sort_by_key(|c| c.hw_eta());
    assert_eq!(top_two, [b, a]);
}

#[test]
fn triplet_order_maps_scores() {
    init_logging();
    let cands: Vec<Candidate> = (0..7)
        .map(|i: u32| {
            let id = 2 + (i % 2) as u8;
            Candidate::new(100 - 10 * i, 60 * i as i32, -50 * i as i32, id, 0)
        })
        .collect();
    let event = Event::from_candidates(&cands).unwrap();

    // pt(i0), pt(i1), pt(i2) packed into decimal digits identify the triplet
    let model: Arc<dyn ScoreModel> = Arc::new(FnModel::new("triplet-id", |x: &FeatureVector| {
        (x[5] * 10_000 + x[1] * 100 + x[0]) as f64
    }));
    let processor = EventProcessor::new(ProcessorConfig::default(), model).unwrap();
    let outcome = processor.process(&event).unwrap();

    for (score, &(i0, i1, i2)) in outcome.scores.iter().zip(TRIPLETS.iter()) {
        let pt = |i: usize| (100 - 10 * i) as f64;
        assert_eq!(*score, pt(i0) * 10_000.0 + pt(i1) * 100.0 + pt(i2));
    }
    assert_eq!(outcome.best_triplet, 0);
}

#[test]
fn random_events_respect_invariants() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let processor = diagnostic_processor(small_ensemble());

    for _ in 0..40 {
        let event = random_event(&mut rng);
        let outcome = processor.process(&event).unwrap();
        let diag = outcome.diagnostics.as_ref().unwrap();

        assert!(diag.sorted.windows(2).all(|w| w[0].hw_pt() >= w[1].hw_pt()));
        assert_eq!(&diag.sorted[..7], &outcome.selected[..]);
        let max = outcome.scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(outcome.max_score, max);

        let iso = outcome.isolation.as_ref().unwrap();
        assert!(iso.isolated.count <= NISO_MAX);
        for (seed, abs_iso) in iso.isolated.isolated() {
            assert!(abs_iso < seed.hw_pt() as u32);
        }

        let report = cross_check(&processor, &event).unwrap();
        assert!(report.same_multiset);
        assert!(report.is_tolerated());
    }
}

#[test]
fn batch_preserves_order_and_matches_serial() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(99);
    let events: Vec<Event> = (0..64).map(|_| random_event(&mut rng)).collect();
    let config = ProcessorConfig::builder()
        .ordering(OrderingConfig::default())
        .trig(TrigMode::Lut)
        .build()
        .unwrap();
    let processor = EventProcessor::new(config, small_ensemble()).unwrap();

    let batch = processor.process_batch(&events);
    assert_eq!(batch.len(), events.len());
    for (event, result) in events.iter().zip(batch) {
        let serial = processor.process(event).unwrap();
        let parallel = result.unwrap();
        assert_eq!(parallel.max_score, serial.max_score);
        assert_eq!(parallel.selected, serial.selected);
        assert_eq!(parallel.scores, serial.scores);
    }
}
