//! Per-event processor.
//!
//! ```text
//! raw ─► filter ─► sort/merge ─► top-K ─► triplet features ─► scores ─► max
//!           │
//!           └─────► seed / isolation (optional)
//! ```
//!
//! The processor holds only read-only state (configuration and a shared model),
//! so one instance can score many events concurrently.

use crate::config::{ProcessorConfig, SortMode};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;
use w3pi_bdt::ScoreModel;
use w3pi_core::{
    Candidate, CandidateMask, Event, FeatureVector, Result, Selected, W3piError, NPUPPI_MAX,
    NPUPPI_SEL, NTRIPLETS,
};
use w3pi_physics::bitonic::{self, Direction};
use w3pi_physics::{
    compute_isolated, event_features, isolation_of_selected, sort_reference, truncate_top_k,
    IsolationOutput, TrigMode,
};

/// Score with a total order, so NaN scores still sort deterministically.
#[derive(Debug, Clone, Copy)]
struct TotalScore(f64);

impl PartialEq for TotalScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TotalScore {}

impl PartialOrd for TotalScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TotalScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Highest of the triplet scores and the triplet it came from.
///
/// The partitioned path runs the scores through the bitonic network; the
/// reference path uses a stable descending sort. The maximum is the same, the
/// reported index may differ when two triplets tie.
pub fn highest_score(scores: &[f64; NTRIPLETS], mode: SortMode) -> (usize, f64) {
    let mut ranked: [(usize, f64); NTRIPLETS] = [(0, 0.0); NTRIPLETS];
    for (i, slot) in ranked.iter_mut().enumerate() {
        *slot = (i, scores[i]);
    }
    match mode {
        SortMode::Partitioned => {
            bitonic::sort_by_key(&mut ranked, Direction::Descending, |&(_, s)| TotalScore(s))
        }
        SortMode::Reference => ranked.sort_by(|a, b| TotalScore(b.1).cmp(&TotalScore(a.1))),
    }
    ranked[0]
}

/// Wall-clock time spent per stage, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StageTimings {
    pub filter_us: f64,
    pub sort_us: f64,
    pub features_us: f64,
    pub score_us: f64,
    pub isolation_us: f64,
}

impl StageTimings {
    pub fn total_us(&self) -> f64 {
        self.filter_us + self.sort_us + self.features_us + self.score_us + self.isolation_us
    }
}

fn elapsed_us(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1e6
}

/// Isolation results for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsolationReport {
    /// Isolated seeds found over the filtered array
    pub isolated: IsolationOutput,
    /// Ring sum of each selected candidate against the raw input
    pub selected_iso: [u32; NPUPPI_SEL],
}

/// Intermediate arrays, kept only when diagnostics are enabled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub masked: CandidateMask,
    pub sorted: Vec<Candidate>,
    pub features: [FeatureVector; NTRIPLETS],
}

/// Result of processing one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventOutcome {
    pub max_score: f64,
    /// Index into the triplet table of the highest score
    pub best_triplet: usize,
    pub scores: [f64; NTRIPLETS],
    pub selected: Selected,
    /// Candidates that passed the selection cuts
    pub n_selected: usize,
    pub isolation: Option<IsolationReport>,
    pub diagnostics: Option<Diagnostics>,
    pub timings: StageTimings,
}

/// Scores events with a fixed configuration and a shared model.
#[derive(Clone)]
pub struct EventProcessor {
    config: ProcessorConfig,
    model: Arc<dyn ScoreModel>,
}

impl std::fmt::Debug for EventProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventProcessor")
            .field("config", &self.config)
            .field("model", &self.model.name())
            .finish()
    }
}

impl EventProcessor {
    pub fn new(config: ProcessorConfig, model: Arc<dyn ScoreModel>) -> Result<Self> {
        config.validate()?;
        log::info!(
            "Event processor ready: {:?} sort ({} × {}), {:?} trig, model '{}', isolation {}",
            config.sort_mode,
            config.ordering.block_count,
            config.ordering.block_size,
            config.trig,
            model.name(),
            if config.enable_isolation { "on" } else { "off" }
        );
        Ok(Self { config, model })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn model(&self) -> &Arc<dyn ScoreModel> {
        &self.model
    }

    /// Process one event with the configured sort and trig modes.
    pub fn process(&self, event: &Event) -> Result<EventOutcome> {
        self.process_with(event, self.config.sort_mode, self.config.trig)
    }

    /// Process one event, overriding the sort and trig modes.
    pub fn process_with(&self, event: &Event, sort_mode: SortMode, trig: TrigMode) -> Result<EventOutcome> {
        let width = self.config.ordering.sort_width();
        if sort_mode == SortMode::Partitioned && event.len() > width {
            return Err(W3piError::capacity(event.len(), width));
        }

        let mut timings = StageTimings::default();

        let start = Instant::now();
        let (masked, slimmed) = self.config.selection.select(event.candidates());
        let n_selected = NPUPPI_MAX - masked.count();
        timings.filter_us = elapsed_us(start);
        log::debug!("filter: {} of {} candidates admitted", n_selected, event.len());

        let start = Instant::now();
        let sorted = match sort_mode {
            SortMode::Partitioned => self.config.ordering.sort(&slimmed),
            SortMode::Reference => sort_reference(&slimmed),
        };
        let selected = truncate_top_k(&sorted);
        timings.sort_us = elapsed_us(start);
        log::debug!(
            "sort: leading momenta {:?}",
            selected.iter().map(Candidate::hw_pt).collect::<Vec<_>>()
        );

        let start = Instant::now();
        let features = event_features(&selected, trig);
        timings.features_us = elapsed_us(start);

        let start = Instant::now();
        let mut scores = [0.0; NTRIPLETS];
        for (score, x) in scores.iter_mut().zip(features.iter()) {
            *score = self.model.score(x);
        }
        let (best_triplet, max_score) = highest_score(&scores, sort_mode);
        timings.score_us = elapsed_us(start);
        log::debug!("score: max {:.5} from triplet {}", max_score, best_triplet);

        let isolation = if self.config.enable_isolation {
            let start = Instant::now();
            let isolated = compute_isolated(&slimmed, &self.config.isolation);
            let selected_iso = isolation_of_selected(
                &selected,
                event.candidates(),
                &self.config.isolation.thresholds(),
            );
            timings.isolation_us = elapsed_us(start);
            log::debug!("isolation: {} isolated seeds", isolated.count);
            Some(IsolationReport {
                isolated,
                selected_iso,
            })
        } else {
            None
        };

        let diagnostics = self.config.collect_diagnostics.then(|| Diagnostics {
            masked,
            sorted: sorted.to_vec(),
            features,
        });

        Ok(EventOutcome {
            max_score,
            best_triplet,
            scores,
            selected,
            n_selected,
            isolation,
            diagnostics,
            timings,
        })
    }

    /// Process independent events in parallel; results keep input order.
    pub fn process_batch(&self, events: &[Event]) -> Vec<Result<EventOutcome>> {
        log::debug!("processing batch of {} events", events.len());
        events.par_iter().map(|event| self.process(event)).collect()
    }
}
