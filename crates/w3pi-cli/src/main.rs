//! W3Pi trigger CLI entry point.
//!
//! Reads a raw event dump, scores each event with a tree-ensemble model and
//! prints the best triplet score per event.

mod dump;

use anyhow::{Context, Result};
use clap::Parser;
use dump::{DumpReader, RawEvent};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use w3pi_bdt::TreeEnsemble;
use w3pi_core::{Event, W3piError};
use w3pi_pipeline::{
    cross_check, EventOutcome, EventProcessor, EventTelemetry, ProcessorConfig, TelemetryWriter,
};

/// W3Pi version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "w3pi")]
#[command(version = VERSION)]
#[command(about = "W3Pi L1 trigger: scores three-pion candidate triplets in raw event dumps", long_about = None)]
struct Args {
    /// Raw event dump (64-bit header + candidate words per event)
    #[arg(short, long)]
    input: PathBuf,

    /// Tree-ensemble model (JSON)
    #[arg(short, long)]
    model: PathBuf,

    /// Processor configuration (TOML); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many events have been read
    #[arg(long)]
    max_events: Option<usize>,

    /// Events with fewer candidates are skipped
    #[arg(long, default_value = "3")]
    min_candidates: usize,

    /// Events scored in parallel per batch
    #[arg(long, default_value = "256")]
    batch_size: usize,

    /// Write one JSON telemetry record per event to this file
    #[arg(long)]
    telemetry: Option<PathBuf>,

    /// Compare every event against the whole-array reference
    #[arg(long)]
    cross_check: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default)]
struct RunSummary {
    read: usize,
    skipped: usize,
    processed: usize,
    failed: usize,
    score_sum: f64,
    best: Option<(usize, f64)>,
    order_mismatches: usize,
    untolerated: usize,
    max_abs_delta: f64,
}

impl RunSummary {
    fn record(&mut self, index: usize, outcome: &EventOutcome) {
        self.processed += 1;
        self.score_sum += outcome.max_score;
        if self.best.map_or(true, |(_, s)| outcome.max_score > s) {
            self.best = Some((index, outcome.max_score));
        }
    }

    fn print(&self) {
        println!("----------------------------------------");
        println!("events read:      {}", self.read);
        println!("skipped:          {}", self.skipped);
        println!("processed:        {}", self.processed);
        println!("failed:           {}", self.failed);
        if self.processed > 0 {
            println!(
                "mean max score:   {:.6}",
                self.score_sum / self.processed as f64
            );
        }
        if let Some((index, score)) = self.best {
            println!("best event:       #{} (score {:.6})", index, score);
        }
        if self.order_mismatches > 0 || self.untolerated > 0 || self.max_abs_delta > 0.0 {
            println!(
                "cross-check:      {} order mismatches ({} without ties), max |delta| {:.6}",
                self.order_mismatches, self.untolerated, self.max_abs_delta
            );
        }
    }
}

struct Runner {
    processor: EventProcessor,
    telemetry: Option<TelemetryWriter>,
    cross_check: bool,
    summary: RunSummary,
}

impl Runner {
    fn flush_batch(&mut self, batch: &mut Vec<(RawEvent, Event)>) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let events: Vec<Event> = batch.iter().map(|(_, event)| event.clone()).collect();
        let results = self.processor.process_batch(&events);

        for ((raw, event), result) in batch.drain(..).zip(results) {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::error!("event {}: {}", raw.index, e.user_message());
                    self.summary.failed += 1;
                    continue;
                }
            };

            println!(
                "event {:>6}  bx {:>4}  n {:>3}  sel {:>3}  triplet {}  score {:+.6}",
                raw.index,
                raw.header.bunch_crossing,
                event.len(),
                outcome.n_selected,
                outcome.best_triplet,
                outcome.max_score
            );
            self.summary.record(raw.index, &outcome);

            let mut record = EventTelemetry::new(raw.index, event.len(), &outcome);
            if self.cross_check {
                let report = cross_check(&self.processor, &event)
                    .with_context(|| format!("cross-check of event {}", raw.index))?;
                if !report.sorted_identical {
                    self.summary.order_mismatches += 1;
                }
                if !report.is_tolerated() {
                    self.summary.untolerated += 1;
                }
                let delta = report.score_delta.abs();
                self.summary.max_abs_delta = self.summary.max_abs_delta.max(delta);
                record = record.with_cross_check(&report);
            }
            if let Some(writer) = self.telemetry.as_mut() {
                writer.write(&record)?;
            }
        }
        Ok(())
    }
}

/// Library error with its actionable guidance attached.
fn guidance(err: W3piError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    log::info!("W3Pi {} - Starting", VERSION);

    if args.batch_size == 0 {
        anyhow::bail!("--batch-size must be > 0");
    }

    let config = match &args.config {
        Some(path) => ProcessorConfig::from_file(path)
            .map_err(guidance)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ProcessorConfig::default(),
    };
    let model = TreeEnsemble::from_file(&args.model)
        .map_err(guidance)
        .with_context(|| format!("loading model {}", args.model.display()))?;
    let processor = EventProcessor::new(config, Arc::new(model)).map_err(guidance)?;

    let telemetry = match &args.telemetry {
        Some(path) => Some(
            TelemetryWriter::create(path)
                .with_context(|| format!("creating telemetry file {}", path.display()))?,
        ),
        None => None,
    };

    let file = File::open(&args.input)
        .with_context(|| format!("opening dump {}", args.input.display()))?;
    let reader = DumpReader::new(BufReader::new(file));

    let mut runner = Runner {
        processor,
        telemetry,
        cross_check: args.cross_check,
        summary: RunSummary::default(),
    };
    let mut batch = Vec::with_capacity(args.batch_size);

    for raw in reader {
        if args.max_events.is_some_and(|max| runner.summary.read >= max) {
            break;
        }
        let raw = raw.with_context(|| format!("reading {}", args.input.display()))?;
        runner.summary.read += 1;

        if raw.header.count < args.min_candidates {
            log::debug!(
                "event {}: {} candidates, below minimum {}, skipped",
                raw.index,
                raw.header.count,
                args.min_candidates
            );
            runner.summary.skipped += 1;
            continue;
        }

        let event = raw.to_event()?;
        batch.push((raw, event));
        if batch.len() >= args.batch_size {
            runner.flush_batch(&mut batch)?;
        }
    }
    runner.flush_batch(&mut batch)?;

    if let Some(writer) = runner.telemetry.as_mut() {
        writer.flush()?;
        log::info!(
            "Wrote {} telemetry records to {}",
            writer.records(),
            writer.path().display()
        );
    }

    runner.summary.print();
    Ok(())
}
