//! Per-event telemetry written as JSON lines.

use crate::processor::EventOutcome;
use crate::validation::CrossCheckReport;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use w3pi_core::Result;

/// One telemetry record per processed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTelemetry {
    /// RFC 3339 timestamp
    pub timestamp: String,

    /// Position of the event in the input stream
    pub event_index: usize,

    /// Valid candidates in the input
    pub n_candidates: usize,

    /// Candidates admitted by the selection cuts
    pub n_selected: usize,

    /// Isolated seeds (absent when isolation is off)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_isolated: Option<usize>,

    pub best_triplet: usize,
    pub max_score: f64,

    /// Per-stage wall-clock time (µs)
    pub filter_us: f64,
    pub sort_us: f64,
    pub features_us: f64,
    pub score_us: f64,
    pub isolation_us: f64,

    /// Reference comparison, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_delta: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_matches_reference: Option<bool>,
}

impl EventTelemetry {
    pub fn new(event_index: usize, n_candidates: usize, outcome: &EventOutcome) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event_index,
            n_candidates,
            n_selected: outcome.n_selected,
            n_isolated: outcome.isolation.as_ref().map(|iso| iso.isolated.count),
            best_triplet: outcome.best_triplet,
            max_score: outcome.max_score,
            filter_us: outcome.timings.filter_us,
            sort_us: outcome.timings.sort_us,
            features_us: outcome.timings.features_us,
            score_us: outcome.timings.score_us,
            isolation_us: outcome.timings.isolation_us,
            score_delta: None,
            order_matches_reference: None,
        }
    }

    /// Attaches a reference cross-check to this record.
    pub fn with_cross_check(mut self, report: &CrossCheckReport) -> Self {
        self.score_delta = Some(report.score_delta);
        self.order_matches_reference = Some(report.sorted_identical);
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Buffered JSONL sink, appending to an existing file.
pub struct TelemetryWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    records: usize,
}

impl TelemetryWriter {
    /// Opens `path` for appending, creating parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        log::info!("Telemetry writer created: {}", path.display());
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            records: 0,
        })
    }

    pub fn write(&mut self, record: &EventTelemetry) -> Result<()> {
        let json = record.to_json()?;
        writeln!(self.writer, "{}", json)?;
        self.records += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TelemetryWriter {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            log::warn!("Failed to flush telemetry {}: {}", self.path.display(), e);
        }
    }
}
