//! # W3Pi Pipeline
//!
//! Ties the physics stages and the score model into one per-event transform.
//!
//! - [`config`]: `ProcessorConfig` (TOML), sort mode, builder
//! - [`processor`]: `EventProcessor`, score reduction, batch execution
//! - [`validation`]: comparison against the whole-array reference
//! - [`telemetry`]: JSONL event records

pub mod config;
pub mod processor;
pub mod telemetry;
pub mod validation;

pub use config::{ProcessorConfig, ProcessorConfigBuilder, SortMode};
pub use processor::{
    highest_score, Diagnostics, EventOutcome, EventProcessor, IsolationReport, StageTimings,
};
pub use telemetry::{EventTelemetry, TelemetryWriter};
pub use validation::{cross_check, CrossCheckReport};
