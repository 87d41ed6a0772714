//! # w3pi-core
//!
//! Core types and errors for the W3Pi three-pion trigger.
//!
//! This crate defines the fixed-point abstractions shared by every stage:
//! - **Candidate**: packed particle-flow candidate in hardware units
//! - **Types**: fixed sizes, the per-event container, the rejection mask
//! - **Errors**: unified error handling with `W3piError`
//!
//! ## Architecture
//! ```text
//! ┌─────────────┐
//! │  w3pi-core  │  ← candidate model, sizes, errors
//! └─────────────┘
//!        ▲
//!   ┌────┴──────────┐
//!   │               │
//! ┌─▼───────────┐ ┌─▼────────┐
//! │ w3pi-physics│ │ w3pi-bdt │
//! └─────────────┘ └──────────┘
//!        ▲               ▲
//!        └──────┬────────┘
//!        ┌──────▼────────┐
//!        │ w3pi-pipeline │
//!        └───────────────┘
//! ```

pub mod candidate;
pub mod errors;
pub mod types;

pub use candidate::{
    Candidate, ParticleId, ETAPHI_LSB, INT_2PI, INT_PI, PT_LSB, Z0_LSB,
};
pub use errors::{Result, W3piError};
pub use types::{
    CandidateMask, Event, FeatureVector, Selected, NISO_MAX, NPUPPI_MAX, NPUPPI_SEL,
    NTRIPLETS, N_FEATURES,
};
