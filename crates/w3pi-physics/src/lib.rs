//! # W3Pi Physics
//!
//! Fixed-point stages of the three-pion trigger, leaves first:
//!
//! - [`filter`]: admission cuts, rejected slots demoted to fillers
//! - [`bitonic`]: data-independent comparator network for any length
//! - [`ordering`]: partitioned sort + pairwise merge, reference sort, top-K
//! - [`kinematics`] / [`trig_lut`]: ΔR², pair mass, cos/cosh tables
//! - [`isolation`]: seed loop with cone masking and ring sums
//! - [`triplets`]: the fixed triplet table and 11-feature vectors
//!
//! Every function here is a pure transform of per-event arrays.

pub mod bitonic;
pub mod filter;
pub mod isolation;
pub mod kinematics;
pub mod ordering;
pub mod trig_lut;
pub mod triplets;

pub use bitonic::Direction;
pub use filter::{SelectionCuts, ETA_CUT};
pub use isolation::{
    compute_isolated, find_seed, isolation_of, isolation_of_selected, IsolationConfig,
    IsolationCut, IsolationOutput, IsolationThresholds, MaskPolicy,
};
pub use kinematics::{delta_r2, dr_to_hw_dr2, pair_mass, wrap_delta_phi};
pub use ordering::{has_ambiguous_ties, sort_reference, truncate_top_k, OrderingConfig};
pub use trig_lut::{TrigMode, COSCOSH_LSB};
pub use triplets::{event_features, triplet_features, FEATURE_NAMES, TRIPLETS};
