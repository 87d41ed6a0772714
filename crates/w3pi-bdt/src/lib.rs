//! # W3Pi BDT
//!
//! Scoring side of the trigger. The processor only needs something that maps
//! an 11-feature vector to a scalar; [`ScoreModel`] is that seam, and
//! [`TreeEnsemble`] is the boosted-tree implementation loaded from a JSON
//! artifact.

use w3pi_core::FeatureVector;

pub mod ensemble;

pub use ensemble::{DecisionTree, TreeEnsemble};

/// Deterministic, side-effect-free scoring of one triplet feature vector.
///
/// Models are loaded once and shared immutably across threads.
pub trait ScoreModel: Send + Sync {
    fn score(&self, features: &FeatureVector) -> f64;

    /// Short label used in logs and telemetry.
    fn name(&self) -> &str {
        "score-model"
    }
}

/// Wraps a closure as a [`ScoreModel`].
pub struct FnModel<F> {
    name: String,
    f: F,
}

impl<F> FnModel<F>
where
    F: Fn(&FeatureVector) -> f64 + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> ScoreModel for FnModel<F>
where
    F: Fn(&FeatureVector) -> f64 + Send + Sync,
{
    fn score(&self, features: &FeatureVector) -> f64 {
        (self.f)(features)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fn_model_as_trait_object() {
        let model: Arc<dyn ScoreModel> =
            Arc::new(FnModel::new("pt-sum", |x: &FeatureVector| x[6] as f64));
        let mut x = [0i64; 11];
        x[6] = 90;
        assert_eq!(model.score(&x), 90.0);
        assert_eq!(model.name(), "pt-sum");
    }
}
