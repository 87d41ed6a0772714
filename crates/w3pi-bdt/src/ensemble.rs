//! Boosted decision-tree ensemble.
//!
//! The JSON layout is the one written by the conifer converter:
//!
//! ```json
//! {
//!   "n_features": 11,
//!   "n_classes": 2,
//!   "init_predict": [0.0],
//!   "norm": 1.0,
//!   "trees": [[{"feature": [6, -2, -2], "threshold": [100.5, -2, -2],
//!               "value": [0, -0.3, 0.4],
//!               "children_left": [1, -1, -1], "children_right": [2, -1, -1]}]]
//! }
//! ```
//!
//! `trees` holds one entry per boosting round, each a list with a single tree
//! for binary models. Node 0 is the root, a node with `children_left == -1` is a
//! leaf, and traversal goes left when `x[feature] <= threshold`.
//!
//! score = init_predict[0] + norm · Σ leaf values.

use crate::ScoreModel;
use serde::{Deserialize, Serialize};
use std::path::Path;
use w3pi_core::{FeatureVector, Result, W3piError, N_FEATURES};

const LEAF: i32 = -1;

/// One tree stored as parallel node arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub feature: Vec<i32>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
    pub children_left: Vec<i32>,
    pub children_right: Vec<i32>,
}

impl DecisionTree {
    /// Single-leaf tree.
    pub fn leaf(value: f64) -> Self {
        Self {
            feature: vec![-2],
            threshold: vec![-2.0],
            value: vec![value],
            children_left: vec![LEAF],
            children_right: vec![LEAF],
        }
    }

    /// Depth-one tree splitting on `feature`.
    pub fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Self {
        Self {
            feature: vec![feature as i32, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![0.0, left, right],
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.value.len()
    }

    /// Structural checks: equal array lengths, in-range features, children that
    /// point forward (which rules out cycles) and stay inside the tree.
    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        let n = self.n_nodes();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if [
            self.feature.len(),
            self.threshold.len(),
            self.children_left.len(),
            self.children_right.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err(format!("node arrays differ in length (expected {})", n));
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF {
                if right != LEAF {
                    return Err(format!("node {} has a right child but no left child", node));
                }
                continue;
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(format!("node {} splits on feature {}", node, feature));
            }
            for child in [left, right] {
                if child <= node as i32 || child as usize >= n {
                    return Err(format!("node {} has dangling child {}", node, child));
                }
            }
        }
        Ok(())
    }

    /// Leaf value reached by `x`.
    pub fn evaluate(&self, x: &FeatureVector) -> f64 {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if x[feature] as f64 <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        self.value[node]
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct EnsembleDocument {
    n_features: usize,
    #[serde(default = "default_classes")]
    n_classes: usize,
    init_predict: Vec<f64>,
    #[serde(default = "default_norm")]
    norm: f64,
    trees: Vec<Vec<DecisionTree>>,
}

fn default_classes() -> usize {
    2
}

fn default_norm() -> f64 {
    1.0
}

/// Validated single-output tree ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    init_predict: f64,
    norm: f64,
    trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    /// Build from trees directly.
    pub fn new(init_predict: f64, norm: f64, trees: Vec<DecisionTree>) -> Result<Self> {
        for (i, tree) in trees.iter().enumerate() {
            tree.validate(N_FEATURES)
                .map_err(|e| W3piError::model(format!("tree {}: {}", i, e)))?;
        }
        if !init_predict.is_finite() || !norm.is_finite() {
            return Err(W3piError::model("init_predict and norm must be finite"));
        }
        Ok(Self {
            init_predict,
            norm,
            trees,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: EnsembleDocument = serde_json::from_str(json)?;

        if doc.n_features != N_FEATURES {
            return Err(W3piError::model(format!(
                "model expects {} features, the trigger provides {}",
                doc.n_features, N_FEATURES
            )));
        }
        if doc.n_classes > 2 || doc.init_predict.len() != 1 {
            return Err(W3piError::model(format!(
                "multi-class layout ({} classes, {} initial predictions) is not supported",
                doc.n_classes,
                doc.init_predict.len()
            )));
        }

        let mut trees = Vec::with_capacity(doc.trees.len());
        for (round, mut per_class) in doc.trees.into_iter().enumerate() {
            if per_class.len() != 1 {
                return Err(W3piError::model(format!(
                    "boosting round {} holds {} trees, expected 1",
                    round,
                    per_class.len()
                )));
            }
            trees.extend(per_class.pop());
        }

        Self::new(doc.init_predict[0], doc.norm, trees)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let ensemble = Self::from_json_str(&json)?;
        log::info!(
            "Loaded tree ensemble from {} ({} trees, {} nodes)",
            path.display(),
            ensemble.n_trees(),
            ensemble.trees.iter().map(DecisionTree::n_nodes).sum::<usize>()
        );
        Ok(ensemble)
    }

    /// Serialise back to the JSON layout accepted by [`TreeEnsemble::from_json_str`].
    pub fn to_json_string(&self) -> Result<String> {
        let doc = EnsembleDocument {
            n_features: N_FEATURES,
            n_classes: 2,
            init_predict: vec![self.init_predict],
            norm: self.norm,
            trees: self.trees.iter().map(|t| vec![t.clone()]).collect(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Sum of leaf values in tree order, scaled and offset.
    pub fn decision_function(&self, x: &FeatureVector) -> f64 {
        let sum: f64 = self.trees.iter().map(|tree| tree.evaluate(x)).sum();
        self.init_predict + self.norm * sum
    }
}

impl ScoreModel for TreeEnsemble {
    fn score(&self, features: &FeatureVector) -> f64 {
        self.decision_function(features)
    }

    fn name(&self) -> &str {
        "tree-ensemble"
    }
}
