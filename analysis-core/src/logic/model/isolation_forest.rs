//! Isolation Forest
//!
//! Randomised tree ensemble: outliers are isolated by fewer random splits.
//! Training is seeded, so identical inputs always produce identical trees.

use ndarray::{ArrayView1, ArrayView2};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::seq::index;

use crate::logic::error::{AnalysisError, Result};

/// Euler–Mascheroni constant
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone)]
enum IsolationNode {
    Internal {
        feature: usize,
        threshold: f64,
        left: Box<IsolationNode>,
        right: Box<IsolationNode>,
    },
    /// Leaf with the number of training samples that reached it
    Leaf { size: usize },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    root: IsolationNode,
}

impl IsolationTree {
    fn build(data: &ArrayView2<f64>, indices: Vec<usize>, max_depth: usize, rng: &mut StdRng) -> Self {
        Self {
            root: Self::build_node(data, indices, 0, max_depth, rng),
        }
    }

    fn build_node(
        data: &ArrayView2<f64>,
        indices: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> IsolationNode {
        let n_samples = indices.len();
        if depth >= max_depth || n_samples <= 1 {
            return IsolationNode::Leaf { size: n_samples };
        }

        let feature = rng.gen_range(0..data.ncols());
        let (min_val, max_val) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
            let v = data[[i, feature]];
            (lo.min(v), hi.max(v))
        });

        // constant column: nothing to split on
        if !(max_val > min_val) {
            return IsolationNode::Leaf { size: n_samples };
        }

        let threshold = rng.gen_range(min_val..max_val);
        let (left, right): (Vec<usize>, Vec<usize>) =
            indices.into_iter().partition(|&i| data[[i, feature]] < threshold);

        if left.is_empty() || right.is_empty() {
            return IsolationNode::Leaf { size: n_samples };
        }

        IsolationNode::Internal {
            feature,
            threshold,
            left: Box::new(Self::build_node(data, left, depth + 1, max_depth, rng)),
            right: Box::new(Self::build_node(data, right, depth + 1, max_depth, rng)),
        }
    }

    fn path_length(&self, sample: &ArrayView1<f64>) -> f64 {
        let mut node = &self.root;
        let mut depth = 0usize;
        loop {
            match node {
                IsolationNode::Leaf { size } => return depth as f64 + average_path_length(*size),
                IsolationNode::Internal { feature, threshold, left, right } => {
                    node = if sample[*feature] < *threshold { left } else { right };
                    depth += 1;
                }
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` items, c(n)
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Fitted isolation forest
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    /// Subsample size actually used per tree
    sample_size: usize,
}

impl IsolationForest {
    /// Fit `n_estimators` trees, each on `min(max_samples, n)` rows drawn
    /// without replacement. An empty `data` is `EmptyTrainingSet`.
    pub fn fit(data: ArrayView2<f64>, n_estimators: usize, max_samples: usize, seed: u64) -> Result<Self> {
        let n_rows = data.nrows();
        if n_rows == 0 {
            return Err(AnalysisError::EmptyTrainingSet);
        }
        let sample_size = max_samples.clamp(1, n_rows);
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;

        let mut rng = StdRng::seed_from_u64(seed);
        let trees = (0..n_estimators.max(1))
            .map(|_| {
                let indices = index::sample(&mut rng, n_rows, sample_size).into_vec();
                IsolationTree::build(&data, indices, max_depth, &mut rng)
            })
            .collect();

        Ok(Self { trees, sample_size })
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Isolation score `2^(-E[h(x)] / c(ψ))` per row, in (0, 1].
    ///
    /// Higher is more anomalous; 0.5 when a single-sample forest gives no
    /// depth information.
    pub fn score_samples(&self, data: ArrayView2<f64>) -> Vec<f64> {
        let c = average_path_length(self.sample_size);
        data.rows()
            .into_iter()
            .map(|row| {
                if c <= 0.0 {
                    return 0.5;
                }
                let mean_path = self.trees.iter().map(|t| t.path_length(&row)).sum::<f64>()
                    / self.trees.len() as f64;
                2.0_f64.powf(-mean_path / c)
            })
            .collect()
    }
}
