//! CART decision tree for binary labels
//!
//! Splits minimise weighted Gini impurity. Each node looks at a random subset
//! of features; a feature that is constant on the node does not count towards
//! the subset, so a node only becomes a leaf early when every feature is
//! constant on it.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tree growth limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Features examined per split
    pub max_features: usize,
    /// Nodes with fewer samples become leaves
    pub min_samples_split: usize,
    pub max_depth: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams {
            max_features: usize::MAX,
            min_samples_split: 2,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        /// Fraction of label 1 among the node's samples
        value: f64,
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct Pending {
    node: usize,
    samples: Vec<usize>,
    depth: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    /// Grow a tree on the rows of `x` named by `samples`.
    ///
    /// `samples` may repeat indices (bootstrap draws); repeats act as weights.
    /// Rows must all have the same length and labels must be 0 or 1; the
    /// forest checks both before calling in.
    pub fn fit<R: Rng + ?Sized>(
        x: &[Vec<f64>],
        y: &[u8],
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let n_features = x.first().map_or(0, |row| row.len());
        let mut features: Vec<usize> = (0..n_features).collect();
        let mut nodes = vec![Node::Leaf {
            value: 0.0,
            samples: 0,
        }];
        let mut stack = vec![Pending {
            node: 0,
            samples,
            depth: 0,
        }];

        while let Some(Pending {
            node,
            samples,
            depth,
        }) = stack.pop()
        {
            let positives = samples.iter().filter(|&&i| y[i] == 1).count();
            let total = samples.len();
            let leaf = Node::Leaf {
                value: if total == 0 {
                    0.0
                } else {
                    positives as f64 / total as f64
                },
                samples: total,
            };

            let pure = positives == 0 || positives == total;
            let too_small = total < params.min_samples_split;
            let too_deep = params.max_depth.is_some_and(|d| depth >= d);
            if pure || too_small || too_deep {
                nodes[node] = leaf;
                continue;
            }

            features.shuffle(rng);
            let Some(best) = best_split(x, y, &samples, &features, params.max_features) else {
                nodes[node] = leaf;
                continue;
            };
            log::trace!(
                "node {} depth {}: split on feature {} at {} (impurity {:.4})",
                node,
                depth,
                best.feature,
                best.threshold,
                best.impurity
            );

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                .into_iter()
                .partition(|&i| x[i][best.feature] <= best.threshold);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf {
                value: 0.0,
                samples: 0,
            });
            nodes.push(Node::Leaf {
                value: 0.0,
                samples: 0,
            });
            nodes[node] = Node::Split {
                feature: best.feature,
                threshold: best.threshold,
                left,
                right,
            };

            stack.push(Pending {
                node: right,
                samples: right_samples,
                depth: depth + 1,
            });
            stack.push(Pending {
                node: left,
                samples: left_samples,
                depth: depth + 1,
            });
        }

        DecisionTree { nodes }
    }

    /// Probability of label 1 for one row
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value, .. } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Length of the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            match &self.nodes[idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(depth),
                Node::Split { left, right, .. } => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
            }
        }
        max_depth
    }

    /// Structural check for trees read back from disk
    pub fn is_well_formed(&self, n_features: usize) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        self.nodes.iter().enumerate().all(|(i, n)| match n {
            Node::Leaf { value, .. } => (0.0..=1.0).contains(value),
            Node::Split {
                feature,
                left,
                right,
                threshold,
            } => {
                *feature < n_features
                    && threshold.is_finite()
                    && *left > i
                    && *right > i
                    && *left < self.nodes.len()
                    && *right < self.nodes.len()
            }
        })
    }
}

/// Weighted Gini impurity `n * gini` of a node with `positives` of `total`
fn weighted_gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    let p = positives as f64;
    let q = n - p;
    n - (p * p + q * q) / n
}

fn best_split(
    x: &[Vec<f64>],
    y: &[u8],
    samples: &[usize],
    features: &[usize],
    max_features: usize,
) -> Option<BestSplit> {
    let total = samples.len();
    let total_pos = samples.iter().filter(|&&i| y[i] == 1).count();
    let mut best: Option<BestSplit> = None;
    let mut examined = 0;
    let mut column: Vec<(f64, u8)> = Vec::with_capacity(total);

    for &feature in features {
        if examined >= max_features {
            break;
        }

        column.clear();
        column.extend(samples.iter().map(|&i| (x[i][feature], y[i])));
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        if column[0].0 == column[total - 1].0 {
            continue;
        }
        examined += 1;

        let mut left_pos = 0;
        for i in 0..total - 1 {
            left_pos += column[i].1 as usize;
            let (lo, hi) = (column[i].0, column[i + 1].0);
            if lo == hi {
                continue;
            }
            let left_n = i + 1;
            let impurity = weighted_gini(left_pos, left_n)
                + weighted_gini(total_pos - left_pos, total - left_n);

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(BestSplit {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
    }

    best
}
