//! Random forest classifier
//!
//! Bagged CART trees over a random feature subset per split. Trees are fitted
//! on the rayon pool; every tree draws from its own ChaCha stream seeded from
//! a master generator, so the fitted forest depends only on the data and the
//! seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TreeParams};
use crate::{BattleError, ForestConfig, Result};

/// Forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub seed: u64,
    pub min_samples_split: usize,
    pub max_depth: Option<usize>,
    /// Features examined per split; `sqrt(n_features)` when unset
    pub max_features: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams::from(&ForestConfig::default())
    }
}

impl From<&ForestConfig> for ForestParams {
    fn from(config: &ForestConfig) -> Self {
        ForestParams {
            n_trees: config.n_trees,
            seed: config.seed,
            min_samples_split: config.min_samples_split,
            max_depth: config.max_depth,
            max_features: None,
        }
    }
}

impl ForestParams {
    fn tree_params(&self, n_features: usize) -> TreeParams {
        let sqrt = (n_features as f64).sqrt().floor() as usize;
        TreeParams {
            max_features: self.max_features.unwrap_or(sqrt).clamp(1, n_features.max(1)),
            min_samples_split: self.min_samples_split.max(2),
            max_depth: self.max_depth,
        }
    }
}

/// Diagnostics from a fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitReport {
    /// Accuracy on out-of-bag votes, if any sample was out-of-bag
    pub oob_accuracy: Option<f64>,
    /// Samples that had at least one out-of-bag tree
    pub oob_samples: usize,
    pub mean_depth: f64,
}

/// A fitted random forest for binary labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit on rows `x` with labels `y` (0 or 1)
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: ForestParams) -> Result<(Self, FitReport)> {
        validate(x, y, &params)?;

        let n = x.len();
        let n_features = x[0].len();
        let tree_params = params.tree_params(n_features);

        let mut master = ChaCha8Rng::seed_from_u64(params.seed);
        let seeds: Vec<u64> = (0..params.n_trees).map(|_| master.gen()).collect();

        log::info!(
            "Fitting {} trees on {} samples ({} features, {} per split)",
            params.n_trees,
            n,
            n_features,
            tree_params.max_features
        );

        let fitted: Vec<(DecisionTree, Vec<bool>)> = seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let mut in_bag = vec![false; n];
                let samples: Vec<usize> = (0..n)
                    .map(|_| {
                        let i = rng.gen_range(0..n);
                        in_bag[i] = true;
                        i
                    })
                    .collect();
                let tree = DecisionTree::fit(x, y, samples, &tree_params, &mut rng);
                (tree, in_bag)
            })
            .collect();

        let (trees, bags): (Vec<DecisionTree>, Vec<Vec<bool>>) = fitted.into_iter().unzip();
        let forest = RandomForest {
            params,
            n_features,
            trees,
        };

        let report = forest.report(x, y, &bags);
        log::debug!(
            "Forest fitted: mean depth {:.1}, {} samples out-of-bag",
            report.mean_depth,
            report.oob_samples
        );

        Ok((forest, report))
    }

    fn report(&self, x: &[Vec<f64>], y: &[u8], bags: &[Vec<bool>]) -> FitReport {
        let (correct, scored) = (0..x.len())
            .into_par_iter()
            .map(|i| {
                let (sum, votes) = self
                    .trees
                    .iter()
                    .zip(bags)
                    .filter(|(_, bag)| !bag[i])
                    .fold((0.0, 0usize), |(s, v), (tree, _)| {
                        (s + tree.predict_proba(&x[i]), v + 1)
                    });
                if votes == 0 {
                    return (0usize, 0usize);
                }
                let label = u8::from(sum / votes as f64 > 0.5);
                (usize::from(label == y[i]), 1)
            })
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

        let mean_depth = self.trees.iter().map(|t| t.depth() as f64).sum::<f64>()
            / self.trees.len() as f64;

        FitReport {
            oob_accuracy: (scored > 0).then(|| correct as f64 / scored as f64),
            oob_samples: scored,
            mean_depth,
        }
    }

    /// Mean of the trees' probability of label 1
    pub fn predict_proba(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(BattleError::FeatureCount {
                expected: self.n_features,
                found: row.len(),
            });
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    /// Label 1 when the mean probability is above one half
    pub fn predict(&self, row: &[f64]) -> Result<u8> {
        Ok(u8::from(self.predict_proba(row)? > 0.5))
    }

    /// Fraction of rows predicted correctly
    pub fn accuracy(&self, x: &[Vec<f64>], y: &[u8]) -> Result<f64> {
        if x.is_empty() {
            return Ok(0.0);
        }
        let mut correct = 0;
        for (row, &label) in x.iter().zip(y) {
            if self.predict(row)? == label {
                correct += 1;
            }
        }
        Ok(correct as f64 / x.len() as f64)
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Structural check for forests read back from disk
    pub fn is_well_formed(&self) -> bool {
        !self.trees.is_empty() && self.trees.iter().all(|t| t.is_well_formed(self.n_features))
    }
}

fn validate(x: &[Vec<f64>], y: &[u8], params: &ForestParams) -> Result<()> {
    if x.is_empty() {
        return Err(BattleError::InvalidTrainingData(
            "cannot fit on an empty feature matrix".to_string(),
        ));
    }
    if x.len() != y.len() {
        return Err(BattleError::InvalidTrainingData(format!(
            "{} rows but {} labels",
            x.len(),
            y.len()
        )));
    }
    let width = x[0].len();
    if width == 0 || x.iter().any(|row| row.len() != width) {
        return Err(BattleError::InvalidTrainingData(
            "rows must share a non-zero feature count".to_string(),
        ));
    }
    if x.iter().flatten().any(|v| !v.is_finite()) {
        return Err(BattleError::InvalidTrainingData(
            "features must be finite".to_string(),
        ));
    }
    if y.iter().any(|&l| l > 1) {
        return Err(BattleError::InvalidTrainingData(
            "labels must be 0 or 1".to_string(),
        ));
    }
    if params.n_trees == 0 {
        return Err(BattleError::InvalidTrainingData(
            "forest needs at least one tree".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(n_trees: usize, seed: u64) -> ForestParams {
        ForestParams {
            n_trees,
            seed,
            ..ForestParams::default()
        }
    }

    /// Label 1 when the sum of the row is positive
    fn linear_data() -> (Vec<Vec<f64>>, Vec<u8>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for a in -5..=5 {
            for b in -5..=5 {
                if a + b == 0 {
                    continue;
                }
                x.push(vec![a as f64 * 10.0, b as f64 * 10.0, (a - b) as f64]);
                y.push(u8::from(a + b > 0));
            }
        }
        (x, y)
    }

    #[test]
    fn test_default_params_match_config() {
        let p = ForestParams::default();
        assert_eq!(p.n_trees, 200);
        assert_eq!(p.seed, 42);
        assert_eq!(p.tree_params(6).max_features, 2);
        assert_eq!(p.tree_params(1).max_features, 1);
    }

    #[test]
    fn test_fit_learns_separable_data() {
        let (x, y) = linear_data();
        let (forest, report) = RandomForest::fit(&x, &y, params(25, 42)).unwrap();

        assert_eq!(forest.n_trees(), 25);
        assert_eq!(forest.n_features(), 3);
        assert!(forest.accuracy(&x, &y).unwrap() > 0.95);
        assert!(report.oob_samples > 0);
        assert!(report.oob_accuracy.unwrap() > 0.7);
        assert!(forest.is_well_formed());

        assert_eq!(forest.predict(&[50.0, 50.0, 0.0]).unwrap(), 1);
        assert_eq!(forest.predict(&[-50.0, -50.0, 0.0]).unwrap(), 0);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = linear_data();
        let (a, _) = RandomForest::fit(&x, &y, params(10, 7)).unwrap();
        let (b, _) = RandomForest::fit(&x, &y, params(10, 7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = RandomForest::fit(&[], &[], params(5, 1)).unwrap_err();
        assert!(matches!(err, BattleError::InvalidTrainingData(_)));
    }

    #[test]
    fn test_shape_checks() {
        let x = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(RandomForest::fit(&x, &[0, 1], params(5, 1)).is_err());

        let x = vec![vec![1.0], vec![2.0]];
        assert!(RandomForest::fit(&x, &[0], params(5, 1)).is_err());
        assert!(RandomForest::fit(&x, &[0, 2], params(5, 1)).is_err());
        assert!(RandomForest::fit(&x, &[0, 1], params(0, 1)).is_err());

        let (forest, _) = RandomForest::fit(&x, &[0, 1], params(5, 1)).unwrap();
        assert!(forest.predict(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_single_sample_predicts_its_label() {
        let x = vec![vec![-30.0; 6]];
        let (forest, report) = RandomForest::fit(&x, &[0], params(10, 42)).unwrap();
        assert_eq!(forest.predict(&[-30.0; 6]).unwrap(), 0);
        // the only sample is drawn by every bootstrap
        assert_eq!(report.oob_accuracy, None);
    }

    #[test]
    fn test_serde_round_trip_predicts_identically() {
        let (x, y) = linear_data();
        let (forest, _) = RandomForest::fit(&x, &y, params(5, 3)).unwrap();
        let json = serde_json::to_string(&forest).unwrap();
        let restored: RandomForest = serde_json::from_str(&json).unwrap();
        for row in &x {
            let a = forest.predict_proba(row).unwrap();
            let b = restored.predict_proba(row).unwrap();
            assert!((a - b).abs() < 1e-12);
        }
    }
}
