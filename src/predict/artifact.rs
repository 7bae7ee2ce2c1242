//! Versioned model file
//!
//! The trained forest is stored as JSON together with the ordered feature
//! names it was trained on. Loading checks the format version and resolves
//! every feature name back to a stat, so a model written by an incompatible
//! build is rejected instead of being fed misaligned vectors.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::RandomForest;
use crate::{BattleError, Result, Stat};

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// Feature names in the order used to build training vectors
    pub features: Vec<String>,
    pub forest: RandomForest,
    pub trained_at: DateTime<Utc>,
    pub training_samples: usize,
    pub skipped_combats: usize,
    #[serde(default)]
    pub oob_accuracy: Option<f64>,
}

impl ModelArtifact {
    pub fn new(
        order: &[Stat],
        forest: RandomForest,
        training_samples: usize,
        skipped_combats: usize,
        oob_accuracy: Option<f64>,
    ) -> Self {
        ModelArtifact {
            format_version: FORMAT_VERSION,
            features: order.iter().map(|s| s.name().to_string()).collect(),
            forest,
            trained_at: Utc::now(),
            training_samples,
            skipped_combats,
            oob_accuracy,
        }
    }

    /// Feature order as stats; fails on names this build does not know
    pub fn feature_order(&self) -> Result<Vec<Stat>> {
        self.features
            .iter()
            .map(|name| {
                Stat::from_name(name).ok_or_else(|| BattleError::UnknownFeature(name.clone()))
            })
            .collect()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        log::info!("Model written to {}", path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BattleError::NoModel {
                path: path.display().to_string(),
            });
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct Header {
            format_version: u32,
        }

        let header: Header = serde_json::from_str(json)?;
        if header.format_version != FORMAT_VERSION {
            return Err(BattleError::ArtifactVersion {
                found: header.format_version,
                expected: FORMAT_VERSION,
            });
        }

        let artifact: ModelArtifact = serde_json::from_str(json)?;
        let order = artifact.feature_order()?;
        if order.len() != artifact.forest.n_features() {
            return Err(BattleError::FeatureCount {
                expected: artifact.forest.n_features(),
                found: order.len(),
            });
        }
        if !artifact.forest.is_well_formed() {
            return Err(BattleError::MalformedModel(
                "a tree references a missing node or feature".to_string(),
            ));
        }
        Ok(artifact)
    }
}
