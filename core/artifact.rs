use crate::{config::Settings, encode::FeatureEncoder};
use anyhow::{Context, Result};
use gradecast_forest as forest;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Everything needed to apply a trained model to a fresh test table: the resolved settings that drive the test pipeline, the learner options the model was trained with, the fitted encoder, and the forest itself.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ModelArtifact {
	pub settings: Settings,
	pub train_options: forest::TrainOptions,
	pub encoder: FeatureEncoder,
	pub model: forest::Regressor,
}

impl ModelArtifact {
	pub fn to_path(&self, path: &Path) -> Result<()> {
		let file = File::create(path)
			.with_context(|| format!("failed to create {}", path.display()))?;
		serde_json::to_writer(BufWriter::new(file), self)
			.with_context(|| format!("failed to write model to {}", path.display()))?;
		Ok(())
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file =
			File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
		serde_json::from_reader(BufReader::new(file))
			.with_context(|| format!("failed to parse model from {}", path.display()))
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use ndarray::prelude::*;

	#[test]
	fn test_artifact_round_trips_through_json() {
		let features = ndarray::arr2(&[[0.0, 1.0], [1.0, 0.0], [2.0, 1.0], [3.0, 0.0]]);
		let labels = ndarray::arr1(&[0.0, 0.0, 1.0, 1.0]);
		let train_options = forest::TrainOptions {
			n_trees: 5,
			seed: Some(1),
			..Default::default()
		};
		let output =
			forest::Regressor::train(features.view(), labels.view(), &train_options, &mut |_| {});
		let artifact = ModelArtifact {
			settings: crate::config::Settings::from_config(&None),
			train_options,
			encoder: FeatureEncoder { columns: vec![] },
			model: output.model,
		};
		let json = serde_json::to_vec(&artifact).unwrap();
		let restored: ModelArtifact = serde_json::from_slice(&json).unwrap();
		assert_eq!(restored.model.trees.len(), artifact.model.trees.len());
		let a = artifact.model.predict(features.view());
		let b = restored.model.predict(features.view());
		assert_eq!(a, b);
	}
}
