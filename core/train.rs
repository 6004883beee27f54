use anyhow::{format_err, Result};
use gradecast_forest as forest;
use ndarray::prelude::*;

/// The minimum node size of the single default run, matching the learner's regression default.
pub const DEFAULT_MIN_SAMPLES_LEAF: usize = 5;

#[derive(Debug)]
pub struct TrainModelOutput {
	pub model: forest::Regressor,
	pub oob_rmse: f32,
	pub feature_importances: Vec<f32>,
}

/// The options of the single default run: bootstrap resampling of the whole table, one third of the features per split, and a tree count scaled to the feature count.
pub fn default_train_options(
	n_features: usize,
	trees_per_feature: usize,
	seed: u64,
) -> forest::TrainOptions {
	forest::TrainOptions {
		n_trees: trees_per_feature * n_features,
		max_features: None,
		min_samples_leaf: DEFAULT_MIN_SAMPLES_LEAF,
		replace: true,
		sample_fraction: 1.0,
		seed: Some(seed),
	}
}

/// Train one model and require its out-of-bag error, which is what every later stage compares on.
pub fn train_model(
	features: ArrayView2<f32>,
	labels: ArrayView1<f32>,
	options: &forest::TrainOptions,
	update_progress: &mut dyn FnMut(forest::TrainProgress),
) -> Result<TrainModelOutput> {
	let output = forest::Regressor::train(features, labels, options, update_progress);
	let oob_rmse = output.oob_rmse.ok_or_else(|| {
		format_err!(
			"no training example was out of bag; use replace: true or a sample fraction below 1"
		)
	})?;
	Ok(TrainModelOutput {
		model: output.model,
		oob_rmse,
		feature_importances: output.feature_importances,
	})
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_default_options_scale_trees_with_features() {
		let options = default_train_options(19, 10, 42);
		assert_eq!(options.n_trees, 190);
		assert_eq!(options.max_features, None);
		assert_eq!(options.seed, Some(42));
	}
}
