/*!
This crate implements the tree ensemble learner behind the inspection workflow: a random forest of regression trees trained on bootstrap resamples of the feature matrix. Because the outcome labels are 0/1, the forest's averaged leaf values are probability scores, and the out-of-bag error it reports is the RMSE the grid search ranks configurations by.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod feature_importances;
mod regressor;
mod tree;

pub use self::regressor::{Regressor, TrainOutput};
pub use self::tree::{BranchNode, LeafNode, Node, Tree};

/// These are the options passed to `Regressor::train`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrainOptions {
	/// The number of trees to train.
	pub n_trees: usize,
	/// The count of candidate features considered at each split point. If `None`, one third of the feature count is used.
	pub max_features: Option<usize>,
	/// A split will only be considered valid if the number of training examples sent to each of the resulting children is at least this value.
	pub min_samples_leaf: usize,
	/// If true, each tree's resample is drawn with replacement, otherwise without.
	pub replace: bool,
	/// The fraction of the training examples each tree's resample draws.
	pub sample_fraction: f32,
	/// The seed used to derive each tree's random stream. If `None`, a seed is drawn from the thread rng, so repeated calls sample the learner's natural variance.
	pub seed: Option<u64>,
}

impl Default for TrainOptions {
	fn default() -> Self {
		Self {
			n_trees: 100,
			max_features: None,
			min_samples_leaf: 5,
			replace: true,
			sample_fraction: 1.0,
			seed: None,
		}
	}
}

/// This enum reports the training progress.
#[derive(Debug)]
pub enum TrainProgress {
	Training(gradecast_progress::ProgressCounter),
}
