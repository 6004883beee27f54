/*!
This module enumerates the hyperparameter grid and runs the search: every combination of the candidate value sets is trained once with the fixed seed, its out-of-bag RMSE is recorded, and the configurations are ranked ascending by error. No pruning, no early termination: the search trains the full Cartesian product.
*/

use crate::{
	progress::Progress,
	train::{train_model, TrainModelOutput},
};
use anyhow::{format_err, Result};
use gradecast_forest as forest;
use itertools::{iproduct, izip};
use ndarray::prelude::*;
use std::cmp::Ordering;

/// One hyperparameter configuration: the four dimensions the search tunes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridItem {
	pub max_features: usize,
	pub min_samples_leaf: usize,
	pub replace: bool,
	pub sample_fraction: f32,
}

impl GridItem {
	/// The learner options for this configuration, with everything the grid does not tune taken from the base options.
	pub fn train_options(&self, base_options: &forest::TrainOptions) -> forest::TrainOptions {
		forest::TrainOptions {
			max_features: Some(self.max_features),
			min_samples_leaf: self.min_samples_leaf,
			replace: self.replace,
			sample_fraction: self.sample_fraction,
			..base_options.clone()
		}
	}
}

/// The candidate value sets, one per hyperparameter dimension.
#[derive(Clone, Debug)]
pub struct GridValues {
	pub max_features: Vec<usize>,
	pub min_samples_leaf: Vec<usize>,
	pub replace: Vec<bool>,
	pub sample_fraction: Vec<f32>,
}

const DEFAULT_MAX_FEATURES_VALUES: [usize; 5] = [2, 4, 6, 8, 10];
const DEFAULT_MIN_SAMPLES_LEAF_VALUES: [usize; 4] = [1, 3, 5, 10];
const DEFAULT_REPLACE_VALUES: [bool; 2] = [true, false];
const DEFAULT_SAMPLE_FRACTION_VALUES: [f32; 3] = [0.5, 0.632, 0.8];

impl Default for GridValues {
	fn default() -> Self {
		Self {
			max_features: DEFAULT_MAX_FEATURES_VALUES.to_vec(),
			min_samples_leaf: DEFAULT_MIN_SAMPLES_LEAF_VALUES.to_vec(),
			replace: DEFAULT_REPLACE_VALUES.to_vec(),
			sample_fraction: DEFAULT_SAMPLE_FRACTION_VALUES.to_vec(),
		}
	}
}

impl GridValues {
	pub fn from_config(config: Option<&crate::config::GridValuesConfig>) -> Self {
		let default = Self::default();
		match config {
			Some(config) => Self {
				max_features: config.max_features.clone().unwrap_or(default.max_features),
				min_samples_leaf: config
					.min_samples_leaf
					.clone()
					.unwrap_or(default.min_samples_leaf),
				replace: config.replace.clone().unwrap_or(default.replace),
				sample_fraction: config
					.sample_fraction
					.clone()
					.unwrap_or(default.sample_fraction),
			},
			None => default,
		}
	}
}

/// Construct the full Cartesian product of the candidate value sets.
pub fn compute_hyperparameter_grid(values: &GridValues) -> Vec<GridItem> {
	iproduct!(
		values.max_features.iter(),
		values.min_samples_leaf.iter(),
		values.replace.iter(),
		values.sample_fraction.iter()
	)
	.map(
		|(&max_features, &min_samples_leaf, &replace, &sample_fraction)| GridItem {
			max_features,
			min_samples_leaf,
			replace,
			sample_fraction,
		},
	)
	.collect()
}

#[derive(Clone, Debug)]
pub struct GridSearchEntry {
	/// The configuration's position in the grid enumeration, which is also the ranking tie break.
	pub grid_index: usize,
	pub item: GridItem,
	pub oob_rmse: f32,
	/// Percentage improvement of this configuration's error over the default run's error.
	pub percent_gain: f32,
}

#[derive(Debug)]
pub struct GridSearchOutput {
	pub best: GridSearchEntry,
	/// The lowest-error configurations, at most `N_RANKED_RETAINED` of them.
	pub ranked: Vec<GridSearchEntry>,
	pub n_configurations: usize,
}

/// How many of the top ranked configurations the search retains for reporting.
pub const N_RANKED_RETAINED: usize = 10;

pub fn grid_search(
	features: ArrayView2<f32>,
	labels: ArrayView1<f32>,
	values: &GridValues,
	base_options: &forest::TrainOptions,
	default_oob_rmse: f32,
	update_progress: &mut dyn FnMut(Progress),
) -> Result<GridSearchOutput> {
	let grid = compute_hyperparameter_grid(values);
	let n_configurations = grid.len();
	let mut oob_rmses = Vec::with_capacity(n_configurations);
	for (index, item) in grid.iter().enumerate() {
		update_progress(Progress::GridSearching {
			current: index + 1,
			total: n_configurations,
		});
		let options = item.train_options(base_options);
		let TrainModelOutput { oob_rmse, .. } =
			train_model(features, labels, &options, &mut |_| {})?;
		oob_rmses.push(oob_rmse);
	}
	let mut ranked = rank_configurations(grid, oob_rmses, default_oob_rmse);
	let best = ranked
		.first()
		.cloned()
		.ok_or_else(|| format_err!("the hyperparameter grid is empty"))?;
	ranked.truncate(N_RANKED_RETAINED);
	Ok(GridSearchOutput {
		best,
		ranked,
		n_configurations,
	})
}

/// Rank the recorded errors ascending. The order is total and reproducible: a NaN error ranks after every finite error, and ties resolve to the earliest enumerated configuration.
pub fn rank_configurations(
	grid: Vec<GridItem>,
	oob_rmses: Vec<f32>,
	default_oob_rmse: f32,
) -> Vec<GridSearchEntry> {
	let mut entries: Vec<GridSearchEntry> = izip!(grid.into_iter(), oob_rmses.into_iter())
		.enumerate()
		.map(|(grid_index, (item, oob_rmse))| GridSearchEntry {
			grid_index,
			item,
			oob_rmse,
			percent_gain: 100.0 * (default_oob_rmse - oob_rmse) / default_oob_rmse,
		})
		.collect();
	entries.sort_by(|a, b| {
		compare_errors(a.oob_rmse, b.oob_rmse).then_with(|| a.grid_index.cmp(&b.grid_index))
	});
	entries
}

fn compare_errors(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(false, false) => a.partial_cmp(&b).unwrap(),
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_grid_cardinality_is_the_product_of_the_value_sets() {
		let grid = compute_hyperparameter_grid(&GridValues::default());
		assert_eq!(grid.len(), 5 * 4 * 2 * 3);
		// Every combination is distinct.
		for (index, item) in grid.iter().enumerate() {
			assert!(grid[index + 1..].iter().all(|other| other != item));
		}
	}

	fn test_grid(n: usize) -> Vec<GridItem> {
		(0..n)
			.map(|index| GridItem {
				max_features: index + 1,
				min_samples_leaf: 1,
				replace: true,
				sample_fraction: 0.8,
			})
			.collect()
	}

	#[test]
	fn test_ranking_is_ascending_and_stable() {
		let oob_rmses = vec![0.3, 0.1, 0.2, 0.1];
		let ranked = rank_configurations(test_grid(4), oob_rmses.clone(), 0.2);
		let order: Vec<usize> = ranked.iter().map(|entry| entry.grid_index).collect();
		// The tied error at indexes 1 and 3 resolves to the earlier configuration.
		assert_eq!(order, vec![1, 3, 2, 0]);
		assert!((ranked[0].percent_gain - 50.0).abs() < 1e-5);
		// Re-ranking the same inputs yields the same order.
		let ranked_again = rank_configurations(test_grid(4), oob_rmses, 0.2);
		let order_again: Vec<usize> =
			ranked_again.iter().map(|entry| entry.grid_index).collect();
		assert_eq!(order, order_again);
	}

	#[test]
	fn test_nan_errors_rank_last() {
		let ranked = rank_configurations(test_grid(3), vec![std::f32::NAN, 0.2, 0.1], 0.2);
		let order: Vec<usize> = ranked.iter().map(|entry| entry.grid_index).collect();
		assert_eq!(order, vec![2, 1, 0]);
	}
}
