use crate::{
	feature_importances::compute_feature_importances,
	tree::{train_tree, TrainTreeOptions, Tree},
	TrainOptions, TrainProgress,
};
use gradecast_metrics::{MeanSquaredError, StreamingMetric};
use gradecast_progress::ProgressCounter;
use itertools::izip;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;

/// A trained random forest. A prediction is the mean of the per-tree predictions, which for 0/1 labels is a probability score in [0, 1].
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Regressor {
	pub trees: Vec<Tree>,
	pub n_features: usize,
}

/// The output of `Regressor::train`.
#[derive(Debug)]
pub struct TrainOutput {
	pub model: Regressor,
	/// The root mean squared error of the out-of-bag predictions, or `None` if no training example was ever out of bag.
	pub oob_rmse: Option<f32>,
	pub feature_importances: Vec<f32>,
}

impl Regressor {
	pub fn train(
		features: ArrayView2<f32>,
		labels: ArrayView1<f32>,
		options: &TrainOptions,
		update_progress: &mut dyn FnMut(TrainProgress),
	) -> TrainOutput {
		let n_rows = features.nrows();
		let n_features = features.ncols();
		assert!(n_rows > 0 && n_features > 0 && options.n_trees > 0);
		let max_features = options
			.max_features
			.unwrap_or(n_features / 3)
			.max(1)
			.min(n_features);
		let n_sample = (options.sample_fraction * n_rows.to_f32().unwrap())
			.round()
			.to_usize()
			.unwrap()
			.max(1);
		let n_sample = if options.replace {
			n_sample
		} else {
			n_sample.min(n_rows)
		};
		let base_seed = options.seed.unwrap_or_else(|| rand::thread_rng().gen());
		let progress_counter = ProgressCounter::new(options.n_trees.to_u64().unwrap());
		update_progress(TrainProgress::Training(progress_counter.clone()));
		let train_tree_options = TrainTreeOptions {
			max_features,
			min_samples_leaf: options.min_samples_leaf.max(1),
		};
		// Each tree derives its own random stream from the base seed, so the result does not depend on how rayon schedules the trees.
		let results: Vec<(Tree, Vec<(usize, f32)>)> = (0..options.n_trees)
			.into_par_iter()
			.map(|tree_index| {
				let mut rng =
					Xoshiro256Plus::seed_from_u64(base_seed.wrapping_add(tree_index.to_u64().unwrap()));
				let (mut in_bag, out_of_bag) =
					sample_rows(n_rows, n_sample, options.replace, &mut rng);
				let tree = train_tree(
					features,
					labels,
					&mut in_bag,
					&train_tree_options,
					&mut rng,
				);
				let oob_predictions = out_of_bag
					.into_iter()
					.map(|row| (row, tree.predict_row(features.row(row))))
					.collect();
				progress_counter.inc(1);
				(tree, oob_predictions)
			})
			.collect();
		// Aggregate the out-of-bag predictions in tree order.
		let mut oob_sums = vec![0.0f64; n_rows];
		let mut oob_counts = vec![0u32; n_rows];
		for (_, oob_predictions) in results.iter() {
			for (row, prediction) in oob_predictions.iter() {
				oob_sums[*row] += *prediction as f64;
				oob_counts[*row] += 1;
			}
		}
		let mut mean_squared_error = MeanSquaredError::default();
		for (sum, count, label) in izip!(oob_sums.iter(), oob_counts.iter(), labels.iter()) {
			if *count > 0 {
				let oob_prediction = (sum / *count as f64) as f32;
				mean_squared_error.update((oob_prediction, *label));
			}
		}
		let oob_rmse = mean_squared_error.finalize().map(|mse| mse.sqrt());
		let trees: Vec<Tree> = results.into_iter().map(|(tree, _)| tree).collect();
		let feature_importances = compute_feature_importances(&trees, n_features);
		TrainOutput {
			model: Regressor { trees, n_features },
			oob_rmse,
			feature_importances,
		}
	}

	pub fn predict(&self, features: ArrayView2<f32>) -> Array1<f32> {
		let mut predictions = Array1::zeros(features.nrows());
		for (row, prediction) in izip!(features.genrows(), predictions.iter_mut()) {
			let sum: f32 = self.trees.iter().map(|tree| tree.predict_row(row)).sum();
			*prediction = sum / self.trees.len().to_f32().unwrap();
		}
		predictions
	}
}

/// Draw each tree's resample: `n_sample` rows with or without replacement. The second return value holds the rows that were never drawn, which are that tree's out-of-bag set.
fn sample_rows(
	n_rows: usize,
	n_sample: usize,
	replace: bool,
	rng: &mut Xoshiro256Plus,
) -> (Vec<usize>, Vec<usize>) {
	let mut in_bag_mask = vec![false; n_rows];
	let in_bag: Vec<usize> = if replace {
		(0..n_sample)
			.map(|_| {
				let row = rng.gen_range(0, n_rows);
				in_bag_mask[row] = true;
				row
			})
			.collect()
	} else {
		let in_bag = rand::seq::index::sample(rng, n_rows, n_sample).into_vec();
		for row in in_bag.iter() {
			in_bag_mask[*row] = true;
		}
		in_bag
	};
	let out_of_bag = in_bag_mask
		.iter()
		.enumerate()
		.filter(|(_, in_bag)| !**in_bag)
		.map(|(row, _)| row)
		.collect();
	(in_bag, out_of_bag)
}

#[cfg(test)]
mod test {
	use super::*;

	fn synthetic_features_labels(n_rows: usize) -> (Array2<f32>, Array1<f32>) {
		// A deterministic grid over two features; the label depends only on the first.
		let features = Array2::from_shape_fn((n_rows, 2), |(row, column)| {
			if column == 0 {
				row.to_f32().unwrap() / n_rows.to_f32().unwrap()
			} else {
				(row % 7).to_f32().unwrap()
			}
		});
		let labels = Array1::from_shape_fn(n_rows, |row| {
			if row.to_f32().unwrap() / n_rows.to_f32().unwrap() > 0.5 {
				1.0
			} else {
				0.0
			}
		});
		(features, labels)
	}

	fn test_options() -> TrainOptions {
		TrainOptions {
			n_trees: 20,
			max_features: Some(2),
			min_samples_leaf: 2,
			replace: true,
			sample_fraction: 1.0,
			seed: Some(42),
		}
	}

	#[test]
	fn test_train_is_deterministic_with_seed() {
		let (features, labels) = synthetic_features_labels(100);
		let options = test_options();
		let output_a = Regressor::train(features.view(), labels.view(), &options, &mut |_| {});
		let output_b = Regressor::train(features.view(), labels.view(), &options, &mut |_| {});
		assert_eq!(output_a.oob_rmse, output_b.oob_rmse);
		let predictions_a = output_a.model.predict(features.view());
		let predictions_b = output_b.model.predict(features.view());
		assert_eq!(predictions_a, predictions_b);
	}

	#[test]
	fn test_learns_the_threshold_function() {
		let (features, labels) = synthetic_features_labels(200);
		let output = Regressor::train(features.view(), labels.view(), &test_options(), &mut |_| {});
		let predictions = output.model.predict(features.view());
		let mut mean_squared_error = MeanSquaredError::default();
		for (prediction, label) in izip!(predictions.iter(), labels.iter()) {
			assert!(*prediction >= 0.0 && *prediction <= 1.0);
			mean_squared_error.update((*prediction, *label));
		}
		assert!(mean_squared_error.finalize().unwrap() < 0.05);
	}

	#[test]
	fn test_oob_rmse_present_when_bootstrapping() {
		let (features, labels) = synthetic_features_labels(100);
		let output = Regressor::train(features.view(), labels.view(), &test_options(), &mut |_| {});
		let oob_rmse = output.oob_rmse.unwrap();
		assert!(oob_rmse.is_finite() && oob_rmse < 0.5);
	}

	#[test]
	fn test_no_oob_rows_without_resampling() {
		let (features, labels) = synthetic_features_labels(50);
		let options = TrainOptions {
			replace: false,
			sample_fraction: 1.0,
			..test_options()
		};
		let output = Regressor::train(features.view(), labels.view(), &options, &mut |_| {});
		assert_eq!(output.oob_rmse, None);
	}

	#[test]
	fn test_feature_importances_find_the_signal() {
		let (features, labels) = synthetic_features_labels(200);
		let output = Regressor::train(features.view(), labels.view(), &test_options(), &mut |_| {});
		let total: f32 = output.feature_importances.iter().sum();
		assert!((total - 1.0).abs() < 1e-5);
		assert!(output.feature_importances[0] > output.feature_importances[1]);
	}
}
