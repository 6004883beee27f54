/*!
This module characterizes the variance of the selected configuration: it retrains the same configuration many times without a seed and collects the resulting out-of-bag errors. The sample quantifies the spread attributable to the learner's internal randomness; it is a report, not a tuning step.
*/

use crate::{grid::GridItem, progress::Progress, train::train_model};
use anyhow::{format_err, Result};
use gradecast_forest as forest;
use gradecast_metrics::{MeanVariance, StreamingMetric};
use ndarray::prelude::*;

#[derive(Debug)]
pub struct RepeatedFitOutput {
	/// One out-of-bag RMSE per unseeded refit, in fit order, ready to render as a histogram.
	pub oob_rmses: Vec<f32>,
	pub mean: f32,
	pub std: f32,
	pub min: f32,
	pub max: f32,
}

pub fn repeated_fit(
	features: ArrayView2<f32>,
	labels: ArrayView1<f32>,
	item: &GridItem,
	base_options: &forest::TrainOptions,
	n_repeats: usize,
	update_progress: &mut dyn FnMut(Progress),
) -> Result<RepeatedFitOutput> {
	let options = forest::TrainOptions {
		// No seed: each fit samples the learner's natural variance.
		seed: None,
		..item.train_options(base_options)
	};
	let mut oob_rmses = Vec::with_capacity(n_repeats);
	for index in 0..n_repeats {
		update_progress(Progress::RepeatedFitting {
			current: index + 1,
			total: n_repeats,
		});
		let output = train_model(features, labels, &options, &mut |_| {})?;
		oob_rmses.push(output.oob_rmse);
	}
	let mut mean_variance = MeanVariance::default();
	let mut min = std::f32::INFINITY;
	let mut max = std::f32::NEG_INFINITY;
	for oob_rmse in oob_rmses.iter() {
		mean_variance.update(*oob_rmse);
		min = min.min(*oob_rmse);
		max = max.max(*oob_rmse);
	}
	let (mean, variance) = mean_variance
		.finalize()
		.ok_or_else(|| format_err!("n_repeats must be at least 1"))?;
	Ok(RepeatedFitOutput {
		oob_rmses,
		mean,
		std: variance.sqrt(),
		min,
		max,
	})
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_repeated_fit_collects_one_error_per_fit() {
		let features = Array2::from_shape_fn((60, 2), |(row, column)| {
			(row * (column + 1) % 13) as f32
		});
		let labels = Array1::from_shape_fn(60, |row| if row % 13 > 6 { 1.0 } else { 0.0 });
		let item = GridItem {
			max_features: 1,
			min_samples_leaf: 2,
			replace: true,
			sample_fraction: 0.8,
		};
		let base_options = forest::TrainOptions {
			n_trees: 10,
			..Default::default()
		};
		let output = repeated_fit(
			features.view(),
			labels.view(),
			&item,
			&base_options,
			5,
			&mut |_| {},
		)
		.unwrap();
		assert_eq!(output.oob_rmses.len(), 5);
		assert!(output.min <= output.mean && output.mean <= output.max);
		assert!(output.std >= 0.0);
	}
}
