/*!
This module assembles the run report. Each drop category is reported as its own count: rows removed for an unparseable coordinate are not conflated with rows removed for incompleteness.
*/

use crate::{filter::CompletenessReport, grid::GridSearchOutput, repeat::RepeatedFitOutput};
use anyhow::Result;
use num_traits::ToPrimitive;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct RunReport {
	pub n_train_rows_loaded: usize,
	pub n_train_rows_dropped_for_coordinates: usize,
	pub train_completeness: CompletenessReport,
	pub n_train_rows: usize,
	pub n_test_rows_loaded: usize,
	pub n_test_rows_dropped_for_coordinates: usize,
	pub test_completeness: CompletenessReport,
	pub n_features: usize,
	pub default_oob_rmse: f32,
	pub grid: GridSearchOutput,
	pub repeats: RepeatedFitOutput,
	/// Feature importances of the chosen model, sorted descending.
	pub feature_importances: Vec<(String, f32)>,
	pub n_predictions: usize,
	pub output_dir: PathBuf,
}

fn percent(count: usize, total: usize) -> f32 {
	if total == 0 {
		0.0
	} else {
		100.0 * count.to_f32().unwrap() / total.to_f32().unwrap()
	}
}

impl std::fmt::Display for RunReport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		writeln!(f, "training rows loaded: {}", self.n_train_rows_loaded)?;
		writeln!(
			f,
			"  dropped for unparseable coordinates: {} ({:.2}%)",
			self.n_train_rows_dropped_for_coordinates,
			percent(
				self.n_train_rows_dropped_for_coordinates,
				self.n_train_rows_loaded
			),
		)?;
		writeln!(
			f,
			"  dropped for incompleteness: {} ({:.2}%)",
			self.train_completeness.n_rows_dropped,
			self.train_completeness.percent_dropped(),
		)?;
		writeln!(f, "  rows used for training: {}", self.n_train_rows)?;
		writeln!(f, "test rows loaded: {}", self.n_test_rows_loaded)?;
		writeln!(
			f,
			"  dropped for unparseable coordinates: {} ({:.2}%)",
			self.n_test_rows_dropped_for_coordinates,
			percent(
				self.n_test_rows_dropped_for_coordinates,
				self.n_test_rows_loaded
			),
		)?;
		writeln!(
			f,
			"  dropped for incompleteness: {} ({:.2}%)",
			self.test_completeness.n_rows_dropped,
			self.test_completeness.percent_dropped(),
		)?;
		writeln!(f, "features: {}", self.n_features)?;
		writeln!(f, "default out-of-bag rmse: {:.6}", self.default_oob_rmse)?;
		writeln!(
			f,
			"grid search: {} configurations, top {}:",
			self.grid.n_configurations,
			self.grid.ranked.len(),
		)?;
		writeln!(
			f,
			"  {:<6} {:<14} {:<18} {:<9} {:<17} {:<12} {}",
			"rank", "max_features", "min_samples_leaf", "replace", "sample_fraction", "oob_rmse", "gain"
		)?;
		for (rank, entry) in self.grid.ranked.iter().enumerate() {
			writeln!(
				f,
				"  {:<6} {:<14} {:<18} {:<9} {:<17} {:<12.6} {:+.2}%",
				rank + 1,
				entry.item.max_features,
				entry.item.min_samples_leaf,
				entry.item.replace,
				entry.item.sample_fraction,
				entry.oob_rmse,
				entry.percent_gain,
			)?;
		}
		writeln!(
			f,
			"repeated fits: {} runs, oob rmse mean {:.6}, std {:.6}, min {:.6}, max {:.6}",
			self.repeats.oob_rmses.len(),
			self.repeats.mean,
			self.repeats.std,
			self.repeats.min,
			self.repeats.max,
		)?;
		writeln!(f, "feature importances:")?;
		for (column_name, importance) in self.feature_importances.iter().take(10) {
			writeln!(f, "  {:<24} {:.4}", column_name, importance)?;
		}
		writeln!(
			f,
			"wrote {} predictions to {}",
			self.n_predictions,
			self.output_dir.join("predictions.csv").display(),
		)?;
		Ok(())
	}
}

pub fn write_grid(path: &Path, output: &GridSearchOutput) -> Result<()> {
	let mut writer = csv::Writer::from_path(path)?;
	writer.write_record(&[
		"rank",
		"max_features",
		"min_samples_leaf",
		"replace",
		"sample_fraction",
		"oob_rmse",
		"percent_gain",
	])?;
	for (rank, entry) in output.ranked.iter().enumerate() {
		writer.write_record(&[
			(rank + 1).to_string(),
			entry.item.max_features.to_string(),
			entry.item.min_samples_leaf.to_string(),
			entry.item.replace.to_string(),
			entry.item.sample_fraction.to_string(),
			entry.oob_rmse.to_string(),
			entry.percent_gain.to_string(),
		])?;
	}
	writer.flush()?;
	Ok(())
}

pub fn write_repeats(path: &Path, output: &RepeatedFitOutput) -> Result<()> {
	let mut writer = csv::Writer::from_path(path)?;
	writer.write_record(&["oob_rmse"])?;
	for oob_rmse in output.oob_rmses.iter() {
		writer.write_record(&[oob_rmse.to_string()])?;
	}
	writer.flush()?;
	Ok(())
}
