use crate::{
	artifact::ModelArtifact,
	config::{self, Settings},
	encode::FeatureEncoder,
	filter,
	grid::{self, GridValues},
	normalize,
	predict,
	progress::Progress,
	repeat, report,
	report::RunReport,
	select, source,
	train::{self, TrainModelOutput},
};
use anyhow::{ensure, format_err, Context, Result};
use gradecast_dataframe::{DataFrame, FromCsvOptions};
use gradecast_forest as forest;
use itertools::izip;
use ndarray::prelude::*;
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct RunOptions {
	pub train_source: Option<String>,
	pub test_source: Option<String>,
	pub config_path: Option<PathBuf>,
	pub output_dir: Option<PathBuf>,
}

/// Run the whole workflow: load and normalize both tables, train the default model, search the hyperparameter grid, characterize the best configuration with repeated fits, predict on the test table, and write the outputs.
pub fn run(options: RunOptions, update_progress: &mut dyn FnMut(Progress)) -> Result<RunReport> {
	let config = config::load_config(options.config_path.as_deref())?;
	let settings = Settings::from_config(&config);
	let grid_values =
		GridValues::from_config(config.as_ref().and_then(|config| config.grid.as_ref()));
	let train_source = options
		.train_source
		.or_else(|| config.as_ref().and_then(|config| config.train_source.clone()))
		.ok_or_else(|| {
			format_err!("no training data source; pass --file-train or set train_source in the config")
		})?;
	let test_source = options
		.test_source
		.or_else(|| config.as_ref().and_then(|config| config.test_source.clone()))
		.ok_or_else(|| {
			format_err!("no test data source; pass --file-test or set test_source in the config")
		})?;
	let output_dir = options
		.output_dir
		.or_else(|| config.as_ref().and_then(|config| config.output_dir.clone()))
		.unwrap_or_else(|| PathBuf::from("output"));

	// The training table, through normalization, filtering, selection, and encoding.
	let mut dataframe_train = source::load_table(
		&train_source,
		FromCsvOptions {
			column_types: Some(settings.dataframe_column_types()),
			..Default::default()
		},
		update_progress,
		Progress::LoadingTrain,
	)?;
	let n_train_rows_loaded = dataframe_train.nrows();
	update_progress(Progress::Normalizing);
	let normalize_train = normalize::normalize(
		&mut dataframe_train,
		&settings.coordinate_column_name,
		&settings.postal_column_name,
		&settings.timestamp_column_name,
	)?;
	update_progress(Progress::FilteringIncomplete);
	let train_completeness = filter::drop_incomplete_rows(&mut dataframe_train);
	ensure!(
		dataframe_train.nrows() > 0,
		"no training rows survived normalization and filtering"
	);
	let labels = Array1::from(select::extract_target(
		&mut dataframe_train,
		&settings.target_column_name,
	)?);
	select::select_features(&mut dataframe_train, &settings.drop_columns);
	let encoder = FeatureEncoder::fit(&dataframe_train, labels.as_slice().unwrap())?;
	let features = encoder.transform(&dataframe_train)?;
	let n_features = features.ncols();
	ensure!(n_features > 0, "no feature columns remain after selection");

	// The single default run.
	let base_options =
		train::default_train_options(n_features, settings.trees_per_feature, settings.seed);
	let default_output = train::train_model(
		features.view(),
		labels.view(),
		&base_options,
		&mut |forest_progress| match forest_progress {
			forest::TrainProgress::Training(counter) => {
				update_progress(Progress::TrainingDefault(counter))
			}
		},
	)?;

	// The grid search and the repeated fits on its best configuration.
	let grid_output = grid::grid_search(
		features.view(),
		labels.view(),
		&grid_values,
		&base_options,
		default_output.oob_rmse,
		update_progress,
	)?;
	let repeats = repeat::repeated_fit(
		features.view(),
		labels.view(),
		&grid_output.best.item,
		&base_options,
		settings.n_repeats,
		update_progress,
	)?;

	// Retraining the chosen configuration with the fixed seed reproduces the model the grid search scored.
	let final_options = grid_output.best.item.train_options(&base_options);
	let TrainModelOutput {
		model: final_model,
		feature_importances: final_feature_importances,
		..
	} = train::train_model(features.view(), labels.view(), &final_options, &mut |_| {})?;

	// The test table goes through the same pipeline, with the training-fitted encoder.
	let test_table = prepare_test_table(&test_source, &settings, update_progress)?;
	update_progress(Progress::Predicting);
	let predictions = predict::predict(
		&final_model,
		&encoder,
		&test_table.dataframe,
		&test_table.ids,
		settings.threshold,
	)?;

	std::fs::create_dir_all(&output_dir)
		.with_context(|| format!("failed to create {}", output_dir.display()))?;
	predict::write_predictions(&output_dir.join("predictions.csv"), &predictions)?;
	report::write_grid(&output_dir.join("grid.csv"), &grid_output)?;
	report::write_repeats(&output_dir.join("repeats.csv"), &repeats)?;
	let mut feature_importances: Vec<(String, f32)> = izip!(
		encoder.feature_names().into_iter(),
		final_feature_importances.iter()
	)
	.map(|(column_name, importance)| (column_name.to_owned(), *importance))
	.collect();
	feature_importances.sort_by(|a, b| {
		b.1.partial_cmp(&a.1)
			.unwrap()
			.then_with(|| a.0.cmp(&b.0))
	});
	ModelArtifact {
		settings: settings.clone(),
		train_options: final_options,
		encoder,
		model: final_model,
	}
	.to_path(&output_dir.join("model.json"))?;

	Ok(RunReport {
		n_train_rows_loaded,
		n_train_rows_dropped_for_coordinates: normalize_train.n_rows_dropped_for_coordinates,
		train_completeness,
		n_train_rows: labels.len(),
		n_test_rows_loaded: test_table.n_rows_loaded,
		n_test_rows_dropped_for_coordinates: test_table
			.normalize_output
			.n_rows_dropped_for_coordinates,
		test_completeness: test_table.completeness,
		n_features,
		default_oob_rmse: default_output.oob_rmse,
		grid: grid_output,
		repeats,
		feature_importances,
		n_predictions: predictions.len(),
		output_dir,
	})
}

#[derive(Debug)]
pub struct PredictOptions {
	pub model_path: PathBuf,
	pub test_source: String,
	pub output_path: Option<PathBuf>,
}

/// Apply a saved model artifact to a test table and write the predictions. Returns the number of predictions written.
pub fn run_predict(
	options: PredictOptions,
	update_progress: &mut dyn FnMut(Progress),
) -> Result<usize> {
	let artifact = ModelArtifact::from_path(&options.model_path)?;
	let test_table = prepare_test_table(&options.test_source, &artifact.settings, update_progress)?;
	update_progress(Progress::Predicting);
	let predictions = predict::predict(
		&artifact.model,
		&artifact.encoder,
		&test_table.dataframe,
		&test_table.ids,
		artifact.settings.threshold,
	)?;
	let output_path = options
		.output_path
		.unwrap_or_else(|| PathBuf::from("predictions.csv"));
	predict::write_predictions(&output_path, &predictions)?;
	Ok(predictions.len())
}

struct TestTable {
	dataframe: DataFrame,
	ids: Vec<String>,
	normalize_output: normalize::NormalizeOutput,
	completeness: filter::CompletenessReport,
	n_rows_loaded: usize,
}

/// Load the test table and run it through normalization, filtering, and feature selection, reading the identifier column off before the identifiers are dropped from the feature set. The target column is never touched.
fn prepare_test_table(
	source: &str,
	settings: &Settings,
	update_progress: &mut dyn FnMut(Progress),
) -> Result<TestTable> {
	let mut dataframe = source::load_table(
		source,
		FromCsvOptions {
			column_types: Some(settings.dataframe_column_types()),
			..Default::default()
		},
		update_progress,
		Progress::LoadingTest,
	)?;
	let n_rows_loaded = dataframe.nrows();
	update_progress(Progress::Normalizing);
	let normalize_output = normalize::normalize(
		&mut dataframe,
		&settings.coordinate_column_name,
		&settings.postal_column_name,
		&settings.timestamp_column_name,
	)?;
	update_progress(Progress::FilteringIncomplete);
	let completeness = filter::drop_incomplete_rows(&mut dataframe);
	let ids = select::extract_ids(&dataframe, &settings.id_column_name)?;
	select::select_features(&mut dataframe, &settings.drop_columns);
	Ok(TestTable {
		dataframe,
		ids,
		normalize_output,
		completeness,
		n_rows_loaded,
	})
}
