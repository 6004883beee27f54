use crate::encode::FeatureEncoder;
use anyhow::{ensure, Result};
use gradecast_dataframe::DataFrame;
use gradecast_forest as forest;
use itertools::izip;
use std::path::Path;

/// One row of the results table.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Prediction {
	pub id: String,
	pub probability: f32,
	pub label: u8,
}

/// Apply a trained model to the normalized, filtered, feature selected test table. The probability is the forest's averaged leaf value; the label is 1 exactly when the probability exceeds the threshold.
pub fn predict(
	model: &forest::Regressor,
	encoder: &FeatureEncoder,
	dataframe: &DataFrame,
	ids: &[String],
	threshold: f32,
) -> Result<Vec<Prediction>> {
	ensure!(
		ids.len() == dataframe.nrows(),
		"expected one id per test row"
	);
	let features = encoder.transform(dataframe)?;
	let probabilities = model.predict(features.view());
	let predictions = izip!(ids.iter(), probabilities.iter())
		.map(|(id, probability)| Prediction {
			id: id.clone(),
			probability: *probability,
			label: if *probability > threshold { 1 } else { 0 },
		})
		.collect();
	Ok(predictions)
}

pub fn write_predictions(path: &Path, predictions: &[Prediction]) -> Result<()> {
	let mut writer = csv::Writer::from_path(path)?;
	for prediction in predictions.iter() {
		writer.serialize(prediction)?;
	}
	writer.flush()?;
	Ok(())
}

#[cfg(test)]
mod test {
	use super::*;
	use gradecast_dataframe::{Column, NumberColumn};
	use ndarray::prelude::*;

	fn test_model_and_table() -> (forest::Regressor, FeatureEncoder, DataFrame) {
		let features = ndarray::arr2(&[[0.0], [1.0], [2.0], [3.0], [4.0], [5.0]]);
		let labels = ndarray::arr1(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
		let options = forest::TrainOptions {
			n_trees: 10,
			max_features: Some(1),
			min_samples_leaf: 1,
			replace: true,
			sample_fraction: 1.0,
			seed: Some(7),
		};
		let output = forest::Regressor::train(features.view(), labels.view(), &options, &mut |_| {});
		let dataframe = DataFrame {
			columns: vec![Column::Number(NumberColumn {
				name: "inspection_demerits".to_owned(),
				data: vec![0.5, 2.5, 4.5],
			})],
		};
		let encoder = FeatureEncoder::fit(&dataframe, &[0.0, 0.0, 1.0]).unwrap();
		(output.model, encoder, dataframe)
	}

	#[test]
	fn test_predictions_are_deterministic_for_a_fixed_model() {
		let (model, encoder, dataframe) = test_model_and_table();
		let ids = vec!["1001".to_owned(), "1002".to_owned(), "1003".to_owned()];
		let a = predict(&model, &encoder, &dataframe, &ids, 0.5).unwrap();
		let b = predict(&model, &encoder, &dataframe, &ids, 0.5).unwrap();
		for (a, b) in izip!(a.iter(), b.iter()) {
			assert_eq!(a.probability, b.probability);
			assert_eq!(a.label, b.label);
		}
	}

	#[test]
	fn test_label_is_positive_exactly_when_probability_exceeds_the_threshold() {
		let (model, encoder, dataframe) = test_model_and_table();
		let ids = vec!["1001".to_owned(), "1002".to_owned(), "1003".to_owned()];
		for prediction in predict(&model, &encoder, &dataframe, &ids, 0.5).unwrap() {
			assert!(prediction.probability >= 0.0 && prediction.probability <= 1.0);
			assert_eq!(prediction.label == 1, prediction.probability > 0.5);
		}
	}

	#[test]
	fn test_id_count_must_match_row_count() {
		let (model, encoder, dataframe) = test_model_and_table();
		let ids = vec!["1001".to_owned()];
		assert!(predict(&model, &encoder, &dataframe, &ids, 0.5).is_err());
	}
}
