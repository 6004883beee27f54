/*!
This module turns the feature selected table into the `f32` matrix the forest trains on.

Number columns pass through untouched. Enum columns use an ordering aware encoding: the options are sorted by the frequency of the positive outcome class among the training rows holding each option, and a value is encoded as its option's rank. Splitting on the rank is then equivalent to splitting the options into a low-frequency and a high-frequency group, which is what makes this encoding work with a tree learner where one-hot encoding would not. The encoder is fitted on the training table only and reused as-is for the test table.
*/

use anyhow::{format_err, Result};
use gradecast_dataframe::{Column, DataFrame};
use itertools::izip;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use std::collections::BTreeMap;

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct FeatureEncoder {
	pub columns: Vec<ColumnEncoder>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub enum ColumnEncoder {
	/// A number column passes through untouched.
	Identity { column_name: String },
	/// An enum column encodes each option as its rank in the positive-class frequency ordering. Ranks start at 1; an option never seen in training encodes as 0, below every known rank.
	TargetOrderedEnum {
		column_name: String,
		ranks: BTreeMap<String, f32>,
	},
}

impl ColumnEncoder {
	pub fn column_name(&self) -> &str {
		match self {
			ColumnEncoder::Identity { column_name } => column_name,
			ColumnEncoder::TargetOrderedEnum { column_name, .. } => column_name,
		}
	}
}

impl FeatureEncoder {
	/// Fit one encoder per column of the feature selected training table.
	pub fn fit(dataframe: &DataFrame, labels: &[f32]) -> Result<Self> {
		let columns = dataframe
			.columns
			.iter()
			.map(|column| match column {
				Column::Number(column) => Ok(ColumnEncoder::Identity {
					column_name: column.name.clone(),
				}),
				Column::Enum(column) => {
					let mut positive_counts = vec![0u64; column.options.len()];
					let mut counts = vec![0u64; column.options.len()];
					for (value, label) in izip!(column.data.iter(), labels.iter()) {
						if let Some(value) = value {
							let index = value.get() - 1;
							counts[index] += 1;
							if *label == 1.0 {
								positive_counts[index] += 1;
							}
						}
					}
					let positive_frequency = |index: usize| {
						if counts[index] == 0 {
							-1.0
						} else {
							positive_counts[index].to_f64().unwrap()
								/ counts[index].to_f64().unwrap()
						}
					};
					let mut order: Vec<usize> = (0..column.options.len()).collect();
					// Ties in frequency resolve by option name so the ordering is reproducible.
					order.sort_by(|a, b| {
						positive_frequency(*a)
							.partial_cmp(&positive_frequency(*b))
							.unwrap()
							.then_with(|| column.options[*a].cmp(&column.options[*b]))
					});
					let ranks = order
						.into_iter()
						.enumerate()
						.map(|(rank, index)| {
							(
								column.options[index].clone(),
								(rank + 1).to_f32().unwrap(),
							)
						})
						.collect();
					Ok(ColumnEncoder::TargetOrderedEnum {
						column_name: column.name.clone(),
						ranks,
					})
				}
				Column::Text(column) => Err(format_err!(
					"column \"{}\" is free text and must be removed before encoding",
					column.name
				)),
				Column::Unknown(column) => Err(format_err!(
					"could not determine a type for column \"{}\"",
					column.name
				)),
			})
			.collect::<Result<Vec<ColumnEncoder>>>()?;
		Ok(Self { columns })
	}

	/// Compute the feature matrix for a table. The table must hold every fitted column; extra columns are ignored.
	pub fn transform(&self, dataframe: &DataFrame) -> Result<Array2<f32>> {
		let mut features = Array2::zeros((dataframe.nrows(), self.columns.len()));
		for (encoder, mut feature_column) in
			izip!(self.columns.iter(), features.gencolumns_mut())
		{
			let column = dataframe.column(encoder.column_name()).ok_or_else(|| {
				format_err!(
					"did not find column \"{}\" in the table being encoded",
					encoder.column_name()
				)
			})?;
			match encoder {
				ColumnEncoder::Identity { column_name } => {
					let column = column.as_number().ok_or_else(|| {
						format_err!("expected column \"{}\" to be a number column", column_name)
					})?;
					for (feature, value) in izip!(feature_column.iter_mut(), column.data.iter()) {
						*feature = *value;
					}
				}
				ColumnEncoder::TargetOrderedEnum { column_name, ranks } => {
					let column = column.as_enum().ok_or_else(|| {
						format_err!("expected column \"{}\" to be an enum column", column_name)
					})?;
					for (feature, value) in izip!(feature_column.iter_mut(), column.data.iter()) {
						*feature = value
							.and_then(|value| ranks.get(column.option_name(value)).copied())
							.unwrap_or(0.0);
					}
				}
			}
		}
		Ok(features)
	}

	pub fn feature_names(&self) -> Vec<&str> {
		self.columns
			.iter()
			.map(|encoder| encoder.column_name())
			.collect()
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use gradecast_dataframe::{EnumColumn, NumberColumn};

	fn test_dataframe() -> DataFrame {
		DataFrame {
			columns: vec![
				Column::Number(NumberColumn {
					name: "inspection_demerits".to_owned(),
					data: vec![10.0, 3.0, 8.0, 5.0],
				}),
				Column::Enum(EnumColumn::from_values(
					"inspection_type".to_owned(),
					vec![
						Some("Routine".to_owned()),
						Some("Routine".to_owned()),
						Some("Re-inspection".to_owned()),
						Some("Re-inspection".to_owned()),
					],
				)),
			],
		}
	}

	#[test]
	fn test_enum_options_order_by_positive_frequency() {
		let dataframe = test_dataframe();
		// "Routine" rows are 50% positive, "Re-inspection" rows 100%.
		let labels = vec![1.0, 0.0, 1.0, 1.0];
		let encoder = FeatureEncoder::fit(&dataframe, &labels).unwrap();
		match &encoder.columns[1] {
			ColumnEncoder::TargetOrderedEnum { ranks, .. } => {
				assert_eq!(ranks.get("Routine"), Some(&1.0));
				assert_eq!(ranks.get("Re-inspection"), Some(&2.0));
			}
			_ => panic!("expected a target ordered enum encoder"),
		}
		let features = encoder.transform(&dataframe).unwrap();
		assert_eq!(
			features.column(1).to_vec(),
			vec![1.0, 1.0, 2.0, 2.0]
		);
		assert_eq!(
			features.column(0).to_vec(),
			vec![10.0, 3.0, 8.0, 5.0]
		);
	}

	#[test]
	fn test_unseen_option_encodes_below_every_rank() {
		let dataframe = test_dataframe();
		let labels = vec![1.0, 0.0, 1.0, 1.0];
		let encoder = FeatureEncoder::fit(&dataframe, &labels).unwrap();
		let test_dataframe = DataFrame {
			columns: vec![
				Column::Number(NumberColumn {
					name: "inspection_demerits".to_owned(),
					data: vec![4.0],
				}),
				Column::Enum(EnumColumn::from_values(
					"inspection_type".to_owned(),
					vec![Some("Complaint".to_owned())],
				)),
			],
		};
		let features = encoder.transform(&test_dataframe).unwrap();
		assert_eq!(features[(0, 1)], 0.0);
	}

	#[test]
	fn test_free_text_columns_are_rejected() {
		let dataframe = DataFrame {
			columns: vec![Column::Text(gradecast_dataframe::TextColumn {
				name: "restaurant_name".to_owned(),
				data: vec!["PHO SO 1".to_owned()],
			})],
		};
		assert!(FeatureEncoder::fit(&dataframe, &[0.0]).is_err());
	}
}
