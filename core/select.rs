/*!
This module carves the loaded table into the pieces the trainer needs: it pulls out the target labels, reads the identifier column the predictions are keyed by, and removes the identifier, free text, and superseded columns from the feature set.
*/

use anyhow::{format_err, Result};
use gradecast_dataframe::{Column, DataFrame};

/// Remove the named columns from the feature table. Names not present are ignored, so the same drop list works for the training and test tables.
pub fn select_features(dataframe: &mut DataFrame, drop_columns: &[String]) {
	let drop_columns: Vec<&str> = drop_columns
		.iter()
		.map(|column_name| column_name.as_str())
		.collect();
	dataframe.remove_columns(&drop_columns);
}

/// Remove the target column and return its values as 0/1 floats. The target must be a binary column; it is never part of the feature set.
pub fn extract_target(dataframe: &mut DataFrame, target_column_name: &str) -> Result<Vec<f32>> {
	let column = dataframe.take_column(target_column_name).ok_or_else(|| {
		let column_names = dataframe
			.columns
			.iter()
			.map(|column| column.name().to_owned())
			.collect::<Vec<String>>()
			.join(", ");
		format_err!(
			"did not find target column \"{}\" among columns \"{}\"",
			target_column_name,
			column_names
		)
	})?;
	match &column {
		Column::Enum(column) => column
			.data
			.iter()
			.map(|value| {
				let value = value
					.ok_or_else(|| format_err!("missing value in target column"))?;
				match column.option_name(value) {
					"0" => Ok(0.0),
					"1" => Ok(1.0),
					option => Err(format_err!(
						"target column value \"{}\" is not 0 or 1",
						option
					)),
				}
			})
			.collect(),
		Column::Number(column) => column
			.data
			.iter()
			.map(|value| {
				if *value == 0.0 || *value == 1.0 {
					Ok(*value)
				} else {
					Err(format_err!("target column value {} is not 0 or 1", value))
				}
			})
			.collect(),
		_ => Err(format_err!(
			"target column \"{}\" must be a binary column",
			target_column_name
		)),
	}
}

/// Read the identifier column as strings, without removing it.
pub fn extract_ids(dataframe: &DataFrame, id_column_name: &str) -> Result<Vec<String>> {
	let column = dataframe.column(id_column_name).ok_or_else(|| {
		format_err!("did not find id column \"{}\"", id_column_name)
	})?;
	match column {
		Column::Text(column) => Ok(column.data.clone()),
		Column::Number(column) => Ok(column.data.iter().map(|value| value.to_string()).collect()),
		Column::Enum(column) => Ok(column
			.data
			.iter()
			.map(|value| {
				value
					.map(|value| column.option_name(value).to_owned())
					.unwrap_or_default()
			})
			.collect()),
		Column::Unknown(_) => Err(format_err!(
			"id column \"{}\" has unknown type",
			id_column_name
		)),
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use gradecast_dataframe::{EnumColumn, NumberColumn, TextColumn};

	#[test]
	fn test_extract_target_from_enum() {
		let mut dataframe = DataFrame {
			columns: vec![Column::Enum(EnumColumn::from_values(
				"NEXT_INSPECTION_GRADE_C_OR_BELOW".to_owned(),
				vec![
					Some("0".to_owned()),
					Some("1".to_owned()),
					Some("0".to_owned()),
				],
			))],
		};
		let labels = extract_target(&mut dataframe, "NEXT_INSPECTION_GRADE_C_OR_BELOW").unwrap();
		assert_eq!(labels, vec![0.0, 1.0, 0.0]);
		assert_eq!(dataframe.ncols(), 0);
	}

	#[test]
	fn test_extract_target_rejects_nonbinary() {
		let mut dataframe = DataFrame {
			columns: vec![Column::Number(NumberColumn {
				name: "label".to_owned(),
				data: vec![0.0, 2.0],
			})],
		};
		assert!(extract_target(&mut dataframe, "label").is_err());
	}

	#[test]
	fn test_extract_ids() {
		let dataframe = DataFrame {
			columns: vec![Column::Number(NumberColumn {
				name: "restaurant_serial_number".to_owned(),
				data: vec![1001.0, 1002.0],
			})],
		};
		let ids = extract_ids(&dataframe, "restaurant_serial_number").unwrap();
		assert_eq!(ids, vec!["1001".to_owned(), "1002".to_owned()]);
	}

	#[test]
	fn test_select_features_ignores_missing_names() {
		let mut dataframe = DataFrame {
			columns: vec![Column::Text(TextColumn {
				name: "restaurant_name".to_owned(),
				data: vec!["PHO SO 1".to_owned()],
			})],
		};
		select_features(
			&mut dataframe,
			&["restaurant_name".to_owned(), "not_here".to_owned()],
		);
		assert_eq!(dataframe.ncols(), 0);
	}
}
