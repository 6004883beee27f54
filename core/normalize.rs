/*!
This module derives the structured fields the model consumes from the raw composite columns: latitude and longitude from the coordinate string, the 5 character postal prefix, and the calendar fields from the inspection timestamp. It also drops the rows whose coordinate could not be parsed.
*/

use anyhow::{format_err, Result};
use chrono::NaiveDateTime;
use gradecast_dataframe::{Column, DataFrame, EnumColumn, NumberColumn, TextColumn};

pub const LATITUDE_COLUMN_NAME: &str = "latitude";
pub const LONGITUDE_COLUMN_NAME: &str = "longitude";
pub const POSTAL_PREFIX_COLUMN_NAME: &str = "zip5";
pub const DATE_COLUMN_NAME: &str = "date";
pub const YEAR_COLUMN_NAME: &str = "year";
pub const MONTH_COLUMN_NAME: &str = "month";
pub const HOUR_COLUMN_NAME: &str = "hour";

const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M";

#[derive(Debug)]
pub struct NormalizeOutput {
	/// The count of rows removed because their coordinate parsed to the zero latitude sentinel.
	pub n_rows_dropped_for_coordinates: usize,
}

pub fn normalize(
	dataframe: &mut DataFrame,
	coordinate_column_name: &str,
	postal_column_name: &str,
	timestamp_column_name: &str,
) -> Result<NormalizeOutput> {
	let n_rows = dataframe.nrows();

	// Parse the coordinate strings. An unparseable coordinate maps to (0, 0), the same sentinel the source data uses for a missing coordinate, so both cases are removed by the latitude check below.
	let coordinates: Vec<(f32, f32)> = text_column(dataframe, coordinate_column_name)?
		.data
		.iter()
		.map(|value| parse_coordinates(value).unwrap_or((0.0, 0.0)))
		.collect();

	// Truncate the postal codes to their first 5 characters.
	let postal_prefixes: Vec<Option<String>> = text_column(dataframe, postal_column_name)?
		.data
		.iter()
		.map(|value| {
			if value.is_empty() {
				None
			} else {
				Some(value.chars().take(5).collect())
			}
		})
		.collect();

	// Parse the timestamps and derive the calendar fields. A failed parse leaves every derived field missing, which the completeness filter removes later.
	let timestamps: Vec<Option<NaiveDateTime>> = text_column(dataframe, timestamp_column_name)?
		.data
		.iter()
		.map(|value| NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok())
		.collect();

	let mut latitudes = Vec::with_capacity(n_rows);
	let mut longitudes = Vec::with_capacity(n_rows);
	for (latitude, longitude) in coordinates.iter() {
		latitudes.push(*latitude);
		// The source data records some longitudes with the sign flipped. Every inspected restaurant is in the western hemisphere, so force the sign.
		longitudes.push(-longitude.abs());
	}
	let dates: Vec<String> = timestamps
		.iter()
		.map(|timestamp| {
			timestamp
				.map(|timestamp| timestamp.format("%Y-%m-%d").to_string())
				.unwrap_or_default()
		})
		.collect();
	let years = calendar_field(&timestamps, "%Y");
	let months = calendar_field(&timestamps, "%m");
	let hours = calendar_field(&timestamps, "%H");

	dataframe.columns.push(Column::Number(NumberColumn {
		name: LATITUDE_COLUMN_NAME.to_owned(),
		data: latitudes,
	}));
	dataframe.columns.push(Column::Number(NumberColumn {
		name: LONGITUDE_COLUMN_NAME.to_owned(),
		data: longitudes,
	}));
	dataframe.columns.push(Column::Enum(EnumColumn::from_values(
		POSTAL_PREFIX_COLUMN_NAME.to_owned(),
		postal_prefixes,
	)));
	dataframe.columns.push(Column::Text(TextColumn {
		name: DATE_COLUMN_NAME.to_owned(),
		data: dates,
	}));
	dataframe.columns.push(Column::Enum(EnumColumn::from_values(
		YEAR_COLUMN_NAME.to_owned(),
		years,
	)));
	dataframe.columns.push(Column::Enum(EnumColumn::from_values(
		MONTH_COLUMN_NAME.to_owned(),
		months,
	)));
	dataframe.columns.push(Column::Enum(EnumColumn::from_values(
		HOUR_COLUMN_NAME.to_owned(),
		hours,
	)));

	// Remove the rows whose latitude is the sentinel. This is an exact comparison, not a missing value check: the sentinel is what the coordinate parse produces for bad input.
	let mask: Vec<bool> = coordinates
		.iter()
		.map(|(latitude, _)| *latitude != 0.0)
		.collect();
	dataframe.retain_rows(&mask);
	let n_rows_dropped_for_coordinates = n_rows - dataframe.nrows();

	Ok(NormalizeOutput {
		n_rows_dropped_for_coordinates,
	})
}

fn text_column<'a>(dataframe: &'a DataFrame, column_name: &str) -> Result<&'a TextColumn> {
	dataframe
		.column(column_name)
		.and_then(|column| column.as_text())
		.ok_or_else(|| format_err!("did not find a text column named \"{}\"", column_name))
}

fn parse_coordinates(value: &str) -> Option<(f32, f32)> {
	let mut parts = value
		.trim()
		.trim_start_matches('(')
		.trim_end_matches(')')
		.split(',');
	let latitude = parts.next()?.trim().parse::<f32>().ok()?;
	let longitude = parts.next()?.trim().parse::<f32>().ok()?;
	if parts.next().is_some() {
		return None;
	}
	Some((latitude, longitude))
}

fn calendar_field(
	timestamps: &[Option<NaiveDateTime>],
	format: &str,
) -> Vec<Option<String>> {
	timestamps
		.iter()
		.map(|timestamp| timestamp.map(|timestamp| timestamp.format(format).to_string()))
		.collect()
}

#[cfg(test)]
mod test {
	use super::*;

	fn test_dataframe(
		coordinates: Vec<&str>,
		postal_codes: Vec<&str>,
		timestamps: Vec<&str>,
	) -> DataFrame {
		DataFrame {
			columns: vec![
				Column::Text(TextColumn {
					name: "restaurant_location".to_owned(),
					data: coordinates.into_iter().map(|value| value.to_owned()).collect(),
				}),
				Column::Text(TextColumn {
					name: "zip".to_owned(),
					data: postal_codes.into_iter().map(|value| value.to_owned()).collect(),
				}),
				Column::Text(TextColumn {
					name: "inspection_time".to_owned(),
					data: timestamps.into_iter().map(|value| value.to_owned()).collect(),
				}),
			],
		}
	}

	fn normalize_test_dataframe(dataframe: &mut DataFrame) -> NormalizeOutput {
		normalize(dataframe, "restaurant_location", "zip", "inspection_time").unwrap()
	}

	#[test]
	fn test_derived_fields() {
		let mut dataframe = test_dataframe(
			vec!["(36.17, 115.14)", "(36.20, 115.20)"],
			vec!["89109-1234", "89101"],
			vec!["01/15/2011 10:30", "06/02/2012 14:05"],
		);
		let output = normalize_test_dataframe(&mut dataframe);
		assert_eq!(output.n_rows_dropped_for_coordinates, 0);
		assert_eq!(
			dataframe.column("longitude").unwrap().as_number().unwrap().data,
			vec![-115.14, -115.20]
		);
		assert_eq!(
			dataframe.column("latitude").unwrap().as_number().unwrap().data,
			vec![36.17, 36.20]
		);
		let zip5 = dataframe.column("zip5").unwrap().as_enum().unwrap();
		assert_eq!(zip5.option_name(zip5.data[0].unwrap()), "89109");
		assert_eq!(zip5.option_name(zip5.data[1].unwrap()), "89101");
		let year = dataframe.column("year").unwrap().as_enum().unwrap();
		assert_eq!(year.option_name(year.data[0].unwrap()), "2011");
		assert_eq!(year.option_name(year.data[1].unwrap()), "2012");
		let month = dataframe.column("month").unwrap().as_enum().unwrap();
		assert_eq!(month.option_name(month.data[0].unwrap()), "01");
		assert_eq!(month.option_name(month.data[1].unwrap()), "06");
		let hour = dataframe.column("hour").unwrap().as_enum().unwrap();
		assert_eq!(hour.option_name(hour.data[0].unwrap()), "10");
		assert_eq!(hour.option_name(hour.data[1].unwrap()), "14");
		assert_eq!(
			dataframe.column("date").unwrap().as_text().unwrap().data,
			vec!["2011-01-15".to_owned(), "2012-06-02".to_owned()]
		);
	}

	#[test]
	fn test_longitude_is_never_positive() {
		let mut dataframe = test_dataframe(
			vec!["(36.17, 115.14)", "(36.20, -115.20)"],
			vec!["89109", "89101"],
			vec!["01/15/2011 10:30", "06/02/2012 14:05"],
		);
		normalize_test_dataframe(&mut dataframe);
		for longitude in dataframe
			.column("longitude")
			.unwrap()
			.as_number()
			.unwrap()
			.data
			.iter()
		{
			assert!(*longitude <= 0.0);
		}
	}

	#[test]
	fn test_zero_coordinate_sentinel_drops_the_row() {
		let mut dataframe = test_dataframe(
			vec!["(0,0)", "(36.20, 115.20)"],
			vec!["89109", "89101"],
			vec!["01/15/2011 10:30", "06/02/2012 14:05"],
		);
		let output = normalize_test_dataframe(&mut dataframe);
		assert_eq!(output.n_rows_dropped_for_coordinates, 1);
		assert_eq!(dataframe.nrows(), 1);
		assert_eq!(
			dataframe.column("zip5").unwrap().as_enum().unwrap().data[0]
				.map(|value| value.get()),
			Some(1)
		);
	}

	#[test]
	fn test_unparseable_coordinate_drops_the_row() {
		let mut dataframe = test_dataframe(
			vec!["not a coordinate", "(36.20, 115.20)"],
			vec!["89109", "89101"],
			vec!["01/15/2011 10:30", "06/02/2012 14:05"],
		);
		let output = normalize_test_dataframe(&mut dataframe);
		assert_eq!(output.n_rows_dropped_for_coordinates, 1);
		assert_eq!(dataframe.nrows(), 1);
	}

	#[test]
	fn test_unparseable_timestamp_yields_missing_derived_fields() {
		let mut dataframe = test_dataframe(
			vec!["(36.17, 115.14)"],
			vec!["89109"],
			vec!["not a timestamp"],
		);
		let output = normalize_test_dataframe(&mut dataframe);
		assert_eq!(output.n_rows_dropped_for_coordinates, 0);
		assert_eq!(dataframe.column("year").unwrap().as_enum().unwrap().data[0], None);
		assert!(dataframe.column("date").unwrap().is_missing(0));
	}
}
