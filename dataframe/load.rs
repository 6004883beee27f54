use crate::{Column, ColumnType, DataFrame};
use anyhow::Result;
use fnv::FnvHashMap;
use std::{
	collections::{BTreeMap, BTreeSet},
	num::NonZeroUsize,
	path::Path,
};

#[derive(Clone)]
pub struct FromCsvOptions<'a> {
	pub column_types: Option<BTreeMap<String, ColumnType>>,
	pub infer_options: InferOptions,
	pub invalid_values: &'a [&'a str],
}

impl<'a> Default for FromCsvOptions<'a> {
	fn default() -> Self {
		Self {
			column_types: None,
			infer_options: InferOptions::default(),
			invalid_values: DEFAULT_INVALID_VALUES,
		}
	}
}

#[derive(Clone, Debug)]
pub struct InferOptions {
	/// A column whose count of unique values exceeds this is inferred as a text column instead of an enum column.
	pub enum_max_unique_values: usize,
}

impl Default for InferOptions {
	fn default() -> Self {
		Self {
			enum_max_unique_values: 100,
		}
	}
}

/// These values are the default values that are considered invalid.
const DEFAULT_INVALID_VALUES: &[&str] = &[
	"", "null", "NULL", "n/a", "N/A", "nan", "-nan", "NaN", "-NaN", "?",
];

impl DataFrame {
	pub fn from_path(path: &Path, options: FromCsvOptions, progress: impl Fn(u64)) -> Result<Self> {
		Self::from_csv(&mut csv::Reader::from_path(path)?, options, progress)
	}

	pub fn from_csv<R>(
		reader: &mut csv::Reader<R>,
		options: FromCsvOptions,
		progress: impl Fn(u64),
	) -> Result<Self>
	where
		R: std::io::Read + std::io::Seek,
	{
		let column_names: Vec<String> = reader
			.headers()?
			.into_iter()
			.map(|column_name| column_name.to_owned())
			.collect();
		let start_position = reader.position().clone();

		// Resolve each column's type: take the type specified in the options if there is one, otherwise run an inference pass over the csv.
		let specified_types: Vec<Option<ColumnType>> = column_names
			.iter()
			.map(|column_name| {
				options
					.column_types
					.as_ref()
					.and_then(|column_types| column_types.get(column_name).cloned())
			})
			.collect();
		let needs_infer = specified_types.iter().any(|column_type| column_type.is_none());
		let column_types: Vec<ColumnType> = if needs_infer {
			let mut infer_stats: Vec<Option<InferStats>> = specified_types
				.iter()
				.map(|column_type| match column_type {
					Some(_) => None,
					None => Some(InferStats::new(
						&options.infer_options,
						options.invalid_values,
					)),
				})
				.collect();
			let mut record = csv::StringRecord::new();
			while reader.read_record(&mut record)? {
				for (index, infer_stats) in infer_stats.iter_mut().enumerate() {
					if let Some(infer_stats) = infer_stats {
						infer_stats.update(record.get(index).unwrap_or(""));
					}
				}
			}
			// After inference, return to the beginning of the csv to load the values.
			reader.seek(start_position)?;
			specified_types
				.into_iter()
				.zip(infer_stats.into_iter())
				.map(|(column_type, infer_stats)| match column_type {
					Some(column_type) => column_type,
					None => infer_stats.unwrap().finalize(),
				})
				.collect()
		} else {
			specified_types
				.into_iter()
				.map(|column_type| column_type.unwrap())
				.collect()
		};

		let mut dataframe = Self::new(column_names, column_types);
		// Intern each enum column's options so values are matched without allocating.
		let options_maps: Vec<Option<FnvHashMap<String, NonZeroUsize>>> = dataframe
			.columns
			.iter()
			.map(|column| match column {
				Column::Enum(column) => Some(
					column
						.options
						.iter()
						.enumerate()
						.map(|(index, option)| {
							(option.clone(), NonZeroUsize::new(index + 1).unwrap())
						})
						.collect(),
				),
				_ => None,
			})
			.collect();
		// Read each csv record and push the values into the columns of the dataframe.
		let mut record = csv::ByteRecord::new();
		while reader.read_byte_record(&mut record)? {
			progress(record.position().unwrap().byte());
			for ((column, options_map), value) in dataframe
				.columns
				.iter_mut()
				.zip(options_maps.iter())
				.zip(record.iter())
			{
				match column {
					Column::Unknown(column) => {
						column.len += 1;
					}
					Column::Number(column) => {
						let value = match lexical::parse::<f32, &[u8]>(value) {
							Ok(value) if value.is_finite() => value,
							_ => std::f32::NAN,
						};
						column.data.push(value);
					}
					Column::Enum(column) => {
						let value = std::str::from_utf8(value)
							.ok()
							.and_then(|value| options_map.as_ref().unwrap().get(value).cloned());
						column.data.push(value);
					}
					Column::Text(column) => {
						column.data.push(std::str::from_utf8(value)?.to_owned());
					}
				}
			}
		}
		Ok(dataframe)
	}
}

#[derive(Clone, Debug)]
pub struct InferStats<'a> {
	infer_options: &'a InferOptions,
	invalid_values: &'a [&'a str],
	n_valid_values: usize,
	all_values_are_numbers: bool,
	unique_values: Option<BTreeSet<String>>,
}

impl<'a> InferStats<'a> {
	pub fn new(infer_options: &'a InferOptions, invalid_values: &'a [&'a str]) -> Self {
		Self {
			infer_options,
			invalid_values,
			n_valid_values: 0,
			all_values_are_numbers: true,
			unique_values: Some(BTreeSet::new()),
		}
	}

	pub fn update(&mut self, value: &str) {
		if self.invalid_values.contains(&value) {
			return;
		}
		self.n_valid_values += 1;
		if !lexical::parse::<f32, &str>(value)
			.map(|value| value.is_finite())
			.unwrap_or(false)
		{
			self.all_values_are_numbers = false;
		}
		if let Some(unique_values) = self.unique_values.as_mut() {
			if !unique_values.contains(value) {
				unique_values.insert(value.to_owned());
			}
			if unique_values.len() > self.infer_options.enum_max_unique_values {
				self.unique_values = None;
			}
		}
	}

	pub fn finalize(self) -> ColumnType {
		if self.n_valid_values == 0 {
			return ColumnType::Unknown;
		}
		if self.all_values_are_numbers {
			// A column whose only values are zero and one is an enum column, so a binary label loads as an enum.
			if let Some(unique_values) = self.unique_values {
				if unique_values.len() == 2
					&& unique_values.contains("0")
					&& unique_values.contains("1")
				{
					return ColumnType::Enum {
						options: unique_values.into_iter().collect(),
					};
				}
			}
			return ColumnType::Number;
		}
		match self.unique_values {
			Some(unique_values) => ColumnType::Enum {
				options: unique_values.into_iter().collect(),
			},
			None => ColumnType::Text,
		}
	}
}

#[test]
fn test_infer() {
	let csv = r#"current_demerits,current_grade,restaurant_name
3,A,PHO SO 1
6,A,HOT DOG SHACK
"#;
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions {
			column_types: None,
			infer_options: InferOptions {
				enum_max_unique_values: 1,
			},
			..Default::default()
		},
		|_| {},
	)
	.unwrap();
	insta::assert_debug_snapshot!(df, @r###"
 DataFrame {
     columns: [
         Number(
             NumberColumn {
                 name: "current_demerits",
                 data: [
                     3.0,
                     6.0,
                 ],
             },
         ),
         Enum(
             EnumColumn {
                 name: "current_grade",
                 options: [
                     "A",
                 ],
                 data: [
                     Some(
                         1,
                     ),
                     Some(
                         1,
                     ),
                 ],
             },
         ),
         Text(
             TextColumn {
                 name: "restaurant_name",
                 data: [
                     "PHO SO 1",
                     "HOT DOG SHACK",
                 ],
             },
         ),
     ],
 }
 "###);
}

#[test]
fn test_binary_label_infers_as_enum() {
	let csv = r#"zip,NEXT_INSPECTION_GRADE_C_OR_BELOW
89109-1234,0
89101,1
"#;
	let mut column_types = BTreeMap::new();
	column_types.insert("zip".to_owned(), ColumnType::Text);
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions {
			column_types: Some(column_types),
			..Default::default()
		},
		|_| {},
	)
	.unwrap();
	insta::assert_debug_snapshot!(df, @r###"
 DataFrame {
     columns: [
         Text(
             TextColumn {
                 name: "zip",
                 data: [
                     "89109-1234",
                     "89101",
                 ],
             },
         ),
         Enum(
             EnumColumn {
                 name: "NEXT_INSPECTION_GRADE_C_OR_BELOW",
                 options: [
                     "0",
                     "1",
                 ],
                 data: [
                     Some(
                         1,
                     ),
                     Some(
                         2,
                     ),
                 ],
             },
         ),
     ],
 }
 "###);
}

#[test]
fn test_invalid_values_load_as_missing() {
	let csv = r#"inspection_demerits,inspection_type
10,Routine
n/a,
"#;
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions::default(),
		|_| {},
	)
	.unwrap();
	assert!(df.columns[0].as_number().unwrap().data[1].is_nan());
	assert_eq!(df.columns[1].as_enum().unwrap().data[1], None);
	assert_eq!(df.columns[0].count_missing(), 1);
	assert_eq!(df.columns[1].count_missing(), 1);
}
