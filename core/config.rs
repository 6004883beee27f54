/*!
This module defines the `Config` struct, which configures a run from an optional yaml file, and the `Settings` struct, which holds every option resolved to a concrete value. `Settings` is what gets saved into the model artifact, so a saved model can re-run the test pipeline exactly.
*/

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, serde::Deserialize)]
pub struct Config {
	pub train_source: Option<String>,
	pub test_source: Option<String>,
	pub target_column_name: Option<String>,
	pub id_column_name: Option<String>,
	pub coordinate_column_name: Option<String>,
	pub postal_column_name: Option<String>,
	pub timestamp_column_name: Option<String>,
	pub drop_columns: Option<Vec<String>>,
	pub column_types: Option<BTreeMap<String, ColumnType>>,
	pub seed: Option<u64>,
	pub trees_per_feature: Option<usize>,
	pub threshold: Option<f32>,
	pub n_repeats: Option<usize>,
	pub grid: Option<GridValuesConfig>,
	pub output_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ColumnType {
	#[serde(rename = "unknown")]
	Unknown,
	#[serde(rename = "number")]
	Number,
	#[serde(rename = "enum")]
	Enum { options: Vec<String> },
	#[serde(rename = "text")]
	Text,
}

/// Candidate value sets for the hyperparameter grid. Any dimension left unset uses the default value set.
#[derive(Debug, serde::Deserialize)]
pub struct GridValuesConfig {
	pub max_features: Option<Vec<usize>>,
	pub min_samples_leaf: Option<Vec<usize>>,
	pub replace: Option<Vec<bool>>,
	pub sample_fraction: Option<Vec<f32>>,
}

pub const DEFAULT_TARGET_COLUMN_NAME: &str = "NEXT_INSPECTION_GRADE_C_OR_BELOW";
pub const DEFAULT_ID_COLUMN_NAME: &str = "restaurant_serial_number";
pub const DEFAULT_COORDINATE_COLUMN_NAME: &str = "restaurant_location";
pub const DEFAULT_POSTAL_COLUMN_NAME: &str = "zip";
pub const DEFAULT_TIMESTAMP_COLUMN_NAME: &str = "inspection_time";

/// Identifier, free text, constant, and superseded columns that never enter the feature set.
pub const DEFAULT_DROP_COLUMNS: &[&str] = &[
	"restaurant_serial_number",
	"restaurant_permit_number",
	"restaurant_name",
	"address",
	"city",
	"state",
	"violations_raw",
	"current_grade",
	"restaurant_location",
	"zip",
	"inspection_time",
	"record_updated",
	"date",
];

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TREES_PER_FEATURE: usize = 10;
pub const DEFAULT_THRESHOLD: f32 = 0.5;
pub const DEFAULT_N_REPEATS: usize = 100;

/// Every option resolved to a concrete value.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Settings {
	pub target_column_name: String,
	pub id_column_name: String,
	pub coordinate_column_name: String,
	pub postal_column_name: String,
	pub timestamp_column_name: String,
	pub drop_columns: Vec<String>,
	pub column_types: BTreeMap<String, ColumnType>,
	pub seed: u64,
	pub trees_per_feature: usize,
	pub threshold: f32,
	pub n_repeats: usize,
}

impl Settings {
	pub fn from_config(config: &Option<Config>) -> Self {
		let config = config.as_ref();
		Self {
			target_column_name: config
				.and_then(|config| config.target_column_name.clone())
				.unwrap_or_else(|| DEFAULT_TARGET_COLUMN_NAME.to_owned()),
			id_column_name: config
				.and_then(|config| config.id_column_name.clone())
				.unwrap_or_else(|| DEFAULT_ID_COLUMN_NAME.to_owned()),
			coordinate_column_name: config
				.and_then(|config| config.coordinate_column_name.clone())
				.unwrap_or_else(|| DEFAULT_COORDINATE_COLUMN_NAME.to_owned()),
			postal_column_name: config
				.and_then(|config| config.postal_column_name.clone())
				.unwrap_or_else(|| DEFAULT_POSTAL_COLUMN_NAME.to_owned()),
			timestamp_column_name: config
				.and_then(|config| config.timestamp_column_name.clone())
				.unwrap_or_else(|| DEFAULT_TIMESTAMP_COLUMN_NAME.to_owned()),
			drop_columns: config
				.and_then(|config| config.drop_columns.clone())
				.unwrap_or_else(|| {
					DEFAULT_DROP_COLUMNS
						.iter()
						.map(|column_name| column_name.to_string())
						.collect()
				}),
			column_types: config
				.and_then(|config| config.column_types.clone())
				.unwrap_or_default(),
			seed: config.and_then(|config| config.seed).unwrap_or(DEFAULT_SEED),
			trees_per_feature: config
				.and_then(|config| config.trees_per_feature)
				.unwrap_or(DEFAULT_TREES_PER_FEATURE),
			threshold: config
				.and_then(|config| config.threshold)
				.unwrap_or(DEFAULT_THRESHOLD),
			n_repeats: config
				.and_then(|config| config.n_repeats)
				.unwrap_or(DEFAULT_N_REPEATS),
		}
	}

	/// The column type overrides passed to the csv loader. The three raw composite columns are forced to text so the normalizer can parse them itself, whatever the loader would have inferred.
	pub fn dataframe_column_types(
		&self,
	) -> BTreeMap<String, gradecast_dataframe::ColumnType> {
		let mut column_types: BTreeMap<String, gradecast_dataframe::ColumnType> = self
			.column_types
			.iter()
			.map(|(column_name, column_type)| {
				let column_type = match column_type {
					ColumnType::Unknown => gradecast_dataframe::ColumnType::Unknown,
					ColumnType::Number => gradecast_dataframe::ColumnType::Number,
					ColumnType::Enum { options } => gradecast_dataframe::ColumnType::Enum {
						options: options.clone(),
					},
					ColumnType::Text => gradecast_dataframe::ColumnType::Text,
				};
				(column_name.clone(), column_type)
			})
			.collect();
		for column_name in &[
			&self.coordinate_column_name,
			&self.postal_column_name,
			&self.timestamp_column_name,
		] {
			column_types.insert(
				column_name.to_string(),
				gradecast_dataframe::ColumnType::Text,
			);
		}
		column_types
	}
}

pub fn load_config(config_path: Option<&Path>) -> Result<Option<Config>> {
	if let Some(config_path) = config_path {
		let config = std::fs::read_to_string(config_path)
			.with_context(|| format!("failed to read config file {}", config_path.display()))?;
		let config = serde_yaml::from_str(&config)
			.with_context(|| format!("failed to parse config file {}", config_path.display()))?;
		Ok(Some(config))
	} else {
		Ok(None)
	}
}
