/*!
This crate provides the columnar tables that the inspection pipeline threads between its stages. A `DataFrame` holds one typed column per csv field: numbers, enums whose values are drawn from a fixed set of options, free text, and columns whose type could not be determined. It implements only what the pipeline needs: csv loading with a type inference pass, missing value accounting, row filtering, and column removal.
*/

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

pub mod load;

pub use self::load::*;

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
	pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
	Unknown(UnknownColumn),
	Number(NumberColumn),
	Enum(EnumColumn),
	Text(TextColumn),
}

/// A column none of whose values could be interpreted, e.g. a column that is entirely empty.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownColumn {
	pub name: String,
	pub len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberColumn {
	pub name: String,
	pub data: Vec<f32>,
}

/// An enum column stores each value as an index into `options`. `None` marks a value that was missing or was not one of the options.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumColumn {
	pub name: String,
	pub options: Vec<String>,
	pub data: Vec<Option<NonZeroUsize>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextColumn {
	pub name: String,
	pub data: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum ColumnType {
	Unknown,
	Number,
	Enum { options: Vec<String> },
	Text,
}

impl DataFrame {
	pub fn new(column_names: Vec<String>, column_types: Vec<ColumnType>) -> Self {
		let columns = column_names
			.into_iter()
			.zip(column_types.into_iter())
			.map(|(column_name, column_type)| match column_type {
				ColumnType::Unknown => Column::Unknown(UnknownColumn::new(column_name)),
				ColumnType::Number => Column::Number(NumberColumn::new(column_name)),
				ColumnType::Enum { options } => Column::Enum(EnumColumn::new(column_name, options)),
				ColumnType::Text => Column::Text(TextColumn::new(column_name)),
			})
			.collect();
		Self { columns }
	}

	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	pub fn column(&self, name: &str) -> Option<&Column> {
		self.columns.iter().find(|column| column.name() == name)
	}

	/// Keep only the rows whose entry in `mask` is `true`. `mask` must have one entry per row.
	pub fn retain_rows(&mut self, mask: &[bool]) {
		assert_eq!(mask.len(), self.nrows());
		for column in self.columns.iter_mut() {
			column.retain_rows(mask);
		}
	}

	/// Remove the named columns. Names not present in the dataframe are ignored.
	pub fn remove_columns(&mut self, names: &[&str]) {
		self.columns
			.retain(|column| !names.contains(&column.name()));
	}

	/// Remove and return the named column.
	pub fn take_column(&mut self, name: &str) -> Option<Column> {
		let index = self
			.columns
			.iter()
			.position(|column| column.name() == name)?;
		Some(self.columns.remove(index))
	}
}

impl Column {
	pub fn len(&self) -> usize {
		match self {
			Self::Unknown(s) => s.len,
			Self::Number(s) => s.data.len(),
			Self::Enum(s) => s.data.len(),
			Self::Text(s) => s.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Unknown(s) => s.name.as_str(),
			Self::Number(s) => s.name.as_str(),
			Self::Enum(s) => s.name.as_str(),
			Self::Text(s) => s.name.as_str(),
		}
	}

	pub fn as_number(&self) -> Option<&NumberColumn> {
		match self {
			Self::Number(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_enum(&self) -> Option<&EnumColumn> {
		match self {
			Self::Enum(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_text(&self) -> Option<&TextColumn> {
		match self {
			Self::Text(s) => Some(s),
			_ => None,
		}
	}

	/// Whether the value at `index` is missing: `NaN` for a number column, `None` for an enum column, the empty string for a text column. Every value of an unknown column is missing.
	pub fn is_missing(&self, index: usize) -> bool {
		match self {
			Self::Unknown(_) => true,
			Self::Number(s) => s.data[index].is_nan(),
			Self::Enum(s) => s.data[index].is_none(),
			Self::Text(s) => s.data[index].is_empty(),
		}
	}

	/// The number of missing values in this column.
	pub fn count_missing(&self) -> usize {
		(0..self.len()).filter(|index| self.is_missing(*index)).count()
	}

	fn retain_rows(&mut self, mask: &[bool]) {
		match self {
			Self::Unknown(s) => s.len = mask.iter().filter(|keep| **keep).count(),
			Self::Number(s) => retain_by_mask(&mut s.data, mask),
			Self::Enum(s) => retain_by_mask(&mut s.data, mask),
			Self::Text(s) => retain_by_mask(&mut s.data, mask),
		}
	}
}

fn retain_by_mask<T>(data: &mut Vec<T>, mask: &[bool]) {
	let mut index = 0;
	data.retain(|_| {
		let keep = mask[index];
		index += 1;
		keep
	});
}

impl UnknownColumn {
	pub fn new(name: String) -> Self {
		Self { name, len: 0 }
	}
}

impl NumberColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}
}

impl EnumColumn {
	pub fn new(name: String, options: Vec<String>) -> Self {
		Self {
			name,
			options,
			data: Vec::new(),
		}
	}

	/// Build an enum column from one string per row, where `None` marks a missing value. The options are the distinct values in sorted order.
	pub fn from_values(name: String, values: Vec<Option<String>>) -> Self {
		let options: Vec<String> = values
			.iter()
			.filter_map(|value| value.clone())
			.collect::<BTreeSet<String>>()
			.into_iter()
			.collect();
		let data = values
			.into_iter()
			.map(|value| {
				value.and_then(|value| {
					options
						.iter()
						.position(|option| *option == value)
						.map(|position| NonZeroUsize::new(position + 1).unwrap())
				})
			})
			.collect();
		Self {
			name,
			options,
			data,
		}
	}

	/// The option name for a stored value.
	pub fn option_name(&self, value: NonZeroUsize) -> &str {
		&self.options[value.get() - 1]
	}
}

impl TextColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn test_dataframe() -> DataFrame {
		DataFrame {
			columns: vec![
				Column::Number(NumberColumn {
					name: "current_demerits".to_owned(),
					data: vec![3.0, std::f32::NAN, 9.0],
				}),
				Column::Enum(EnumColumn::from_values(
					"current_grade".to_owned(),
					vec![Some("A".to_owned()), Some("B".to_owned()), None],
				)),
				Column::Text(TextColumn {
					name: "restaurant_name".to_owned(),
					data: vec!["PHO SO 1".to_owned(), "".to_owned(), "MR LUCKY".to_owned()],
				}),
			],
		}
	}

	#[test]
	fn test_is_missing() {
		let df = test_dataframe();
		assert_eq!(df.columns[0].count_missing(), 1);
		assert_eq!(df.columns[1].count_missing(), 1);
		assert_eq!(df.columns[2].count_missing(), 1);
		assert!(!df.columns[0].is_missing(0));
		assert!(df.columns[0].is_missing(1));
		assert!(df.columns[1].is_missing(2));
		assert!(df.columns[2].is_missing(1));
	}

	#[test]
	fn test_retain_rows() {
		let mut df = test_dataframe();
		df.retain_rows(&[true, false, true]);
		assert_eq!(df.nrows(), 2);
		assert_eq!(df.columns[0].as_number().unwrap().data, vec![3.0, 9.0]);
		assert_eq!(
			df.columns[2].as_text().unwrap().data,
			vec!["PHO SO 1".to_owned(), "MR LUCKY".to_owned()]
		);
	}

	#[test]
	fn test_enum_from_values() {
		let column = EnumColumn::from_values(
			"inspection_type".to_owned(),
			vec![
				Some("Routine".to_owned()),
				Some("Re-inspection".to_owned()),
				Some("Routine".to_owned()),
				None,
			],
		);
		assert_eq!(
			column.options,
			vec!["Re-inspection".to_owned(), "Routine".to_owned()]
		);
		assert_eq!(column.data[0].unwrap().get(), 2);
		assert_eq!(column.data[1].unwrap().get(), 1);
		assert_eq!(column.data[2].unwrap().get(), 2);
		assert_eq!(column.data[3], None);
	}

	#[test]
	fn test_remove_columns() {
		let mut df = test_dataframe();
		df.remove_columns(&["restaurant_name", "not_a_column"]);
		assert_eq!(df.ncols(), 2);
		assert!(df.column("restaurant_name").is_none());
		assert!(df.column("current_grade").is_some());
	}
}
